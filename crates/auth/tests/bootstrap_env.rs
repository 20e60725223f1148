//! Bootstrap from environment variables into a temporary home.

use std::fs;

use gishn_auth::{bootstrap, AuthError, Credentials, EnvToken};

#[test]
fn nested_client_secret_from_env() {
    let var = "GISHN_TEST_TOKEN_NESTED";
    std::env::set_var(
        var,
        r#"{"installed": {"client_id": "cid", "client_secret": "csecret", "project_id": "my-proj"}}"#,
    );

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".config/earthengine/credentials");
    bootstrap(&EnvToken::new(var), &path).unwrap();

    let written: Credentials = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written.client_id.as_deref(), Some("cid"));
    assert_eq!(written.quota_project_id.as_deref(), Some("my-proj"));
    assert_eq!(written.refresh_token, None);
    assert_eq!(written.token_uri, "https://oauth2.googleapis.com/token");
}

#[test]
fn bare_token_from_env() {
    let var = "GISHN_TEST_TOKEN_BARE";
    std::env::set_var(var, "1//refresh-token\n");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("credentials");
    let creds = bootstrap(&EnvToken::new(var), &path).unwrap();
    assert_eq!(creds.refresh_token.as_deref(), Some("1//refresh-token"));
    assert!(path.exists());
}

#[test]
fn empty_var_is_an_error() {
    let var = "GISHN_TEST_TOKEN_EMPTY";
    std::env::set_var(var, "  ");

    let dir = tempfile::tempdir().unwrap();
    let err = bootstrap(&EnvToken::new(var), &dir.path().join("credentials")).unwrap_err();
    assert!(matches!(err, AuthError::EmptyVar(_)));
}
