//! Earth Engine credentials file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{AuthError, Result};
use crate::token::{EarthEngineToken, TokenSource};

/// Google OAuth2 token endpoint.
pub const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Location of the credentials file below `$HOME`.
pub const CREDENTIALS_RELATIVE_PATH: &str = ".config/earthengine/credentials";

/// Contents of `~/.config/earthengine/credentials`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub token_uri: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota_project_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
}

impl From<EarthEngineToken> for Credentials {
    fn from(token: EarthEngineToken) -> Self {
        match token {
            EarthEngineToken::RefreshToken(refresh_token) => Self {
                token_uri: TOKEN_URI.to_string(),
                refresh_token: Some(refresh_token),
                client_id: None,
                client_secret: None,
                quota_project_id: None,
                scopes: None,
            },
            EarthEngineToken::OAuthClient(client) => Self {
                token_uri: TOKEN_URI.to_string(),
                refresh_token: client.refresh_token,
                client_id: client.client_id,
                client_secret: client.client_secret,
                quota_project_id: client.project.or(client.project_id),
                scopes: client.scopes,
            },
        }
    }
}

/// `~/.config/earthengine/credentials`, resolved from `$HOME`.
pub fn default_credentials_path() -> Result<PathBuf> {
    let home = std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .ok_or(AuthError::NoHome)?;
    Ok(PathBuf::from(home).join(CREDENTIALS_RELATIVE_PATH))
}

/// Write `credentials` as JSON to `path`, creating parent directories.
pub fn write_credentials(credentials: &Credentials, path: &Path) -> Result<()> {
    let write_err = |source| AuthError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    let json = serde_json::to_string_pretty(credentials)?;
    fs::write(path, json).map_err(write_err)?;

    debug!("Wrote Earth Engine credentials to {}", path.display());
    Ok(())
}

/// Read a token from `source` and write the credentials file to `path`.
pub fn bootstrap(source: &dyn TokenSource, path: &Path) -> Result<Credentials> {
    let credentials = Credentials::from(source.token()?);
    write_credentials(&credentials, path)?;
    Ok(credentials)
}

/// Read `EARTHENGINE_TOKEN` and write `~/.config/earthengine/credentials`.
///
/// Returns the path written.
pub fn bootstrap_from_env() -> Result<PathBuf> {
    let path = default_credentials_path()?;
    bootstrap(&crate::token::EnvToken::default(), &path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::StaticToken;

    #[test]
    fn test_refresh_token_credentials_shape() {
        let creds = Credentials::from(EarthEngineToken::RefreshToken("rt".into()));
        let json = serde_json::to_value(&creds).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"token_uri": TOKEN_URI, "refresh_token": "rt"})
        );
    }

    #[test]
    fn test_oauth_client_maps_project_to_quota_project() {
        let token = EarthEngineToken::parse(
            r#"{"client_id": "id", "client_secret": "s", "refresh_token": "rt", "project": "p"}"#,
        )
        .unwrap();
        let creds = Credentials::from(token);
        assert_eq!(creds.quota_project_id.as_deref(), Some("p"));
        assert_eq!(creds.client_secret.as_deref(), Some("s"));
    }

    #[test]
    fn test_project_preferred_over_project_id() {
        let token = EarthEngineToken::parse(
            r#"{"refresh_token": "rt", "project": "p", "project_id": "pid"}"#,
        )
        .unwrap();
        let creds = Credentials::from(token);
        assert_eq!(creds.quota_project_id.as_deref(), Some("p"));
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".config/earthengine/credentials");

        let creds = bootstrap(&StaticToken("rt".into()), &path).unwrap();
        let written: Credentials =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, creds);
    }

    #[test]
    fn test_bad_token_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials");
        assert!(bootstrap(&StaticToken("{oops".into()), &path).is_err());
        assert!(!path.exists());
    }
}
