//! Earth Engine token sources.
//!
//! `EARTHENGINE_TOKEN` has been seen in three shapes:
//! - a bare refresh token: `1//0abc...`
//! - flat OAuth client JSON: `{"client_id", "client_secret", "refresh_token", "project"}`
//! - a downloaded client secret: `{"installed": {"client_id", "client_secret", "project_id", ...}}`
//!
//! All three parse into [`EarthEngineToken`].

use serde::Deserialize;
use serde_json::Value;

use crate::error::{AuthError, Result};

/// Environment variable holding the token.
pub const TOKEN_VAR: &str = "EARTHENGINE_TOKEN";

/// OAuth client fields found in a JSON token.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct OAuthClient {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub scopes: Option<Vec<String>>,
}

impl OAuthClient {
    /// Quota project: `project`, or `project_id` when only that is set.
    pub fn project(&self) -> Option<&str> {
        self.project.as_deref().or(self.project_id.as_deref())
    }
}

/// A parsed `EARTHENGINE_TOKEN` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EarthEngineToken {
    RefreshToken(String),
    OAuthClient(OAuthClient),
}

impl EarthEngineToken {
    /// Parse a raw token value; JSON when it starts with `{`.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(AuthError::Malformed("token is empty".into()));
        }

        if raw.starts_with('{') {
            let value: Value = serde_json::from_str(raw)?;
            let client_value = match value.get("installed") {
                Some(inner) => inner.clone(),
                None => value,
            };
            let client: OAuthClient = serde_json::from_value(client_value)?;

            let has_client = client.client_id.is_some() && client.client_secret.is_some();
            if !has_client && client.refresh_token.is_none() {
                return Err(AuthError::Malformed(
                    "JSON token needs client_id and client_secret, or a refresh_token".into(),
                ));
            }
            return Ok(EarthEngineToken::OAuthClient(client));
        }

        if raw.chars().any(char::is_whitespace) {
            return Err(AuthError::Malformed(
                "refresh token must not contain whitespace".into(),
            ));
        }
        Ok(EarthEngineToken::RefreshToken(raw.to_string()))
    }
}

/// Something that can produce an Earth Engine token.
pub trait TokenSource {
    fn token(&self) -> Result<EarthEngineToken>;
}

/// Token read from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    pub fn var(&self) -> &str {
        &self.var
    }
}

impl Default for EnvToken {
    fn default() -> Self {
        Self::new(TOKEN_VAR)
    }
}

impl TokenSource for EnvToken {
    fn token(&self) -> Result<EarthEngineToken> {
        let raw = std::env::var(&self.var).map_err(|_| AuthError::MissingVar(self.var.clone()))?;
        if raw.trim().is_empty() {
            return Err(AuthError::EmptyVar(self.var.clone()));
        }
        EarthEngineToken::parse(&raw)
    }
}

/// Token given directly, e.g. from a file or a test.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

impl TokenSource for StaticToken {
    fn token(&self) -> Result<EarthEngineToken> {
        EarthEngineToken::parse(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_refresh_token() {
        let t = EarthEngineToken::parse("  1//0abcDEF-ghi  \n").unwrap();
        assert_eq!(t, EarthEngineToken::RefreshToken("1//0abcDEF-ghi".into()));
    }

    #[test]
    fn test_flat_json() {
        let t = EarthEngineToken::parse(
            r#"{"client_id": "id", "client_secret": "secret", "refresh_token": "rt", "project": "p"}"#,
        )
        .unwrap();
        let EarthEngineToken::OAuthClient(c) = t else {
            panic!("expected OAuth client");
        };
        assert_eq!(c.client_id.as_deref(), Some("id"));
        assert_eq!(c.refresh_token.as_deref(), Some("rt"));
        assert_eq!(c.project(), Some("p"));
    }

    #[test]
    fn test_nested_installed_json() {
        let t = EarthEngineToken::parse(
            r#"{"installed": {"client_id": "id", "client_secret": "s", "project_id": "proj",
                "auth_uri": "https://accounts.google.com/o/oauth2/auth"}}"#,
        )
        .unwrap();
        let EarthEngineToken::OAuthClient(c) = t else {
            panic!("expected OAuth client");
        };
        assert_eq!(c.project(), Some("proj"));
        assert_eq!(c.refresh_token, None);
    }

    #[test]
    fn test_project_and_project_id_together() {
        let t = EarthEngineToken::parse(
            r#"{"refresh_token": "rt", "project": "p", "project_id": "pid"}"#,
        )
        .unwrap();
        let EarthEngineToken::OAuthClient(c) = t else {
            panic!("expected OAuth client");
        };
        assert_eq!(c.project(), Some("p"));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            EarthEngineToken::parse("{\"client_id\": "),
            Err(AuthError::Json(_))
        ));
    }

    #[test]
    fn test_json_without_credentials() {
        assert!(matches!(
            EarthEngineToken::parse(r#"{"project": "p"}"#),
            Err(AuthError::Malformed(_))
        ));
    }

    #[test]
    fn test_empty_and_whitespace() {
        assert!(EarthEngineToken::parse("   ").is_err());
        assert!(EarthEngineToken::parse("two words").is_err());
    }

    #[test]
    fn test_static_source() {
        let t = StaticToken("abc".into()).token().unwrap();
        assert_eq!(t, EarthEngineToken::RefreshToken("abc".into()));
    }

    #[test]
    fn test_env_source_missing_var() {
        let src = EnvToken::new("GISHN_TEST_TOKEN_THAT_IS_NEVER_SET");
        assert!(matches!(src.token(), Err(AuthError::MissingVar(v)) if v == src.var()));
    }
}
