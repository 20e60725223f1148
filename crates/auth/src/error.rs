//! Error types for credential bootstrap.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while reading a token or writing credentials.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("environment variable {0} is not set")]
    MissingVar(String),

    #[error("environment variable {0} is empty")]
    EmptyVar(String),

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot locate home directory (HOME is not set)")]
    NoHome,

    #[error("failed to write credentials to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result alias for credential operations.
pub type Result<T> = std::result::Result<T, AuthError>;
