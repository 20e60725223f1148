//! Error types for gishn

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for catalog and imagery operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read catalog {path}: {source}")]
    CatalogRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse catalog {path}: {source}")]
    CatalogParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown spectral index: {0}")]
    UnknownIndex(String),

    #[error("parameter '{0}' is neither a spectral constant nor a spectral band")]
    UnknownParameter(String),

    #[error("band '{band}' has no entry for platform '{platform}'")]
    MissingPlatformBand { band: String, platform: String },

    #[error("index '{index}' has no property '{property}'")]
    UnknownProperty { index: String, property: String },

    #[error("image has no band '{0}'")]
    MissingBand(String),

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("formula error: {0}")]
    Formula(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for gishn operations
pub type Result<T> = std::result::Result<T, Error>;
