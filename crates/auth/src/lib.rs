//! # gishn auth
//!
//! Earth Engine credential bootstrap for CI jobs.
//!
//! The `EARTHENGINE_TOKEN` environment variable holds either a bare refresh
//! token or an OAuth client JSON blob. [`bootstrap_from_env`] turns it into the
//! credentials file the Earth Engine client discovers at
//! `~/.config/earthengine/credentials`.

pub mod credentials;
pub mod error;
pub mod token;

pub use credentials::{
    bootstrap, bootstrap_from_env, default_credentials_path, write_credentials, Credentials,
};
pub use error::{AuthError, Result};
pub use token::{EarthEngineToken, EnvToken, StaticToken, TokenSource, TOKEN_VAR};
