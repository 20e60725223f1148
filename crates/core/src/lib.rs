//! # gishn core
//!
//! Core types for the gishn spectral-index helpers.
//!
//! This crate provides:
//! - `Error` / `Result`: the shared error type
//! - `Catalogs`: the spectral index, constant and band catalogs

pub mod catalog;
pub mod error;

pub use catalog::{BandRecord, Catalogs, ConstantRecord, IndexRecord, PlatformBand};
pub use error::{Error, Result};

/// Platform key used when none is given: Sentinel-2A.
pub const DEFAULT_PLATFORM: &str = "sentinel2a";

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::catalog::Catalogs;
    pub use crate::error::{Error, Result};
    pub use crate::DEFAULT_PLATFORM;
}
