//! Image capability interface
//!
//! The index helpers never touch pixels themselves; they talk to an image
//! through [`ImageHandle`]. [`crate::graph::LazyImage`] records the calls as
//! an expression graph for the remote platform, [`crate::raster::RasterImage`]
//! evaluates them in memory.

use serde::Serialize;
use std::collections::BTreeMap;

use gishn_core::Result;

/// A resolved formula parameter: a constant or a band of the image.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue<B> {
    Constant(f64),
    Band(B),
}

impl<B> ParamValue<B> {
    pub fn as_constant(&self) -> Option<f64> {
        match self {
            ParamValue::Constant(v) => Some(*v),
            ParamValue::Band(_) => None,
        }
    }

    pub fn as_band(&self) -> Option<&B> {
        match self {
            ParamValue::Band(b) => Some(b),
            ParamValue::Constant(_) => None,
        }
    }
}

/// Parameter name → resolved value, one entry per formula parameter.
pub type IndexParams<B> = BTreeMap<String, ParamValue<B>>;

/// Narrow view of an image on the imagery platform.
pub trait ImageHandle: Sized {
    /// Reference to a single band (or band expression) of the image.
    type Band: Clone;

    /// Select a band by its platform code.
    fn select(&self, band: &str) -> Result<Self::Band>;

    /// Evaluate an arithmetic formula whose identifiers are bound by `params`.
    fn expression(&self, formula: &str, params: &IndexParams<Self::Band>) -> Result<Self::Band>;

    /// Return the image with `band` added under `name`.
    fn with_band(self, name: &str, band: Self::Band) -> Result<Self>;
}

/// One or more spectral index names.
///
/// A single name is treated as a one-element selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSelection(Vec<String>);

impl IndexSelection {
    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl From<&str> for IndexSelection {
    fn from(name: &str) -> Self {
        Self(vec![name.to_string()])
    }
}

impl From<String> for IndexSelection {
    fn from(name: String) -> Self {
        Self(vec![name])
    }
}

impl From<&[&str]> for IndexSelection {
    fn from(names: &[&str]) -> Self {
        Self(names.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for IndexSelection {
    fn from(names: [&str; N]) -> Self {
        Self(names.iter().map(|s| s.to_string()).collect())
    }
}

impl From<&[String]> for IndexSelection {
    fn from(names: &[String]) -> Self {
        Self(names.to_vec())
    }
}

impl From<Vec<String>> for IndexSelection {
    fn from(names: Vec<String>) -> Self {
        Self(names)
    }
}

impl From<&IndexSelection> for IndexSelection {
    fn from(sel: &IndexSelection) -> Self {
        sel.clone()
    }
}
