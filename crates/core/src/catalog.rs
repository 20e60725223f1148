//! Spectral catalogs: indices, constants and bands.
//!
//! Three JSON documents describe everything the index helpers know:
//!
//! - `spectral_indices.json`: `{"spectral_indices": {NAME: {formula, bands, ...}}}`
//! - `spectral_constants.json`: `{NAME: {default, ...}}`
//! - `spectral_bands.json`: `{NAME: {platforms: {PLATFORM: {band, ...}}, ...}}`
//!
//! They are loaded once into a [`Catalogs`] value and passed by reference.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};

/// File name of the index catalog inside a catalog directory.
pub const INDICES_FILE: &str = "spectral_indices.json";
/// File name of the constants catalog inside a catalog directory.
pub const CONSTANTS_FILE: &str = "spectral_constants.json";
/// File name of the bands catalog inside a catalog directory.
pub const BANDS_FILE: &str = "spectral_bands.json";

const BUNDLED_INDICES: &str = include_str!("../data/spectral_indices.json");
const BUNDLED_CONSTANTS: &str = include_str!("../data/spectral_constants.json");
const BUNDLED_BANDS: &str = include_str!("../data/spectral_bands.json");

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A spectral index: a formula over named parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub formula: String,

    /// Parameter names the formula references, in catalog order.
    pub bands: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_domain: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributor: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_addition: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub platforms: Vec<String>,

    /// Fields this model does not know about, kept verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,

    /// The catalog entry as read, including empty and `null` fields.
    #[serde(skip)]
    raw: Map<String, Value>,
}

impl IndexRecord {
    /// Parse a catalog entry, keeping its JSON object for property lookup.
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        let mut record: IndexRecord = serde_json::from_value(value.clone())?;
        if let Value::Object(map) = value {
            record.raw = map;
        }
        Ok(record)
    }

    /// Look up a property by its catalog field name.
    ///
    /// Returns the value exactly as stored in the catalog, so a field present
    /// as `[]` or `null` is found; only absent fields yield `None`.
    pub fn property(&self, name: &str) -> Option<Value> {
        if !self.raw.is_empty() {
            return self.raw.get(name).cloned();
        }
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map.get(name).cloned(),
            _ => None,
        }
    }
}

/// A spectral constant with its default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantRecord {
    pub default: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// The platform-specific identity of a spectral band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformBand {
    /// Band code on the platform, e.g. `B8`.
    pub band: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A spectral band and its codes across platforms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandRecord {
    pub platforms: BTreeMap<String, PlatformBand>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_name: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl BandRecord {
    /// Band code on `platform`, if the band exists there.
    pub fn code(&self, platform: &str) -> Option<&str> {
        self.platforms.get(platform).map(|p| p.band.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct IndexDocument {
    spectral_indices: BTreeMap<String, Value>,
}

impl IndexDocument {
    fn into_records(self) -> serde_json::Result<BTreeMap<String, IndexRecord>> {
        self.spectral_indices
            .into_iter()
            .map(|(name, value)| Ok((name, IndexRecord::from_value(value)?)))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Catalogs
// ---------------------------------------------------------------------------

/// The three read-only catalogs, loaded together.
#[derive(Debug, Clone, Default)]
pub struct Catalogs {
    pub indices: BTreeMap<String, IndexRecord>,
    pub constants: BTreeMap<String, ConstantRecord>,
    pub bands: BTreeMap<String, BandRecord>,
}

impl Catalogs {
    /// Parse catalogs from the contents of the three JSON documents.
    pub fn from_json_strs(indices: &str, constants: &str, bands: &str) -> Result<Self> {
        let doc: IndexDocument = serde_json::from_str(indices)?;
        Ok(Self {
            indices: doc.into_records()?,
            constants: serde_json::from_str(constants)?,
            bands: serde_json::from_str(bands)?,
        })
    }

    /// Load the three catalog files from `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let indices_path = dir.join(INDICES_FILE);
        let doc: IndexDocument = read_json(&indices_path)?;
        let indices = doc
            .into_records()
            .map_err(|source| Error::CatalogParse {
                path: indices_path,
                source,
            })?;
        let catalogs = Self {
            indices,
            constants: read_json(&dir.join(CONSTANTS_FILE))?,
            bands: read_json(&dir.join(BANDS_FILE))?,
        };
        debug!(
            "Loaded {} indices, {} constants, {} bands from {}",
            catalogs.indices.len(),
            catalogs.constants.len(),
            catalogs.bands.len(),
            dir.display()
        );
        Ok(catalogs)
    }

    /// Catalogs compiled into the crate.
    pub fn bundled() -> Result<Self> {
        Self::from_json_strs(BUNDLED_INDICES, BUNDLED_CONSTANTS, BUNDLED_BANDS)
    }

    /// Look up an index record.
    pub fn index(&self, name: &str) -> Result<&IndexRecord> {
        self.indices
            .get(name)
            .ok_or_else(|| Error::UnknownIndex(name.to_string()))
    }

    /// Parameters referenced by an index that are neither constants nor bands,
    /// grouped by index. Empty when the catalogs are consistent.
    pub fn dangling_parameters(&self) -> BTreeMap<String, Vec<String>> {
        self.indices
            .iter()
            .filter_map(|(name, record)| {
                let missing: Vec<String> = record
                    .bands
                    .iter()
                    .filter(|p| {
                        !self.constants.contains_key(p.as_str())
                            && !self.bands.contains_key(p.as_str())
                    })
                    .cloned()
                    .collect();
                (!missing.is_empty()).then(|| (name.clone(), missing))
            })
            .collect()
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).map_err(|source| Error::CatalogRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| Error::CatalogParse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_catalogs_load() {
        let c = Catalogs::bundled().unwrap();
        let ndvi = c.index("NDVI").unwrap();
        assert_eq!(ndvi.bands, vec!["N", "R"]);
        assert!(c.constants.contains_key("L"));
        assert_eq!(c.bands["N"].code("sentinel2a"), Some("B8"));
    }

    #[test]
    fn test_bundled_catalogs_are_consistent() {
        let c = Catalogs::bundled().unwrap();
        assert!(
            c.dangling_parameters().is_empty(),
            "dangling: {:?}",
            c.dangling_parameters()
        );
    }

    #[test]
    fn test_unknown_index() {
        let c = Catalogs::bundled().unwrap();
        assert!(matches!(c.index("NOPE"), Err(Error::UnknownIndex(n)) if n == "NOPE"));
    }

    #[test]
    fn test_property_lookup_includes_extra_fields() {
        let c = Catalogs::from_json_strs(
            r#"{"spectral_indices": {"X": {"formula": "A", "bands": ["A"], "custom": 3}}}"#,
            "{}",
            "{}",
        )
        .unwrap();
        let x = c.index("X").unwrap();
        assert_eq!(x.property("formula"), Some(Value::from("A")));
        assert_eq!(x.property("custom"), Some(Value::from(3)));
        assert_eq!(x.property("long_name"), None);
    }

    #[test]
    fn test_property_lookup_keeps_empty_and_null_fields() {
        let c = Catalogs::from_json_strs(
            r#"{"spectral_indices": {"X": {"formula": "A", "bands": ["A"],
                "platforms": [], "reference": null}}}"#,
            "{}",
            "{}",
        )
        .unwrap();
        let x = c.index("X").unwrap();
        assert_eq!(x.property("platforms"), Some(serde_json::json!([])));
        assert_eq!(x.property("reference"), Some(Value::Null));
        assert_eq!(x.property("contributor"), None);
    }

    #[test]
    fn test_dangling_parameters_reported() {
        let c = Catalogs::from_json_strs(
            r#"{"spectral_indices": {"X": {"formula": "A + Q", "bands": ["A", "Q"]}}}"#,
            r#"{"A": {"default": 1.0}}"#,
            "{}",
        )
        .unwrap();
        let dangling = c.dangling_parameters();
        assert_eq!(dangling.get("X"), Some(&vec!["Q".to_string()]));
    }

    #[test]
    fn test_from_dir_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(INDICES_FILE), BUNDLED_INDICES).unwrap();
        fs::write(dir.path().join(CONSTANTS_FILE), BUNDLED_CONSTANTS).unwrap();
        fs::write(dir.path().join(BANDS_FILE), BUNDLED_BANDS).unwrap();

        let c = Catalogs::from_dir(dir.path()).unwrap();
        assert_eq!(c.indices.len(), Catalogs::bundled().unwrap().indices.len());
    }

    #[test]
    fn test_from_dir_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Catalogs::from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, Error::CatalogRead { .. }));
    }

    #[test]
    fn test_from_dir_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(INDICES_FILE), "{not json").unwrap();
        let err = Catalogs::from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, Error::CatalogParse { .. }));
    }
}
