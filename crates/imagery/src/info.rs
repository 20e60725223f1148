//! Index metadata lookup

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use gishn_core::{Catalogs, Error, Result};

use crate::image::IndexSelection;

/// Property reported when none are requested.
pub const DEFAULT_PROPERTY: &str = "formula";

/// Requested catalog properties of one index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexInfo {
    pub index: String,
    pub properties: BTreeMap<String, Value>,
}

impl fmt::Display for IndexInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "'{}' info:", self.index)?;
        let map: serde_json::Map<String, Value> = self
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        write!(f, "{}", Value::Object(map))
    }
}

/// Collect `properties` (default: `formula`) of each requested index.
///
/// A missing index or property is an error.
pub fn index_info(
    catalogs: &Catalogs,
    indices: impl Into<IndexSelection>,
    properties: &[&str],
) -> Result<Vec<IndexInfo>> {
    let properties: &[&str] = if properties.is_empty() {
        &[DEFAULT_PROPERTY]
    } else {
        properties
    };

    let indices: IndexSelection = indices.into();
    indices
        .iter()
        .map(|name| {
            let record = catalogs.index(name)?;
            let mut found = BTreeMap::new();
            for &prop in properties {
                let value = record.property(prop).ok_or_else(|| Error::UnknownProperty {
                    index: name.to_string(),
                    property: prop.to_string(),
                })?;
                found.insert(prop.to_string(), value);
            }
            Ok(IndexInfo {
                index: name.to_string(),
                properties: found,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_property_is_formula() {
        let c = Catalogs::bundled().unwrap();
        let info = index_info(&c, "NDVI", &[]).unwrap();
        assert_eq!(info.len(), 1);
        assert_eq!(info[0].properties.len(), 1);
        assert_eq!(info[0].properties["formula"], Value::from("(N - R)/(N + R)"));
    }

    #[test]
    fn test_multiple_indices_and_properties() {
        let c = Catalogs::bundled().unwrap();
        let info = index_info(&c, ["NDVI", "EVI"], &["long_name", "bands"]).unwrap();
        assert_eq!(info[1].index, "EVI");
        assert_eq!(
            info[0].properties["long_name"],
            Value::from("Normalized Difference Vegetation Index")
        );
        assert!(info[1].properties["bands"].is_array());
    }

    #[test]
    fn test_display() {
        let c = Catalogs::bundled().unwrap();
        let info = index_info(&c, "NDVI", &[]).unwrap();
        let text = info[0].to_string();
        assert!(text.starts_with("'NDVI' info:\n"));
        assert!(text.contains("\"formula\":\"(N - R)/(N + R)\""));
    }

    #[test]
    fn test_missing_property() {
        let c = Catalogs::bundled().unwrap();
        let err = index_info(&c, "NDVI", &["colour"]).unwrap_err();
        assert!(matches!(err, Error::UnknownProperty { .. }));
    }

    #[test]
    fn test_empty_and_null_properties_returned_as_stored() {
        let c = Catalogs::from_json_strs(
            r#"{"spectral_indices": {"X": {"formula": "A", "bands": ["A"],
                "platforms": [], "reference": null}}}"#,
            "{}",
            "{}",
        )
        .unwrap();
        let info = index_info(&c, "X", &["platforms", "reference"]).unwrap();
        assert_eq!(info[0].properties["platforms"], serde_json::json!([]));
        assert_eq!(info[0].properties["reference"], Value::Null);
    }

    #[test]
    fn test_missing_index() {
        let c = Catalogs::bundled().unwrap();
        assert!(matches!(
            index_info(&c, "NOPE", &[]),
            Err(Error::UnknownIndex(_))
        ));
    }
}
