//! Lazy image expression graph.
//!
//! [`LazyImage`] records every operation as a node of a serializable graph
//! instead of computing anything. The resulting JSON is what an Earth Engine
//! client submits for server-side evaluation.

use serde::Serialize;
use std::collections::BTreeMap;

use gishn_core::{Error, Result};

use crate::formula::Formula;
use crate::image::{ImageHandle, IndexParams, ParamValue};

/// Pixel-wise comparison against a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Eq,
    Neq,
    Lt,
    Gt,
}

/// A node producing an image.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ImageExpr {
    Load {
        asset_id: String,
    },
    /// Select bands by name or regular expression.
    Select {
        input: Box<ImageExpr>,
        bands: Vec<String>,
    },
    Expression {
        input: Box<ImageExpr>,
        formula: String,
        params: BTreeMap<String, ParamValue<ImageExpr>>,
    },
    Rename {
        input: Box<ImageExpr>,
        name: String,
    },
    AddBands {
        input: Box<ImageExpr>,
        bands: Box<ImageExpr>,
        overwrite: bool,
    },
    Compare {
        input: Box<ImageExpr>,
        comparison: Comparison,
        value: f64,
    },
    And {
        left: Box<ImageExpr>,
        right: Box<ImageExpr>,
    },
    BitwiseAnd {
        input: Box<ImageExpr>,
        value: i64,
    },
    Multiply {
        input: Box<ImageExpr>,
        value: f64,
    },
    Add {
        input: Box<ImageExpr>,
        value: f64,
    },
    UpdateMask {
        input: Box<ImageExpr>,
        mask: Box<ImageExpr>,
    },
    /// First image of a collection.
    First {
        collection: Box<CollectionExpr>,
    },
    /// `then` if `collection` has at least one image, else `otherwise`.
    IfNotEmpty {
        collection: Box<CollectionExpr>,
        then: Box<ImageExpr>,
        otherwise: Box<ImageExpr>,
    },
}

/// A node producing an image collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CollectionExpr {
    Load {
        collection_id: String,
    },
    /// Keep images intersecting the footprint of `geometry_of`.
    FilterBounds {
        input: Box<CollectionExpr>,
        geometry_of: Box<ImageExpr>,
    },
    /// Keep images acquired in `[start, end)`.
    FilterDate {
        input: Box<CollectionExpr>,
        start: DateExpr,
        end: DateExpr,
    },
}

/// A node producing a date.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DateExpr {
    /// Acquisition date of an image.
    ImageDate { image: Box<ImageExpr> },
    Advance {
        date: Box<DateExpr>,
        delta: f64,
        unit: String,
    },
}

impl DateExpr {
    pub fn advance(&self, delta: f64, unit: &str) -> DateExpr {
        DateExpr::Advance {
            date: Box::new(self.clone()),
            delta,
            unit: unit.to_string(),
        }
    }
}

/// A collection on the platform, built up lazily.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LazyCollection(CollectionExpr);

impl LazyCollection {
    pub fn load(collection_id: &str) -> Self {
        Self(CollectionExpr::Load {
            collection_id: collection_id.to_string(),
        })
    }

    pub fn filter_bounds(self, image: &LazyImage) -> Self {
        Self(CollectionExpr::FilterBounds {
            input: Box::new(self.0),
            geometry_of: Box::new(image.0.clone()),
        })
    }

    pub fn filter_date(self, start: DateExpr, end: DateExpr) -> Self {
        Self(CollectionExpr::FilterDate {
            input: Box::new(self.0),
            start,
            end,
        })
    }

    pub fn first(&self) -> LazyImage {
        LazyImage(ImageExpr::First {
            collection: Box::new(self.0.clone()),
        })
    }

    /// `then` when this collection is not empty, `otherwise` when it is.
    pub fn if_not_empty(&self, then: LazyImage, otherwise: LazyImage) -> LazyImage {
        LazyImage(ImageExpr::IfNotEmpty {
            collection: Box::new(self.0.clone()),
            then: Box::new(then.0),
            otherwise: Box::new(otherwise.0),
        })
    }

    pub fn expr(&self) -> &CollectionExpr {
        &self.0
    }
}

/// An image on the platform, built up lazily.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LazyImage(ImageExpr);

impl LazyImage {
    /// Reference an image asset by id.
    pub fn load(asset_id: &str) -> Self {
        Self(ImageExpr::Load {
            asset_id: asset_id.to_string(),
        })
    }

    pub fn expr(&self) -> &ImageExpr {
        &self.0
    }

    pub fn into_expr(self) -> ImageExpr {
        self.0
    }

    /// Graph as JSON.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    fn wrap(self, f: impl FnOnce(Box<ImageExpr>) -> ImageExpr) -> Self {
        Self(f(Box::new(self.0)))
    }

    /// Select bands by name or regular expression.
    pub fn select_bands(&self, bands: &[&str]) -> Self {
        self.clone().wrap(|input| ImageExpr::Select {
            input,
            bands: bands.iter().map(|b| b.to_string()).collect(),
        })
    }

    pub fn rename(self, name: &str) -> Self {
        self.wrap(|input| ImageExpr::Rename {
            input,
            name: name.to_string(),
        })
    }

    pub fn add_bands(self, bands: LazyImage, overwrite: bool) -> Self {
        self.wrap(|input| ImageExpr::AddBands {
            input,
            bands: Box::new(bands.0),
            overwrite,
        })
    }

    fn compare(&self, comparison: Comparison, value: f64) -> Self {
        self.clone().wrap(|input| ImageExpr::Compare {
            input,
            comparison,
            value,
        })
    }

    pub fn equals(&self, value: f64) -> Self {
        self.compare(Comparison::Eq, value)
    }

    pub fn not_equals(&self, value: f64) -> Self {
        self.compare(Comparison::Neq, value)
    }

    pub fn less_than(&self, value: f64) -> Self {
        self.compare(Comparison::Lt, value)
    }

    pub fn greater_than(&self, value: f64) -> Self {
        self.compare(Comparison::Gt, value)
    }

    pub fn and(self, other: LazyImage) -> Self {
        self.wrap(|left| ImageExpr::And {
            left,
            right: Box::new(other.0),
        })
    }

    pub fn bitwise_and(&self, value: i64) -> Self {
        self.clone()
            .wrap(|input| ImageExpr::BitwiseAnd { input, value })
    }

    pub fn multiply(self, value: f64) -> Self {
        self.wrap(|input| ImageExpr::Multiply { input, value })
    }

    pub fn add_scalar(self, value: f64) -> Self {
        self.wrap(|input| ImageExpr::Add { input, value })
    }

    pub fn update_mask(self, mask: LazyImage) -> Self {
        self.wrap(|input| ImageExpr::UpdateMask {
            input,
            mask: Box::new(mask.0),
        })
    }

    /// Acquisition date of this image.
    pub fn date(&self) -> DateExpr {
        DateExpr::ImageDate {
            image: Box::new(self.0.clone()),
        }
    }
}

impl ImageHandle for LazyImage {
    type Band = LazyImage;

    fn select(&self, band: &str) -> Result<LazyImage> {
        Ok(self.select_bands(&[band]))
    }

    fn expression(&self, formula: &str, params: &IndexParams<LazyImage>) -> Result<LazyImage> {
        let parsed = Formula::parse(formula)?;
        if let Some(unbound) = parsed.identifiers().iter().find(|id| !params.contains_key(*id)) {
            return Err(Error::Formula(format!("no value for '{}'", unbound)));
        }

        let params = params
            .iter()
            .map(|(name, value)| {
                let value = match value {
                    ParamValue::Constant(c) => ParamValue::Constant(*c),
                    ParamValue::Band(b) => ParamValue::Band(b.0.clone()),
                };
                (name.clone(), value)
            })
            .collect();

        Ok(Self(ImageExpr::Expression {
            input: Box::new(self.0.clone()),
            formula: formula.to_string(),
            params,
        }))
    }

    fn with_band(self, name: &str, band: LazyImage) -> Result<Self> {
        Ok(self.add_bands(band.rename(name), false))
    }
}
