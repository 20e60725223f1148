//! Index parameter resolution
//!
//! Maps the parameters a set of spectral indices needs to either a constant
//! default (constants catalog) or a band of the image (bands catalog, looked
//! up under one platform key).

use std::collections::BTreeSet;
use tracing::debug;

use gishn_core::{Catalogs, Error, Result, DEFAULT_PLATFORM};

use crate::image::{ImageHandle, IndexParams, IndexSelection, ParamValue};

/// Resolves index parameters against a set of catalogs for one platform.
#[derive(Debug, Clone)]
pub struct ParamResolver<'a> {
    catalogs: &'a Catalogs,
    platform: String,
}

impl<'a> ParamResolver<'a> {
    /// Resolver for the default platform (`sentinel2a`).
    pub fn new(catalogs: &'a Catalogs) -> Self {
        Self {
            catalogs,
            platform: DEFAULT_PLATFORM.to_string(),
        }
    }

    /// Use band codes of another platform, e.g. `landsat8`.
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }

    /// Catalogs this resolver reads from.
    pub fn catalogs(&self) -> &'a Catalogs {
        self.catalogs
    }

    /// Union of the parameters of every requested index, deduplicated.
    pub fn required_params(&self, indices: impl Into<IndexSelection>) -> Result<BTreeSet<String>> {
        let indices: IndexSelection = indices.into();
        let mut params = BTreeSet::new();
        for name in indices.iter() {
            params.extend(self.catalogs.index(name)?.bands.iter().cloned());
        }
        Ok(params)
    }

    /// Resolve every parameter of `indices` against `image`.
    ///
    /// Constants take their catalog default; bands become a selection of the
    /// platform band code on `image`. A parameter present in both catalogs
    /// resolves as a constant. Fails without a partial result if any
    /// parameter is in neither catalog.
    pub fn resolve<I: ImageHandle>(
        &self,
        indices: impl Into<IndexSelection>,
        image: &I,
    ) -> Result<IndexParams<I::Band>> {
        let params = self.required_params(indices)?;

        let mut resolved = IndexParams::new();
        for param in params {
            let value = if let Some(constant) = self.catalogs.constants.get(&param) {
                ParamValue::Constant(constant.default)
            } else if let Some(band) = self.catalogs.bands.get(&param) {
                let code = band
                    .code(&self.platform)
                    .ok_or_else(|| Error::MissingPlatformBand {
                        band: param.clone(),
                        platform: self.platform.clone(),
                    })?;
                ParamValue::Band(image.select(code)?)
            } else {
                return Err(Error::UnknownParameter(param));
            };
            resolved.insert(param, value);
        }

        debug!(
            "Resolved {} parameters for platform {}",
            resolved.len(),
            self.platform
        );
        Ok(resolved)
    }
}

/// Resolve the parameters of `indices` for Sentinel-2A band codes.
pub fn resolve_params<I: ImageHandle>(
    catalogs: &Catalogs,
    indices: impl Into<IndexSelection>,
    image: &I,
) -> Result<IndexParams<I::Band>> {
    ParamResolver::new(catalogs).resolve(indices, image)
}
