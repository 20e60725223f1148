//! # gishn imagery
//!
//! Spectral index helpers for Earth Engine style workflows:
//! - Parameter resolution: index → constants and platform bands
//! - Index metadata lookup and computation
//! - Sentinel-2 cloud masking, Landsat 8 scale factors
//! - `LazyImage`: expression graph for the platform
//! - `RasterImage`: local evaluation on in-memory bands

pub mod compute;
pub mod formula;
pub mod graph;
pub mod image;
pub mod info;
pub mod masking;
pub mod raster;
pub mod resolver;
pub mod scaling;

mod maybe_rayon;

pub use compute::{compute_index, spectral_indices};
pub use formula::{BoundFormula, Formula};
pub use graph::{CollectionExpr, DateExpr, ImageExpr, LazyCollection, LazyImage};
pub use image::{ImageHandle, IndexParams, IndexSelection, ParamValue};
pub use info::{index_info, IndexInfo};
pub use masking::{mask_s2_clouds, mask_s2_clouds_raster};
pub use raster::RasterImage;
pub use resolver::{resolve_params, ParamResolver};
pub use scaling::{apply_scale_factors_l8, apply_scale_factors_l8_raster};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        compute_index, index_info, resolve_params, spectral_indices, ImageHandle, IndexParams,
        LazyImage, ParamResolver, ParamValue, RasterImage,
    };
    pub use gishn_core::prelude::*;
}
