//! Landsat 8 Collection 2 Level-2 scale factors
//!
//! Surface reflectance: `DN * 0.0000275 - 0.2`
//! Surface temperature (K): `DN * 0.00341802 + 149.0`

use gishn_core::Result;

use crate::graph::LazyImage;
use crate::raster::RasterImage;

/// Optical surface-reflectance bands (`SR_B1` .. `SR_B7`).
pub const L8_OPTICAL_PATTERN: &str = "SR_B.";
/// Thermal surface-temperature bands (`ST_B10`, ...).
pub const L8_THERMAL_PATTERN: &str = "ST_B.*";

pub const L8_OPTICAL_SCALE: f64 = 0.0000275;
pub const L8_OPTICAL_OFFSET: f64 = -0.2;
pub const L8_THERMAL_SCALE: f64 = 0.00341802;
pub const L8_THERMAL_OFFSET: f64 = 149.0;

/// Rescale optical and thermal bands on the platform, replacing the originals.
pub fn apply_scale_factors_l8(img: &LazyImage) -> LazyImage {
    let optical = img
        .select_bands(&[L8_OPTICAL_PATTERN])
        .multiply(L8_OPTICAL_SCALE)
        .add_scalar(L8_OPTICAL_OFFSET);
    let thermal = img
        .select_bands(&[L8_THERMAL_PATTERN])
        .multiply(L8_THERMAL_SCALE)
        .add_scalar(L8_THERMAL_OFFSET);
    img.clone()
        .add_bands(optical, true)
        .add_bands(thermal, true)
}

/// Rescale optical and thermal bands of an in-memory image.
///
/// Band names are matched in full against the same patterns the platform
/// uses; other bands are left untouched.
pub fn apply_scale_factors_l8_raster(img: &RasterImage) -> Result<RasterImage> {
    let mut out = img.clone();
    for name in img.bands_matching(L8_OPTICAL_PATTERN)? {
        out.map_band(&name, |v| v * L8_OPTICAL_SCALE + L8_OPTICAL_OFFSET)?;
    }
    for name in img.bands_matching(L8_THERMAL_PATTERN)? {
        out.map_band(&name, |v| v * L8_THERMAL_SCALE + L8_THERMAL_OFFSET)?;
    }
    Ok(out)
}
