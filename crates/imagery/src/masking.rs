//! Sentinel-2 cloud and shadow masking
//!
//! A pixel is kept when all of the following hold:
//! - its Scene Classification Layer class is not cloud shadow (3), cloud
//!   medium probability (8), cloud high probability (9) or thin cirrus (10);
//! - QA60 bit 10 (opaque clouds) and bit 11 (cirrus) are clear;
//! - when a cloud-probability image exists for the scene, its
//!   `probability` band is below 20.

use ndarray::{Array2, Zip};

use gishn_core::{Error, Result};

use crate::graph::{LazyCollection, LazyImage};
use crate::raster::RasterImage;

/// Scene Classification Layer band.
pub const SCL_BAND: &str = "SCL";
/// Cloud bitmask band.
pub const QA60_BAND: &str = "QA60";
/// Band of the cloud-probability images.
pub const PROBABILITY_BAND: &str = "probability";
/// Collection holding per-scene cloud probability.
pub const CLOUD_PROBABILITY_COLLECTION: &str = "COPERNICUS/S2_CLOUD_PROBABILITY";

/// SCL classes removed by the mask.
pub const SCL_MASKED_CLASSES: [u8; 4] = [3, 8, 9, 10];
/// QA60 bit 10: opaque clouds.
pub const QA60_OPAQUE_CLOUD: i64 = 1 << 10;
/// QA60 bit 11: cirrus.
pub const QA60_CIRRUS: i64 = 1 << 11;
/// Pixels at or above this cloud probability (percent) are masked.
pub const CLOUD_PROBABILITY_THRESHOLD: f64 = 20.0;

/// Cloud-probability images covering `img` and acquired within one day of it.
pub fn cloud_probability_collection(img: &LazyImage) -> LazyCollection {
    LazyCollection::load(CLOUD_PROBABILITY_COLLECTION)
        .filter_bounds(img)
        .filter_date(img.date(), img.date().advance(1.0, "day"))
}

/// Mask clouds, shadows and cirrus of a Sentinel-2 image on the platform.
///
/// Uses the cloud-probability collection when it has an image for the
/// scene, and only SCL + QA60 otherwise.
pub fn mask_s2_clouds(img: &LazyImage) -> LazyImage {
    let cloud_prob = cloud_probability_collection(img);

    let scl = img.select_bands(&[SCL_BAND]);
    let [first, rest @ ..] = SCL_MASKED_CLASSES;
    let scl_mask = rest.iter().fold(scl.not_equals(first as f64), |mask, &class| {
        mask.and(scl.not_equals(class as f64))
    });

    let qa = img.select_bands(&[QA60_BAND]);
    let qa_mask = qa
        .bitwise_and(QA60_OPAQUE_CLOUD)
        .equals(0.0)
        .and(qa.bitwise_and(QA60_CIRRUS).equals(0.0));

    let base = scl_mask.and(qa_mask);
    let prob_mask = cloud_prob
        .first()
        .select_bands(&[PROBABILITY_BAND])
        .less_than(CLOUD_PROBABILITY_THRESHOLD);
    let combined = cloud_prob.if_not_empty(base.clone().and(prob_mask), base);

    img.clone().update_mask(combined)
}

fn scl_keep(class: f64) -> bool {
    !class.is_nan() && !SCL_MASKED_CLASSES.iter().any(|&c| class == c as f64)
}

fn qa60_keep(qa: f64) -> bool {
    if qa.is_nan() {
        return false;
    }
    let bits = qa as i64;
    bits & QA60_OPAQUE_CLOUD == 0 && bits & QA60_CIRRUS == 0
}

/// Mask clouds of an in-memory Sentinel-2 image.
///
/// Every band is set to NaN at masked pixels. `cloud_probability`, when
/// given, must match the image shape. Pixels whose SCL, QA60 or probability
/// value is NaN are masked.
pub fn mask_s2_clouds_raster(
    img: &RasterImage,
    cloud_probability: Option<&Array2<f64>>,
) -> Result<RasterImage> {
    let scl = img
        .band(SCL_BAND)
        .ok_or_else(|| Error::MissingBand(SCL_BAND.to_string()))?;
    let qa = img
        .band(QA60_BAND)
        .ok_or_else(|| Error::MissingBand(QA60_BAND.to_string()))?;

    let mut keep = Array2::from_elem(img.shape(), false);
    Zip::from(&mut keep)
        .and(scl)
        .and(qa)
        .for_each(|k, &s, &q| *k = scl_keep(s) && qa60_keep(q));

    if let Some(prob) = cloud_probability {
        let (rows, cols) = img.shape();
        let (r, c) = prob.dim();
        if r != rows || c != cols {
            return Err(Error::SizeMismatch {
                er: rows,
                ec: cols,
                ar: r,
                ac: c,
            });
        }
        Zip::from(&mut keep)
            .and(prob)
            .for_each(|k, &p| *k = *k && p < CLOUD_PROBABILITY_THRESHOLD);
    }

    let mut out = img.clone();
    out.update_mask(&keep)?;
    Ok(out)
}
