//! Spectral index computation
//!
//! Each requested index is evaluated from its catalog formula and added to
//! the image as a band named after the index.

use gishn_core::{Catalogs, Result};

use crate::image::{ImageHandle, IndexParams, IndexSelection};
use crate::resolver::ParamResolver;

/// Add one band per index in `indices`, evaluated with `params`.
pub fn compute_index<I: ImageHandle>(
    catalogs: &Catalogs,
    image: I,
    indices: impl Into<IndexSelection>,
    params: &IndexParams<I::Band>,
) -> Result<I> {
    let indices: IndexSelection = indices.into();
    let mut image = image;
    for name in indices.iter() {
        let formula = &catalogs.index(name)?.formula;
        let band = image.expression(formula, params)?;
        image = image.with_band(name, band)?;
    }
    Ok(image)
}

/// Resolve parameters for `indices` and compute them in one step.
pub fn spectral_indices<I: ImageHandle>(
    resolver: &ParamResolver<'_>,
    image: I,
    indices: impl Into<IndexSelection>,
) -> Result<I> {
    let indices: IndexSelection = indices.into();
    let params = resolver.resolve(&indices, &image)?;
    compute_index(resolver.catalogs(), image, &indices, &params)
}
