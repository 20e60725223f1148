//! In-memory multi-band image
//!
//! [`RasterImage`] implements [`ImageHandle`] by evaluating formulas locally,
//! one row per task. Bands are `f64` grids of identical shape; NaN marks
//! masked or missing pixels.

use ndarray::{Array2, Zip};
use regex::Regex;

use gishn_core::{Error, Result};

use crate::formula::Formula;
use crate::image::{ImageHandle, IndexParams, ParamValue};
use crate::maybe_rayon::*;

/// Named bands sharing one grid shape, in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    rows: usize,
    cols: usize,
    bands: Vec<(String, Array2<f64>)>,
}

impl RasterImage {
    /// An image with no bands yet.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            bands: Vec::new(),
        }
    }

    /// Build an image from `(name, data)` pairs; the first band fixes the shape.
    pub fn from_bands<I, S>(bands: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Array2<f64>)>,
        S: Into<String>,
    {
        let mut iter = bands.into_iter().peekable();
        let (rows, cols) = match iter.peek() {
            Some((_, data)) => data.dim(),
            None => (0, 0),
        };
        let mut image = Self::new(rows, cols);
        for (name, data) in iter {
            image.insert_band(name, data)?;
        }
        Ok(image)
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn band_names(&self) -> Vec<&str> {
        self.bands.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn band(&self, name: &str) -> Option<&Array2<f64>> {
        self.bands.iter().find(|(n, _)| n == name).map(|(_, d)| d)
    }

    /// Insert a band, replacing any band of the same name.
    pub fn insert_band(&mut self, name: impl Into<String>, data: Array2<f64>) -> Result<()> {
        let (r, c) = data.dim();
        if r != self.rows || c != self.cols {
            return Err(Error::SizeMismatch {
                er: self.rows,
                ec: self.cols,
                ar: r,
                ac: c,
            });
        }
        let name = name.into();
        match self.bands.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = data,
            None => self.bands.push((name, data)),
        }
        Ok(())
    }

    /// Names of bands fully matching the regular expression `pattern`.
    pub fn bands_matching(&self, pattern: &str) -> Result<Vec<String>> {
        let re = Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| {
            Error::InvalidParameter {
                name: "pattern",
                value: pattern.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(self
            .bands
            .iter()
            .filter(|(n, _)| re.is_match(n))
            .map(|(n, _)| n.clone())
            .collect())
    }

    /// Apply `f` to every non-NaN pixel of the named band in place.
    pub fn map_band<F>(&mut self, name: &str, f: F) -> Result<()>
    where
        F: Fn(f64) -> f64,
    {
        let data = self
            .bands
            .iter_mut()
            .find(|(n, _)| n.as_str() == name)
            .map(|(_, d)| d)
            .ok_or_else(|| Error::MissingBand(name.to_string()))?;
        data.mapv_inplace(|v| if v.is_nan() { v } else { f(v) });
        Ok(())
    }

    /// Set every band to NaN where `keep` is false.
    pub fn update_mask(&mut self, keep: &Array2<bool>) -> Result<()> {
        let (r, c) = keep.dim();
        if r != self.rows || c != self.cols {
            return Err(Error::SizeMismatch {
                er: self.rows,
                ec: self.cols,
                ar: r,
                ac: c,
            });
        }
        for (_, data) in self.bands.iter_mut() {
            Zip::from(data).and(keep).for_each(|v, &k| {
                if !k {
                    *v = f64::NAN;
                }
            });
        }
        Ok(())
    }
}

/// A formula input at evaluation time
enum Input<'a> {
    Constant(f64),
    Band(&'a Array2<f64>),
}

impl ImageHandle for RasterImage {
    type Band = Array2<f64>;

    fn select(&self, band: &str) -> Result<Array2<f64>> {
        self.band(band)
            .cloned()
            .ok_or_else(|| Error::MissingBand(band.to_string()))
    }

    fn expression(&self, formula: &str, params: &IndexParams<Array2<f64>>) -> Result<Array2<f64>> {
        let parsed = Formula::parse(formula)?;
        let names = parsed.identifiers().to_vec();
        let bound = parsed.bind(&names)?;

        let inputs: Vec<Input<'_>> = names
            .iter()
            .map(|name| match params.get(name) {
                Some(ParamValue::Constant(c)) => Ok(Input::Constant(*c)),
                Some(ParamValue::Band(data)) => {
                    let (r, c) = data.dim();
                    if r != self.rows || c != self.cols {
                        return Err(Error::SizeMismatch {
                            er: self.rows,
                            ec: self.cols,
                            ar: r,
                            ac: c,
                        });
                    }
                    Ok(Input::Band(data))
                }
                None => Err(Error::Formula(format!("no value for '{}'", name))),
            })
            .collect::<Result<_>>()?;

        let (rows, cols) = (self.rows, self.cols);
        let data: Vec<f64> = (0..rows)
            .into_par_iter()
            .flat_map(|row| {
                let mut row_data = vec![f64::NAN; cols];
                let mut values = vec![0.0; inputs.len()];

                for (col, out) in row_data.iter_mut().enumerate() {
                    let mut any_nan = false;
                    for (slot, input) in inputs.iter().enumerate() {
                        let v = match input {
                            Input::Constant(c) => *c,
                            Input::Band(data) => data[[row, col]],
                        };
                        if v.is_nan() {
                            any_nan = true;
                            break;
                        }
                        values[slot] = v;
                    }

                    if any_nan {
                        continue;
                    }

                    *out = bound.eval(&values);
                }

                row_data
            })
            .collect();

        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))
    }

    fn with_band(mut self, name: &str, band: Array2<f64>) -> Result<Self> {
        self.insert_band(name, band)?;
        Ok(self)
    }
}
