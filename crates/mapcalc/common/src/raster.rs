// Mapcalc
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! In-memory raster
//!
//! Samples are stored as `f64`, band-interleaved in row-major order. Writes go
//! through a lock so the same raster can be shared between a running job and
//! the code that inspects it afterwards.

use crate::error::{ImageError, ImageResult};
use crate::image::{Bounds, Image, WritableImage};
use parking_lot::RwLock;
use std::fmt;

/// Multi-band in-memory image
pub struct Raster {
    bounds: Bounds,
    bands: usize,
    samples: RwLock<Vec<f64>>,
}

impl Raster {
    /// Create a raster with every sample set to `value`
    pub fn filled(bounds: Bounds, bands: usize, value: f64) -> ImageResult<Self> {
        if bands == 0 {
            return Err(ImageError::InvalidGeometry("a raster needs at least one band".into()));
        }
        let len = bounds.pixel_count() as usize * bands;
        Ok(Self {
            bounds,
            bands,
            samples: RwLock::new(vec![value; len]),
        })
    }

    /// Create a zero-filled raster
    pub fn new(bounds: Bounds, bands: usize) -> ImageResult<Self> {
        Self::filled(bounds, bands, 0.0)
    }

    /// Create a raster whose samples are computed from their coordinates
    pub fn from_fn<F>(bounds: Bounds, bands: usize, mut f: F) -> ImageResult<Self>
    where
        F: FnMut(i64, i64, usize) -> f64,
    {
        let raster = Self::new(bounds, bands)?;
        {
            let mut samples = raster.samples.write();
            for y in bounds.min_y..=bounds.max_y() {
                for x in bounds.min_x..=bounds.max_x() {
                    let base = raster.index(x, y, 0).ok_or(ImageError::OutOfBounds { x, y })?;
                    for band in 0..bands {
                        samples[base + band] = f(x, y, band);
                    }
                }
            }
        }
        Ok(raster)
    }

    fn index(&self, x: i64, y: i64, band: usize) -> Option<usize> {
        if band >= self.bands {
            return None;
        }
        self.bounds.offset_of(x, y).map(|pixel| pixel * self.bands + band)
    }

    /// Copy of every sample of one band in row-major order
    pub fn band_values(&self, band: usize) -> Vec<f64> {
        let samples = self.samples.read();
        samples.iter().skip(band).step_by(self.bands).copied().collect()
    }
}

impl Image for Raster {
    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn band_count(&self) -> usize {
        self.bands
    }

    fn sample(&self, x: i64, y: i64, band: usize) -> Option<f64> {
        let index = self.index(x, y, band)?;
        Some(self.samples.read()[index])
    }
}

impl WritableImage for Raster {
    fn set_sample(&self, x: i64, y: i64, band: usize, value: f64) -> ImageResult<()> {
        if band >= self.bands {
            return Err(ImageError::BandOutOfRange { band, bands: self.bands });
        }
        let index = self.index(x, y, band).ok_or(ImageError::OutOfBounds { x, y })?;
        self.samples.write()[index] = value;
        Ok(())
    }
}

impl fmt::Debug for Raster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Raster").field("bounds", &self.bounds).field("bands", &self.bands).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fn_populates_every_band() {
        let raster = Raster::from_fn(Bounds::new(1, 1, 2, 2), 2, |x, y, b| (x * 10 + y) as f64 + b as f64 * 100.0).unwrap();
        assert_eq!(raster.sample(1, 1, 0), Some(11.0));
        assert_eq!(raster.sample(2, 2, 0), Some(22.0));
        assert_eq!(raster.sample(2, 1, 1), Some(121.0));
        assert_eq!(raster.sample(0, 0, 0), None);
        assert_eq!(raster.sample(1, 1, 2), None);
    }

    #[test]
    fn test_write_outside_is_rejected() {
        let raster = Raster::new(Bounds::sized(2, 2), 1).unwrap();
        assert_eq!(raster.set_sample(2, 0, 0, 1.0), Err(ImageError::OutOfBounds { x: 2, y: 0 }));
        assert_eq!(raster.set_sample(0, 0, 1, 1.0), Err(ImageError::BandOutOfRange { band: 1, bands: 1 }));
        raster.set_sample(1, 1, 0, 7.5).unwrap();
        assert_eq!(raster.band_values(0), vec![0.0, 0.0, 0.0, 7.5]);
    }

    #[test]
    fn test_zero_bands_rejected() {
        assert!(Raster::new(Bounds::sized(1, 1), 0).is_err());
    }
}
