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

//! The image capability
//!
//! The compiler never touches pixel storage directly. Everything it needs from
//! an image is the surface below: its bounds, its band count, and per-sample
//! reads (plus writes for destination images).

use crate::error::ImageResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Pixel rectangle covered by an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bounds {
    /// Minimum X ordinate (inclusive)
    pub min_x: i64,
    /// Minimum Y ordinate (inclusive)
    pub min_y: i64,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Bounds {
    /// Create bounds from an origin and a size
    pub fn new(min_x: i64, min_y: i64, width: u32, height: u32) -> Self {
        Self { min_x, min_y, width, height }
    }

    /// Bounds with the origin at (0, 0)
    pub fn sized(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Maximum X ordinate (inclusive)
    pub fn max_x(&self) -> i64 {
        self.min_x + self.width as i64 - 1
    }

    /// Maximum Y ordinate (inclusive)
    pub fn max_y(&self) -> i64 {
        self.min_y + self.height as i64 - 1
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Check whether a pixel lies inside these bounds
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= self.min_x && y >= self.min_y && x <= self.max_x() && y <= self.max_y()
    }

    /// Number of pixels covered
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Row-major offset of a pixel, if it lies inside the bounds
    pub fn offset_of(&self, x: i64, y: i64) -> Option<usize> {
        if !self.contains(x, y) {
            return None;
        }
        let col = (x - self.min_x) as usize;
        let row = (y - self.min_y) as usize;
        Some(row * self.width as usize + col)
    }
}

/// Read access to a multi-band image
pub trait Image: Send + Sync {
    /// Pixel bounds of the image
    fn bounds(&self) -> Bounds;

    /// Number of bands per pixel
    fn band_count(&self) -> usize;

    /// Sample value, or `None` when the pixel or band does not exist
    fn sample(&self, x: i64, y: i64, band: usize) -> Option<f64>;
}

/// Read and write access to a multi-band image
pub trait WritableImage: Image {
    /// Store a sample value
    fn set_sample(&self, x: i64, y: i64, band: usize, value: f64) -> ImageResult<()>;
}

/// Shared handle to a readable image
pub type SharedImage = Arc<dyn Image>;

/// Shared handle to a writable image
pub type SharedWritableImage = Arc<dyn WritableImage>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_extent() {
        let bounds = Bounds::new(-2, 3, 4, 5);
        assert_eq!(bounds.max_x(), 1);
        assert_eq!(bounds.max_y(), 7);
        assert_eq!(bounds.pixel_count(), 20);
        assert!(bounds.contains(-2, 3));
        assert!(bounds.contains(1, 7));
        assert!(!bounds.contains(2, 7));
        assert!(!bounds.contains(-3, 3));
    }

    #[test]
    fn test_offset_is_row_major() {
        let bounds = Bounds::new(10, 20, 3, 2);
        assert_eq!(bounds.offset_of(10, 20), Some(0));
        assert_eq!(bounds.offset_of(12, 20), Some(2));
        assert_eq!(bounds.offset_of(10, 21), Some(3));
        assert_eq!(bounds.offset_of(13, 21), None);
    }

    #[test]
    fn test_empty_bounds() {
        assert!(Bounds::sized(0, 10).is_empty());
        assert!(!Bounds::sized(1, 1).is_empty());
    }
}
