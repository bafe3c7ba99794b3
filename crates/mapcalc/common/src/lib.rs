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

//! Shared building blocks for the mapcalc workspace
//!
//! - `image`: the image capability the compiler and runtime address pixels through
//! - `raster`: an in-memory image implementation
//! - `math`: the numeric kernel behind script operators and catalog functions
//! - `error`: image access errors

pub mod error;
pub mod image;
pub mod math;
pub mod raster;

pub use error::{ImageError, ImageResult};
pub use image::{Bounds, Image, SharedImage, SharedWritableImage, WritableImage};
pub use raster::Raster;
