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

//! Program section generators

pub mod body;
pub mod init;
pub mod traits;
pub mod variables;

pub use body::BodyGenerator;
pub use init::{ImageInitGenerator, OptionInitGenerator};
pub use traits::SectionGenerator;
pub use variables::{AccessorGenerator, DeclarationsGenerator, DefaultsGenerator};

/// One generator per section kind
pub fn standard_generators() -> Vec<Box<dyn SectionGenerator>> {
    vec![
        Box::new(DeclarationsGenerator),
        Box::new(DefaultsGenerator),
        Box::new(ImageInitGenerator),
        Box::new(BodyGenerator),
        Box::new(AccessorGenerator),
        Box::new(OptionInitGenerator),
    ]
}
