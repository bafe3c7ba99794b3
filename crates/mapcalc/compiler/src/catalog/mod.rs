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

//! Function, option and constant catalogs
//!
//! Catalogs are built once and shared by reference between the analyzer and
//! the assembler; nothing here is global or mutable after construction.

pub mod constants;
pub mod functions;
pub mod options;

pub use functions::{Arity, FunctionCatalog, FunctionDescriptor, FunctionKind, PositionQuery};
pub use options::{OptionCatalog, OptionDescriptor, OptionLiteral, OptionSetting, OutsidePolicy, ValueDomain};
