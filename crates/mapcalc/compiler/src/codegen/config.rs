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

//! Configuration for compilation

use super::ir::EvaluationModel;
use serde::{Deserialize, Serialize};

/// Configuration for compiling scripts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Evaluation model of generated programs
    pub model: EvaluationModel,

    /// Whether to fold constant subexpressions
    pub enable_constant_folding: bool,

    /// Deepest loop nesting a script may use
    pub max_loop_nesting: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            model: EvaluationModel::Direct,
            enable_constant_folding: true,
            max_loop_nesting: 64,
        }
    }
}

impl CompilerConfig {
    /// Create a configuration for the given evaluation model
    pub fn for_model(model: EvaluationModel) -> Self {
        Self { model, ..Default::default() }
    }

    /// Configuration that keeps the program exactly as written
    pub fn debug() -> Self {
        Self {
            enable_constant_folding: false,
            ..Default::default()
        }
    }

    /// Load a configuration from JSON; missing fields take their defaults
    pub fn from_json(text: &str) -> Result<Self, String> {
        let config: Self = serde_json::from_str(text).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_loop_nesting == 0 {
            return Err("Maximum loop nesting must be greater than 0".to_string());
        }
        Ok(())
    }
}
