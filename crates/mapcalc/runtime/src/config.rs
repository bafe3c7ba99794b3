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

//! Runtime and executor configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration of one runtime instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Seed of the instance's random stream; `None` seeds from entropy
    pub random_seed: Option<u64>,
}

impl RuntimeConfig {
    /// Configuration with a reproducible random stream
    pub fn seeded(seed: u64) -> Self {
        Self { random_seed: Some(seed) }
    }
}

/// Configuration of a [`JobExecutor`](crate::JobExecutor)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Worker threads running jobs; 0 lets the pool pick one per core
    pub worker_threads: usize,

    /// Interval of the completion polling loop in milliseconds
    pub polling_interval_ms: u64,

    /// Interval of the drain check during graceful shutdown in milliseconds
    pub drain_check_interval_ms: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            worker_threads: 0,
            polling_interval_ms: 20,
            drain_check_interval_ms: 50,
        }
    }
}

impl ExecutorConfig {
    /// Configuration with a fixed number of worker threads
    pub fn with_workers(worker_threads: usize) -> Self {
        Self {
            worker_threads,
            ..Default::default()
        }
    }

    pub fn polling_interval(&self) -> Duration {
        Duration::from_millis(self.polling_interval_ms)
    }

    pub fn drain_check_interval(&self) -> Duration {
        Duration::from_millis(self.drain_check_interval_ms)
    }

    /// Load a configuration from JSON; missing fields take their defaults
    pub fn from_json(text: &str) -> Result<Self, String> {
        let config: Self = serde_json::from_str(text).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.polling_interval_ms == 0 {
            return Err("Polling interval must be greater than 0".to_string());
        }
        if self.drain_check_interval_ms == 0 {
            return Err("Drain check interval must be greater than 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ExecutorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.polling_interval(), Duration::from_millis(20));
    }

    #[test]
    fn test_from_json() {
        let config = ExecutorConfig::from_json(r#"{ "worker_threads": 2 }"#).unwrap();
        assert_eq!(config.worker_threads, 2);
        assert_eq!(config.drain_check_interval_ms, 50);
        assert!(ExecutorConfig::from_json(r#"{ "polling_interval_ms": 0 }"#).is_err());
    }

    #[test]
    fn test_runtime_config_seed() {
        let config: RuntimeConfig = serde_json::from_str(r#"{ "random_seed": 7 }"#).unwrap();
        assert_eq!(config, RuntimeConfig::seeded(7));
        assert_eq!(RuntimeConfig::default().random_seed, None);
    }
}
