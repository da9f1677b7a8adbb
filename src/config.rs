//! Tool-chain configuration.
//!
//! Settings are read from a TOML file with three sections. Every field has
//! a default, so an empty file (or no file at all) gives a working setup:
//!
//! ```toml
//! [general]
//! log_level = "info"
//!
//! [scheduler]
//! max_ii = 1000
//! parallel_search = true
//!
//! [simulator]
//! max_cycles = 100000
//! trace_cycles = false
//! ```

use serde::Deserialize;

use crate::common::Result;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_MAX_II: usize = 1000;
const DEFAULT_MAX_CYCLES: u64 = 100_000;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub simulator: SimulatorConfig,
}

impl Config {
    /// Parses a configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    /// Default `env_logger` filter; `RUST_LOG` overrides it.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Largest initiation interval the modulo scheduler tries.
    #[serde(default = "default_max_ii")]
    pub max_ii: usize,

    /// Evaluate a window of candidate IIs on the rayon thread pool.
    #[serde(default = "default_parallel_search")]
    pub parallel_search: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_ii: default_max_ii(),
            parallel_search: default_parallel_search(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulatorConfig {
    /// Cycle bound after which a run is reported as diverging.
    #[serde(default = "default_max_cycles")]
    pub max_cycles: u64,

    /// Log every executed cycle at trace level.
    #[serde(default = "default_trace_cycles")]
    pub trace_cycles: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            max_cycles: default_max_cycles(),
            trace_cycles: default_trace_cycles(),
        }
    }
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_max_ii() -> usize {
    DEFAULT_MAX_II
}

fn default_parallel_search() -> bool {
    true
}

fn default_max_cycles() -> u64 {
    DEFAULT_MAX_CYCLES
}

fn default_trace_cycles() -> bool {
    cfg!(feature = "always-trace")
}
