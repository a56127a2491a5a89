// crates/divvy-cli/src/config.rs
//
// Runtime configuration for the Divvy CLI.
// Loaded from a TOML file or populated with sensible defaults.

use serde::{Deserialize, Serialize};
use std::fs;

use divvy_ledger::InstrumentConfig;

/// Initial share allocation for one named holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderAllocation {
    pub name: String,
    pub shares: u64,
}

/// Runtime configuration for the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    /// `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Dividend instrument settings (`[instrument]` table).
    #[serde(default)]
    pub instrument: InstrumentConfig,

    /// Shares minted before a replay starts (`[[holders]]` tables).
    #[serde(default)]
    pub holders: Vec<HolderAllocation>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            instrument: InstrumentConfig::default(),
            holders: Vec::new(),
        }
    }
}

impl CliConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        let config: CliConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Render the resolved configuration as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
