// crates/divvy-ledger/src/config.rs
//
// Instrument configuration, fixed at creation time.

use serde::{Deserialize, Serialize};

use divvy_core::error::DivvyError;

use crate::fixed_point::{Magnitude, DEFAULT_MAGNITUDE_EXPONENT};

/// Settings for a dividend instrument.
///
/// The deposit minimum and the pool release threshold are independent: the
/// minimum applies to every individual deposit, including contributions into
/// the pool, and the threshold only applies when pooling is enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentConfig {
    /// Smallest accepted deposit, in value units.
    #[serde(default)]
    pub minimum_deposit: u64,

    /// When set, deposits are pooled until the pool reaches this amount.
    #[serde(default)]
    pub release_threshold: Option<u64>,

    /// Fixed-point magnitude exponent: M = 10^magnitude_exponent.
    #[serde(default = "default_magnitude_exponent")]
    pub magnitude_exponent: u32,
}

fn default_magnitude_exponent() -> u32 {
    DEFAULT_MAGNITUDE_EXPONENT
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            minimum_deposit: 0,
            release_threshold: None,
            magnitude_exponent: default_magnitude_exponent(),
        }
    }
}

impl InstrumentConfig {
    /// Immediate distribution with a deposit minimum.
    pub fn standard(minimum_deposit: u64) -> Self {
        Self {
            minimum_deposit,
            ..Self::default()
        }
    }

    /// Pooled distribution releasing at `release_threshold`.
    pub fn pooled(release_threshold: u64) -> Self {
        Self {
            release_threshold: Some(release_threshold),
            ..Self::default()
        }
    }

    /// Check the settings and return the magnitude they describe.
    ///
    /// # Errors
    /// Returns `DivvyError::InvalidConfig` for an out-of-range magnitude or a
    /// zero release threshold.
    pub fn validate(&self) -> Result<Magnitude, DivvyError> {
        if self.release_threshold == Some(0) {
            return Err(DivvyError::InvalidConfig(
                "release_threshold must be greater than zero".to_string(),
            ));
        }
        Magnitude::new(self.magnitude_exponent)
    }
}
