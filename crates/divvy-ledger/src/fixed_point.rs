// crates/divvy-ledger/src/fixed_point.rs
//
// Fixed-point helpers for the dividend accumulator.
//
// Dividend-per-share is tracked as an integer scaled by a decimal magnitude
// M = 10^exponent (default 10^38, roughly 2^126). A decimal magnitude keeps the
// per-share increment exact whenever the supply divides a power of ten, which
// covers the round supplies share ledgers are usually issued with.
//
// The magnitude is never smaller than 10^20, which exceeds u64::MAX and so any
// possible supply. Truncating one deposit's increment therefore loses less
// than one value unit in total, whatever the supply.
//
// Amounts and balances are u64, so every scaled quantity is carried in a
// 256-bit word:
//   - one deposit's increment is amount * M / supply < 2^64 * 10^38 < 2^192
//   - a holder's magnified entitlement is sum_i(increment_i * balance_i),
//     which is bounded by total_deposited * M < 2^192
//
// Per-holder corrections are signed. They are stored as two's complement
// 256-bit words and combined with wrapping arithmetic; because the corrected
// entitlement is provably in [0, 2^192), the wrapped result is exact.

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use divvy_core::error::DivvyError;

/// Default magnitude exponent: M = 10^38.
pub const DEFAULT_MAGNITUDE_EXPONENT: u32 = 38;

/// Smallest accepted magnitude exponent. 10^20 > u64::MAX >= any supply, so
/// the per-deposit truncation loss, at most supply / M, stays below one unit.
pub const MIN_MAGNITUDE_EXPONENT: u32 = 20;

/// Largest accepted magnitude exponent. Keeps a single deposit's increment
/// below 2^192.
pub const MAX_MAGNITUDE_EXPONENT: u32 = 38;

/// The fixed-point scaling constant, stored as its power-of-ten exponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Magnitude {
    exponent: u32,
}

impl Magnitude {
    /// Create a magnitude of 10^exponent.
    ///
    /// # Errors
    /// Returns `DivvyError::InvalidConfig` if `exponent` is outside
    /// `MIN_MAGNITUDE_EXPONENT..=MAX_MAGNITUDE_EXPONENT`.
    pub fn new(exponent: u32) -> Result<Self, DivvyError> {
        if !(MIN_MAGNITUDE_EXPONENT..=MAX_MAGNITUDE_EXPONENT).contains(&exponent) {
            return Err(DivvyError::InvalidConfig(format!(
                "magnitude_exponent must be within {}..={}, got {}",
                MIN_MAGNITUDE_EXPONENT, MAX_MAGNITUDE_EXPONENT, exponent
            )));
        }
        Ok(Self { exponent })
    }

    pub fn exponent(&self) -> u32 {
        self.exponent
    }

    /// The magnitude as a 256-bit integer.
    pub fn value(&self) -> U256 {
        U256::exp10(self.exponent as usize)
    }

    /// `floor(amount * M / supply)`.
    ///
    /// # Errors
    /// Returns `DivvyError::ZeroSupply` if `supply` is zero.
    pub fn per_share(&self, amount: u64, supply: u64) -> Result<U256, DivvyError> {
        if supply == 0 {
            return Err(DivvyError::ZeroSupply);
        }
        let scaled = U256::from(amount) * self.value();
        Ok(scaled / U256::from(supply))
    }

    /// `floor(magnified / M)`, narrowed to u64.
    ///
    /// # Errors
    /// Returns `DivvyError::InvariantViolation` if the value does not fit a
    /// u64. Every legitimate entitlement is bounded by total deposits, so a
    /// wider value means a correction has gone wrong.
    pub fn descale(&self, magnified: U256) -> Result<u64, DivvyError> {
        let whole = magnified / self.value();
        if whole > U256::from(u64::MAX) {
            return Err(DivvyError::InvariantViolation(format!(
                "descaled entitlement {} exceeds u64 range",
                whole
            )));
        }
        Ok(whole.low_u64())
    }
}

impl Default for Magnitude {
    fn default() -> Self {
        Self {
            exponent: DEFAULT_MAGNITUDE_EXPONENT,
        }
    }
}

/// A holder's signed dividend correction, in magnified units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction(U256);

impl Correction {
    /// Subtract `magnified` (a balance increase was observed).
    pub fn debit(self, magnified: U256) -> Self {
        Self(self.0.overflowing_sub(magnified).0)
    }

    /// Add `magnified` (a balance decrease was observed).
    pub fn credit(self, magnified: U256) -> Self {
        Self(self.0.overflowing_add(magnified).0)
    }

    /// Apply the correction to an uncorrected magnified entitlement.
    pub fn apply(self, base: U256) -> U256 {
        base.overflowing_add(self.0).0
    }

}

/// Multiply a magnified per-share value by a share count modulo 2^256.
///
/// Only used where the caller combines the product with a `Correction` and the
/// combined value is known to fit.
pub fn wrapping_scale(per_share: U256, shares: u64) -> U256 {
    per_share.overflowing_mul(U256::from(shares)).0
}
