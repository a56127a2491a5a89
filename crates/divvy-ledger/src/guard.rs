// crates/divvy-ledger/src/guard.rs
//
// Deposit admission checks. Runs before the pool or the accumulator sees the
// deposit, so a rejected deposit never mutates anything.

use divvy_core::error::DivvyError;

/// Validate a deposit against the configured minimum and the current supply.
///
/// # Errors
/// - `DivvyError::BelowMinimum` if `amount < minimum_deposit`.
/// - `DivvyError::ZeroSupply` if `total_supply` is zero.
pub fn validate(amount: u64, total_supply: u64, minimum_deposit: u64) -> Result<(), DivvyError> {
    if amount < minimum_deposit {
        return Err(DivvyError::BelowMinimum {
            amount,
            minimum: minimum_deposit,
        });
    }
    if total_supply == 0 {
        return Err(DivvyError::ZeroSupply);
    }
    Ok(())
}

/// Deposit admission policy with a fixed minimum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DepositGuard {
    minimum_deposit: u64,
}

impl DepositGuard {
    pub fn new(minimum_deposit: u64) -> Self {
        Self { minimum_deposit }
    }

    /// See [`validate`].
    pub fn check(&self, amount: u64, total_supply: u64) -> Result<(), DivvyError> {
        validate(amount, total_supply, self.minimum_deposit)
    }
}
