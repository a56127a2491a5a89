// crates/divvy-ledger/src/withdrawal.rs
//
// Per-holder record of dividends already paid out.
//
// withdrawable(h) = accumulated(h) - withdrawn(h). The accumulator owns the
// first term, this tracker owns the second.

use std::collections::HashMap;

use divvy_core::error::DivvyError;
use divvy_core::HolderId;

/// Tracks how much each holder has already withdrawn.
#[derive(Debug, Clone, Default)]
pub struct WithdrawalTracker {
    withdrawn: HashMap<HolderId, u64>,
    total_withdrawn: u64,
}

impl WithdrawalTracker {
    /// Create a tracker with no withdrawals.
    pub fn new() -> Self {
        Self::default()
    }

    /// Amount `holder` has withdrawn so far.
    pub fn withdrawn_by(&self, holder: &HolderId) -> u64 {
        self.withdrawn.get(holder).copied().unwrap_or(0)
    }

    /// Amount `holder` may still withdraw given their `accumulated` dividend.
    ///
    /// # Errors
    /// Returns `DivvyError::InvariantViolation` if more has been withdrawn
    /// than was ever earned.
    pub fn withdrawable(&self, holder: &HolderId, accumulated: u64) -> Result<u64, DivvyError> {
        let withdrawn = self.withdrawn_by(holder);
        accumulated.checked_sub(withdrawn).ok_or_else(|| {
            DivvyError::InvariantViolation(format!(
                "holder {} withdrew {} but only accumulated {}",
                holder, withdrawn, accumulated
            ))
        })
    }

    /// Record a completed payout of `amount` to `holder`.
    ///
    /// # Errors
    /// Returns `DivvyError::ArithmeticOverflow` if either running total would
    /// overflow; nothing is written in that case.
    pub fn record_withdrawal(&mut self, holder: &HolderId, amount: u64) -> Result<(), DivvyError> {
        let holder_total = self
            .withdrawn_by(holder)
            .checked_add(amount)
            .ok_or_else(|| DivvyError::overflow("holder withdrawn total"))?;
        let total = self
            .total_withdrawn
            .checked_add(amount)
            .ok_or_else(|| DivvyError::overflow("total withdrawn"))?;

        self.withdrawn.insert(*holder, holder_total);
        self.total_withdrawn = total;
        Ok(())
    }

    /// Ensure a (zero) withdrawal record exists for `holder`.
    pub fn touch(&mut self, holder: &HolderId) {
        self.withdrawn.entry(*holder).or_insert(0);
    }

    /// Sum of all payouts.
    pub fn total_withdrawn(&self) -> u64 {
        self.total_withdrawn
    }
}
