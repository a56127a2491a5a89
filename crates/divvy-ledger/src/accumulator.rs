// crates/divvy-ledger/src/accumulator.rs
//
// The dividend accumulator.
//
// A single running "magnified dividend per share" value encodes the effect of
// every deposit on every holder at once. Each holder additionally carries a
// signed correction that is adjusted whenever their balance changes, so that
//
//   accumulated(h) = floor((per_share * balance(h) + correction(h)) / M)
//
// equals the sum over all deposits of amount * balance_at_deposit /
// supply_at_deposit, truncated. Deposits never touch per-holder state.

use std::collections::HashMap;

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use divvy_core::error::DivvyError;
use divvy_core::HolderId;

use crate::fixed_point::{wrapping_scale, Correction, Magnitude};

/// Outcome of a single recorded deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedDeposit {
    /// Amount distributed.
    pub amount: u64,
    /// Supply the amount was apportioned over.
    pub total_supply: u64,
    /// Increase of the magnified per-share value.
    pub per_share_increment: U256,
}

/// Supply-wide dividend state plus one correction per holder.
#[derive(Debug, Clone)]
pub struct DividendAccumulator {
    magnitude: Magnitude,
    magnified_dividend_per_share: U256,
    total_deposited: u64,
    deposit_count: u64,
    corrections: HashMap<HolderId, Correction>,
}

impl DividendAccumulator {
    /// Create an empty accumulator with the given fixed-point magnitude.
    pub fn new(magnitude: Magnitude) -> Self {
        Self {
            magnitude,
            magnified_dividend_per_share: U256::zero(),
            total_deposited: 0,
            deposit_count: 0,
            corrections: HashMap::new(),
        }
    }

    /// Distribute `amount` over `total_supply` shares.
    ///
    /// All checks run before any field is written.
    ///
    /// # Errors
    /// - `DivvyError::ZeroSupply` if `total_supply` is zero.
    /// - `DivvyError::ArithmeticOverflow` if the per-share value or the
    ///   deposit total would leave its representable range.
    pub fn record_deposit(
        &mut self,
        amount: u64,
        total_supply: u64,
    ) -> Result<RecordedDeposit, DivvyError> {
        let increment = self.magnitude.per_share(amount, total_supply)?;
        let per_share = self
            .magnified_dividend_per_share
            .checked_add(increment)
            .ok_or_else(|| DivvyError::overflow("magnified dividend per share"))?;
        let total_deposited = self
            .total_deposited
            .checked_add(amount)
            .ok_or_else(|| DivvyError::overflow("total deposited"))?;

        self.magnified_dividend_per_share = per_share;
        self.total_deposited = total_deposited;
        self.deposit_count = self.deposit_count.saturating_add(1);

        tracing::debug!(
            amount,
            total_supply,
            deposit_count = self.deposit_count,
            "Accumulator recorded deposit"
        );

        Ok(RecordedDeposit {
            amount,
            total_supply,
            per_share_increment: increment,
        })
    }

    /// Adjust `holder`'s correction for a balance change from `old_balance`
    /// to `new_balance`, against the current per-share value.
    ///
    /// Must be called before the new balance becomes visible to
    /// `accumulated_of`.
    pub fn adjust_for_balance_change(
        &mut self,
        holder: &HolderId,
        old_balance: u64,
        new_balance: u64,
    ) {
        let entry = self.corrections.entry(*holder).or_default();
        if old_balance == new_balance {
            return;
        }

        let delta = old_balance.abs_diff(new_balance);
        let magnified = wrapping_scale(self.magnified_dividend_per_share, delta);
        *entry = if new_balance > old_balance {
            entry.debit(magnified)
        } else {
            entry.credit(magnified)
        };

        tracing::debug!(
            holder = %holder.short(),
            old_balance,
            new_balance,
            "Dividend correction adjusted"
        );
    }

    /// Total dividend ever earned by `holder` holding `balance` now,
    /// independent of withdrawals.
    ///
    /// # Errors
    /// Returns `DivvyError::InvariantViolation` if the corrected value is
    /// negative or wider than u64, which no valid call sequence produces.
    pub fn accumulated_of(&self, holder: &HolderId, balance: u64) -> Result<u64, DivvyError> {
        let correction = self.correction(holder);
        let base = wrapping_scale(self.magnified_dividend_per_share, balance);
        let corrected = correction.apply(base);
        if corrected.bit(255) {
            return Err(DivvyError::InvariantViolation(format!(
                "negative accumulated dividend for holder {}",
                holder
            )));
        }
        self.magnitude.descale(corrected)
    }

    /// Current correction for `holder` (zero if never touched).
    pub fn correction(&self, holder: &HolderId) -> Correction {
        self.corrections.get(holder).copied().unwrap_or_default()
    }

    /// Holders with a correction record.
    pub fn holders(&self) -> impl Iterator<Item = &HolderId> {
        self.corrections.keys()
    }

    pub fn magnitude(&self) -> Magnitude {
        self.magnitude
    }

    pub fn magnified_dividend_per_share(&self) -> U256 {
        self.magnified_dividend_per_share
    }

    pub fn total_deposited(&self) -> u64 {
        self.total_deposited
    }

    /// Number of deposits recorded, each of which may leave rounding dust.
    pub fn deposit_count(&self) -> u64 {
        self.deposit_count
    }
}

impl Default for DividendAccumulator {
    fn default() -> Self {
        Self::new(Magnitude::default())
    }
}
