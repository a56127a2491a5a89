// crates/divvy-ledger/src/pool.rs
//
// Pooled distribution policy.
//
// Deposits are withheld in a pending pool. As soon as the pool reaches the
// release threshold the whole pool (not just the excess) is released to the
// accumulator as one deposit and the pool resets to zero:
//
//   Accumulating (pending < threshold) --deposit crossing threshold--> Released
//   Released --reset--> Accumulating
//
// Staging and committing are split so the caller can record the released
// deposit first and only reset the pool once that succeeded.

use serde::{Deserialize, Serialize};

use divvy_core::error::DivvyError;

/// What a contribution does to the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolStage {
    /// Still below the threshold; the pool will hold `pending`.
    Hold { pending: u64 },
    /// Threshold reached; `amount` (the entire pool) is to be distributed.
    Release { amount: u64 },
}

/// Pending-pool counter with an immutable release threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolGate {
    pending_pool: u64,
    release_threshold: u64,
}

impl PoolGate {
    /// Create an empty pool.
    ///
    /// # Errors
    /// Returns `DivvyError::InvalidConfig` if `release_threshold` is zero.
    pub fn new(release_threshold: u64) -> Result<Self, DivvyError> {
        if release_threshold == 0 {
            return Err(DivvyError::InvalidConfig(
                "release_threshold must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            pending_pool: 0,
            release_threshold,
        })
    }

    /// Work out what contributing `amount` would do, without changing state.
    ///
    /// # Errors
    /// Returns `DivvyError::ArithmeticOverflow` if the pool would overflow.
    pub fn stage(&self, amount: u64) -> Result<PoolStage, DivvyError> {
        let pending = self
            .pending_pool
            .checked_add(amount)
            .ok_or_else(|| DivvyError::overflow("pending pool"))?;
        if pending >= self.release_threshold {
            Ok(PoolStage::Release { amount: pending })
        } else {
            Ok(PoolStage::Hold { pending })
        }
    }

    /// Apply a stage previously returned by [`PoolGate::stage`].
    pub fn commit(&mut self, stage: PoolStage) {
        match stage {
            PoolStage::Hold { pending } => {
                self.pending_pool = pending;
            }
            PoolStage::Release { amount } => {
                tracing::debug!(amount, threshold = self.release_threshold, "Pool released");
                self.pending_pool = 0;
            }
        }
    }

    /// Amount withheld and not yet distributed.
    pub fn pending(&self) -> u64 {
        self.pending_pool
    }
}
