// crates/divvy-core/src/traits.rs

use crate::error::DivvyError;
use crate::holder::{BalanceChange, HolderId};

/// Read-only view of a share ledger.
///
/// The dividend engine only ever queries balances; storage, authorization,
/// and supply changes belong to the implementor.
pub trait ShareLedger {
    /// Current share balance of `holder`. Unknown holders have zero.
    fn balance_of(&self, holder: &HolderId) -> u64;

    /// Total shares outstanding.
    fn total_supply(&self) -> u64;
}

/// Notification a share ledger must deliver before committing any balance
/// delta (transfer, mint, burn).
///
/// Implemented by the dividend instrument. The ledger calls it once per
/// affected holder, with pre-change and post-change balances, inside the same
/// atomic step as the mutation. If the hook fails the ledger must not commit.
pub trait BalanceChangeHook {
    fn on_balance_change(&mut self, change: &BalanceChange) -> Result<(), DivvyError>;
}

/// External value transfer used to pay out a withdrawal.
///
/// A withdrawal is only recorded after `pay` succeeds.
pub trait PayoutSink {
    fn pay(&mut self, holder: &HolderId, amount: u64) -> Result<(), DivvyError>;
}
