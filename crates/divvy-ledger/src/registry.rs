// crates/divvy-ledger/src/registry.rs
//
// In-memory reference share ledger.
//
// Every mutation follows the same three steps:
//   1. validate (balances, supply overflow) without writing
//   2. notify the hook once per affected holder with pre/post balances
//   3. commit the new balances and supply
// A transfer notifies the sender first, then the recipient, against the same
// dividend state. If the recipient notification fails the sender's
// notification is reversed before the error is returned.

use std::collections::HashMap;

use divvy_core::error::DivvyError;
use divvy_core::{BalanceChange, BalanceChangeHook, HolderId, ShareLedger};

/// Balances and total supply for one share class.
#[derive(Debug, Clone, Default)]
pub struct ShareRegistry {
    balances: HashMap<HolderId, u64>,
    /// Holders in the order they first received shares.
    order: Vec<HolderId>,
    total_supply: u64,
}

impl ShareRegistry {
    /// Create an empty registry with zero supply.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue `amount` new shares to `to`.
    ///
    /// # Errors
    /// - `DivvyError::ArithmeticOverflow` if the balance or supply overflows.
    /// - Any error returned by the hook; nothing is committed in that case.
    pub fn mint<H: BalanceChangeHook + ?Sized>(
        &mut self,
        to: &HolderId,
        amount: u64,
        hook: &mut H,
    ) -> Result<(), DivvyError> {
        if amount == 0 {
            return Ok(());
        }
        let old_balance = self.balance_of(to);
        let new_balance = old_balance
            .checked_add(amount)
            .ok_or_else(|| DivvyError::overflow("holder balance"))?;
        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| DivvyError::overflow("total supply"))?;

        hook.on_balance_change(&BalanceChange {
            holder: *to,
            old_balance,
            new_balance,
            old_supply: self.total_supply,
            new_supply,
        })?;

        self.set_balance(to, new_balance);
        self.total_supply = new_supply;
        tracing::debug!(holder = %to.short(), amount, new_supply, "Shares minted");
        Ok(())
    }

    /// Destroy `amount` of `from`'s shares.
    ///
    /// # Errors
    /// - `DivvyError::InsufficientShares` if `from` holds fewer than `amount`.
    /// - Any error returned by the hook; nothing is committed in that case.
    pub fn burn<H: BalanceChangeHook + ?Sized>(
        &mut self,
        from: &HolderId,
        amount: u64,
        hook: &mut H,
    ) -> Result<(), DivvyError> {
        let old_balance = self.require_balance(from, amount)?;
        if amount == 0 {
            return Ok(());
        }
        let new_balance = old_balance - amount;
        let new_supply = self.total_supply - amount;

        hook.on_balance_change(&BalanceChange {
            holder: *from,
            old_balance,
            new_balance,
            old_supply: self.total_supply,
            new_supply,
        })?;

        self.set_balance(from, new_balance);
        self.total_supply = new_supply;
        tracing::debug!(holder = %from.short(), amount, new_supply, "Shares burned");
        Ok(())
    }

    /// Move `amount` shares from `from` to `to`.
    ///
    /// Zero amounts and self-transfers change nothing (the sender's balance
    /// is still checked).
    ///
    /// # Errors
    /// - `DivvyError::InsufficientShares` if `from` holds fewer than `amount`.
    /// - `DivvyError::ArithmeticOverflow` if the recipient balance overflows.
    /// - Any error returned by the hook; nothing is committed in that case.
    pub fn transfer<H: BalanceChangeHook + ?Sized>(
        &mut self,
        from: &HolderId,
        to: &HolderId,
        amount: u64,
        hook: &mut H,
    ) -> Result<(), DivvyError> {
        let from_old = self.require_balance(from, amount)?;
        if amount == 0 || from == to {
            return Ok(());
        }
        let from_new = from_old - amount;
        let to_old = self.balance_of(to);
        let to_new = to_old
            .checked_add(amount)
            .ok_or_else(|| DivvyError::overflow("holder balance"))?;
        let supply = self.total_supply;

        let sender = BalanceChange {
            holder: *from,
            old_balance: from_old,
            new_balance: from_new,
            old_supply: supply,
            new_supply: supply,
        };
        let recipient = BalanceChange {
            holder: *to,
            old_balance: to_old,
            new_balance: to_new,
            old_supply: supply,
            new_supply: supply,
        };

        hook.on_balance_change(&sender)?;
        if let Err(e) = hook.on_balance_change(&recipient) {
            let reverse = BalanceChange {
                old_balance: from_new,
                new_balance: from_old,
                ..sender
            };
            hook.on_balance_change(&reverse)?;
            return Err(e);
        }

        self.set_balance(from, from_new);
        self.set_balance(to, to_new);
        tracing::debug!(
            from = %from.short(),
            to = %to.short(),
            amount,
            "Shares transferred"
        );
        Ok(())
    }

    /// Holders in first-seen order, including those now at zero.
    pub fn holders(&self) -> &[HolderId] {
        &self.order
    }

    fn require_balance(&self, holder: &HolderId, amount: u64) -> Result<u64, DivvyError> {
        let balance = self.balance_of(holder);
        if balance < amount {
            return Err(DivvyError::InsufficientShares {
                holder: *holder,
                balance,
                requested: amount,
            });
        }
        Ok(balance)
    }

    fn set_balance(&mut self, holder: &HolderId, balance: u64) {
        if self.balances.insert(*holder, balance).is_none() {
            self.order.push(*holder);
        }
    }
}

impl ShareLedger for ShareRegistry {
    fn balance_of(&self, holder: &HolderId) -> u64 {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    fn total_supply(&self) -> u64 {
        self.total_supply
    }
}
