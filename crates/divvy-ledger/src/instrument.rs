// crates/divvy-ledger/src/instrument.rs
//
// The dividend instrument: a single owned object holding all dividend state
// for one share class.
//
// Deposit path:     DepositGuard -> [PoolGate] -> DividendAccumulator
// Balance changes:  share ledger -> BalanceChangeHook -> DividendAccumulator
// Withdrawal path:  DividendAccumulator -> WithdrawalTracker -> PayoutSink
//
// Every method either completes or fails before writing anything.

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use divvy_core::error::DivvyError;
use divvy_core::{BalanceChange, BalanceChangeHook, HolderId, PayoutSink, ShareLedger};

use crate::accumulator::DividendAccumulator;
use crate::config::InstrumentConfig;
use crate::events::{EventJournal, LedgerEvent, LedgerEventKind};
use crate::guard::DepositGuard;
use crate::pool::{PoolGate, PoolStage};
use crate::withdrawal::WithdrawalTracker;

/// Result of an accepted deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DepositOutcome {
    /// Distributed immediately over the current supply.
    Distributed { amount: u64, total_supply: u64 },
    /// Withheld in the pool; nobody's entitlement changed yet.
    Withheld { pending: u64 },
    /// This deposit pushed the pool over its threshold and the whole pool
    /// was distributed.
    Released { amount: u64, total_supply: u64 },
}

/// One holder's dividend position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderStatement {
    pub holder: HolderId,
    pub balance: u64,
    /// Total ever earned.
    pub accumulated: u64,
    pub withdrawn: u64,
    /// Still claimable.
    pub withdrawable: u64,
}

/// Instrument-wide liability check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    pub total_deposited: u64,
    pub pending_pool: u64,
    pub total_withdrawn: u64,
    /// Sum of every holder's withdrawable amount.
    pub outstanding: u128,
    /// Deposited value no holder can ever claim.
    pub dust: u128,
    pub deposit_count: u64,
    pub holder_count: u64,
}

/// Aggregate counters, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentSummary {
    pub minimum_deposit: u64,
    pub release_threshold: Option<u64>,
    pub magnitude_exponent: u32,
    pub magnified_dividend_per_share: U256,
    pub total_deposited: u64,
    pub pending_pool: u64,
    pub total_withdrawn: u64,
    pub held_value: u64,
    pub deposit_count: u64,
}

/// Dividend bookkeeping for one share class.
#[derive(Debug, Clone)]
pub struct DividendInstrument {
    config: InstrumentConfig,
    guard: DepositGuard,
    pool: Option<PoolGate>,
    accumulator: DividendAccumulator,
    withdrawals: WithdrawalTracker,
    journal: EventJournal,
}

impl DividendInstrument {
    /// Create an instrument from validated configuration.
    ///
    /// # Errors
    /// Returns `DivvyError::InvalidConfig` if the configuration is rejected.
    pub fn new(config: InstrumentConfig) -> Result<Self, DivvyError> {
        let magnitude = config.validate()?;
        let pool = config.release_threshold.map(PoolGate::new).transpose()?;
        Ok(Self {
            guard: DepositGuard::new(config.minimum_deposit),
            pool,
            accumulator: DividendAccumulator::new(magnitude),
            withdrawals: WithdrawalTracker::new(),
            journal: EventJournal::new(),
            config,
        })
    }

    /// Accept a deposit of `amount` from `depositor`.
    ///
    /// The deposit is validated against the minimum and the ledger's current
    /// supply, then either distributed or pooled.
    ///
    /// # Errors
    /// - `DivvyError::BelowMinimum` / `DivvyError::ZeroSupply` from the guard.
    /// - `DivvyError::ArithmeticOverflow` if a running total would overflow.
    ///
    /// No state is changed on error.
    pub fn deposit<L: ShareLedger + ?Sized>(
        &mut self,
        depositor: &HolderId,
        amount: u64,
        ledger: &L,
    ) -> Result<DepositOutcome, DivvyError> {
        let total_supply = ledger.total_supply();
        if let Err(e) = self.guard.check(amount, total_supply) {
            tracing::warn!(depositor = %depositor.short(), amount, "Deposit rejected: {}", e);
            return Err(e);
        }

        let outcome = match self.pool.as_mut() {
            None => {
                self.accumulator.record_deposit(amount, total_supply)?;
                self.journal.record(LedgerEventKind::Deposited {
                    depositor: *depositor,
                    amount,
                    total_supply,
                });
                DepositOutcome::Distributed {
                    amount,
                    total_supply,
                }
            }
            Some(pool) => {
                let stage = pool.stage(amount)?;
                match stage {
                    PoolStage::Hold { pending } => {
                        pool.commit(stage);
                        self.journal.record(LedgerEventKind::Pooled {
                            depositor: *depositor,
                            amount,
                            pending,
                        });
                        DepositOutcome::Withheld { pending }
                    }
                    PoolStage::Release { amount: released } => {
                        self.accumulator.record_deposit(released, total_supply)?;
                        pool.commit(stage);
                        self.journal.record(LedgerEventKind::Pooled {
                            depositor: *depositor,
                            amount,
                            pending: released,
                        });
                        self.journal.record(LedgerEventKind::Released {
                            amount: released,
                            total_supply,
                        });
                        DepositOutcome::Released {
                            amount: released,
                            total_supply,
                        }
                    }
                }
            }
        };

        tracing::info!(
            depositor = %depositor.short(),
            amount,
            total_supply,
            ?outcome,
            "Dividend deposit accepted"
        );
        Ok(outcome)
    }

    /// Total dividend ever earned by `holder`.
    pub fn accumulated_of<L: ShareLedger + ?Sized>(
        &self,
        holder: &HolderId,
        ledger: &L,
    ) -> Result<u64, DivvyError> {
        self.accumulator
            .accumulated_of(holder, ledger.balance_of(holder))
    }

    /// Dividend `holder` can withdraw right now.
    ///
    /// # Errors
    /// Returns `DivvyError::InvariantViolation` if bookkeeping is corrupt.
    pub fn withdrawable_of<L: ShareLedger + ?Sized>(
        &self,
        holder: &HolderId,
        ledger: &L,
    ) -> Result<u64, DivvyError> {
        let accumulated = self.accumulated_of(holder, ledger)?;
        self.withdrawals.withdrawable(holder, accumulated)
    }

    /// Mark `holder`'s full withdrawable amount as paid and return it.
    ///
    /// Returns `Ok(0)` without side effects when nothing is owed. The caller
    /// performs the value transfer; use [`DividendInstrument::withdraw_to`]
    /// when that transfer can fail.
    pub fn withdraw<L: ShareLedger + ?Sized>(
        &mut self,
        holder: &HolderId,
        ledger: &L,
    ) -> Result<u64, DivvyError> {
        let amount = self.withdrawable_of(holder, ledger)?;
        if amount == 0 {
            return Ok(0);
        }
        self.commit_withdrawal(holder, amount)?;
        Ok(amount)
    }

    /// Pay `holder`'s full withdrawable amount through `sink`.
    ///
    /// The withdrawal is recorded only after `sink.pay` succeeds, so a failed
    /// payout leaves the entitlement intact.
    ///
    /// # Errors
    /// Propagates the sink's error (typically `DivvyError::Payout`).
    pub fn withdraw_to<L, S>(
        &mut self,
        holder: &HolderId,
        ledger: &L,
        sink: &mut S,
    ) -> Result<u64, DivvyError>
    where
        L: ShareLedger + ?Sized,
        S: PayoutSink + ?Sized,
    {
        let amount = self.withdrawable_of(holder, ledger)?;
        if amount == 0 {
            return Ok(0);
        }
        if let Err(e) = sink.pay(holder, amount) {
            tracing::warn!(holder = %holder.short(), amount, "Payout failed: {}", e);
            return Err(e);
        }
        self.commit_withdrawal(holder, amount)?;
        Ok(amount)
    }

    fn commit_withdrawal(&mut self, holder: &HolderId, amount: u64) -> Result<(), DivvyError> {
        self.withdrawals.record_withdrawal(holder, amount)?;
        self.journal.record(LedgerEventKind::Withdrawn {
            holder: *holder,
            amount,
        });
        tracing::info!(holder = %holder.short(), amount, "Dividend withdrawn");
        Ok(())
    }

    /// Full position of `holder`.
    pub fn statement<L: ShareLedger + ?Sized>(
        &self,
        holder: &HolderId,
        ledger: &L,
    ) -> Result<HolderStatement, DivvyError> {
        let accumulated = self.accumulated_of(holder, ledger)?;
        let withdrawable = self.withdrawals.withdrawable(holder, accumulated)?;
        Ok(HolderStatement {
            holder: *holder,
            balance: ledger.balance_of(holder),
            accumulated,
            withdrawn: self.withdrawals.withdrawn_by(holder),
            withdrawable,
        })
    }

    /// Check total liability against total deposits across every holder
    /// record the instrument has seen.
    ///
    /// This walks all holders and is meant for reporting and tests; the
    /// deposit and withdrawal paths never call it.
    ///
    /// # Errors
    /// Returns `DivvyError::InvariantViolation` if holders are owed more than
    /// was deposited, or if the unclaimable dust exceeds one unit per deposit
    /// per holder.
    pub fn audit<L: ShareLedger + ?Sized>(&self, ledger: &L) -> Result<AuditReport, DivvyError> {
        let mut outstanding: u128 = 0;
        let mut holder_count: u64 = 0;
        for holder in self.accumulator.holders() {
            outstanding += u128::from(self.withdrawable_of(holder, ledger)?);
            holder_count += 1;
        }

        let total_deposited = self.accumulator.total_deposited();
        let total_withdrawn = self.withdrawals.total_withdrawn();
        let liability = outstanding + u128::from(total_withdrawn);
        let dust = u128::from(total_deposited)
            .checked_sub(liability)
            .ok_or_else(|| {
                DivvyError::InvariantViolation(format!(
                    "liability {} exceeds total deposited {}",
                    liability, total_deposited
                ))
            })?;

        let deposit_count = self.accumulator.deposit_count();
        let dust_bound = u128::from(deposit_count) * u128::from(holder_count);
        if dust > dust_bound {
            return Err(DivvyError::InvariantViolation(format!(
                "rounding dust {} exceeds bound {} ({} deposits, {} holders)",
                dust, dust_bound, deposit_count, holder_count
            )));
        }

        Ok(AuditReport {
            total_deposited,
            pending_pool: self.pending_pool(),
            total_withdrawn,
            outstanding,
            dust,
            deposit_count,
            holder_count,
        })
    }

    /// Value received and not yet paid out, including the pending pool.
    pub fn held_value(&self) -> u64 {
        self.accumulator
            .total_deposited()
            .saturating_sub(self.withdrawals.total_withdrawn())
            .saturating_add(self.pending_pool())
    }

    /// Amount withheld by the pool (zero when pooling is off).
    pub fn pending_pool(&self) -> u64 {
        self.pool.as_ref().map(PoolGate::pending).unwrap_or(0)
    }

    pub fn summary(&self) -> InstrumentSummary {
        InstrumentSummary {
            minimum_deposit: self.config.minimum_deposit,
            release_threshold: self.config.release_threshold,
            magnitude_exponent: self.accumulator.magnitude().exponent(),
            magnified_dividend_per_share: self.accumulator.magnified_dividend_per_share(),
            total_deposited: self.accumulator.total_deposited(),
            pending_pool: self.pending_pool(),
            total_withdrawn: self.withdrawals.total_withdrawn(),
            held_value: self.held_value(),
            deposit_count: self.accumulator.deposit_count(),
        }
    }

    pub fn accumulator(&self) -> &DividendAccumulator {
        &self.accumulator
    }

    pub fn events(&self) -> &[LedgerEvent] {
        self.journal.events()
    }
}

impl BalanceChangeHook for DividendInstrument {
    fn on_balance_change(&mut self, change: &BalanceChange) -> Result<(), DivvyError> {
        self.accumulator.adjust_for_balance_change(
            &change.holder,
            change.old_balance,
            change.new_balance,
        );
        self.withdrawals.touch(&change.holder);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    /// Minimal ledger: fixed balances, no hook plumbing.
    struct FixedLedger {
        balances: HashMap<HolderId, u64>,
    }

    impl FixedLedger {
        fn sole(holder: HolderId, shares: u64) -> Self {
            let mut balances = HashMap::new();
            balances.insert(holder, shares);
            Self { balances }
        }
    }

    impl ShareLedger for FixedLedger {
        fn balance_of(&self, holder: &HolderId) -> u64 {
            self.balances.get(holder).copied().unwrap_or(0)
        }

        fn total_supply(&self) -> u64 {
            self.balances.values().sum()
        }
    }

    struct FailingSink;

    impl PayoutSink for FailingSink {
        fn pay(&mut self, _holder: &HolderId, _amount: u64) -> Result<(), DivvyError> {
            Err(DivvyError::Payout("recipient rejected transfer".to_string()))
        }
    }

    fn holder() -> HolderId {
        HolderId::from_label("holder")
    }

    fn issuer() -> HolderId {
        HolderId::from_label("issuer")
    }

    fn funded(config: InstrumentConfig) -> (DividendInstrument, FixedLedger) {
        let mut instrument = DividendInstrument::new(config).unwrap();
        instrument
            .on_balance_change(&BalanceChange {
                holder: holder(),
                old_balance: 0,
                new_balance: 100,
                old_supply: 0,
                new_supply: 100,
            })
            .unwrap();
        (instrument, FixedLedger::sole(holder(), 100))
    }

    #[test]
    fn test_owes_nothing_on_creation() {
        let (mut instrument, ledger) = funded(InstrumentConfig::default());
        assert_eq!(instrument.withdrawable_of(&holder(), &ledger).unwrap(), 0);
        assert_eq!(instrument.withdraw(&holder(), &ledger).unwrap(), 0);
        assert!(instrument.events().is_empty());
    }

    #[test]
    fn test_deposit_below_minimum_rejected() {
        let (mut instrument, ledger) = funded(InstrumentConfig::standard(42));
        let err = instrument.deposit(&issuer(), 41, &ledger).unwrap_err();
        assert_eq!(
            err,
            DivvyError::BelowMinimum {
                amount: 41,
                minimum: 42
            }
        );
        assert_eq!(instrument.held_value(), 0);
        assert!(instrument.events().is_empty());
    }

    #[test]
    fn test_deposit_then_withdraw() {
        let (mut instrument, ledger) = funded(InstrumentConfig::standard(42));
        let outcome = instrument.deposit(&issuer(), 42, &ledger).unwrap();
        assert_eq!(
            outcome,
            DepositOutcome::Distributed {
                amount: 42,
                total_supply: 100
            }
        );
        assert_eq!(instrument.held_value(), 42);
        assert_eq!(instrument.withdraw(&holder(), &ledger).unwrap(), 42);
        assert_eq!(instrument.withdraw(&holder(), &ledger).unwrap(), 0);
        assert_eq!(instrument.held_value(), 0);
        assert_eq!(instrument.events().len(), 2);
    }

    #[test]
    fn test_failed_payout_keeps_entitlement() {
        let (mut instrument, ledger) = funded(InstrumentConfig::default());
        instrument.deposit(&issuer(), 42, &ledger).unwrap();
        let err = instrument
            .withdraw_to(&holder(), &ledger, &mut FailingSink)
            .unwrap_err();
        assert!(matches!(err, DivvyError::Payout(_)));
        assert_eq!(instrument.withdrawable_of(&holder(), &ledger).unwrap(), 42);
        assert_eq!(instrument.summary().total_withdrawn, 0);
    }

    #[test]
    fn test_pooled_deposit_is_withheld() {
        let (mut instrument, ledger) = funded(InstrumentConfig::pooled(42));
        let outcome = instrument.deposit(&issuer(), 41, &ledger).unwrap();
        assert_eq!(outcome, DepositOutcome::Withheld { pending: 41 });
        assert_eq!(instrument.withdrawable_of(&holder(), &ledger).unwrap(), 0);
        assert_eq!(instrument.pending_pool(), 41);
        assert_eq!(instrument.held_value(), 41);
    }

    #[test]
    fn test_pool_release_emits_both_events() {
        let (mut instrument, ledger) = funded(InstrumentConfig::pooled(42));
        instrument.deposit(&issuer(), 13, &ledger).unwrap();
        let outcome = instrument.deposit(&issuer(), 41, &ledger).unwrap();
        assert_eq!(
            outcome,
            DepositOutcome::Released {
                amount: 54,
                total_supply: 100
            }
        );
        let kinds: Vec<_> = instrument.events().iter().map(|e| &e.kind).collect();
        assert_eq!(kinds.len(), 3);
        assert!(matches!(
            kinds[2],
            LedgerEventKind::Released { amount: 54, .. }
        ));
    }

    #[test]
    fn test_audit_single_holder() {
        let (mut instrument, ledger) = funded(InstrumentConfig::default());
        instrument.deposit(&issuer(), 42, &ledger).unwrap();
        instrument.withdraw(&holder(), &ledger).unwrap();
        let report = instrument.audit(&ledger).unwrap();
        assert_eq!(report.total_deposited, 42);
        assert_eq!(report.total_withdrawn, 42);
        assert_eq!(report.outstanding, 0);
        assert_eq!(report.dust, 0);
        assert_eq!(report.holder_count, 1);
    }

    #[test]
    fn test_pooled_release_overflow_keeps_pool() {
        let (mut instrument, ledger) = funded(InstrumentConfig::pooled(10));
        instrument.deposit(&issuer(), u64::MAX, &ledger).unwrap();
        assert_eq!(
            instrument.deposit(&issuer(), 5, &ledger).unwrap(),
            DepositOutcome::Withheld { pending: 5 }
        );
        let before = instrument.summary();
        let events = instrument.events().len();

        let err = instrument.deposit(&issuer(), 6, &ledger).unwrap_err();
        assert!(matches!(err, DivvyError::ArithmeticOverflow(_)));
        assert_eq!(instrument.pending_pool(), 5);
        assert_eq!(instrument.accumulator().total_deposited(), u64::MAX);
        assert_eq!(instrument.summary(), before);
        assert_eq!(instrument.events().len(), events);
    }

    #[test]
    fn test_smallest_magnitude_with_huge_supply() {
        let config = InstrumentConfig {
            magnitude_exponent: 20,
            ..InstrumentConfig::default()
        };
        for supply in [1_000_000_000_000u64, u64::MAX] {
            let mut instrument = DividendInstrument::new(config.clone()).unwrap();
            instrument
                .on_balance_change(&BalanceChange {
                    holder: holder(),
                    old_balance: 0,
                    new_balance: supply,
                    old_supply: 0,
                    new_supply: supply,
                })
                .unwrap();
            let ledger = FixedLedger::sole(holder(), supply);

            instrument.deposit(&issuer(), 1_500_000, &ledger).unwrap();
            let owed = instrument.withdrawable_of(&holder(), &ledger).unwrap();
            assert!(1_500_000 - owed <= 1, "supply {} owed {}", supply, owed);
            let report = instrument.audit(&ledger).unwrap();
            assert!(report.dust <= 1);
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(DividendInstrument::new(InstrumentConfig::pooled(0)).is_err());
    }
}
