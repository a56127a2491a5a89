// crates/divvy-cli/src/shared.rs
//
// LedgerSession: a share registry and its dividend instrument, addressed by
// holder name.
//
// Wrapped in `SharedSession` so concurrent tasks can drive one session. Every
// operation holds the lock for its full duration, so share movements and
// deposits are serialized.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use divvy_core::{DivvyError, HolderId, PayoutSink, ShareLedger};
use divvy_ledger::{
    AuditReport, DepositOutcome, DividendInstrument, HolderStatement, InstrumentSummary,
    ShareRegistry,
};

use crate::config::CliConfig;
use crate::script::Operation;

/// Shared session handle for concurrent access from tokio tasks.
pub type SharedSession = Arc<Mutex<LedgerSession>>;

/// Payout sink that records what each holder has been paid.
#[derive(Debug, Clone, Default)]
pub struct PayoutJournal {
    paid: HashMap<HolderId, u64>,
    total: u64,
}

impl PayoutJournal {
    pub fn paid_to(&self, holder: &HolderId) -> u64 {
        self.paid.get(holder).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.total
    }
}

impl PayoutSink for PayoutJournal {
    fn pay(&mut self, holder: &HolderId, amount: u64) -> Result<(), DivvyError> {
        let total = self
            .total
            .checked_add(amount)
            .ok_or_else(|| DivvyError::Payout("payout journal total overflow".to_string()))?;
        *self.paid.entry(*holder).or_insert(0) += amount;
        self.total = total;
        Ok(())
    }
}

/// What an accepted operation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    Distributed { amount: u64, total_supply: u64 },
    Withheld { pending: u64 },
    Released { amount: u64, total_supply: u64 },
    SharesMoved { total_supply: u64 },
    Paid { amount: u64 },
}

impl From<DepositOutcome> for Effect {
    fn from(outcome: DepositOutcome) -> Self {
        match outcome {
            DepositOutcome::Distributed {
                amount,
                total_supply,
            } => Effect::Distributed {
                amount,
                total_supply,
            },
            DepositOutcome::Withheld { pending } => Effect::Withheld { pending },
            DepositOutcome::Released {
                amount,
                total_supply,
            } => Effect::Released {
                amount,
                total_supply,
            },
        }
    }
}

impl std::fmt::Display for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Effect::Distributed {
                amount,
                total_supply,
            } => write!(f, "distributed {} over {} shares", amount, total_supply),
            Effect::Withheld { pending } => write!(f, "pooled ({} pending)", pending),
            Effect::Released {
                amount,
                total_supply,
            } => write!(f, "released {} over {} shares", amount, total_supply),
            Effect::SharesMoved { total_supply } => write!(f, "supply {}", total_supply),
            Effect::Paid { amount } => write!(f, "paid {}", amount),
        }
    }
}

/// A named holder's statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedStatement {
    pub name: String,
    #[serde(flatten)]
    pub statement: HolderStatement,
}

/// Share registry plus dividend instrument for one replay.
#[derive(Debug)]
pub struct LedgerSession {
    registry: ShareRegistry,
    instrument: DividendInstrument,
    payouts: PayoutJournal,
    names: HashMap<HolderId, String>,
}

impl LedgerSession {
    /// Build a session and mint the configured initial allocation.
    pub fn from_config(config: &CliConfig) -> Result<Self, DivvyError> {
        let mut session = Self {
            registry: ShareRegistry::new(),
            instrument: DividendInstrument::new(config.instrument.clone())?,
            payouts: PayoutJournal::default(),
            names: HashMap::new(),
        };
        for allocation in &config.holders {
            session.apply(&Operation::Mint {
                to: allocation.name.clone(),
                amount: allocation.shares,
            })?;
        }
        tracing::info!(
            holders = config.holders.len(),
            total_supply = session.registry.total_supply(),
            "Session ready"
        );
        Ok(session)
    }

    /// Wrap the session for shared use.
    pub fn into_shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    /// Apply one operation. Nothing changes when an error is returned.
    pub fn apply(&mut self, op: &Operation) -> Result<Effect, DivvyError> {
        let effect = self.execute(op)?;
        for name in op.holder_names() {
            self.names
                .entry(HolderId::from_label(name))
                .or_insert_with(|| name.to_string());
        }
        Ok(effect)
    }

    fn execute(&mut self, op: &Operation) -> Result<Effect, DivvyError> {
        match op {
            Operation::Deposit { from, amount } => {
                let depositor = HolderId::from_label(from);
                let outcome = self
                    .instrument
                    .deposit(&depositor, *amount, &self.registry)?;
                Ok(outcome.into())
            }
            Operation::Mint { to, amount } => {
                let to = HolderId::from_label(to);
                self.registry.mint(&to, *amount, &mut self.instrument)?;
                Ok(self.shares_moved())
            }
            Operation::Burn { from, amount } => {
                let from = HolderId::from_label(from);
                self.registry.burn(&from, *amount, &mut self.instrument)?;
                Ok(self.shares_moved())
            }
            Operation::Transfer { from, to, amount } => {
                let from = HolderId::from_label(from);
                let to = HolderId::from_label(to);
                self.registry
                    .transfer(&from, &to, *amount, &mut self.instrument)?;
                Ok(self.shares_moved())
            }
            Operation::Withdraw { holder: name } => {
                let id = HolderId::from_label(name);
                let amount = self
                    .instrument
                    .withdraw_to(&id, &self.registry, &mut self.payouts)?;
                Ok(Effect::Paid { amount })
            }
        }
    }

    fn shares_moved(&self) -> Effect {
        Effect::SharesMoved {
            total_supply: self.registry.total_supply(),
        }
    }

    /// Statements for every holder that ever held shares, in first-seen order.
    pub fn statements(&self) -> Result<Vec<NamedStatement>, DivvyError> {
        self.registry
            .holders()
            .iter()
            .map(|id| {
                Ok(NamedStatement {
                    name: self.name_of(id),
                    statement: self.instrument.statement(id, &self.registry)?,
                })
            })
            .collect()
    }

    pub fn name_of(&self, id: &HolderId) -> String {
        self.names.get(id).cloned().unwrap_or_else(|| id.short())
    }

    pub fn summary(&self) -> InstrumentSummary {
        self.instrument.summary()
    }

    pub fn audit(&self) -> Result<AuditReport, DivvyError> {
        self.instrument.audit(&self.registry)
    }

    pub fn payouts(&self) -> &PayoutJournal {
        &self.payouts
    }

    pub fn total_supply(&self) -> u64 {
        self.registry.total_supply()
    }
}
