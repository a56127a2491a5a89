// crates/divvy-ledger/src/lib.rs
//
// divvy-ledger: dividend accounting for a fungible, transferable share.
//
// Deposits are apportioned to holders pro rata to their balance at deposit
// time. Each deposit and each balance change costs O(1) regardless of how many
// holders exist; no operation ever iterates the holder set.
//
// All values are integers in the smallest unit of the deposited asset.

pub mod accumulator;
pub mod config;
pub mod events;
pub mod fixed_point;
pub mod guard;
pub mod instrument;
pub mod pool;
pub mod registry;
pub mod withdrawal;

// Re-export key types for ergonomic access from downstream crates.
pub use accumulator::{DividendAccumulator, RecordedDeposit};
pub use config::InstrumentConfig;
pub use events::{EventJournal, LedgerEvent, LedgerEventKind};
pub use fixed_point::{Correction, Magnitude, DEFAULT_MAGNITUDE_EXPONENT};
pub use guard::DepositGuard;
pub use instrument::{
    AuditReport, DepositOutcome, DividendInstrument, HolderStatement, InstrumentSummary,
};
pub use pool::{PoolGate, PoolStage};
pub use registry::ShareRegistry;
pub use withdrawal::WithdrawalTracker;
