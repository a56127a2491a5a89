// crates/divvy-core/src/lib.rs
//
// divvy-core: Core types, traits, and error definitions for the Divvy
// dividend ledger.
//
// This is the leaf crate that the rest of the workspace depends on. It defines
// holder identity, the balance-change notification passed from a share ledger
// to the dividend engine, and the trait seams between the two.

pub mod error;
pub mod holder;
pub mod traits;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use divvy_core::HolderId;`

pub use error::DivvyError;
pub use holder::{BalanceChange, HolderId};
pub use traits::{BalanceChangeHook, PayoutSink, ShareLedger};
