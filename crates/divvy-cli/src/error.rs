// crates/divvy-cli/src/error.rs
//
// Errors surfaced by the Divvy CLI.

use divvy_core::DivvyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Script parse error: {0}")]
    Script(#[from] toml::de::Error),

    #[error("Ledger error: {0}")]
    Ledger(#[from] DivvyError),

    /// A replayed operation was rejected and `--stop-on-error` was set.
    #[error("Step {step} rejected: {source}")]
    Rejected { step: usize, source: DivvyError },

    /// A replayed operation failed for a reason other than a caller mistake.
    #[error("Step {step} failed: {source}")]
    Failed { step: usize, source: DivvyError },
}
