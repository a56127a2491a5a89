use thiserror::Error;

use crate::holder::HolderId;

/// Error types for the Divvy dividend ledger.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DivvyError {
    /// A deposit was attempted while no shares are outstanding.
    #[error("Deposit rejected: total supply is zero")]
    ZeroSupply,

    /// A deposit was smaller than the configured minimum.
    #[error("Deposit rejected: amount {amount} is below the minimum of {minimum}")]
    BelowMinimum { amount: u64, minimum: u64 },

    /// Scaled arithmetic exceeded its representable range.
    #[error("Arithmetic overflow: {0}")]
    ArithmeticOverflow(String),

    /// Internal bookkeeping produced an impossible value.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// A transfer or burn asked for more shares than the holder owns.
    #[error("Insufficient shares: holder {holder} has {balance}, requested {requested}")]
    InsufficientShares {
        holder: HolderId,
        balance: u64,
        requested: u64,
    },

    /// Instrument or CLI configuration is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The external value transfer for a withdrawal failed.
    #[error("Payout failed: {0}")]
    Payout(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DivvyError {
    /// Shorthand for an overflow error with context.
    pub fn overflow(context: impl Into<String>) -> Self {
        DivvyError::ArithmeticOverflow(context.into())
    }

    /// Returns `true` when the caller asked for something the ledger refuses
    /// (a bad deposit or share move). Other errors point at broken state or a
    /// failed external transfer.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            DivvyError::ZeroSupply
                | DivvyError::BelowMinimum { .. }
                | DivvyError::InsufficientShares { .. }
        )
    }
}

impl From<serde_json::Error> for DivvyError {
    fn from(e: serde_json::Error) -> Self {
        DivvyError::Serialization(e.to_string())
    }
}
