// crates/divvy-core/src/holder.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::DivvyError;

/// Opaque account key identifying a share holder.
///
/// The dividend engine never interprets the bytes; it only uses the key to
/// look up per-holder bookkeeping. Keys are usually public keys or addresses
/// supplied by the share ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HolderId(pub [u8; 32]);

impl HolderId {
    /// Derive a deterministic key from a human-readable label.
    ///
    /// The key is the SHA-256 digest of the label, so the same label always
    /// maps to the same holder.
    pub fn from_label(label: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(label.as_bytes());
        let digest = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        Self(out)
    }

    /// First eight hex characters, for log lines and tables.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for HolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for HolderId {
    type Err = DivvyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(raw)
            .map_err(|e| DivvyError::Serialization(format!("Invalid holder key: {}", e)))?;
        let key: [u8; 32] = bytes.try_into().map_err(|_| {
            DivvyError::Serialization("Holder key must be exactly 32 bytes".to_string())
        })?;
        Ok(Self(key))
    }
}

/// A single holder's balance delta, reported by the share ledger before the
/// delta is committed.
///
/// A transfer between two holders produces two changes (one per side), both
/// observed against the same dividend state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceChange {
    pub holder: HolderId,
    pub old_balance: u64,
    pub new_balance: u64,
    pub old_supply: u64,
    pub new_supply: u64,
}
