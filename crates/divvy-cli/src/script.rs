// crates/divvy-cli/src/script.rs
//
// Replay scripts: an ordered list of ledger operations read from TOML.
//
//   [[ops]]
//   op = "deposit"
//   from = "carol"
//   amount = 42

use std::fmt;
use std::fs;

use serde::{Deserialize, Serialize};

use crate::error::CliError;

/// One scripted operation. Holders are referred to by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Deposit { from: String, amount: u64 },
    Mint { to: String, amount: u64 },
    Burn { from: String, amount: u64 },
    Transfer { from: String, to: String, amount: u64 },
    Withdraw { holder: String },
}

impl Operation {
    /// Every holder name the operation refers to.
    pub fn holder_names(&self) -> Vec<&str> {
        match self {
            Operation::Deposit { from, .. } | Operation::Burn { from, .. } => vec![from.as_str()],
            Operation::Mint { to, .. } => vec![to.as_str()],
            Operation::Transfer { from, to, .. } => vec![from.as_str(), to.as_str()],
            Operation::Withdraw { holder } => vec![holder.as_str()],
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Deposit { from, amount } => write!(f, "deposit {} from {}", amount, from),
            Operation::Mint { to, amount } => write!(f, "mint {} to {}", amount, to),
            Operation::Burn { from, amount } => write!(f, "burn {} from {}", amount, from),
            Operation::Transfer { from, to, amount } => {
                write!(f, "transfer {} {} -> {}", amount, from, to)
            }
            Operation::Withdraw { holder } => write!(f, "withdraw {}", holder),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub ops: Vec<Operation>,
}

impl Script {
    pub fn parse(contents: &str) -> Result<Self, CliError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load(path: &str) -> Result<Self, CliError> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_every_operation() {
        let script = Script::parse(
            r#"
            [[ops]]
            op = "mint"
            to = "alice"
            amount = 100

            [[ops]]
            op = "deposit"
            from = "carol"
            amount = 42

            [[ops]]
            op = "transfer"
            from = "alice"
            to = "bob"
            amount = 25

            [[ops]]
            op = "burn"
            from = "bob"
            amount = 5

            [[ops]]
            op = "withdraw"
            holder = "alice"
            "#,
        )
        .unwrap();

        assert_eq!(script.ops.len(), 5);
        assert_eq!(
            script.ops[2],
            Operation::Transfer {
                from: "alice".to_string(),
                to: "bob".to_string(),
                amount: 25,
            }
        );
        assert_eq!(
            script.ops[4],
            Operation::Withdraw {
                holder: "alice".to_string()
            }
        );
    }

    #[test]
    fn test_empty_script() {
        assert!(Script::parse("").unwrap().ops.is_empty());
    }

    #[test]
    fn test_unknown_operation_rejected() {
        let err = Script::parse("[[ops]]\nop = \"airdrop\"\nto = \"alice\"\n").unwrap_err();
        assert!(matches!(err, CliError::Script(_)));
    }

    #[test]
    fn test_holder_names() {
        let op = Operation::Transfer {
            from: "alice".to_string(),
            to: "bob".to_string(),
            amount: 1,
        };
        assert_eq!(op.holder_names(), vec!["alice", "bob"]);
        let op = Operation::Withdraw {
            holder: "carol".to_string(),
        };
        assert_eq!(op.holder_names(), vec!["carol"]);
    }

    #[test]
    fn test_display() {
        let op = Operation::Deposit {
            from: "carol".to_string(),
            amount: 42,
        };
        assert_eq!(op.to_string(), "deposit 42 from carol");
    }
}
