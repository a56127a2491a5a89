// crates/divvy-ledger/src/events.rs
//
// Append-only journal of dividend events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use divvy_core::HolderId;

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerEventKind {
    /// A deposit was distributed immediately.
    Deposited {
        depositor: HolderId,
        amount: u64,
        total_supply: u64,
    },
    /// A deposit was added to the pending pool.
    Pooled {
        depositor: HolderId,
        amount: u64,
        pending: u64,
    },
    /// The pending pool was distributed as one deposit.
    Released { amount: u64, total_supply: u64 },
    /// A holder was paid out.
    Withdrawn { holder: HolderId, amount: u64 },
}

/// A journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    /// Position in the journal, starting at 0.
    pub sequence: u64,
    pub recorded_at: DateTime<Utc>,
    pub kind: LedgerEventKind,
}

/// Ordered list of events emitted by an instrument.
#[derive(Debug, Clone, Default)]
pub struct EventJournal {
    events: Vec<LedgerEvent>,
}

impl EventJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event stamped with the current time.
    pub fn record(&mut self, kind: LedgerEventKind) {
        let event = LedgerEvent {
            sequence: self.events.len() as u64,
            recorded_at: Utc::now(),
            kind,
        };
        self.events.push(event);
    }

    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequences_are_dense() {
        let mut journal = EventJournal::new();
        assert!(journal.events().is_empty());
        journal.record(LedgerEventKind::Released {
            amount: 54,
            total_supply: 100,
        });
        journal.record(LedgerEventKind::Withdrawn {
            holder: HolderId::from_label("holder"),
            amount: 54,
        });
        assert_eq!(journal.events().len(), 2);
        assert_eq!(journal.events()[0].sequence, 0);
        assert_eq!(journal.events()[1].sequence, 1);
    }

    #[test]
    fn test_event_json_is_tagged() {
        let mut journal = EventJournal::new();
        journal.record(LedgerEventKind::Released {
            amount: 54,
            total_supply: 100,
        });
        let json = serde_json::to_value(&journal.events()[0]).unwrap();
        assert_eq!(json["kind"]["kind"], "released");
        assert_eq!(json["kind"]["amount"], 54);
    }
}
