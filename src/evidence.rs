//! Settlement model for the corroborating-evidence lookups that feed the
//! reconciliation classifier.
//!
//! The orchestration itself (four parallel lookups against isolated data
//! sources) lives outside this core; these types pin down the contract: a
//! failure in one source never invalidates the others, and the bundle is
//! complete once every source has settled, whether it succeeded or not.

use serde::{Deserialize, Serialize};

/// Outcome of one evidence lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "state", content = "value")]
pub enum EvidenceState<T> {
    /// Lookup not yet settled.
    Pending,
    /// Lookup succeeded with content.
    Ready(T),
    /// Lookup succeeded but the source had nothing for this account.
    Empty,
    /// Lookup failed; the message is kept, the other sources are unaffected.
    Failed(String),
}

impl<T> EvidenceState<T> {
    pub fn is_settled(&self) -> bool {
        !matches!(self, EvidenceState::Pending)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            EvidenceState::Ready(v) => Some(v),
            _ => None,
        }
    }
}

/// The four independent evidence sources consulted per account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceBundle<T> {
    pub ledger_entries: EvidenceState<T>,
    pub bank_movements: EvidenceState<T>,
    pub cash_movements: EvidenceState<T>,
    pub journal_vouchers: EvidenceState<T>,
}

impl<T> Default for EvidenceBundle<T> {
    fn default() -> Self {
        Self {
            ledger_entries: EvidenceState::Pending,
            bank_movements: EvidenceState::Pending,
            cash_movements: EvidenceState::Pending,
            journal_vouchers: EvidenceState::Pending,
        }
    }
}

impl<T> EvidenceBundle<T> {
    fn states(&self) -> [&EvidenceState<T>; 4] {
        [
            &self.ledger_entries,
            &self.bank_movements,
            &self.cash_movements,
            &self.journal_vouchers,
        ]
    }

    /// Complete once every lookup has settled, succeeded or failed.
    pub fn is_complete(&self) -> bool {
        self.states().iter().all(|s| s.is_settled())
    }

    /// A partially failed bundle (e.g. 3 of 4 succeeded) still renders its
    /// successful parts; only a bundle with zero successes is a total loss.
    pub fn has_any_evidence(&self) -> bool {
        self.states()
            .iter()
            .any(|s| matches!(s, EvidenceState::Ready(_)))
    }

    pub fn failure_count(&self) -> usize {
        self.states()
            .iter()
            .filter(|s| matches!(s, EvidenceState::Failed(_)))
            .count()
    }
}
