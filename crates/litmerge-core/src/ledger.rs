//! Append-only audit trail of every dedup decision.

use serde::Serialize;

use crate::models::{DecisionLogEntry, SourceStatistics};

#[derive(Debug, Clone, Default)]
pub struct DecisionLedger {
    entries: Vec<DecisionLogEntry>,
}

/// Selected/rejected counts over the whole ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LedgerSummary {
    pub processed: usize,
    pub selected: usize,
    pub rejected: usize,
    /// `None` when the ledger is empty.
    pub selection_rate: Option<f64>,
}

impl DecisionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: DecisionLogEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[DecisionLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn selected_count(&self) -> usize {
        self.entries.iter().filter(|e| e.accepted).count()
    }

    pub fn summary(&self) -> LedgerSummary {
        let processed = self.len();
        let selected = self.selected_count();
        LedgerSummary {
            processed,
            selected,
            rejected: processed - selected,
            selection_rate: (processed > 0).then(|| selected as f64 / processed as f64),
        }
    }

    /// Recompute statistics from the logged decisions carrying `label`.
    ///
    /// Labels need not be unique across a run; every source sharing `label`
    /// is counted together.
    pub fn statistics_for(&self, label: &str) -> SourceStatistics {
        self.entries
            .iter()
            .filter(|e| e.source_label == label)
            .fold(SourceStatistics::new(label), |mut stats, entry| {
                stats.record(&entry.reason);
                stats
            })
    }
}

impl<'a> IntoIterator for &'a DecisionLedger {
    type Item = &'a DecisionLogEntry;
    type IntoIter = std::slice::Iter<'a, DecisionLogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
