use serde::{Deserialize, Serialize};

use crate::models::{AcceptBasis, Reason};

/// Decision counts for one source.
///
/// Only ever built by folding [`Reason`]s, so the same numbers can be
/// recomputed from the ledger at any time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceStatistics {
    pub label: String,
    pub total_rows: usize,
    pub doi_based_accepted: usize,
    pub title_based_accepted: usize,
    pub total_accepted: usize,
    /// Rows rejected as a DOI or title duplicate.
    pub duplicates: usize,
    /// Rows with neither a DOI nor a title.
    pub empty_rows: usize,
}

impl SourceStatistics {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    pub fn record(&mut self, reason: &Reason) {
        self.total_rows += 1;
        match reason.basis() {
            Some(AcceptBasis::Doi) => self.doi_based_accepted += 1,
            Some(AcceptBasis::Title) => self.title_based_accepted += 1,
            None if reason.is_duplicate() => self.duplicates += 1,
            None => self.empty_rows += 1,
        }
        self.total_accepted = self.doi_based_accepted + self.title_based_accepted;
    }
}

/// Aggregate numbers over every source of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunTotals {
    pub total_rows: usize,
    pub total_accepted: usize,
    pub duplicates_removed: usize,
    /// `1 - accepted / total`; `None` when nothing was read.
    pub dedup_rate: Option<f64>,
}

impl RunTotals {
    pub fn from_sources<'a>(stats: impl IntoIterator<Item = &'a SourceStatistics>) -> Self {
        let (total_rows, total_accepted) = stats
            .into_iter()
            .fold((0, 0), |(rows, accepted), s| {
                (rows + s.total_rows, accepted + s.total_accepted)
            });

        let dedup_rate = if total_rows > 0 {
            Some(1.0 - total_accepted as f64 / total_rows as f64)
        } else {
            None
        };

        Self {
            total_rows,
            total_accepted,
            duplicates_removed: total_rows - total_accepted,
            dedup_rate,
        }
    }
}
