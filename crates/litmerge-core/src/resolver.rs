//! Two-tier identity resolution: DOI first, normalized title second.

use std::collections::HashSet;

use tracing::debug;

use crate::models::{Reason, Record};
use crate::normalize::preview;

/// Keys accepted so far in a run. Both sets only ever grow.
#[derive(Debug, Clone, Default)]
pub struct SeenKeys {
    dois: HashSet<String>,
    titles: HashSet<String>,
}

impl SeenKeys {
    pub fn contains_doi(&self, key: &str) -> bool {
        self.dois.contains(key)
    }

    pub fn contains_title(&self, key: &str) -> bool {
        self.titles.contains(key)
    }

    pub fn doi_count(&self) -> usize {
        self.dois.len()
    }

    pub fn title_count(&self) -> usize {
        self.titles.len()
    }
}

/// Verdict for the record at `position` (1-based) within its batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub position: usize,
    pub reason: Reason,
}

/// First-seen-wins resolver over one run's [`SeenKeys`].
#[derive(Debug, Clone, Default)]
pub struct IdentityResolver {
    seen: SeenKeys,
}

impl IdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self) -> &SeenKeys {
        &self.seen
    }

    /// Resolve every record of one source.
    ///
    /// Records with a DOI key are decided first, then the DOI-less ones, each
    /// group in file row order. The returned resolutions are in that visit
    /// order, which is also the order they must be logged in.
    pub fn resolve_batch(&mut self, records: &[Record]) -> Vec<Resolution> {
        let keyed: Vec<(usize, String, String)> = records
            .iter()
            .enumerate()
            .map(|(idx, record)| (idx + 1, record.doi_key(), record.title_key()))
            .collect();

        let mut resolutions = Vec::with_capacity(records.len());

        for (position, doi_key, title_key) in keyed.iter().filter(|(_, doi, _)| !doi.is_empty()) {
            let reason = self.decide_by_doi(doi_key, title_key);
            debug!(position, doi = %doi_key, %reason, "doi pass");
            resolutions.push(Resolution {
                position: *position,
                reason,
            });
        }

        for (position, _, title_key) in keyed.iter().filter(|(_, doi, _)| doi.is_empty()) {
            let reason = self.decide_by_title(title_key);
            debug!(position, %reason, "title pass");
            resolutions.push(Resolution {
                position: *position,
                reason,
            });
        }

        resolutions
    }

    /// Decide a record that carries a non-empty DOI key.
    ///
    /// An accepted record also claims its title so that later DOI-less copies
    /// of the same paper are rejected.
    pub fn decide_by_doi(&mut self, doi_key: &str, title_key: &str) -> Reason {
        if self.seen.dois.contains(doi_key) {
            return Reason::DuplicateDoi {
                doi: doi_key.to_string(),
            };
        }

        self.seen.dois.insert(doi_key.to_string());
        if !title_key.is_empty() {
            self.seen.titles.insert(title_key.to_string());
        }
        Reason::UniqueDoi
    }

    /// Decide a record whose DOI key is empty.
    pub fn decide_by_title(&mut self, title_key: &str) -> Reason {
        if title_key.is_empty() {
            return Reason::EmptyKeys;
        }

        if self.seen.titles.insert(title_key.to_string()) {
            Reason::UniqueTitle
        } else {
            Reason::DuplicateTitle {
                title: preview(title_key).to_string(),
            }
        }
    }
}
