//! Drives a merge run: sources in configured order, one resolver, one ledger.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::{MergeConfig, OutputConfig};
use crate::error::{LoadError, Result};
use crate::ledger::DecisionLedger;
use crate::loader::{CsvSourceLoader, SourceLoader};
use crate::models::{DecisionLogEntry, Record, RunTotals, SourceStatistics};
use crate::resolver::IdentityResolver;
use crate::writer;

/// How loading a source went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "lowercase")]
pub enum SourceStatus {
    Loaded,
    Unavailable(String),
    Malformed(String),
}

impl From<&LoadError> for SourceStatus {
    fn from(err: &LoadError) -> Self {
        match err {
            LoadError::SourceUnavailable { reason, .. } => SourceStatus::Unavailable(reason.clone()),
            LoadError::MalformedSource { reason, .. } => SourceStatus::Malformed(reason.clone()),
        }
    }
}

/// Per-source result of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceReport {
    pub file: PathBuf,
    pub status: SourceStatus,
    pub missing_columns: Vec<String>,
    pub stats: SourceStatistics,
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub merged: Vec<Record>,
    pub ledger: DecisionLedger,
    pub sources: Vec<SourceReport>,
}

impl MergeOutcome {
    pub fn totals(&self) -> RunTotals {
        RunTotals::from_sources(self.sources.iter().map(|s| &s.stats))
    }

    /// Write the merged collection and the decision log. Failures here are
    /// the only fatal errors of a run.
    pub fn write(&self, output: &OutputConfig) -> Result<()> {
        writer::write_merged(&output.merged, &self.merged)?;
        info!(path = %output.merged.display(), papers = self.merged.len(), "merged data saved");

        writer::write_ledger(&output.log, &self.ledger)?;
        info!(path = %output.log.display(), rows = self.ledger.len(), "processing log saved");
        Ok(())
    }
}

/// Run state: the seen-sets, the merged collection and the ledger.
///
/// Sources must be fed in order; every decision depends on what earlier
/// sources contributed.
#[derive(Debug, Default)]
pub struct MergeRun {
    resolver: IdentityResolver,
    merged: Vec<Record>,
    ledger: DecisionLedger,
    sources: Vec<SourceReport>,
}

impl MergeRun {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve one source's records and fold them into the run.
    pub fn ingest(&mut self, label: &str, records: &[Record]) -> SourceStatistics {
        let mut stats = SourceStatistics::new(label);

        for resolution in self.resolver.resolve_batch(records) {
            let record = &records[resolution.position - 1];
            stats.record(&resolution.reason);
            if resolution.reason.is_accepted() {
                self.merged.push(record.clone());
            }
            self.ledger
                .append(DecisionLogEntry::new(record, resolution.position, resolution.reason));
        }

        stats
    }

    /// Record a source's outcome after [`ingest`](Self::ingest) or a failed load.
    pub fn push_report(&mut self, report: SourceReport) {
        self.sources.push(report);
    }

    pub fn merged(&self) -> &[Record] {
        &self.merged
    }

    pub fn ledger(&self) -> &DecisionLedger {
        &self.ledger
    }

    pub fn finish(self) -> MergeOutcome {
        MergeOutcome {
            merged: self.merged,
            ledger: self.ledger,
            sources: self.sources,
        }
    }
}

/// Runs configured sources through a [`SourceLoader`].
#[derive(Debug, Clone, Default)]
pub struct Merger<L = CsvSourceLoader> {
    loader: L,
}

impl<L: SourceLoader> Merger<L> {
    pub fn new(loader: L) -> Self {
        Self { loader }
    }

    pub fn run(&self, config: &MergeConfig) -> MergeOutcome {
        let mut run = MergeRun::new();

        for source in &config.sources {
            let label = source.label.as_str();
            let columns = source.columns(&config.columns);
            info!(source = label, file = %source.file.display(), "processing source");

            let report = match self.loader.load(source, &columns) {
                Ok(loaded) => {
                    info!(source = label, rows = loaded.records.len(), "loaded source");
                    if !loaded.missing_columns.is_empty() {
                        warn!(
                            source = label,
                            missing = ?loaded.missing_columns,
                            "missing columns, values treated as absent"
                        );
                    }

                    let stats = run.ingest(label, &loaded.records);
                    info!(
                        source = label,
                        total_rows = stats.total_rows,
                        doi_based = stats.doi_based_accepted,
                        title_only = stats.title_based_accepted,
                        added = stats.total_accepted,
                        "source merged"
                    );
                    if stats.duplicates > 0 {
                        info!(source = label, duplicates = stats.duplicates, "duplicates found");
                    }

                    SourceReport {
                        file: source.file.clone(),
                        status: SourceStatus::Loaded,
                        missing_columns: loaded.missing_columns,
                        stats,
                    }
                }
                Err(err) => {
                    warn!(source = label, error = %err, "skipping source");
                    SourceReport {
                        file: source.file.clone(),
                        status: SourceStatus::from(&err),
                        missing_columns: Vec::new(),
                        stats: SourceStatistics::new(label),
                    }
                }
            };
            run.push_report(report);
        }

        let outcome = run.finish();
        info!(papers = outcome.merged.len(), "final dataset assembled");
        outcome
    }
}

/// Merge the configured CSV exports.
pub fn merge_sources(config: &MergeConfig) -> MergeOutcome {
    Merger::new(CsvSourceLoader).run(config)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::config::{ColumnNames, SourceConfig};
    use crate::models::Reason;

    /// Serves fixed records per file; unknown files are unavailable.
    #[derive(Default)]
    struct MemoryLoader {
        sources: HashMap<PathBuf, Vec<Record>>,
    }

    impl MemoryLoader {
        fn with(self, label: &str, rows: &[(&str, &str)]) -> Self {
            self.with_file(&format!("{label}.csv"), label, rows)
        }

        fn with_file(mut self, file: &str, label: &str, rows: &[(&str, &str)]) -> Self {
            let records = rows
                .iter()
                .map(|(doi, title)| {
                    let mut record = Record::new(label);
                    if !doi.is_empty() {
                        record = record.with_doi(*doi);
                    }
                    if !title.is_empty() {
                        record = record.with_title(*title);
                    }
                    record
                })
                .collect();
            self.sources.insert(PathBuf::from(file), records);
            self
        }
    }

    impl SourceLoader for MemoryLoader {
        fn load(
            &self,
            source: &SourceConfig,
            _columns: &ColumnNames,
        ) -> std::result::Result<crate::loader::LoadedSource, LoadError> {
            self.sources
                .get(&source.file)
                .map(|records| crate::loader::LoadedSource {
                    records: records.clone(),
                    missing_columns: Vec::new(),
                })
                .ok_or_else(|| LoadError::SourceUnavailable {
                    path: source.file.display().to_string(),
                    reason: "not found".to_string(),
                })
        }
    }

    fn config(labels: &[&str]) -> MergeConfig {
        MergeConfig {
            sources: labels
                .iter()
                .map(|label| SourceConfig::new(format!("{label}.csv"), *label))
                .collect(),
            ..Default::default()
        }
    }

    fn decisions(outcome: &MergeOutcome) -> Vec<(String, usize, String)> {
        outcome
            .ledger
            .entries()
            .iter()
            .map(|e| (e.source_label.clone(), e.position, e.reason.to_string()))
            .collect()
    }

    #[test]
    fn end_to_end_example() {
        let loader = MemoryLoader::default()
            .with("A", &[("10.1/X", "Foo"), ("", "Foo")])
            .with("B", &[("10.1/X", "Bar"), ("", "Baz")]);
        let outcome = Merger::new(loader).run(&config(&["A", "B"]));

        assert_eq!(
            decisions(&outcome),
            vec![
                ("A".to_string(), 1, "Unique DOI".to_string()),
                (
                    "A".to_string(),
                    2,
                    "Duplicate Title (already seen: foo...)".to_string()
                ),
                (
                    "B".to_string(),
                    1,
                    "Duplicate DOI (already seen: 10.1/x)".to_string()
                ),
                ("B".to_string(), 2, "Unique Title (no DOI)".to_string()),
            ]
        );
        assert_eq!(outcome.merged.len(), 2);
        assert_eq!(outcome.ledger.len(), 4);
        assert_eq!(outcome.merged[0].title.as_deref(), Some("Foo"));
        assert_eq!(outcome.merged[1].title.as_deref(), Some("Baz"));
        assert_eq!(outcome.merged[1].source_label, "B");
    }

    #[test]
    fn source_order_decides_the_survivor() {
        let loader = || {
            MemoryLoader::default()
                .with("A", &[("10.1/X", "From A")])
                .with("B", &[("10.1/x", "From B")])
        };

        let forward = Merger::new(loader()).run(&config(&["A", "B"]));
        assert_eq!(forward.merged.len(), 1);
        assert_eq!(forward.merged[0].source_label, "A");

        let reversed = Merger::new(loader()).run(&config(&["B", "A"]));
        assert_eq!(reversed.merged.len(), 1);
        assert_eq!(reversed.merged[0].source_label, "B");
    }

    #[test]
    fn later_doi_record_does_not_affect_earlier_title_decision() {
        // A's DOI-less "Foo" is decided before B's DOI record exists
        let loader = MemoryLoader::default()
            .with("A", &[("", "Foo")])
            .with("B", &[("10.1/X", "Foo")]);
        let outcome = Merger::new(loader).run(&config(&["A", "B"]));

        assert_eq!(outcome.merged.len(), 2);
        assert_eq!(outcome.ledger.entries()[0].reason, Reason::UniqueTitle);
        assert_eq!(outcome.ledger.entries()[1].reason, Reason::UniqueDoi);
    }

    #[test]
    fn single_source_is_deduplicated_against_itself() {
        let loader = MemoryLoader::default().with(
            "A",
            &[
                ("10.1/1", "One"),
                ("10.1/2", "Two"),
                ("10.1/1", "One again"),
                ("", "Three"),
                ("", "three "),
                ("", ""),
            ],
        );
        let outcome = Merger::new(loader).run(&config(&["A"]));

        let stats = &outcome.sources[0].stats;
        assert_eq!(stats.total_rows, 6);
        assert_eq!(stats.doi_based_accepted, 2);
        assert_eq!(stats.title_based_accepted, 1);
        assert_eq!(stats.total_accepted, 3);
        assert_eq!(stats.duplicates, 2);
        assert_eq!(stats.empty_rows, 1);
    }

    #[test]
    fn ledger_is_complete_and_consistent() {
        let loader = MemoryLoader::default()
            .with("A", &[("10.1/1", "One"), ("", "Two"), ("", ""), ("10.1/1", "")])
            .with("B", &[("", "one"), ("10.1/3", "Two"), ("", "Four")])
            .with("C", &[("10.1/3", ""), ("", "four"), ("10.1/5", "Five")]);
        let outcome = Merger::new(loader).run(&config(&["A", "B", "C"]));

        assert_eq!(outcome.ledger.len(), 10);
        assert_eq!(outcome.ledger.selected_count(), outcome.merged.len());

        for report in &outcome.sources {
            assert_eq!(outcome.ledger.statistics_for(&report.stats.label), report.stats);
        }

        let totals = outcome.totals();
        assert_eq!(totals.total_rows, 10);
        assert_eq!(totals.total_accepted, outcome.merged.len());
    }

    #[test]
    fn accepted_keys_are_unique() {
        let loader = MemoryLoader::default()
            .with("A", &[("10.1/A", "x"), ("", "y"), ("10.1/a", "z")])
            .with("B", &[("10.1/B", "Y"), ("", "X"), ("", "w")]);
        let outcome = Merger::new(loader).run(&config(&["A", "B"]));

        let mut dois: Vec<String> = outcome
            .merged
            .iter()
            .map(Record::doi_key)
            .filter(|k| !k.is_empty())
            .collect();
        let doi_count = dois.len();
        dois.sort();
        dois.dedup();
        assert_eq!(dois.len(), doi_count);

        let mut titles: Vec<String> = outcome
            .merged
            .iter()
            .filter(|r| r.doi_key().is_empty())
            .map(Record::title_key)
            .collect();
        let title_count = titles.len();
        titles.sort();
        titles.dedup();
        assert_eq!(titles.len(), title_count);
    }

    #[test]
    fn failing_source_is_skipped() {
        let loader = MemoryLoader::default()
            .with("A", &[("10.1/1", "One")])
            .with("C", &[("10.1/1", "One"), ("", "Two")]);
        let outcome = Merger::new(loader).run(&config(&["A", "B", "C"]));

        assert_eq!(outcome.sources.len(), 3);
        assert!(matches!(outcome.sources[1].status, SourceStatus::Unavailable(_)));
        assert_eq!(outcome.sources[1].stats.total_rows, 0);
        assert_eq!(outcome.sources[2].stats.duplicates, 1);
        assert_eq!(outcome.merged.len(), 2);
        assert_eq!(outcome.ledger.len(), 3);
    }

    #[test]
    fn sources_may_share_a_label() {
        let loader = MemoryLoader::default()
            .with_file("q1/scopus.csv", "Scopus", &[("10.1/1", "One"), ("", "Two")])
            .with_file("q2/scopus.csv", "Scopus", &[("10.1/1", "One"), ("", "Three")])
            .with("IEEE", &[("", "two")]);
        let config = MergeConfig {
            sources: vec![
                SourceConfig::new("q1/scopus.csv", "Scopus"),
                SourceConfig::new("q2/scopus.csv", "Scopus"),
                SourceConfig::new("IEEE.csv", "IEEE"),
            ],
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        let outcome = Merger::new(loader).run(&config);

        assert_eq!(outcome.merged.len(), 3);
        assert_eq!(outcome.sources[0].stats.total_accepted, 2);
        assert_eq!(outcome.sources[1].stats.total_accepted, 1);
        assert_eq!(outcome.sources[1].stats.duplicates, 1);
        assert_eq!(outcome.sources[2].stats.duplicates, 1);

        let scopus = outcome.ledger.statistics_for("Scopus");
        assert_eq!(scopus.total_rows, 4);
        assert_eq!(scopus.total_accepted, 3);
        assert_eq!(scopus.duplicates, 1);
        assert_eq!(outcome.totals().total_rows, 5);
    }

    #[test]
    fn na_doi_placeholders_fall_through_to_title_pass() {
        let dir = tempfile::TempDir::new().unwrap();
        let pubmed = dir.path().join("pubmed.csv");
        std::fs::write(
            &pubmed,
            "Title,Abstract,DOI\nPaper One,x,N/A\nPaper Two,y,N/A\nPaper Three,z,NA\n",
        )
        .unwrap();
        let config = MergeConfig {
            sources: vec![SourceConfig::new(&pubmed, "PubMed")],
            ..Default::default()
        };

        let outcome = merge_sources(&config);

        assert_eq!(outcome.merged.len(), 3);
        assert!(
            outcome
                .ledger
                .entries()
                .iter()
                .all(|e| e.reason == Reason::UniqueTitle && e.doi.is_none())
        );
        assert_eq!(outcome.sources[0].stats.title_based_accepted, 3);
    }

    #[test]
    fn runs_do_not_share_state() {
        let loader = MemoryLoader::default().with("A", &[("10.1/1", "One")]);
        let merger = Merger::new(loader);

        let first = merger.run(&config(&["A"]));
        let second = merger.run(&config(&["A"]));
        assert_eq!(first.merged.len(), 1);
        assert_eq!(second.merged.len(), 1);
    }

    #[test]
    fn merge_run_can_be_fed_directly() {
        let mut run = MergeRun::new();
        let a = vec![Record::new("A").with_doi("10.1/X").with_title("Foo")];
        let b = vec![Record::new("B").with_title("FOO")];

        run.ingest("A", &a);
        let stats = run.ingest("B", &b);

        assert_eq!(stats.duplicates, 1);
        assert_eq!(run.merged().len(), 1);
        assert_eq!(run.ledger().len(), 2);
    }

    #[test]
    fn csv_sources_end_to_end() {
        let dir = tempfile::TempDir::new().unwrap();
        let scopus = dir.path().join("scopus.csv");
        let ieee = dir.path().join("ieee.csv");
        std::fs::write(
            &scopus,
            "Title,Abstract,DOI\nFoo,About foo,10.1/X\nFoo,Dup,\n",
        )
        .unwrap();
        std::fs::write(
            &ieee,
            "Document Title,DOI\nBar,10.1/x\nBaz,\n",
        )
        .unwrap();

        let mut ieee_source = SourceConfig::new(&ieee, "IEEE");
        ieee_source.title_col = Some("Document Title".to_string());
        let config = MergeConfig {
            sources: vec![
                SourceConfig::new(&scopus, "Scopus"),
                ieee_source,
                SourceConfig::new(dir.path().join("missing.csv"), "PubMed"),
            ],
            output: OutputConfig {
                merged: dir.path().join("all.csv"),
                log: dir.path().join("processing_log.csv"),
            },
            ..Default::default()
        };

        let outcome = merge_sources(&config);
        assert_eq!(outcome.merged.len(), 2);
        assert_eq!(outcome.sources[1].missing_columns, vec!["Abstract"]);
        assert!(matches!(outcome.sources[2].status, SourceStatus::Unavailable(_)));

        outcome.write(&config.output).unwrap();
        let merged = std::fs::read_to_string(&config.output.merged).unwrap();
        assert_eq!(
            merged,
            "Title,Abstract,DOI,DB\nFoo,About foo,10.1/X,Scopus\nBaz,,,IEEE\n"
        );
        let log = std::fs::read_to_string(&config.output.log).unwrap();
        assert_eq!(log.lines().count(), 5);
    }
}
