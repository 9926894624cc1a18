//! Human-readable and JSON summaries of a finished run.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::OutputConfig;
use crate::ledger::LedgerSummary;
use crate::merge::{MergeOutcome, SourceReport, SourceStatus};
use crate::models::RunTotals;

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub sources: Vec<SourceReport>,
    pub totals: RunTotals,
    pub ledger: LedgerSummary,
    pub merged_path: PathBuf,
    pub log_path: PathBuf,
    pub merged_papers: usize,
}

impl RunReport {
    pub fn new(outcome: &MergeOutcome, output: &OutputConfig) -> Self {
        Self {
            generated_at: Utc::now(),
            sources: outcome.sources.clone(),
            totals: outcome.totals(),
            ledger: outcome.ledger.summary(),
            merged_path: output.merged.clone(),
            log_path: output.log.clone(),
            merged_papers: outcome.merged.len(),
        }
    }

    /// Summary table plus dedup, output and log figures.
    pub fn render(&self) -> String {
        let mut lines = Vec::new();
        lines.push("=== SUMMARY STATISTICS ===".to_string());
        lines.push(table_row(
            "Database",
            "Total Rows",
            "DOI-based",
            "Title-only",
            "Total Added",
        ));
        lines.push("-".repeat(60));

        for source in &self.sources {
            let s = &source.stats;
            lines.push(table_row(
                &s.label,
                &s.total_rows.to_string(),
                &s.doi_based_accepted.to_string(),
                &s.title_based_accepted.to_string(),
                &s.total_accepted.to_string(),
            ));
        }

        lines.push("-".repeat(60));
        lines.push(table_row(
            "TOTAL",
            &self.totals.total_rows.to_string(),
            "",
            "",
            &self.totals.total_accepted.to_string(),
        ));

        let problems: Vec<&SourceReport> = self
            .sources
            .iter()
            .filter(|s| s.status != SourceStatus::Loaded || !s.missing_columns.is_empty())
            .collect();
        if !problems.is_empty() {
            lines.push(String::new());
            lines.push("Source warnings:".to_string());
            for source in problems {
                let label = &source.stats.label;
                lines.push(match &source.status {
                    SourceStatus::Loaded => format!(
                        "  - {label}: missing columns {}",
                        source.missing_columns.join(", ")
                    ),
                    SourceStatus::Unavailable(reason) => format!(
                        "  - {label}: file not found or unreadable ({}): {reason}",
                        source.file.display()
                    ),
                    SourceStatus::Malformed(reason) => format!(
                        "  - {label}: could not parse {}: {reason}",
                        source.file.display()
                    ),
                });
            }
        }

        lines.push(String::new());
        lines.push("Deduplication Results:".to_string());
        lines.push(format!("  - Original total rows: {}", self.totals.total_rows));
        lines.push(format!("  - Final unique papers: {}", self.totals.total_accepted));
        lines.push(format!("  - Duplicates removed: {}", self.totals.duplicates_removed));
        if let Some(rate) = self.totals.dedup_rate {
            lines.push(format!("  - Deduplication rate: {:.1}%", rate * 100.0));
        }

        lines.push(String::new());
        lines.push("Files created:".to_string());
        lines.push(format!(
            "  - {}: Final merged dataset ({} unique papers)",
            self.merged_path.display(),
            self.merged_papers
        ));
        lines.push(format!(
            "  - {}: Detailed log of every row processed ({} total rows)",
            self.log_path.display(),
            self.ledger.processed
        ));

        if let Some(rate) = self.ledger.selection_rate {
            lines.push(String::new());
            lines.push("Log Summary:".to_string());
            lines.push(format!("  - Total rows processed: {}", self.ledger.processed));
            lines.push(format!("  - Rows selected: {}", self.ledger.selected));
            lines.push(format!("  - Rows rejected: {}", self.ledger.rejected));
            lines.push(format!("  - Selection rate: {:.1}%", rate * 100.0));
        }

        lines.join("\n")
    }
}

fn table_row(label: &str, rows: &str, doi: &str, title: &str, added: &str) -> String {
    format!("{label:<10} {rows:<12} {doi:<12} {title:<12} {added:<12}")
}
