//! CSV serialization of the merged collection and the decision log.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::error::{MergeError, Result};
use crate::ledger::DecisionLedger;
use crate::models::Record;

#[derive(Serialize)]
struct MergedRow<'a> {
    #[serde(rename = "Title")]
    title: &'a str,
    #[serde(rename = "Abstract")]
    abstract_text: &'a str,
    #[serde(rename = "DOI")]
    doi: &'a str,
    #[serde(rename = "DB")]
    db: &'a str,
}

#[derive(Serialize)]
struct LogRow<'a> {
    #[serde(rename = "Source_File")]
    source_file: &'a str,
    #[serde(rename = "Row_Index")]
    row_index: usize,
    #[serde(rename = "Title")]
    title: &'a str,
    #[serde(rename = "Abstract")]
    abstract_text: &'a str,
    #[serde(rename = "DOI")]
    doi: &'a str,
    #[serde(rename = "Selected")]
    selected: &'static str,
    #[serde(rename = "Reason")]
    reason: String,
}

/// Write `Title,Abstract,DOI,DB` rows to any writer.
pub fn write_merged_to<W: Write>(writer: W, records: &[Record]) -> std::result::Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    if records.is_empty() {
        csv_writer.write_record(["Title", "Abstract", "DOI", "DB"])?;
    }
    for record in records {
        csv_writer.serialize(MergedRow {
            title: record.title.as_deref().unwrap_or_default(),
            abstract_text: record.abstract_text.as_deref().unwrap_or_default(),
            doi: record.doi.as_deref().unwrap_or_default(),
            db: &record.source_label,
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write `Source_File,Row_Index,Title,Abstract,DOI,Selected,Reason` rows.
pub fn write_ledger_to<W: Write>(
    writer: W,
    ledger: &DecisionLedger,
) -> std::result::Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    if ledger.is_empty() {
        csv_writer.write_record([
            "Source_File",
            "Row_Index",
            "Title",
            "Abstract",
            "DOI",
            "Selected",
            "Reason",
        ])?;
    }
    for entry in ledger {
        csv_writer.serialize(LogRow {
            source_file: &entry.source_label,
            row_index: entry.position,
            title: entry.title.as_deref().unwrap_or_default(),
            abstract_text: entry.abstract_text.as_deref().unwrap_or_default(),
            doi: entry.doi.as_deref().unwrap_or_default(),
            selected: if entry.accepted { "YES" } else { "NO" },
            reason: entry.reason.to_string(),
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_merged(path: &Path, records: &[Record]) -> Result<()> {
    let file = create(path)?;
    write_merged_to(file, records).map_err(|source| output_error(path, source))
}

pub fn write_ledger(path: &Path, ledger: &DecisionLedger) -> Result<()> {
    let file = create(path)?;
    write_ledger_to(file, ledger).map_err(|source| output_error(path, source))
}

fn create(path: &Path) -> Result<fs::File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(fs::File::create(path)?)
}

fn output_error(path: &Path, source: csv::Error) -> MergeError {
    MergeError::Output {
        path: path.display().to_string(),
        source,
    }
}
