//! Reading one source export into uniform [`Record`]s.

use std::fs::File;
use std::io::{BufReader, Read};

use crate::config::{ColumnNames, SourceConfig};
use crate::error::LoadError;
use crate::models::Record;
use crate::normalize::is_missing;

/// Records of one source in file order, plus the configured columns that the
/// file did not have. Missing columns read as absent for every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedSource {
    pub records: Vec<Record>,
    pub missing_columns: Vec<String>,
}

pub trait SourceLoader {
    fn load(
        &self,
        source: &SourceConfig,
        columns: &ColumnNames,
    ) -> std::result::Result<LoadedSource, LoadError>;
}

/// Loads comma-separated exports with a header row.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvSourceLoader;

impl SourceLoader for CsvSourceLoader {
    fn load(
        &self,
        source: &SourceConfig,
        columns: &ColumnNames,
    ) -> std::result::Result<LoadedSource, LoadError> {
        let path = source.file.display().to_string();
        let file = File::open(&source.file).map_err(|e| LoadError::SourceUnavailable {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        read_records(BufReader::new(file), &source.label, columns).map_err(|e| {
            LoadError::MalformedSource {
                path,
                reason: e.to_string(),
            }
        })
    }
}

/// Parse CSV from any reader.
///
/// Short rows are allowed and their trailing cells read as absent. A row with
/// more fields than the header is a parse error. Empty cells and the usual NA
/// placeholders (`N/A`, `NULL`, `NaN`, ...) read as absent.
pub fn read_records<R: Read>(
    reader: R,
    label: &str,
    columns: &ColumnNames,
) -> std::result::Result<LoadedSource, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    let find = |name: &str| headers.iter().position(|h| h == name);

    let title_idx = find(columns.title.as_str());
    let abstract_idx = find(columns.abstract_text.as_str());
    let doi_idx = find(columns.doi.as_str());

    let mut missing_columns = Vec::new();
    for (name, idx) in [
        (&columns.title, title_idx),
        (&columns.abstract_text, abstract_idx),
        (&columns.doi, doi_idx),
    ] {
        if idx.is_none() && !missing_columns.contains(name) {
            missing_columns.push(name.clone());
        }
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        if row.len() > headers.len() {
            return Err(csv::Error::from(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "expected at most {} fields, found {} on line {}",
                    headers.len(),
                    row.len(),
                    row.position().map_or(0, |p| p.line())
                ),
            )));
        }
        let cell = |idx: Option<usize>| {
            idx.and_then(|i| row.get(i))
                .filter(|value| !is_missing(value))
                .map(str::to_string)
        };
        records.push(Record {
            title: cell(title_idx),
            abstract_text: cell(abstract_idx),
            doi: cell(doi_idx),
            source_label: label.to_string(),
        });
    }

    Ok(LoadedSource {
        records,
        missing_columns,
    })
}
