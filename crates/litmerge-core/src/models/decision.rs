use std::fmt;

use serde::Serialize;

use crate::models::Record;

/// Which identity axis let a record through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AcceptBasis {
    Doi,
    Title,
}

/// Outcome of resolving one record against the seen-sets.
///
/// The `Display` text is what ends up in the `Reason` column of the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reason {
    UniqueDoi,
    DuplicateDoi { doi: String },
    UniqueTitle,
    /// `title` holds the truncated normalized title.
    DuplicateTitle { title: String },
    EmptyKeys,
}

impl Reason {
    pub fn is_accepted(&self) -> bool {
        self.basis().is_some()
    }

    pub fn basis(&self) -> Option<AcceptBasis> {
        match self {
            Reason::UniqueDoi => Some(AcceptBasis::Doi),
            Reason::UniqueTitle => Some(AcceptBasis::Title),
            _ => None,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(
            self,
            Reason::DuplicateDoi { .. } | Reason::DuplicateTitle { .. }
        )
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::UniqueDoi => f.write_str("Unique DOI"),
            Reason::DuplicateDoi { doi } => write!(f, "Duplicate DOI (already seen: {doi})"),
            Reason::UniqueTitle => f.write_str("Unique Title (no DOI)"),
            Reason::DuplicateTitle { title } => {
                write!(f, "Duplicate Title (already seen: {title}...)")
            }
            Reason::EmptyKeys => f.write_str("Empty/missing Title and DOI"),
        }
    }
}

/// One row of the audit trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionLogEntry {
    pub source_label: String,
    /// 1-based row position within its source.
    pub position: usize,
    pub title: Option<String>,
    pub abstract_text: Option<String>,
    pub doi: Option<String>,
    pub accepted: bool,
    pub reason: Reason,
}

impl DecisionLogEntry {
    pub fn new(record: &Record, position: usize, reason: Reason) -> Self {
        Self {
            source_label: record.source_label.clone(),
            position,
            title: record.title.clone(),
            abstract_text: record.abstract_text.clone(),
            doi: record.doi.clone(),
            accepted: reason.is_accepted(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_text_matches_log_format() {
        assert_eq!(Reason::UniqueDoi.to_string(), "Unique DOI");
        assert_eq!(Reason::UniqueTitle.to_string(), "Unique Title (no DOI)");
        assert_eq!(
            Reason::DuplicateDoi {
                doi: "10.1/x".to_string()
            }
            .to_string(),
            "Duplicate DOI (already seen: 10.1/x)"
        );
        assert_eq!(
            Reason::DuplicateTitle {
                title: "foo".to_string()
            }
            .to_string(),
            "Duplicate Title (already seen: foo...)"
        );
        assert_eq!(Reason::EmptyKeys.to_string(), "Empty/missing Title and DOI");
    }

    #[test]
    fn only_unique_reasons_accept() {
        assert!(Reason::UniqueDoi.is_accepted());
        assert!(Reason::UniqueTitle.is_accepted());
        assert!(!Reason::EmptyKeys.is_accepted());
        assert!(!Reason::EmptyKeys.is_duplicate());
        assert!(
            Reason::DuplicateDoi {
                doi: "10.1/x".to_string()
            }
            .is_duplicate()
        );
    }

    #[test]
    fn entry_copies_record_fields() {
        let record = Record::new("PubMed").with_title("T").with_doi("10.1/Y");
        let entry = DecisionLogEntry::new(&record, 3, Reason::UniqueDoi);
        assert_eq!(entry.source_label, "PubMed");
        assert_eq!(entry.position, 3);
        assert_eq!(entry.doi.as_deref(), Some("10.1/Y"));
        assert!(entry.accepted);
    }
}
