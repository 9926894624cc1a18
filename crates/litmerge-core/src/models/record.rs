use serde::{Deserialize, Serialize};

use crate::normalize::normalize_key;

/// One paper as read from a source, before any dedup decision.
///
/// `None` means the cell was empty or the column was missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub title: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub doi: Option<String>,
    pub source_label: String,
}

impl Record {
    pub fn new(source_label: impl Into<String>) -> Self {
        Self {
            title: None,
            abstract_text: None,
            doi: None,
            source_label: source_label.into(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_abstract(mut self, abstract_text: impl Into<String>) -> Self {
        self.abstract_text = Some(abstract_text.into());
        self
    }

    pub fn with_doi(mut self, doi: impl Into<String>) -> Self {
        self.doi = Some(doi.into());
        self
    }

    pub fn doi_key(&self) -> String {
        normalize_key(self.doi.as_deref())
    }

    pub fn title_key(&self) -> String {
        normalize_key(self.title.as_deref())
    }
}
