use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MergeError, Result};

/// File name looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "litmerge.toml";

/// Root run configuration, loaded from `litmerge.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub columns: ColumnNames,
    pub output: OutputConfig,
    /// Processed strictly in this order.
    pub sources: Vec<SourceConfig>,
}

/// Names of the title/abstract/DOI columns in a CSV export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub doi: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub merged: PathBuf,
    pub log: PathBuf,
}

/// One input export plus optional per-source column overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub file: PathBuf,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_col: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abstract_col: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi_col: Option<String>,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            columns: ColumnNames::default(),
            output: OutputConfig::default(),
            sources: vec![
                SourceConfig::new("scopus.csv", "Scopus"),
                SourceConfig::new("ieee.csv", "IEEE"),
                SourceConfig::new("pubmed.csv", "PubMed"),
                SourceConfig::new("wos.csv", "WOS"),
            ],
        }
    }
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            title: "Title".to_string(),
            abstract_text: "Abstract".to_string(),
            doi: "DOI".to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            merged: PathBuf::from("all.csv"),
            log: PathBuf::from("processing_log.csv"),
        }
    }
}

// ─── Sources ───────────────────────────────────────────────

impl SourceConfig {
    pub fn new(file: impl Into<PathBuf>, label: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            label: label.into(),
            title_col: None,
            abstract_col: None,
            doi_col: None,
        }
    }

    /// Column names for this source, falling back to the run-wide defaults.
    pub fn columns(&self, defaults: &ColumnNames) -> ColumnNames {
        ColumnNames {
            title: self.title_col.clone().unwrap_or_else(|| defaults.title.clone()),
            abstract_text: self
                .abstract_col
                .clone()
                .unwrap_or_else(|| defaults.abstract_text.clone()),
            doi: self.doi_col.clone().unwrap_or_else(|| defaults.doi.clone()),
        }
    }
}

/// Parses `FILE` or `FILE=LABEL`. Without a label the file stem is used.
impl FromStr for SourceConfig {
    type Err = MergeError;

    fn from_str(s: &str) -> Result<Self> {
        let (file, label) = match s.split_once('=') {
            Some((file, label)) => (file.trim(), label.trim().to_string()),
            None => {
                let file = s.trim();
                let stem = Path::new(file)
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().to_string())
                    .unwrap_or_default();
                (file, stem)
            }
        };

        if file.is_empty() {
            return Err(MergeError::ConfigError(format!("missing file in source '{s}'")));
        }
        if label.is_empty() {
            return Err(MergeError::ConfigError(format!("missing label in source '{s}'")));
        }

        Ok(Self::new(file, label))
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl MergeConfig {
    /// Config file path: `$LITMERGE_CONFIG`, else `./litmerge.toml`.
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("LITMERGE_CONFIG") {
            return PathBuf::from(path);
        }
        PathBuf::from(DEFAULT_CONFIG_FILE)
    }

    /// Load config from the standard path, falling back to defaults if the
    /// file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    /// Every source needs a file and a non-empty label. Labels may repeat.
    pub fn validate(&self) -> Result<()> {
        for source in &self.sources {
            if source.label.trim().is_empty() {
                return Err(MergeError::ConfigError(format!(
                    "source {} has an empty label",
                    source.file.display()
                )));
            }
            if source.file.as_os_str().is_empty() {
                return Err(MergeError::ConfigError(format!(
                    "source '{}' has an empty file path",
                    source.label
                )));
            }
        }
        Ok(())
    }
}
