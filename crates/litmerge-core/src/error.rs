use thiserror::Error;

/// Fatal errors surfaced by a merge run.
///
/// Source-level problems never show up here: they are reported as
/// [`LoadError`] and absorbed by the aggregator.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Failed to write {path}: {source}")]
    Output {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Why a single source could not contribute any records.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("source unavailable: {path}: {reason}")]
    SourceUnavailable { path: String, reason: String },

    #[error("malformed source: {path}: {reason}")]
    MalformedSource { path: String, reason: String },
}

/// Exit codes used by the CLI.
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    InvalidArgs = 3,
    FileSystemError = 4,
}

impl MergeError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            MergeError::ConfigError(_) | MergeError::TomlParse(_) => ExitCode::InvalidArgs,
            MergeError::Output { .. } | MergeError::Io(_) => ExitCode::FileSystemError,
            _ => ExitCode::GeneralError,
        }
    }
}

pub type Result<T> = std::result::Result<T, MergeError>;
