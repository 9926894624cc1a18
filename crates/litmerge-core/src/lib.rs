//! litmerge core: merges literature database exports with DOI/title dedup
//! and a row-level decision log.

pub mod config;
pub mod error;
pub mod ledger;
pub mod loader;
pub mod merge;
pub mod models;
pub mod normalize;
pub mod report;
pub mod resolver;
pub mod writer;

pub use config::{ColumnNames, MergeConfig, OutputConfig, SourceConfig};
pub use error::{ExitCode, LoadError, MergeError, Result};
pub use ledger::{DecisionLedger, LedgerSummary};
pub use loader::{CsvSourceLoader, LoadedSource, SourceLoader};
pub use merge::{MergeOutcome, MergeRun, Merger, SourceReport, SourceStatus, merge_sources};
pub use models::*;
pub use report::RunReport;
pub use resolver::{IdentityResolver, Resolution, SeenKeys};
