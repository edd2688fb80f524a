//! Error types emitted by the geozip CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use geozip_core::SqliteRegionStoreError;
use geozip_ingest::{IngestError, LedgerError};
use thiserror::Error;

/// Errors emitted by the geozip CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        /// Flag naming the path.
        field: &'static str,
        /// Path that was checked.
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        /// Flag naming the path.
        field: &'static str,
        /// Path that was checked.
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        /// Flag naming the path.
        field: &'static str,
        /// Path that was checked.
        path: Utf8PathBuf,
        /// Source error from the filesystem.
        #[source]
        source: std::io::Error,
    },
    /// Opening the input file failed.
    #[error("failed to open input at {path:?}: {source}")]
    OpenInput {
        /// Input path.
        path: Utf8PathBuf,
        /// Source error from the filesystem.
        #[source]
        source: std::io::Error,
    },
    /// Opening the region store failed.
    #[error("failed to open region store: {0}")]
    OpenStore(#[source] Box<SqliteRegionStoreError>),
    /// Loading the previous run's ledger failed.
    #[error("failed to load retry ledger: {0}")]
    RetryLedger(#[source] LedgerError),
    /// Creating this run's ledger failed.
    #[error("failed to create error ledger: {0}")]
    CreateLedger(#[source] LedgerError),
    /// The ingestion run stopped.
    #[error("ingestion stopped: {0}")]
    Ingest(#[from] IngestError),
    /// Writing the run summary failed.
    #[error("failed to write run summary: {0}")]
    WriteSummary(#[source] std::io::Error),
}
