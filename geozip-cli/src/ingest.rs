//! Ingest command implementation for the geozip CLI.

use std::io::{BufReader, Write};

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, ValueEnum};
use geozip_core::SqliteRegionStore;
use geozip_ingest::{
    DEFAULT_ITEM_SIZE_LIMIT, DecodeFailurePolicy, ErrorLedger, IngestDriver, IngestMode,
    IngestOptions, IngestReport, ProbeFailurePolicy, load_failed_zips,
};
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_INPUT, ARG_RETRY_LEDGER, CliError, DEFAULT_INPUT, DEFAULT_LEDGER, DEFAULT_RETRY_LEDGER,
    DEFAULT_STORE,
};

/// Which records an ingest run considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum ModeArg {
    /// Every record at or after the cursor.
    #[default]
    Full,
    /// Only records whose zip appears in the retry ledger.
    RetryOnly,
}

/// Handling of input lines that cannot be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum DecodeErrorArg {
    /// Stop the run.
    #[default]
    Abort,
    /// Write a ledger row and continue.
    Record,
}

impl From<DecodeErrorArg> for DecodeFailurePolicy {
    fn from(arg: DecodeErrorArg) -> Self {
        match arg {
            DecodeErrorArg::Abort => Self::Abort,
            DecodeErrorArg::Record => Self::Record,
        }
    }
}

/// Handling of failed existence probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum ProbeErrorArg {
    /// Treat the zip as absent and insert.
    #[default]
    Insert,
    /// Write a ledger row and skip the write.
    Record,
}

impl From<ProbeErrorArg> for ProbeFailurePolicy {
    fn from(arg: ProbeErrorArg) -> Self {
        match arg {
            ProbeErrorArg::Insert => Self::Insert,
            ProbeErrorArg::Record => Self::Record,
        }
    }
}

/// CLI arguments for the `ingest` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Upsert newline-delimited region records into the region \
                 store. Failed writes are recorded in a CSV ledger that a \
                 later retry-only run can replay. Settings can come from CLI \
                 flags, configuration files, or environment variables.",
    about = "Ingest region records into the region store"
)]
#[ortho_config(prefix = "GEOZIP")]
pub(crate) struct IngestArgs {
    /// Newline-delimited JSON file of region records.
    #[arg(long = ARG_INPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) input: Option<Utf8PathBuf>,
    /// SQLite database holding the region store.
    #[arg(long, value_name = "path")]
    #[serde(default)]
    pub(crate) store: Option<Utf8PathBuf>,
    /// CSV ledger this run writes failures to (truncated at start).
    #[arg(long, value_name = "path")]
    #[serde(default)]
    pub(crate) ledger: Option<Utf8PathBuf>,
    /// Number of leading records to skip.
    #[arg(long, value_name = "n")]
    #[serde(default)]
    pub(crate) cursor: Option<u64>,
    /// Process every record or only those in the retry ledger.
    #[arg(long, value_enum)]
    #[serde(default)]
    pub(crate) mode: Option<ModeArg>,
    /// Ledger from a previous run, read in retry-only mode.
    #[arg(long = ARG_RETRY_LEDGER, value_name = "path")]
    #[serde(default)]
    pub(crate) retry_ledger: Option<Utf8PathBuf>,
    /// Stop on undecodable lines or record them and continue.
    #[arg(long, value_enum)]
    #[serde(default)]
    pub(crate) on_decode_error: Option<DecodeErrorArg>,
    /// Insert or record when an existence probe fails.
    #[arg(long, value_enum)]
    #[serde(default)]
    pub(crate) on_probe_error: Option<ProbeErrorArg>,
    /// Serialized item size, in bytes, above which a warning is logged.
    #[arg(long, value_name = "bytes")]
    #[serde(default)]
    pub(crate) item_size_limit: Option<usize>,
}

impl IngestArgs {
    pub(crate) fn into_config(self) -> Result<IngestConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        Ok(IngestConfig::from(merged))
    }
}

/// Resolved `ingest` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IngestConfig {
    /// Input NDJSON file.
    pub(crate) input: Utf8PathBuf,
    /// SQLite store path.
    pub(crate) store: Utf8PathBuf,
    /// Ledger written by this run.
    pub(crate) ledger: Utf8PathBuf,
    /// Records to skip.
    pub(crate) cursor: u64,
    /// Record selection.
    pub(crate) mode: ModeArg,
    /// Ledger read in retry-only mode.
    pub(crate) retry_ledger: Utf8PathBuf,
    /// Undecodable line handling.
    pub(crate) decode_policy: DecodeFailurePolicy,
    /// Probe failure handling.
    pub(crate) probe_policy: ProbeFailurePolicy,
    /// Oversize warning threshold.
    pub(crate) item_size_limit: usize,
}

impl IngestConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        Self::require_existing(&self.input, ARG_INPUT)?;
        if self.mode == ModeArg::RetryOnly {
            Self::require_existing(&self.retry_ledger, ARG_RETRY_LEDGER)?;
        }
        Ok(())
    }

    fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
        match geozip_fs::file_is_file(path) {
            Ok(true) => Ok(()),
            Ok(false) => Err(CliError::SourcePathNotFile {
                field,
                path: path.to_path_buf(),
            }),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                Err(CliError::MissingSourceFile {
                    field,
                    path: path.to_path_buf(),
                })
            }
            Err(source) => Err(CliError::InspectSourcePath {
                field,
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Build driver options, reading the retry ledger when needed.
    fn ingest_options(&self) -> Result<IngestOptions, CliError> {
        let mode = match self.mode {
            ModeArg::Full => IngestMode::Full,
            ModeArg::RetryOnly => {
                let filter =
                    load_failed_zips(&self.retry_ledger).map_err(CliError::RetryLedger)?;
                info!(
                    "retrying {} zips from {}",
                    filter.len(),
                    self.retry_ledger
                );
                IngestMode::RetryOnly(filter)
            }
        };
        Ok(IngestOptions {
            cursor: self.cursor,
            mode,
            decode_policy: self.decode_policy,
            probe_policy: self.probe_policy,
            item_size_limit: self.item_size_limit,
        })
    }
}

impl From<IngestArgs> for IngestConfig {
    fn from(args: IngestArgs) -> Self {
        Self {
            input: args.input.unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_INPUT)),
            store: args.store.unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_STORE)),
            ledger: args.ledger.unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_LEDGER)),
            cursor: args.cursor.unwrap_or_default(),
            mode: args.mode.unwrap_or_default(),
            retry_ledger: args
                .retry_ledger
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_RETRY_LEDGER)),
            decode_policy: args.on_decode_error.unwrap_or_default().into(),
            probe_policy: args.on_probe_error.unwrap_or_default().into(),
            item_size_limit: args.item_size_limit.unwrap_or(DEFAULT_ITEM_SIZE_LIMIT),
        }
    }
}

pub(crate) fn run_ingest(args: IngestArgs) -> Result<IngestReport, CliError> {
    let mut stdout = std::io::stdout().lock();
    run_ingest_with(args, &mut stdout)
}

pub(crate) fn run_ingest_with(
    args: IngestArgs,
    writer: &mut dyn Write,
) -> Result<IngestReport, CliError> {
    let config = resolve_ingest_config(args)?;
    let report = execute_ingest(&config)?;
    write_summary(writer, &config, &report)?;
    Ok(report)
}

fn resolve_ingest_config(args: IngestArgs) -> Result<IngestConfig, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    Ok(config)
}

/// Run the driver for a validated configuration.
///
/// The retry ledger is read before this run's ledger is created so both may
/// name the same file.
pub(crate) fn execute_ingest(config: &IngestConfig) -> Result<IngestReport, CliError> {
    let options = config.ingest_options()?;
    let mut store = SqliteRegionStore::open(&config.store)
        .map_err(|source| CliError::OpenStore(Box::new(source)))?;
    let mut ledger = ErrorLedger::create(&config.ledger).map_err(CliError::CreateLedger)?;
    let input = geozip_fs::open_utf8_file(&config.input).map_err(|source| {
        CliError::OpenInput {
            path: config.input.clone(),
            source,
        }
    })?;

    info!(
        "ingesting {} into {} from cursor {}",
        config.input, config.store, config.cursor
    );
    let mut driver = IngestDriver::new(&mut store, &mut ledger, options);
    Ok(driver.run(BufReader::new(input))?)
}

fn write_summary(
    writer: &mut dyn Write,
    config: &IngestConfig,
    report: &IngestReport,
) -> Result<(), CliError> {
    writeln!(
        writer,
        "{} lines read: {} inserted, {} updated, {} failed, {} skipped before cursor, {} filtered",
        report.lines,
        report.inserted,
        report.updated,
        report.failed,
        report.skipped,
        report.filtered,
    )
    .map_err(CliError::WriteSummary)?;
    if report.decode_failures > 0 {
        writeln!(writer, "{} undecodable lines", report.decode_failures)
            .map_err(CliError::WriteSummary)?;
    }
    if report.oversized > 0 {
        writeln!(writer, "{} oversized items", report.oversized)
            .map_err(CliError::WriteSummary)?;
    }
    let ledgered = report.failed + report.decode_failures;
    if ledgered > 0 {
        writeln!(writer, "{ledgered} failures recorded in {}", config.ledger)
            .map_err(CliError::WriteSummary)?;
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<IngestConfig, CliError> {
    let merged = IngestArgs::merge_from_layers(layers).map_err(CliError::from)?;
    Ok(IngestConfig::from(merged))
}
