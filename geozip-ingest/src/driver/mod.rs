//! Sequential ingestion of a newline-delimited region file.
//!
//! The driver reads one line at a time, numbers it, consults the
//! [`ResumeController`], decodes the line and hands the region to the
//! [`UpsertResolver`]. Both pipelines share this loop: a full run processes
//! every record at or after the cursor, while a retry-only run additionally
//! drops records whose zip is absent from the previous run's ledger.

use std::io::{BufRead, Write};

use geozip_core::{RegionItem, RegionStore};
use log::{info, warn};
use thiserror::Error;

use crate::decode::{MalformedRecordError, decode_record};
use crate::ledger::{ErrorLedger, LedgerError, RetryFilter};
use crate::resume::{ResumeController, ResumeDecision};
use crate::upsert::{ProbeFailurePolicy, UpsertOutcome, UpsertResolver};

/// Largest serialized item, in bytes, accepted without a warning.
pub const DEFAULT_ITEM_SIZE_LIMIT: usize = 400 * 1024;

/// Which records a run considers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum IngestMode {
    /// Every record at or after the cursor.
    #[default]
    Full,
    /// Only records whose zip failed in a previous run.
    RetryOnly(RetryFilter),
}

impl IngestMode {
    fn admits(&self, zip: geozip_core::Zip) -> bool {
        match self {
            Self::Full => true,
            Self::RetryOnly(filter) => filter.contains(zip),
        }
    }
}

/// What to do with a line that cannot be decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecodeFailurePolicy {
    /// Stop the run and return the decode error.
    #[default]
    Abort,
    /// Ledger the failure with whatever zip could be read and continue.
    Record,
}

/// Parameters of one ingestion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOptions {
    /// Number of leading lines to skip.
    pub cursor: u64,
    /// Record selection.
    pub mode: IngestMode,
    /// Handling of undecodable lines.
    pub decode_policy: DecodeFailurePolicy,
    /// Handling of failed existence probes.
    pub probe_policy: ProbeFailurePolicy,
    /// Serialized size above which an item is reported as oversized.
    pub item_size_limit: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            cursor: 0,
            mode: IngestMode::Full,
            decode_policy: DecodeFailurePolicy::Abort,
            probe_policy: ProbeFailurePolicy::Insert,
            item_size_limit: DEFAULT_ITEM_SIZE_LIMIT,
        }
    }
}

/// Counts gathered over one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Lines read, including skipped and blank ones.
    pub lines: u64,
    /// Lines before the cursor.
    pub skipped: u64,
    /// Records left out by a retry-only run.
    pub filtered: u64,
    /// Records written as new documents.
    pub inserted: u64,
    /// Records that replaced an existing centre and outline.
    pub updated: u64,
    /// Records whose store calls failed and were ledgered.
    pub failed: u64,
    /// Lines that could not be decoded and were ledgered.
    pub decode_failures: u64,
    /// Records whose serialized item exceeded the size limit.
    pub oversized: u64,
}

impl IngestReport {
    /// Records that reached the store.
    #[must_use]
    pub const fn attempted(&self) -> u64 {
        self.inserted + self.updated + self.failed
    }

    fn record_outcome(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Inserted => self.inserted += 1,
            UpsertOutcome::Updated => self.updated += 1,
            UpsertOutcome::Failed { .. } => self.failed += 1,
        }
    }
}

/// Errors that stop a run.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The source could not be read.
    #[error("failed to read input at line {line}")]
    Read {
        /// 1-based line being read.
        line: u64,
        /// Source error from the reader.
        #[source]
        source: std::io::Error,
    },
    /// A line could not be decoded under [`DecodeFailurePolicy::Abort`].
    #[error(transparent)]
    Decode(#[from] MalformedRecordError),
    /// The error ledger could not be written.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Drives records from a reader into a store.
///
/// # Examples
/// ```
/// use geozip_core::{RegionStore, Zip, test_support::MemoryRegionStore};
/// use geozip_ingest::{ErrorLedger, IngestDriver, IngestOptions};
///
/// let input = "{\"zip\":10001,\"centerLat\":40.75,\"centerLng\":-73.99}\n";
/// let mut store = MemoryRegionStore::default();
/// let mut ledger = ErrorLedger::from_writer(Vec::new())?;
///
/// let report = IngestDriver::new(&mut store, &mut ledger, IngestOptions::default())
///     .run(input.as_bytes())?;
///
/// assert_eq!(report.inserted, 1);
/// assert!(store.probe(Zip::new(10001))?);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct IngestDriver<'a, S: RegionStore + ?Sized, W: Write> {
    resolver: UpsertResolver<'a, S>,
    ledger: &'a mut ErrorLedger<W>,
    resume: ResumeController,
    mode: IngestMode,
    decode_policy: DecodeFailurePolicy,
    item_size_limit: usize,
}

impl<'a, S: RegionStore + ?Sized, W: Write> IngestDriver<'a, S, W> {
    /// Driver writing to `store` and ledgering failures to `ledger`.
    pub fn new(store: &'a mut S, ledger: &'a mut ErrorLedger<W>, options: IngestOptions) -> Self {
        let IngestOptions {
            cursor,
            mode,
            decode_policy,
            probe_policy,
            item_size_limit,
        } = options;
        Self {
            resolver: UpsertResolver::new(store).with_probe_policy(probe_policy),
            ledger,
            resume: ResumeController::new(cursor),
            mode,
            decode_policy,
            item_size_limit,
        }
    }

    /// Process every line of `reader`.
    ///
    /// Every line advances the counter, so the cursor is an absolute line
    /// position. A blank line at or after the cursor is undecodable and is
    /// handled by the [`DecodeFailurePolicy`]. Per-record store failures are
    /// ledgered and do not stop the run.
    pub fn run<R: BufRead>(&mut self, mut reader: R) -> Result<IngestReport, IngestError> {
        let mut report = IngestReport::default();
        let mut line = String::new();
        let mut line_number = 0_u64;

        loop {
            line.clear();
            match reader.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => line_number += 1,
                Err(source) => {
                    return Err(IngestError::Read {
                        line: line_number + 1,
                        source,
                    });
                }
            }

            let counter = line_number - 1;
            self.process_line(counter, &line, line_number, &mut report)?;
        }

        report.lines = line_number;
        info!(
            "ingested {} lines: {} skipped, {} filtered, {} inserted, {} updated, {} failed, {} undecodable, {} oversized",
            report.lines,
            report.skipped,
            report.filtered,
            report.inserted,
            report.updated,
            report.failed,
            report.decode_failures,
            report.oversized,
        );
        Ok(report)
    }

    /// Handle the line at position `counter`.
    ///
    /// The cursor is consulted before decoding, so lines before it are
    /// never validated and a malformed line there does not stop the run.
    fn process_line(
        &mut self,
        counter: u64,
        line: &str,
        line_number: u64,
        report: &mut IngestReport,
    ) -> Result<(), IngestError> {
        if self.resume.decide(counter) == ResumeDecision::Skip {
            info!("Skipping {counter}");
            report.skipped += 1;
            return Ok(());
        }

        let region = match decode_record(line, line_number) {
            Ok(region) => region,
            Err(err) => return self.handle_decode_failure(counter, err, report),
        };
        if !self.mode.admits(region.zip) {
            info!("Skipping {counter}, zip {} not in retry ledger", region.zip);
            report.filtered += 1;
            return Ok(());
        }

        info!("Processing {counter}");
        let item = RegionItem::from(&region);
        if item
            .encoded_len()
            .is_ok_and(|len| len > self.item_size_limit)
        {
            warn!(
                "item #{counter} for zip {} exceeds {} bytes",
                region.zip, self.item_size_limit
            );
            report.oversized += 1;
        }

        let outcome = self.resolver.resolve_item(counter, &item, self.ledger)?;
        report.record_outcome(outcome);
        Ok(())
    }

    fn handle_decode_failure(
        &mut self,
        counter: u64,
        err: MalformedRecordError,
        report: &mut IngestReport,
    ) -> Result<(), IngestError> {
        match self.decode_policy {
            DecodeFailurePolicy::Abort => Err(IngestError::Decode(err)),
            DecodeFailurePolicy::Record => {
                warn!("item #{counter}: {err}");
                self.ledger.record(counter, err.zip(), &err.to_string())?;
                report.decode_failures += 1;
                Ok(())
            }
        }
    }
}
