//! Durable CSV record of per-item failures.
//!
//! The ledger is a three-column table with the header `Counter,Zip,Error`.
//! One row is appended per failed item and flushed immediately so the file
//! is complete up to the last failure even if the process dies mid-run.
//! Error text is sanitized so each row stays on one line with exactly three
//! fields. A ledger from one run feeds the next run's retry filter through
//! [`load_failed_zips`].

use std::io::{self, Write};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs_utf8;
use geozip_core::Zip;
use thiserror::Error;

mod filter;

pub use filter::{RetryFilter, load_failed_zips};

/// Column names written as the first row of every ledger.
pub const LEDGER_HEADER: [&str; 3] = ["Counter", "Zip", "Error"];

/// Errors raised while writing or reading a ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The ledger file could not be created.
    #[error("failed to create error ledger at {path}")]
    Create {
        /// Requested ledger path.
        path: Utf8PathBuf,
        /// Source error from the filesystem.
        #[source]
        source: io::Error,
    },
    /// A previous ledger could not be opened.
    #[error("failed to open error ledger at {path}")]
    Open {
        /// Requested ledger path.
        path: Utf8PathBuf,
        /// Source error from the filesystem.
        #[source]
        source: io::Error,
    },
    /// Writing or flushing a row failed.
    #[error("failed to write error ledger row")]
    Write {
        /// Source error from `csv`.
        #[source]
        source: csv::Error,
    },
    /// Flushing buffered rows to the underlying writer failed.
    #[error("failed to flush error ledger")]
    Flush {
        /// Source error from the writer.
        #[source]
        source: io::Error,
    },
    /// A previous ledger could not be parsed.
    #[error("failed to read error ledger row")]
    Read {
        /// Source error from `csv`.
        #[source]
        source: csv::Error,
    },
    /// A previous ledger does not start with the expected header.
    #[error("error ledger header {found:?} does not match Counter,Zip,Error")]
    Header {
        /// Header row found in the file.
        found: Vec<String>,
    },
}

/// Replace the characters that would break a ledger row.
///
/// Carriage returns, newlines, commas and double quotes are removed, so
/// every row is written as plain `counter,zip,message` text.
///
/// # Examples
/// ```
/// use geozip_ingest::sanitize_message;
///
/// assert_eq!(sanitize_message("timeout,\r\nretry later"), "timeoutretry later");
/// assert_eq!(sanitize_message("invalid zip \"AB12\""), "invalid zip AB12");
/// ```
#[must_use]
pub fn sanitize_message(message: &str) -> String {
    message
        .chars()
        .filter(|c| !matches!(c, '\r' | '\n' | ',' | '"'))
        .collect()
}

/// Append-only CSV writer for per-item failures.
///
/// # Examples
/// ```
/// use geozip_core::Zip;
/// use geozip_ingest::ErrorLedger;
///
/// let mut ledger = ErrorLedger::from_writer(Vec::new())?;
/// ledger.record(4, Some(Zip::new(10001)), "throttled, try again")?;
/// let bytes = ledger.into_inner()?;
///
/// assert_eq!(
///     String::from_utf8_lossy(&bytes),
///     "Counter,Zip,Error\n4,10001,throttled try again\n"
/// );
/// # Ok::<(), geozip_ingest::LedgerError>(())
/// ```
#[derive(Debug)]
pub struct ErrorLedger<W: Write = fs_utf8::File> {
    writer: csv::Writer<W>,
    path: Option<Utf8PathBuf>,
    rows: u64,
}

impl ErrorLedger<fs_utf8::File> {
    /// Create or truncate the ledger at `path` and write the header.
    ///
    /// Missing parent directories are created.
    pub fn create(path: &Utf8Path) -> Result<Self, LedgerError> {
        let file = geozip_fs::create_utf8_file(path).map_err(|source| LedgerError::Create {
            path: path.to_path_buf(),
            source,
        })?;
        let mut ledger = Self::from_writer(file)?;
        ledger.path = Some(path.to_path_buf());
        Ok(ledger)
    }
}

impl<W: Write> ErrorLedger<W> {
    /// Wrap `writer` and write the header row.
    pub fn from_writer(writer: W) -> Result<Self, LedgerError> {
        let mut ledger = Self {
            writer: csv::WriterBuilder::new()
                .terminator(csv::Terminator::Any(b'\n'))
                .from_writer(writer),
            path: None,
            rows: 0,
        };
        ledger.write_row(&LEDGER_HEADER)?;
        Ok(ledger)
    }

    /// Append one failure row and flush it.
    ///
    /// An unknown zip is written as an empty field.
    pub fn record(
        &mut self,
        counter: u64,
        zip: Option<Zip>,
        message: &str,
    ) -> Result<(), LedgerError> {
        let counter_field = counter.to_string();
        let zip_field = zip.map(|known| known.to_string()).unwrap_or_default();
        let error_field = sanitize_message(message);
        self.write_row(&[
            counter_field.as_str(),
            zip_field.as_str(),
            error_field.as_str(),
        ])?;
        self.rows += 1;
        Ok(())
    }

    /// Number of failure rows written, excluding the header.
    #[must_use]
    pub const fn rows(&self) -> u64 {
        self.rows
    }

    /// Path the ledger was created at, if it is file-backed.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8Path> {
        self.path.as_deref()
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> Result<W, LedgerError> {
        self.writer
            .into_inner()
            .map_err(|err| LedgerError::Flush {
                source: err.into_error(),
            })
    }

    fn write_row(&mut self, fields: &[&str]) -> Result<(), LedgerError> {
        self.writer
            .write_record(fields)
            .map_err(|source| LedgerError::Write { source })?;
        self.writer.flush().map_err(|source| LedgerError::Flush { source })
    }
}
