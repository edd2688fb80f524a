//! Resumable, idempotent bulk ingestion of postal regions.
//!
//! Lines of a newline-delimited JSON file are decoded into
//! [`geozip_core::Region`] values and upserted into a
//! [`geozip_core::RegionStore`]. Per-record store failures land in a CSV
//! [`ErrorLedger`] that a later run can replay through a [`RetryFilter`],
//! and a numeric cursor lets an interrupted run restart where it stopped.
#![forbid(unsafe_code)]

pub mod decode;
pub mod driver;
pub mod ledger;
pub mod resume;
pub mod upsert;

pub use decode::{MalformedRecordError, decode_record};
pub use driver::{
    DEFAULT_ITEM_SIZE_LIMIT, DecodeFailurePolicy, IngestDriver, IngestError, IngestMode,
    IngestOptions, IngestReport,
};
pub use ledger::{
    ErrorLedger, LEDGER_HEADER, LedgerError, RetryFilter, load_failed_zips, sanitize_message,
};
pub use resume::{ResumeController, ResumeDecision};
pub use upsert::{ProbeFailurePolicy, UpsertOutcome, UpsertResolver};
