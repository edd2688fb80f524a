//! Facade crate for geozip.
//!
//! This crate re-exports the core region types and exposes the ingestion
//! pipeline and SQLite store behind feature flags.

#![forbid(unsafe_code)]

pub use geozip_core::{
    OutlinePoint, Region, RegionItem, RegionPatch, RegionStore, StoreError, StoreOperation, Zip,
};

#[cfg(feature = "store-sqlite")]
pub use geozip_core::{SqliteRegionStore, SqliteRegionStoreError};

#[cfg(feature = "test-support")]
pub use geozip_core::test_support;

#[cfg(feature = "ingest")]
pub use geozip_ingest::{
    DecodeFailurePolicy, ErrorLedger, IngestDriver, IngestError, IngestMode, IngestOptions,
    IngestReport, LedgerError, MalformedRecordError, ProbeFailurePolicy, ResumeController,
    RetryFilter, UpsertOutcome, UpsertResolver, decode_record, load_failed_zips,
};
