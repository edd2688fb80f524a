//! Test helpers for laying out ingest inputs, stores and ledgers on disk.

use super::*;
use camino::{Utf8Path, Utf8PathBuf};
use geozip_core::{RegionStore, SqliteRegionStore, Zip};
use tempfile::TempDir;

/// Zips written by [`Workspace::write_input`].
pub(super) const SAMPLE_ZIPS: [u32; 3] = [10001, 10002, 10003];

/// Scratch directory holding the files one CLI invocation touches.
#[derive(Debug)]
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root =
            Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace path");
        Self { _dir: dir, root }
    }

    pub(super) fn path(&self, relative: &str) -> Utf8PathBuf {
        self.root.join(relative)
    }

    pub(super) fn input(&self) -> Utf8PathBuf {
        self.path("output.txt")
    }

    pub(super) fn store(&self) -> Utf8PathBuf {
        self.path("db/geo_zip.db")
    }

    pub(super) fn ledger(&self) -> Utf8PathBuf {
        self.path("reports/new_errors.csv")
    }

    pub(super) fn retry_ledger(&self) -> Utf8PathBuf {
        self.path("errors.csv")
    }

    pub(super) fn write_input(&self) -> Utf8PathBuf {
        let lines: String = SAMPLE_ZIPS.iter().map(|zip| region_line(*zip)).collect();
        self.write_lines(&lines)
    }

    pub(super) fn write_lines(&self, lines: &str) -> Utf8PathBuf {
        let path = self.input();
        std::fs::write(&path, lines).expect("write input file");
        path
    }

    pub(super) fn write_retry_ledger(&self, rows: &str) -> Utf8PathBuf {
        let path = self.retry_ledger();
        std::fs::write(&path, format!("Counter,Zip,Error\n{rows}")).expect("write retry ledger");
        path
    }

    /// Arguments naming this workspace's input, store and ledger.
    pub(super) fn args(&self) -> IngestArgs {
        IngestArgs {
            input: Some(self.input()),
            store: Some(self.store()),
            ledger: Some(self.ledger()),
            retry_ledger: Some(self.retry_ledger()),
            ..IngestArgs::default()
        }
    }

    /// Zips present in the workspace store, in ascending order.
    pub(super) fn stored_zips(&self) -> Vec<u32> {
        stored_zips(&self.store())
    }
}

pub(super) fn region_line(zip: u32) -> String {
    format!(
        "{{\"zip\":{zip},\"centerLat\":40.75,\"centerLng\":-73.99,\"outline\":[[40.7,-74.0],[40.8,-73.9]]}}\n"
    )
}

pub(super) fn stored_zips(store_path: &Utf8Path) -> Vec<u32> {
    let mut store = SqliteRegionStore::open(store_path).expect("open region store");
    SAMPLE_ZIPS
        .iter()
        .copied()
        .filter(|zip| store.probe(Zip::new(*zip)).expect("probe"))
        .collect()
}
