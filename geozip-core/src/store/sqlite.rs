//! SQLite-backed region store.
//!
//! Documents live in a single `geo_zip` table as JSON text keyed by the zip.
//! Partial updates rewrite `$.Center` and `$.Outline` in place with
//! `json_set`, so attributes written by other tools survive.

use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use rusqlite::{Connection, Error as SqliteError, OptionalExtension, Transaction};
use thiserror::Error;

use crate::{ITEM_SCHEMA_VERSION, RegionItem, RegionPatch, Zip};

use super::{RegionStore, StoreError, StoreOperation};

/// Errors raised while opening a [`SqliteRegionStore`].
#[derive(Debug, Error)]
pub enum SqliteRegionStoreError {
    /// Failed to create the parent directory for the database.
    #[error("failed to create parent directory for {path:?}")]
    CreateDirectory {
        /// Database path whose parent could not be created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path:?}")]
    Open {
        /// Requested database path.
        path: Utf8PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// A schema statement failed.
    #[error("failed to execute migration step '{step}'")]
    Migration {
        /// Description of the failed step.
        step: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// The database was written with a different document layout.
    #[error(
        "expected geo_zip schema version {expected} but found {found}; migrate the store before retrying"
    )]
    VersionMismatch {
        /// Version this build writes.
        expected: i64,
        /// Version recorded in the database.
        found: i64,
    },
}

/// Region store persisted in a SQLite database.
#[derive(Debug)]
pub struct SqliteRegionStore {
    connection: Connection,
    location: Option<Utf8PathBuf>,
}

impl SqliteRegionStore {
    /// Open (or create) the store at `path`, creating parent directories and
    /// the schema when missing.
    pub fn open(path: &Utf8Path) -> Result<Self, SqliteRegionStoreError> {
        geozip_fs::ensure_parent_dir(path).map_err(|source| {
            SqliteRegionStoreError::CreateDirectory {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let mut connection = Connection::open(path.as_std_path()).map_err(|source| {
            SqliteRegionStoreError::Open {
                path: path.to_path_buf(),
                source,
            }
        })?;
        initialise_schema(&mut connection)?;
        debug!("opened region store at {path}");
        Ok(Self {
            connection,
            location: Some(path.to_path_buf()),
        })
    }

    /// Open a transient store that lives only as long as the value.
    pub fn open_in_memory() -> Result<Self, SqliteRegionStoreError> {
        let mut connection =
            Connection::open_in_memory().map_err(|source| SqliteRegionStoreError::Open {
                path: Utf8PathBuf::from(":memory:"),
                source,
            })?;
        initialise_schema(&mut connection)?;
        Ok(Self {
            connection,
            location: None,
        })
    }

    /// Location of the database file, if it lives on disk.
    #[must_use]
    pub fn location(&self) -> Option<&Utf8Path> {
        self.location.as_deref()
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.connection
    }

    fn sqlite_error(operation: StoreOperation, zip: Zip) -> impl FnOnce(SqliteError) -> StoreError {
        move |source| StoreError::Sqlite {
            operation,
            zip,
            source,
        }
    }
}

impl RegionStore for SqliteRegionStore {
    fn probe(&mut self, zip: Zip) -> Result<bool, StoreError> {
        let mut statement = self
            .connection
            .prepare_cached("SELECT 1 FROM geo_zip WHERE zip = ?1 LIMIT 1")
            .map_err(Self::sqlite_error(StoreOperation::Probe, zip))?;
        let found = statement
            .query_row([i64::from(zip)], |_| Ok(()))
            .optional()
            .map_err(Self::sqlite_error(StoreOperation::Probe, zip))?;
        Ok(found.is_some())
    }

    fn insert(&mut self, item: &RegionItem) -> Result<(), StoreError> {
        let zip = item.key();
        let document = item
            .to_json()
            .map_err(|source| StoreError::Document { zip, source })?;
        let mut statement = self
            .connection
            .prepare_cached("INSERT OR REPLACE INTO geo_zip (zip, item) VALUES (?1, ?2)")
            .map_err(Self::sqlite_error(StoreOperation::Insert, zip))?;
        statement
            .execute((i64::from(zip), document))
            .map(|_| ())
            .map_err(Self::sqlite_error(StoreOperation::Insert, zip))
    }

    fn update(&mut self, zip: Zip, patch: &RegionPatch) -> Result<(), StoreError> {
        let center = patch
            .center_json()
            .map_err(|source| StoreError::Document { zip, source })?;
        let outline = patch
            .outline_json()
            .map_err(|source| StoreError::Document { zip, source })?;
        let mut statement = self
            .connection
            .prepare_cached(
                "UPDATE geo_zip
                    SET item = json_set(item, '$.Center', json(?2), '$.Outline', json(?3))
                    WHERE zip = ?1",
            )
            .map_err(Self::sqlite_error(StoreOperation::Update, zip))?;
        let changed = statement
            .execute((i64::from(zip), center, outline))
            .map_err(Self::sqlite_error(StoreOperation::Update, zip))?;
        if changed == 0 {
            return Err(StoreError::Missing { zip });
        }
        Ok(())
    }

    fn fetch(&mut self, zip: Zip) -> Result<Option<RegionItem>, StoreError> {
        let mut statement = self
            .connection
            .prepare_cached("SELECT item FROM geo_zip WHERE zip = ?1")
            .map_err(Self::sqlite_error(StoreOperation::Fetch, zip))?;
        let document: Option<String> = statement
            .query_row([i64::from(zip)], |row| row.get(0))
            .optional()
            .map_err(Self::sqlite_error(StoreOperation::Fetch, zip))?;
        document
            .map(|json| serde_json::from_str::<RegionItem>(&json))
            .transpose()
            .map_err(|source| StoreError::Document { zip, source })
    }
}

fn initialise_schema(connection: &mut Connection) -> Result<(), SqliteRegionStoreError> {
    let transaction =
        connection
            .transaction()
            .map_err(|source| SqliteRegionStoreError::Migration {
                step: "begin schema transaction",
                source,
            })?;

    run_migration_step(
        &transaction,
        "create geo_zip",
        "CREATE TABLE IF NOT EXISTS geo_zip (
            zip INTEGER PRIMARY KEY CHECK (zip >= 0),
            item TEXT NOT NULL CHECK (json_valid(item))
        )",
    )?;
    ensure_schema_version(&transaction)?;

    transaction
        .commit()
        .map_err(|source| SqliteRegionStoreError::Migration {
            step: "commit schema transaction",
            source,
        })
}

fn ensure_schema_version(transaction: &Transaction<'_>) -> Result<(), SqliteRegionStoreError> {
    run_migration_step(
        transaction,
        "create schema version table",
        "CREATE TABLE IF NOT EXISTS geo_zip_schema_version (
            version INTEGER PRIMARY KEY CHECK (version > 0)
        ) WITHOUT ROWID",
    )?;

    let existing_version: Option<i64> = transaction
        .query_row(
            "SELECT version FROM geo_zip_schema_version LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(|source| SqliteRegionStoreError::Migration {
            step: "read schema version",
            source,
        })?;

    match existing_version {
        Some(version) if version == ITEM_SCHEMA_VERSION => Ok(()),
        Some(found) => Err(SqliteRegionStoreError::VersionMismatch {
            expected: ITEM_SCHEMA_VERSION,
            found,
        }),
        None => transaction
            .execute(
                "INSERT INTO geo_zip_schema_version (version) VALUES (?1)",
                [ITEM_SCHEMA_VERSION],
            )
            .map(|_| ())
            .map_err(|source| SqliteRegionStoreError::Migration {
                step: "record schema version",
                source,
            }),
    }
}

fn run_migration_step(
    transaction: &Transaction<'_>,
    step: &'static str,
    sql: &str,
) -> Result<(), SqliteRegionStoreError> {
    transaction
        .execute(sql, [])
        .map(|_| ())
        .map_err(|source| SqliteRegionStoreError::Migration { step, source })
}
