//! Key-value access to stored regions.
//!
//! The [`RegionStore`] trait models the three calls the ingestion pipeline
//! makes against its backend: an existence probe, a full insert and a partial
//! update. Implementations are used serially through an explicit `&mut`
//! handle; there is no shared global client.

use thiserror::Error;

use crate::{RegionItem, RegionPatch, Zip};

#[cfg(feature = "store-sqlite")]
mod sqlite;

#[cfg(feature = "store-sqlite")]
pub use sqlite::{SqliteRegionStore, SqliteRegionStoreError};

/// Store calls, used to label failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    /// Existence probe.
    Probe,
    /// Full-document insert.
    Insert,
    /// Partial update of `Center` and `Outline`.
    Update,
    /// Document read-back.
    Fetch,
}

impl StoreOperation {
    /// Lower-case label for messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Probe => "probe",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Fetch => "fetch",
        }
    }
}

/// Errors raised by a [`RegionStore`] call.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// The backend could not service the call (connectivity, throttling or an
    /// injected failure).
    #[error("{} of zip {zip} failed: {message}", .operation.label())]
    Unavailable {
        /// Call that failed.
        operation: StoreOperation,
        /// Key the call targeted.
        zip: Zip,
        /// Backend description of the failure.
        message: String,
    },
    /// An update targeted a key that is not stored.
    #[error("zip {zip} is not stored")]
    Missing {
        /// Key the update targeted.
        zip: Zip,
    },
    /// Encoding or decoding a document failed.
    #[error("invalid document for zip {zip}: {source}")]
    Document {
        /// Key of the affected document.
        zip: Zip,
        /// Source error from `serde_json`.
        #[source]
        source: serde_json::Error,
    },
    /// The SQLite backend rejected the call.
    #[cfg(feature = "store-sqlite")]
    #[error("{} of zip {zip} failed: {source}", .operation.label())]
    Sqlite {
        /// Call that failed.
        operation: StoreOperation,
        /// Key the call targeted.
        zip: Zip,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
}

/// Key-value access to region documents keyed by [`Zip`].
///
/// # Examples
///
/// ```rust
/// use std::collections::BTreeMap;
/// use geozip_core::{Region, RegionItem, RegionPatch, RegionStore, StoreError, Zip};
///
/// #[derive(Default)]
/// struct MapStore {
///     items: BTreeMap<Zip, RegionItem>,
/// }
///
/// impl RegionStore for MapStore {
///     fn probe(&mut self, zip: Zip) -> Result<bool, StoreError> {
///         Ok(self.items.contains_key(&zip))
///     }
///
///     fn insert(&mut self, item: &RegionItem) -> Result<(), StoreError> {
///         self.items.insert(item.key(), item.clone());
///         Ok(())
///     }
///
///     fn update(&mut self, zip: Zip, patch: &RegionPatch) -> Result<(), StoreError> {
///         let item = self.items.get_mut(&zip).ok_or(StoreError::Missing { zip })?;
///         item.center = patch.center;
///         item.outline = patch.outline.clone();
///         Ok(())
///     }
///
///     fn fetch(&mut self, zip: Zip) -> Result<Option<RegionItem>, StoreError> {
///         Ok(self.items.get(&zip).cloned())
///     }
/// }
///
/// let region = Region::from_lat_lng_pairs(Zip::new(1), [0.0, 0.0], &[]);
/// let mut store = MapStore::default();
/// store.insert(&RegionItem::from(&region))?;
/// assert!(store.probe(Zip::new(1))?);
/// # Ok::<(), StoreError>(())
/// ```
pub trait RegionStore {
    /// Report whether a document exists for `zip`.
    ///
    /// Absence is `Ok(false)`; an `Err` always means the probe itself failed.
    fn probe(&mut self, zip: Zip) -> Result<bool, StoreError>;

    /// Write the full document, replacing any stored document for the key.
    fn insert(&mut self, item: &RegionItem) -> Result<(), StoreError>;

    /// Overwrite `Center` and `Outline` of an existing document, leaving every
    /// other attribute untouched.
    fn update(&mut self, zip: Zip, patch: &RegionPatch) -> Result<(), StoreError>;

    /// Read a stored document back.
    fn fetch(&mut self, zip: Zip) -> Result<Option<RegionItem>, StoreError>;
}

impl<S: RegionStore + ?Sized> RegionStore for &mut S {
    fn probe(&mut self, zip: Zip) -> Result<bool, StoreError> {
        (**self).probe(zip)
    }

    fn insert(&mut self, item: &RegionItem) -> Result<(), StoreError> {
        (**self).insert(item)
    }

    fn update(&mut self, zip: Zip, patch: &RegionPatch) -> Result<(), StoreError> {
        (**self).update(zip, patch)
    }

    fn fetch(&mut self, zip: Zip) -> Result<Option<RegionItem>, StoreError> {
        (**self).fetch(zip)
    }
}
