//! Core domain types for geozip.
//!
//! A [`Region`] is one postal code with its centre and boundary. Stores keep
//! regions as [`RegionItem`] documents keyed by [`Zip`] and are reached
//! through the [`RegionStore`] trait. The SQLite implementation sits behind
//! the `store-sqlite` feature; an in-memory recording store for tests sits
//! behind `test-support`.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod item;
pub mod region;
pub mod store;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use item::{ITEM_SCHEMA_VERSION, OutlinePoint, RegionItem, RegionPatch, attribute};
pub use region::{Region, Zip, coord_from_pair, pair_from_coord};
pub use store::{RegionStore, StoreError, StoreOperation};

#[cfg(feature = "store-sqlite")]
pub use store::{SqliteRegionStore, SqliteRegionStoreError};
