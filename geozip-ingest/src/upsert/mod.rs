//! Insert-if-absent-else-update against a [`RegionStore`].
//!
//! Each record costs one probe and at most one write. A new key receives the
//! full document; an existing key has only `Center` and `Outline` replaced so
//! attributes written by other tools survive. Store failures never abort the
//! run: they are written to the [`ErrorLedger`] and reported as
//! [`UpsertOutcome::Failed`].

use std::io::Write;

use geozip_core::{Region, RegionItem, RegionStore, StoreError, StoreOperation, Zip};
use log::warn;

use crate::ledger::{ErrorLedger, LedgerError};

/// What to do when the existence probe itself fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProbeFailurePolicy {
    /// Treat the key as absent and insert the full document.
    #[default]
    Insert,
    /// Ledger the probe failure and skip the write.
    Record,
}

/// Result of resolving one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The key was absent and the full document was written.
    Inserted,
    /// The key existed and its centre and outline were replaced.
    Updated,
    /// A store call failed and a ledger row was written.
    Failed {
        /// Call that failed.
        operation: StoreOperation,
    },
}

/// Resolves records into probe-then-write store calls.
///
/// # Examples
/// ```
/// use geozip_core::{Region, RegionStore, Zip, test_support::MemoryRegionStore};
/// use geozip_ingest::{ErrorLedger, UpsertOutcome, UpsertResolver};
///
/// let mut store = MemoryRegionStore::default();
/// let mut ledger = ErrorLedger::from_writer(Vec::new())?;
/// let region = Region::from_lat_lng_pairs(Zip::new(10001), [40.75, -73.99], &[]);
///
/// let mut resolver = UpsertResolver::new(&mut store);
/// assert_eq!(resolver.resolve(0, &region, &mut ledger)?, UpsertOutcome::Inserted);
/// assert_eq!(resolver.resolve(1, &region, &mut ledger)?, UpsertOutcome::Updated);
/// # Ok::<(), geozip_ingest::LedgerError>(())
/// ```
#[derive(Debug)]
pub struct UpsertResolver<'s, S: RegionStore + ?Sized> {
    store: &'s mut S,
    probe_policy: ProbeFailurePolicy,
}

impl<'s, S: RegionStore + ?Sized> UpsertResolver<'s, S> {
    /// Resolver using the default [`ProbeFailurePolicy`].
    pub fn new(store: &'s mut S) -> Self {
        Self {
            store,
            probe_policy: ProbeFailurePolicy::default(),
        }
    }

    /// Replace the probe-failure policy.
    #[must_use]
    pub fn with_probe_policy(mut self, probe_policy: ProbeFailurePolicy) -> Self {
        self.probe_policy = probe_policy;
        self
    }

    /// Probe-failure policy in effect.
    #[must_use]
    pub const fn probe_policy(&self) -> ProbeFailurePolicy {
        self.probe_policy
    }

    /// Write `region`, inserting or updating as the probe dictates.
    ///
    /// Only ledger failures are returned as errors.
    pub fn resolve<W: Write>(
        &mut self,
        counter: u64,
        region: &Region,
        ledger: &mut ErrorLedger<W>,
    ) -> Result<UpsertOutcome, LedgerError> {
        self.resolve_item(counter, &RegionItem::from(region), ledger)
    }

    /// Write an already-built document, inserting or updating as the probe
    /// dictates.
    pub fn resolve_item<W: Write>(
        &mut self,
        counter: u64,
        item: &RegionItem,
        ledger: &mut ErrorLedger<W>,
    ) -> Result<UpsertOutcome, LedgerError> {
        let zip = item.key();
        let exists = match self.store.probe(zip) {
            Ok(exists) => exists,
            Err(err) => match self.probe_policy {
                ProbeFailurePolicy::Insert => {
                    warn!("{err}; treating zip {zip} as absent");
                    false
                }
                ProbeFailurePolicy::Record => {
                    return record_failure(counter, zip, &err, StoreOperation::Probe, ledger);
                }
            },
        };

        if exists {
            match self.store.update(zip, &item.patch()) {
                Ok(()) => Ok(UpsertOutcome::Updated),
                Err(err) => record_failure(counter, zip, &err, StoreOperation::Update, ledger),
            }
        } else {
            match self.store.insert(item) {
                Ok(()) => Ok(UpsertOutcome::Inserted),
                Err(err) => record_failure(counter, zip, &err, StoreOperation::Insert, ledger),
            }
        }
    }
}

fn record_failure<W: Write>(
    counter: u64,
    zip: Zip,
    err: &StoreError,
    operation: StoreOperation,
    ledger: &mut ErrorLedger<W>,
) -> Result<UpsertOutcome, LedgerError> {
    warn!("item #{counter}: {err}");
    ledger.record(counter, Some(zip), &err.to_string())?;
    Ok(UpsertOutcome::Failed { operation })
}
