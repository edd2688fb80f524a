//! In-memory `RegionStore` used by unit and behaviour tests.
//!
//! The store keeps each region as a JSON document, records every call it
//! receives and can be told to fail specific calls for specific zips.

use std::collections::{BTreeMap, HashMap};

use serde_json::{Map, Value};

use crate::{RegionItem, RegionPatch, RegionStore, StoreError, StoreOperation, Zip, attribute};

/// A call received by [`MemoryRegionStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreCall {
    /// `probe(zip)`.
    Probe(Zip),
    /// `insert(item)` for the item's zip.
    Insert(Zip),
    /// `update(zip, patch)`.
    Update(Zip),
    /// `fetch(zip)`.
    Fetch(Zip),
}

impl StoreCall {
    /// Zip the call targeted.
    #[must_use]
    pub const fn zip(self) -> Zip {
        match self {
            Self::Probe(zip) | Self::Insert(zip) | Self::Update(zip) | Self::Fetch(zip) => zip,
        }
    }

    /// Whether the call writes to the store.
    #[must_use]
    pub const fn is_write(self) -> bool {
        matches!(self, Self::Insert(_) | Self::Update(_))
    }
}

/// Recording in-memory store with failure injection.
#[derive(Debug, Default)]
pub struct MemoryRegionStore {
    documents: BTreeMap<Zip, Map<String, Value>>,
    calls: Vec<StoreCall>,
    failures: HashMap<(Zip, StoreOperation), String>,
}

impl MemoryRegionStore {
    /// Store a raw document, bypassing call recording.
    ///
    /// Non-object values are stored as an empty document.
    pub fn seed_document(&mut self, zip: Zip, document: Value) -> &mut Self {
        let map = match document {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self.documents.insert(zip, map);
        self
    }

    /// Store a region as a full document, bypassing call recording.
    ///
    /// # Errors
    /// Returns [`StoreError::Document`] when the item cannot be serialized.
    pub fn seed_item(&mut self, item: &RegionItem) -> Result<&mut Self, StoreError> {
        let zip = item.key();
        let document =
            serde_json::to_value(item).map_err(|source| StoreError::Document { zip, source })?;
        Ok(self.seed_document(zip, document))
    }

    /// Make every subsequent `operation` against `zip` fail with `message`.
    pub fn fail_on(
        &mut self,
        zip: Zip,
        operation: StoreOperation,
        message: impl Into<String>,
    ) -> &mut Self {
        self.failures.insert((zip, operation), message.into());
        self
    }

    /// Stop failing `operation` against `zip`.
    pub fn clear_failure(&mut self, zip: Zip, operation: StoreOperation) -> &mut Self {
        self.failures.remove(&(zip, operation));
        self
    }

    /// Raw document stored for `zip`.
    #[must_use]
    pub fn document(&self, zip: Zip) -> Option<&Map<String, Value>> {
        self.documents.get(&zip)
    }

    /// Number of stored documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether no documents are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Every call received so far, in order.
    #[must_use]
    pub fn calls(&self) -> &[StoreCall] {
        &self.calls
    }

    /// Calls that targeted `zip`, in order.
    #[must_use]
    pub fn calls_for(&self, zip: Zip) -> Vec<StoreCall> {
        self.calls
            .iter()
            .copied()
            .filter(|call| call.zip() == zip)
            .collect()
    }

    /// Forget recorded calls while keeping documents and failures.
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    fn check(&mut self, call: StoreCall, operation: StoreOperation) -> Result<(), StoreError> {
        self.calls.push(call);
        let zip = call.zip();
        match self.failures.get(&(zip, operation)) {
            Some(message) => Err(StoreError::Unavailable {
                operation,
                zip,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl RegionStore for MemoryRegionStore {
    fn probe(&mut self, zip: Zip) -> Result<bool, StoreError> {
        self.check(StoreCall::Probe(zip), StoreOperation::Probe)?;
        Ok(self.documents.contains_key(&zip))
    }

    fn insert(&mut self, item: &RegionItem) -> Result<(), StoreError> {
        let zip = item.key();
        self.check(StoreCall::Insert(zip), StoreOperation::Insert)?;
        let document = match serde_json::to_value(item)
            .map_err(|source| StoreError::Document { zip, source })?
        {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self.documents.insert(zip, document);
        Ok(())
    }

    fn update(&mut self, zip: Zip, patch: &RegionPatch) -> Result<(), StoreError> {
        self.check(StoreCall::Update(zip), StoreOperation::Update)?;
        let center =
            serde_json::to_value(patch.center).map_err(|source| StoreError::Document { zip, source })?;
        let outline = serde_json::to_value(&patch.outline)
            .map_err(|source| StoreError::Document { zip, source })?;
        let document = self
            .documents
            .get_mut(&zip)
            .ok_or(StoreError::Missing { zip })?;
        document.insert(attribute::CENTER.to_owned(), center);
        document.insert(attribute::OUTLINE.to_owned(), outline);
        Ok(())
    }

    fn fetch(&mut self, zip: Zip) -> Result<Option<RegionItem>, StoreError> {
        self.check(StoreCall::Fetch(zip), StoreOperation::Fetch)?;
        self.documents
            .get(&zip)
            .map(|document| serde_json::from_value(Value::Object(document.clone())))
            .transpose()
            .map_err(|source| StoreError::Document { zip, source })
    }
}
