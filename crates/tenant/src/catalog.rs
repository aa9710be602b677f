//! Tenant Database Catalog
//!
//! Process-wide registry mapping a business to its physical store.
//!
//! Readers copy an `Arc` of the current map under a read lock held only for
//! the pointer clone. Writers serialize on `writer`, build the next map off
//! the read path, then swap it in. An entry is fully constructed before it is
//! published, so lookups never see a partial descriptor.
//!
//! A business whose storage was reclaimed is retired: it can never be
//! registered again, whatever provisioning attempt is still in flight.

use bizhub_database::{Database, StoreDescriptor};
use bizhub_models::BusinessId;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::error::{Result, TenantError};

type CatalogMap = HashMap<BusinessId, Arc<CatalogEntry>>;

/// One registered tenant store
#[derive(Debug)]
pub struct CatalogEntry {
    pub business_id: BusinessId,
    pub storage_id: String,
    pub descriptor: StoreDescriptor,
    pub handle: Database,
}

/// Result of a registration attempt
#[derive(Debug, Clone)]
pub enum Registration {
    Inserted(Arc<CatalogEntry>),
    /// An entry was already present and was left in place
    Existing(Arc<CatalogEntry>),
}

impl Registration {
    pub fn entry(&self) -> &Arc<CatalogEntry> {
        match self {
            Registration::Inserted(entry) | Registration::Existing(entry) => entry,
        }
    }

    pub fn was_inserted(&self) -> bool {
        matches!(self, Registration::Inserted(_))
    }
}

#[derive(Debug, Default)]
pub struct TenantCatalog {
    snapshot: RwLock<Arc<CatalogMap>>,
    /// Serializes writers and holds the retired business ids
    writer: Mutex<HashSet<BusinessId>>,
}

impl TenantCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn load(&self) -> Arc<CatalogMap> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn publish(&self, next: CatalogMap) {
        *self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(next);
    }

    pub fn get(&self, business_id: BusinessId) -> Option<Arc<CatalogEntry>> {
        self.load().get(&business_id).cloned()
    }

    pub fn contains(&self, business_id: BusinessId) -> bool {
        self.load().contains_key(&business_id)
    }

    pub fn len(&self) -> usize {
        self.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.load().is_empty()
    }

    /// Point-in-time copy of every entry, ordered by business id
    pub fn entries(&self) -> Vec<Arc<CatalogEntry>> {
        let mut entries: Vec<_> = self.load().values().cloned().collect();
        entries.sort_by_key(|e| e.business_id);
        entries
    }

    pub fn is_retired(&self, business_id: BusinessId) -> bool {
        self.writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&business_id)
    }

    /// Publish `entry` unless the business is already registered. Never
    /// duplicates, refuses a storage id owned by another business and
    /// refuses a retired business.
    pub fn insert_if_absent(&self, entry: CatalogEntry) -> Result<Registration> {
        let retired = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if retired.contains(&entry.business_id) {
            return Err(TenantError::Reclaimed(entry.business_id));
        }
        let current = self.load();

        if let Some(existing) = current.get(&entry.business_id) {
            return Ok(Registration::Existing(existing.clone()));
        }

        if let Some(holder) = current
            .values()
            .find(|e| e.storage_id == entry.storage_id)
        {
            return Err(TenantError::StorageConflict {
                storage_id: entry.storage_id,
                holder: holder.business_id,
            });
        }

        let entry = Arc::new(entry);
        let mut next = (*current).clone();
        next.insert(entry.business_id, entry.clone());
        self.publish(next);

        Ok(Registration::Inserted(entry))
    }

    /// Unpublish a business's entry. Handles already obtained stay usable.
    pub fn remove(&self, business_id: BusinessId) -> Option<Arc<CatalogEntry>> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.unpublish(business_id)
    }

    /// Unpublish and refuse any later registration of the business
    pub fn retire(&self, business_id: BusinessId) -> Option<Arc<CatalogEntry>> {
        let mut retired = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        retired.insert(business_id);
        self.unpublish(business_id)
    }

    /// Caller holds `writer`
    fn unpublish(&self, business_id: BusinessId) -> Option<Arc<CatalogEntry>> {
        let current = self.load();

        if !current.contains_key(&business_id) {
            return None;
        }

        let mut next = (*current).clone();
        let removed = next.remove(&business_id);
        self.publish(next);
        removed
    }
}
