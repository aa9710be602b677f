//! Tenant Store Provisioner
//!
//! Creates a business's dedicated store, brings its schema current and
//! publishes it in the catalog. Each step is idempotent, so the whole
//! operation is safe to repeat for the same business.
//!
//! Concurrent calls for one storage id serialize on a per-id async lock,
//! which the reclaimer also takes. A business retired in the catalog is
//! refused before any file is touched. The catalog lock is only taken to
//! publish, never across file creation or migration.

use bizhub_database::{migrate_tenant_store, Database, DatabaseConfig, StoreDescriptor};
use bizhub_models::{Business, BusinessId};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Mutex as AsyncMutex;

use crate::catalog::{CatalogEntry, TenantCatalog};
use crate::error::{Result, TenantError};
use crate::naming::bound_storage_id;

/// Outcome of a successful provisioning call
#[derive(Debug, Clone)]
pub enum Provisioned {
    /// New physical storage was allocated by this call
    Created(Arc<CatalogEntry>),
    /// Storage already existed; the entry is (now) registered
    Existing(Arc<CatalogEntry>),
}

impl Provisioned {
    pub fn entry(&self) -> &Arc<CatalogEntry> {
        match self {
            Provisioned::Created(entry) | Provisioned::Existing(entry) => entry,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, Provisioned::Created(_))
    }
}

pub struct TenantProvisioner {
    config: DatabaseConfig,
    catalog: Arc<TenantCatalog>,
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl TenantProvisioner {
    pub fn new(config: DatabaseConfig, catalog: Arc<TenantCatalog>) -> Self {
        Self {
            config,
            catalog,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn catalog(&self) -> &Arc<TenantCatalog> {
        &self.catalog
    }

    /// Descriptor of the store a business is bound to
    pub fn descriptor_for(&self, business: &Business) -> StoreDescriptor {
        self.config.tenant_descriptor(&bound_storage_id(business))
    }

    /// `provision(tenant) -> bool`. Never raises: failures are logged and
    /// reported as `false`, and nothing unusable is left in the catalog.
    pub async fn provision(&self, business: &Business) -> bool {
        match self.try_provision(business).await {
            Ok(Provisioned::Created(entry)) => {
                tracing::info!(
                    "Provisioned store {} for business {} at {}",
                    entry.storage_id,
                    business.id,
                    entry.descriptor.location().display()
                );
                true
            }
            Ok(Provisioned::Existing(entry)) => {
                tracing::debug!(
                    "Store {} for business {} already exists",
                    entry.storage_id,
                    business.id
                );
                true
            }
            Err(e) => {
                tracing::error!(
                    "Failed to provision store for business {} ({}): {}",
                    business.id,
                    business.name,
                    e
                );
                false
            }
        }
    }

    /// Provision and report what happened
    pub async fn try_provision(&self, business: &Business) -> Result<Provisioned> {
        self.ensure(business, true).await
    }

    /// Register a store that must already exist on disk. Used when rebuilding
    /// the catalog at startup; a missing file is reported, never recreated.
    pub async fn register_existing(&self, business: &Business) -> Result<Arc<CatalogEntry>> {
        self.ensure(business, false)
            .await
            .map(|provisioned| provisioned.entry().clone())
    }

    async fn ensure(&self, business: &Business, allocate_missing: bool) -> Result<Provisioned> {
        let storage_id = bound_storage_id(business);
        let descriptor = self.config.tenant_descriptor(&storage_id);

        let lock = self.lock_for(&storage_id);
        let _guard = lock.lock().await;

        if self.catalog.is_retired(business.id) {
            return Err(TenantError::Reclaimed(business.id));
        }

        if let Some(entry) = self.catalog.get(business.id) {
            if entry.descriptor == descriptor && descriptor.exists() {
                return Ok(Provisioned::Existing(entry));
            }
            tracing::warn!(
                "Dropping stale catalog entry {} for business {}",
                entry.storage_id,
                business.id
            );
            self.catalog.remove(business.id);
        }

        let created = if allocate_missing {
            allocate(&descriptor).await?
        } else if descriptor.exists() {
            false
        } else {
            return Err(TenantError::StoreMissing(business.id));
        };

        let entry = stage(business.id, storage_id, descriptor).await?;
        let registration = self.catalog.insert_if_absent(entry)?;

        Ok(if created {
            Provisioned::Created(registration.entry().clone())
        } else {
            Provisioned::Existing(registration.entry().clone())
        })
    }

    pub(crate) fn lock_for(&self, storage_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(storage_id.to_string()).or_default().clone()
    }

    /// Drop the lock of a reclaimed store. Waiters holding a clone still
    /// serialize on it and then find the business retired.
    pub(crate) fn release_lock(&self, storage_id: &str) {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(storage_id);
    }

    #[cfg(test)]
    pub(crate) fn lock_count(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Create the empty store file. Returns false when it already existed.
async fn allocate(descriptor: &StoreDescriptor) -> Result<bool> {
    if let Some(parent) = descriptor.location().parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    match tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(descriptor.location())
        .await
    {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Build the entry and migrate through its own pool before it is published
async fn stage(
    business_id: BusinessId,
    storage_id: String,
    descriptor: StoreDescriptor,
) -> Result<CatalogEntry> {
    let handle = Database::connect_lazy(&storage_id, &descriptor);

    match migrate_tenant_store(handle.pool()).await {
        Ok(0) => {}
        Ok(applied) => {
            tracing::info!("Applied {} migration(s) to store {}", applied, storage_id);
        }
        Err(e) => {
            handle.close().await;
            return Err(e.into());
        }
    }

    Ok(CatalogEntry {
        business_id,
        storage_id,
        descriptor,
        handle,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{business, store_files, Harness};

    #[tokio::test]
    async fn test_provision_creates_migrated_store() {
        let h = Harness::new().await;
        let acme = business(1, "Acme");

        assert!(h.provisioner.provision(&acme).await);

        let entry = h.catalog.get(acme.id).unwrap();
        assert_eq!(entry.storage_id, "business_1");
        assert!(entry.descriptor.exists());
        assert_eq!(entry.descriptor.template, h.config.template);

        let (tables,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('products', 'orders')",
        )
        .fetch_one(entry.handle.pool())
        .await
        .unwrap();
        assert_eq!(tables, 2);
    }

    #[tokio::test]
    async fn test_provision_twice_is_idempotent() {
        let h = Harness::new().await;
        let acme = business(1, "Acme");

        let first = h.provisioner.try_provision(&acme).await.unwrap();
        let second = h.provisioner.try_provision(&acme).await.unwrap();

        assert!(first.was_created());
        assert!(!second.was_created());
        assert!(Arc::ptr_eq(first.entry(), second.entry()));
        assert_eq!(h.catalog.len(), 1);
        assert_eq!(store_files(&h), vec!["db_business_1.sqlite3".to_string()]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_provisioning_allocates_once() {
        let h = Harness::new().await;
        let acme = business(1, "Acme");

        let mut handles = Vec::new();
        for _ in 0..8 {
            let provisioner = h.provisioner.clone();
            let acme = acme.clone();
            handles.push(tokio::spawn(async move {
                provisioner.try_provision(&acme).await.unwrap()
            }));
        }

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().was_created() {
                created += 1;
            }
        }

        assert_eq!(created, 1);
        assert_eq!(h.catalog.len(), 1);
        assert_eq!(store_files(&h).len(), 1);
    }

    #[tokio::test]
    async fn test_existing_file_is_adopted() {
        let h = Harness::new().await;
        let acme = business(1, "Acme");
        std::fs::File::create(h.provisioner.descriptor_for(&acme).location()).unwrap();

        let outcome = h.provisioner.try_provision(&acme).await.unwrap();

        assert!(!outcome.was_created());
        assert!(h.catalog.contains(acme.id));
    }

    #[tokio::test]
    async fn test_failure_returns_false_and_is_not_routable() {
        let h = Harness::new().await;
        let blocker = h.dir.path().join("not_a_dir");
        std::fs::write(&blocker, b"").unwrap();

        let mut config = h.config.clone();
        config.storage_dir = blocker.join("stores");
        let provisioner = TenantProvisioner::new(config, h.catalog.clone());

        assert!(!provisioner.provision(&business(1, "Acme")).await);
        assert!(h.catalog.is_empty());
    }

    #[tokio::test]
    async fn test_register_existing_never_recreates() {
        let h = Harness::new().await;
        let acme = business(1, "Acme");

        let err = h.provisioner.register_existing(&acme).await.unwrap_err();
        assert!(matches!(err, TenantError::StoreMissing(BusinessId(1))));
        assert!(store_files(&h).is_empty());

        h.provisioner.provision(&acme).await;
        h.catalog.remove(acme.id);

        let entry = h.provisioner.register_existing(&acme).await.unwrap();
        assert_eq!(entry.storage_id, "business_1");
    }

    #[tokio::test]
    async fn test_retired_business_is_refused() {
        let h = Harness::new().await;
        let acme = business(1, "Acme");
        h.catalog.retire(acme.id);

        let err = h.provisioner.try_provision(&acme).await.unwrap_err();

        assert!(matches!(err, TenantError::Reclaimed(BusinessId(1))));
        assert!(!h.provisioner.provision(&acme).await);
        assert!(store_files(&h).is_empty());
        assert!(h.catalog.is_empty());
    }

    #[tokio::test]
    async fn test_frozen_storage_id_is_used() {
        let h = Harness::new().await;
        let mut acme = business(1, "Acme");
        acme.storage_id = Some("business_legacy".to_string());

        assert!(h.provisioner.provision(&acme).await);
        assert_eq!(h.catalog.get(acme.id).unwrap().storage_id, "business_legacy");
    }
}
