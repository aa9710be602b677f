//! Catalog reconciliation
//!
//! The catalog lives in memory. At startup, and periodically afterwards, it
//! is rebuilt from the business rows in the shared store: ready businesses
//! are re-registered, businesses stuck mid-creation are provisioned again.

use bizhub_database::{migrate_default_store, migrate_tenant_store, BusinessRepository, Database};
use bizhub_models::{Business, StorageState};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, TenantError};
use crate::lifecycle::BusinessLifecycle;
use crate::provisioner::TenantProvisioner;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Ready stores (re-)registered in the catalog
    pub registered: usize,
    /// Unfinished businesses that reached `ready` on this pass
    pub provisioned: usize,
    /// Businesses left or marked `failed`
    pub failed: usize,
    /// Businesses in `failed` awaiting an explicit retry
    pub skipped: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub default_applied: usize,
    pub tenants_migrated: usize,
    pub tenants_failed: usize,
}

/// What one pass did for one business
enum Step {
    Registered,
    Provisioned,
    Failed,
    Skipped,
}

#[derive(Clone)]
pub struct Reconciler {
    default_db: Database,
    businesses: BusinessRepository,
    provisioner: Arc<TenantProvisioner>,
    lifecycle: BusinessLifecycle,
}

impl Reconciler {
    pub fn new(
        default_db: Database,
        businesses: BusinessRepository,
        provisioner: Arc<TenantProvisioner>,
        lifecycle: BusinessLifecycle,
    ) -> Self {
        Self {
            default_db,
            businesses,
            provisioner,
            lifecycle,
        }
    }

    /// One pass over every active business. A business that cannot be
    /// reconciled is logged and counted as failed; the pass continues.
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        let businesses = self.businesses.list_active().await?;
        Ok(self.reconcile_businesses(businesses).await)
    }

    async fn reconcile_businesses(&self, businesses: Vec<Business>) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        for business in businesses {
            match self.reconcile_one(&business).await {
                Ok(Step::Registered) => report.registered += 1,
                Ok(Step::Provisioned) => report.provisioned += 1,
                Ok(Step::Failed) => report.failed += 1,
                Ok(Step::Skipped) => report.skipped += 1,
                Err(e) => {
                    tracing::error!("Failed to reconcile business {}: {}", business.id, e);
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            "Reconciled catalog: {} registered, {} provisioned, {} failed, {} awaiting retry",
            report.registered,
            report.provisioned,
            report.failed,
            report.skipped
        );

        report
    }

    async fn reconcile_one(&self, business: &Business) -> Result<Step> {
        match business.storage_state {
            StorageState::Ready => match self.provisioner.register_existing(business).await {
                Ok(_) => Ok(Step::Registered),
                Err(TenantError::StoreMissing(id)) => {
                    tracing::error!(
                        "Store for ready business {} is missing; marking failed",
                        id
                    );
                    self.businesses
                        .set_storage_state(id, StorageState::Failed)
                        .await?;
                    Ok(Step::Failed)
                }
                Err(e) => Err(e),
            },
            state if state.is_unfinished() => {
                tracing::info!(
                    "Resuming provisioning of business {} (state {})",
                    business.id,
                    state
                );
                let business = self.lifecycle.provision_storage(business).await?;
                Ok(if business.is_ready() {
                    Step::Provisioned
                } else {
                    Step::Failed
                })
            }
            _ => Ok(Step::Skipped),
        }
    }

    /// Bring the default store and every registered tenant store current.
    /// A failing tenant store is logged and skipped.
    pub async fn migrate_all(&self) -> Result<MigrationReport> {
        let mut report = MigrationReport {
            default_applied: migrate_default_store(self.default_db.pool()).await?,
            ..Default::default()
        };

        for entry in self.provisioner.catalog().entries() {
            match migrate_tenant_store(entry.handle.pool()).await {
                Ok(applied) => {
                    tracing::info!(
                        "Migrated store {} ({} applied)",
                        entry.storage_id,
                        applied
                    );
                    report.tenants_migrated += 1;
                }
                Err(e) => {
                    tracing::error!("Failed to migrate store {}: {}", entry.storage_id, e);
                    report.tenants_failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Run [`Reconciler::reconcile`] every `interval` until `shutdown` fires
    pub fn spawn_sweeper(&self, interval: Duration, shutdown: CancellationToken) -> JoinHandle<()> {
        let reconciler = self.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // the first tick completes immediately; startup already reconciled
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        tracing::info!("Reconciliation sweeper stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        if let Err(e) = reconciler.reconcile().await {
                            tracing::error!("Reconciliation sweep failed: {}", e);
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{store_files, Harness};
    use bizhub_models::{BusinessId, CreateBusiness};

    async fn create(h: &Harness, name: &str) -> BusinessId {
        h.service
            .create(
                CreateBusiness {
                    name: name.to_string(),
                    description: None,
                },
                None,
            )
            .await
            .unwrap()
            .business
            .id
    }

    #[tokio::test]
    async fn test_startup_rebuilds_catalog() {
        let h = Harness::new().await;
        let acme = create(&h, "Acme").await;
        let beta = create(&h, "Beta").await;

        // simulate a process restart
        for entry in h.catalog.entries() {
            h.catalog.remove(entry.business_id);
        }

        let report = h.reconciler.reconcile().await.unwrap();

        assert_eq!(report.registered, 2);
        assert!(h.catalog.contains(acme));
        assert!(h.catalog.contains(beta));
    }

    #[tokio::test]
    async fn test_stuck_business_is_provisioned() {
        let h = Harness::new().await;
        let row = h.businesses.create("Acme", None, None).await.unwrap();
        h.businesses
            .set_storage_state(row.id, StorageState::Provisioning)
            .await
            .unwrap();

        let report = h.reconciler.reconcile().await.unwrap();

        assert_eq!(report.provisioned, 1);
        assert!(h.businesses.find_by_id(row.id).await.unwrap().is_ready());
        assert!(h.catalog.contains(row.id));
    }

    #[tokio::test]
    async fn test_missing_ready_store_is_marked_failed() {
        let h = Harness::new().await;
        let acme = create(&h, "Acme").await;
        h.catalog.remove(acme);
        std::fs::remove_file(h.config.tenant_descriptor("business_1").location()).unwrap();

        let report = h.reconciler.reconcile().await.unwrap();

        assert_eq!(report.failed, 1);
        assert!(store_files(&h).is_empty());
        assert_eq!(
            h.businesses.find_by_id(acme).await.unwrap().storage_state,
            StorageState::Failed
        );

        // failed businesses wait for an explicit retry
        let report = h.reconciler.reconcile().await.unwrap();
        assert_eq!(report.skipped, 1);
        assert!(!h.catalog.contains(acme));
    }

    #[tokio::test]
    async fn test_row_deleted_mid_pass_does_not_stop_others() {
        let h = Harness::new().await;
        let acme = h.businesses.create("Acme", None, None).await.unwrap();
        let beta = h.businesses.create("Beta", None, None).await.unwrap();
        let listed = h.businesses.list_active().await.unwrap();

        // deleted after the pass listed it
        assert!(h.businesses.delete(acme.id).await.unwrap());

        let report = h.reconciler.reconcile_businesses(listed).await;

        assert_eq!(report.failed, 1);
        assert_eq!(report.provisioned, 1);
        assert!(!h.catalog.contains(acme.id));
        assert!(h.catalog.contains(beta.id));
        assert_eq!(store_files(&h), vec!["db_business_2.sqlite3".to_string()]);
    }

    #[tokio::test]
    async fn test_inactive_business_is_ignored() {
        let h = Harness::new().await;
        let acme = create(&h, "Acme").await;
        h.service.deactivate(acme).await.unwrap();
        h.catalog.remove(acme);

        let report = h.reconciler.reconcile().await.unwrap();

        assert_eq!(report, ReconcileReport::default());
    }

    #[tokio::test]
    async fn test_migrate_all() {
        let h = Harness::new().await;
        create(&h, "Acme").await;
        create(&h, "Beta").await;

        let report = h.reconciler.migrate_all().await.unwrap();

        assert_eq!(report.default_applied, 0);
        assert_eq!(report.tenants_migrated, 2);
        assert_eq!(report.tenants_failed, 0);
    }

    #[tokio::test]
    async fn test_sweeper_stops_on_cancel() {
        let h = Harness::new().await;
        let row = h.businesses.create("Acme", None, None).await.unwrap();
        let shutdown = CancellationToken::new();

        let sweeper = h
            .reconciler
            .spawn_sweeper(Duration::from_millis(20), shutdown.clone());

        let mut ready = false;
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            if h.catalog.contains(row.id) {
                ready = true;
                break;
            }
        }
        shutdown.cancel();
        sweeper.await.unwrap();

        assert!(ready);
    }
}
