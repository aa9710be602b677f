use bizhub_database::{
    BusinessRepository, Database, DatabaseConfig, RoleRepository, UserRepository,
};
use std::sync::Arc;

use crate::catalog::TenantCatalog;
use crate::extractor::TenantExtractor;
use crate::lifecycle::BusinessLifecycle;
use crate::provisioner::TenantProvisioner;
use crate::reclaimer::TenantReclaimer;
use crate::reconcile::Reconciler;
use crate::router::{RoutingPolicy, StorageRouter};
use crate::service::BusinessService;

/// Every tenancy component wired around one shared catalog
#[derive(Clone)]
pub struct TenantStack {
    pub catalog: Arc<TenantCatalog>,
    pub router: StorageRouter,
    pub provisioner: Arc<TenantProvisioner>,
    pub reclaimer: TenantReclaimer,
    pub lifecycle: BusinessLifecycle,
    pub service: BusinessService,
    pub reconciler: Reconciler,
    pub extractor: TenantExtractor,
}

impl TenantStack {
    /// `default_db` must already carry the core schema
    pub fn new(config: DatabaseConfig, default_db: Database, policy: RoutingPolicy) -> Self {
        let catalog = Arc::new(TenantCatalog::new());
        let pool = default_db.pool().clone();

        let businesses = BusinessRepository::new(pool.clone());
        let users = UserRepository::new(pool.clone());
        let roles = RoleRepository::new(pool);

        let provisioner = Arc::new(TenantProvisioner::new(config, catalog.clone()));
        let reclaimer = TenantReclaimer::new(provisioner.clone());
        let lifecycle = BusinessLifecycle::new(
            businesses.clone(),
            users.clone(),
            roles,
            provisioner.clone(),
            reclaimer.clone(),
        );

        Self {
            router: StorageRouter::new(default_db.clone(), catalog.clone(), policy),
            service: BusinessService::new(businesses.clone(), users.clone(), lifecycle.clone()),
            reconciler: Reconciler::new(
                default_db,
                businesses,
                provisioner.clone(),
                lifecycle.clone(),
            ),
            extractor: TenantExtractor::new(users),
            catalog,
            provisioner,
            reclaimer,
            lifecycle,
        }
    }
}
