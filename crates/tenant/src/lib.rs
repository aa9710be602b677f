// Tenant routing and per-tenant storage lifecycle
//
// context/propagator: who the current unit of work acts for
// router: which physical store backs a data access
// provisioner/reclaimer: creating and destroying tenant stores
// lifecycle/service/reconcile: when the above run

pub mod catalog;
pub mod category;
pub mod context;
pub mod error;
pub mod extractor;
pub mod lifecycle;
pub mod naming;
pub mod propagator;
pub mod provisioner;
pub mod reclaimer;
pub mod reconcile;
pub mod router;
pub mod service;
pub mod stack;

pub use catalog::{CatalogEntry, Registration, TenantCatalog};
pub use category::{ModelCategory, Operation};
pub use context::TenantContext;
pub use error::{ContextError, Result, RouteError, TenantError};
pub use extractor::{MembershipResolver, TenantExtractor};
pub use lifecycle::BusinessLifecycle;
pub use naming::tenant_storage_id;
pub use propagator::propagate;
pub use provisioner::{Provisioned, TenantProvisioner};
pub use reclaimer::{ReclaimOutcome, TenantReclaimer};
pub use reconcile::{MigrationReport, ReconcileReport, Reconciler};
pub use router::{RoutingPolicy, StorageRouter};
pub use service::{BusinessCreated, BusinessService};
pub use stack::TenantStack;

#[cfg(test)]
pub(crate) mod testing {
    use bizhub_database::{
        migrate_default_store, BusinessRepository, Database, DatabaseConfig, RoleRepository,
        StoreTemplate, UserRepository,
    };
    use bizhub_models::{Business, BusinessId, NewUser, StorageState, User};
    use chrono::Utc;
    use std::ops::Deref;
    use std::time::Duration;

    use crate::router::RoutingPolicy;
    use crate::stack::TenantStack;

    /// A full stack over real SQLite files in a temp directory
    pub struct Harness {
        pub dir: tempfile::TempDir,
        pub config: DatabaseConfig,
        pub businesses: BusinessRepository,
        pub users: UserRepository,
        pub roles: RoleRepository,
        stack: TenantStack,
    }

    impl Deref for Harness {
        type Target = TenantStack;

        fn deref(&self) -> &TenantStack {
            &self.stack
        }
    }

    impl Harness {
        pub async fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let config = DatabaseConfig {
                storage_dir: dir.path().to_path_buf(),
                template: StoreTemplate {
                    acquire_timeout: Duration::from_secs(2),
                    ..StoreTemplate::default()
                },
            };

            let default_db = Database::new(&config).await.unwrap();
            migrate_default_store(default_db.pool()).await.unwrap();

            let pool = default_db.pool().clone();
            let stack = TenantStack::new(config.clone(), default_db, RoutingPolicy::Fallback);

            Self {
                businesses: BusinessRepository::new(pool.clone()),
                users: UserRepository::new(pool.clone()),
                roles: RoleRepository::new(pool),
                dir,
                config,
                stack,
            }
        }

        pub async fn user(&self, username: &str) -> User {
            self.users
                .create(&NewUser {
                    username: username.to_string(),
                    email: None,
                })
                .await
                .unwrap()
        }
    }

    /// An in-memory business row that was never inserted
    pub fn business(id: i64, name: &str) -> Business {
        Business {
            id: BusinessId(id),
            name: name.to_string(),
            owner_id: None,
            is_active: true,
            storage_id: None,
            storage_state: StorageState::Pending,
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// Tenant store files in the harness directory, sorted, sidecars excluded
    pub fn store_files(h: &Harness) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(h.dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with("db_business_") && name.ends_with(".sqlite3"))
            .collect();
        names.sort();
        names
    }
}
