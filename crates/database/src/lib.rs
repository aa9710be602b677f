pub mod connection;
pub mod error;
pub mod migrate;
pub mod repositories;
pub mod schema;

pub use connection::{
    Database, DatabaseConfig, Engine, StoreDescriptor, StoreTemplate, DEFAULT_ALIAS,
    DEFAULT_STORE_FILE,
};
pub use error::{DatabaseError, Result};
pub use migrate::{
    applied_versions, migrate_default_store, migrate_tenant_store, run_migrations,
};
pub use repositories::{
    businesses::BusinessRepository, products::ProductRepository, roles::RoleRepository,
    users::UserRepository,
};
pub use schema::{core_migrator, tenant_migrator};
