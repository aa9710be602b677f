//! Embedded migration sets, loaded from `migrations/` at compile time.
//!
//! Core versions start at 1 and tenant versions at 101. The default store
//! records both sets in one `_sqlx_migrations` ledger, so each migrator
//! ignores the versions owned by the other.

use sqlx::migrate::Migrator;

/// Shared default store (tenant-independent data)
pub fn core_migrator() -> Migrator {
    let mut migrator = sqlx::migrate!("./migrations/core");
    migrator.set_ignore_missing(true);
    migrator
}

/// Every tenant store (tenant-scoped data)
pub fn tenant_migrator() -> Migrator {
    let mut migrator = sqlx::migrate!("./migrations/tenant");
    migrator.set_ignore_missing(true);
    migrator
}
