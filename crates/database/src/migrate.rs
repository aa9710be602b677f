//! Schema migrations, run through `sqlx::migrate::Migrator`.

use crate::error::Result;
use crate::schema::{core_migrator, tenant_migrator};
use sqlx::migrate::Migrator;
use sqlx::SqlitePool;

/// Versions recorded in the store's `_sqlx_migrations` ledger
pub async fn applied_versions(pool: &SqlitePool) -> Result<Vec<i64>> {
    let ledger: Option<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'",
    )
    .fetch_optional(pool)
    .await?;

    if ledger.is_none() {
        return Ok(Vec::new());
    }

    let versions: Vec<i64> = sqlx::query_scalar(
        "SELECT version FROM _sqlx_migrations WHERE success = 1 ORDER BY version",
    )
    .fetch_all(pool)
    .await?;

    Ok(versions)
}

/// Apply every migration of `migrator` not yet recorded. Returns how many
/// were applied; an up-to-date store yields 0.
pub async fn run_migrations(pool: &SqlitePool, migrator: &Migrator) -> Result<usize> {
    let applied = applied_versions(pool).await?;

    let pending: Vec<_> = migrator
        .iter()
        .filter(|m| !m.migration_type.is_down_migration() && !applied.contains(&m.version))
        .collect();

    migrator.run(pool).await?;

    for migration in &pending {
        tracing::debug!(
            "Applied migration {} ({})",
            migration.version,
            migration.description
        );
    }

    Ok(pending.len())
}

/// Tenant schema only
pub async fn migrate_tenant_store(pool: &SqlitePool) -> Result<usize> {
    run_migrations(pool, &tenant_migrator()).await
}

/// Core schema plus the tenant schema. Tenant-scoped data routed to the
/// default store by the fallback policy needs tables to land in.
pub async fn migrate_default_store(pool: &SqlitePool) -> Result<usize> {
    let core = run_migrations(pool, &core_migrator()).await?;
    let tenant = run_migrations(pool, &tenant_migrator()).await?;
    Ok(core + tenant)
}
