//! Storage Router
//!
//! Picks the physical store for every data access:
//! - tenant-independent categories always use the shared default store
//! - tenant-scoped categories use the active business's catalog entry
//!
//! A missing context, a missing catalog entry or a stale descriptor falls
//! back to the default store under [`RoutingPolicy::Fallback`] and is
//! rejected under [`RoutingPolicy::Strict`]. Routing never creates storage.

use bizhub_database::Database;
use bizhub_models::BusinessId;
use std::sync::Arc;

use crate::catalog::TenantCatalog;
use crate::category::{ModelCategory, Operation};
use crate::context::{self, TenantContext};
use crate::error::RouteError;

/// What to do when a tenant-scoped access cannot reach a tenant store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoutingPolicy {
    /// Route to the shared default store (legacy behavior)
    #[default]
    Fallback,
    /// Refuse the access
    Strict,
}

impl From<&str> for RoutingPolicy {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "strict" | "reject" => Self::Strict,
            _ => Self::Fallback,
        }
    }
}

impl RoutingPolicy {
    /// Read `TENANT_ROUTING_POLICY` (`fallback` | `strict`)
    pub fn from_env() -> Self {
        std::env::var("TENANT_ROUTING_POLICY")
            .map(|v| Self::from(v.as_str()))
            .unwrap_or_default()
    }
}

#[derive(Clone)]
pub struct StorageRouter {
    default_db: Database,
    catalog: Arc<TenantCatalog>,
    policy: RoutingPolicy,
}

impl StorageRouter {
    pub fn new(default_db: Database, catalog: Arc<TenantCatalog>, policy: RoutingPolicy) -> Self {
        Self {
            default_db,
            catalog,
            policy,
        }
    }

    pub fn default_handle(&self) -> &Database {
        &self.default_db
    }

    pub fn catalog(&self) -> &Arc<TenantCatalog> {
        &self.catalog
    }

    pub fn policy(&self) -> RoutingPolicy {
        self.policy
    }

    /// Route using the task-scoped tenant context
    pub fn route(&self, category: ModelCategory, op: Operation) -> Result<Database, RouteError> {
        self.route_for(context::current(), category, op)
    }

    /// Route with an explicitly supplied tenant context
    pub fn route_for(
        &self,
        ctx: Option<TenantContext>,
        category: ModelCategory,
        op: Operation,
    ) -> Result<Database, RouteError> {
        if category.is_tenant_independent() {
            return Ok(self.default_db.clone());
        }

        let Some(ctx) = ctx else {
            return match self.policy {
                RoutingPolicy::Fallback => {
                    tracing::debug!(
                        "No tenant context for {:?} of {}, using default store",
                        op,
                        category
                    );
                    Ok(self.default_db.clone())
                }
                RoutingPolicy::Strict => Err(RouteError::NoTenantContext(category)),
            };
        };

        match self.lookup(ctx.business_id) {
            Ok(db) => Ok(db),
            Err(reason) => match self.policy {
                RoutingPolicy::Fallback => Ok(self.default_db.clone()),
                RoutingPolicy::Strict => Err(RouteError::StoreUnavailable {
                    business_id: ctx.business_id,
                    category,
                    reason,
                }),
            },
        }
    }

    pub fn db_for_read(&self, category: ModelCategory) -> Result<Database, RouteError> {
        self.route(category, Operation::Read)
    }

    pub fn db_for_write(&self, category: ModelCategory) -> Result<Database, RouteError> {
        self.route(category, Operation::Write)
    }

    fn lookup(&self, business_id: BusinessId) -> Result<Database, String> {
        let Some(entry) = self.catalog.get(business_id) else {
            tracing::debug!("Business {} has no catalog entry", business_id);
            return Err("no catalog entry".to_string());
        };

        if let Err(e) = entry.descriptor.validate() {
            tracing::warn!(
                "Stale catalog entry for business {} ({}): {}",
                business_id,
                entry.storage_id,
                e
            );
            return Err(e.to_string());
        }

        Ok(entry.handle.clone())
    }
}
