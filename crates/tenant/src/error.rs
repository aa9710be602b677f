use bizhub_database::DatabaseError;
use bizhub_models::BusinessId;
use thiserror::Error;

use crate::category::ModelCategory;

pub type Result<T> = std::result::Result<T, TenantError>;

#[derive(Debug, Error)]
pub enum TenantError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage id {storage_id} is already registered to business {holder}")]
    StorageConflict {
        storage_id: String,
        holder: BusinessId,
    },

    #[error("Tenant store for business {0} is missing on disk")]
    StoreMissing(BusinessId),

    #[error("Business {0} was deleted and its store reclaimed")]
    Reclaimed(BusinessId),

    #[error(transparent)]
    Context(#[from] ContextError),
}

impl From<validator::ValidationErrors> for TenantError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::InvalidInput(errors.to_string())
    }
}

impl TenantError {
    /// Whether the error means the addressed record does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            TenantError::NotFound(_)
                | TenantError::Reclaimed(_)
                | TenantError::Database(DatabaseError::NotFound(_))
        )
    }
}

/// Raised only under the strict routing policy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("No tenant context for tenant-scoped {0} access")]
    NoTenantContext(ModelCategory),

    #[error("Tenant store for business {business_id} unavailable for {category}: {reason}")]
    StoreUnavailable {
        business_id: BusinessId,
        category: ModelCategory,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("No tenant context scope is active on this task")]
    OutsideScope,
}
