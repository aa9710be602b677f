use axum::{http::StatusCode, Json};
use bizhub_database::DatabaseError;
use bizhub_tenant::{RouteError, TenantError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
        }
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: &str, message: &str) -> ApiError {
    (status, Json(ErrorResponse::new(error, message)))
}

pub fn tenant_error(e: TenantError) -> ApiError {
    if e.is_not_found() {
        return api_error(StatusCode::NOT_FOUND, "not_found", &e.to_string());
    }

    match &e {
        TenantError::InvalidInput(msg) | TenantError::Database(DatabaseError::InvalidInput(msg)) => {
            api_error(StatusCode::BAD_REQUEST, "invalid_input", msg)
        }
        TenantError::Database(DatabaseError::DuplicateEntry(msg)) => {
            api_error(StatusCode::CONFLICT, "already_exists", msg)
        }
        _ => {
            tracing::error!("Request failed: {}", e);
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Internal server error",
            )
        }
    }
}

pub fn database_error(e: DatabaseError) -> ApiError {
    tenant_error(e.into())
}

/// Only reachable under the strict routing policy
pub fn route_error(e: RouteError) -> ApiError {
    tracing::warn!("Routing refused: {}", e);
    match e {
        RouteError::NoTenantContext(_) => api_error(
            StatusCode::FORBIDDEN,
            "no_tenant_context",
            "Caller is not a member of any business",
        ),
        RouteError::StoreUnavailable { business_id, .. } => api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "tenant_store_unavailable",
            &format!("Store for business {} is not available", business_id),
        ),
    }
}

pub fn validation_error(e: validator::ValidationErrors) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, "validation_error", &e.to_string())
}
