use crate::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub tenant_stores: usize,
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let status = match state.tenants.router.default_handle().ping().await {
        Ok(()) => "healthy",
        Err(e) => {
            tracing::error!("Default store ping failed: {}", e);
            "degraded"
        }
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        tenant_stores: state.tenants.catalog.len(),
    })
}
