use crate::handlers::error::{tenant_error, ApiError};
use crate::middleware::Caller;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use bizhub_models::{Business, BusinessId, ChangeOwner, CreateBusiness, RenameBusiness};
use bizhub_tenant::BusinessCreated;
use std::sync::Arc;

/// Create a business owned by the caller and provision its store.
/// Responds 201 even when provisioning failed; see `storage_ready`.
pub async fn create_business(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Json(request): Json<CreateBusiness>,
) -> Result<(StatusCode, Json<BusinessCreated>), ApiError> {
    let owner = caller.require()?;

    let created = state
        .tenants
        .service
        .create(request, Some(owner))
        .await
        .map_err(tenant_error)?;

    if !created.storage_ready {
        tracing::warn!(
            "Business {} created without a dedicated store",
            created.business.id
        );
    }

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_business(
    State(state): State<Arc<AppState>>,
    Path(id): Path<BusinessId>,
) -> Result<Json<Business>, ApiError> {
    let business = state.tenants.service.get(id).await.map_err(tenant_error)?;
    Ok(Json(business))
}

pub async fn rename_business(
    State(state): State<Arc<AppState>>,
    Path(id): Path<BusinessId>,
    Json(request): Json<RenameBusiness>,
) -> Result<Json<Business>, ApiError> {
    let business = state
        .tenants
        .service
        .rename(id, request)
        .await
        .map_err(tenant_error)?;
    Ok(Json(business))
}

pub async fn change_owner(
    State(state): State<Arc<AppState>>,
    Path(id): Path<BusinessId>,
    Json(request): Json<ChangeOwner>,
) -> Result<Json<Business>, ApiError> {
    let business = state
        .tenants
        .service
        .change_owner(id, request)
        .await
        .map_err(tenant_error)?;
    Ok(Json(business))
}

/// Soft delete; the store is kept
pub async fn deactivate_business(
    State(state): State<Arc<AppState>>,
    Path(id): Path<BusinessId>,
) -> Result<Json<Business>, ApiError> {
    let business = state
        .tenants
        .service
        .deactivate(id)
        .await
        .map_err(tenant_error)?;
    Ok(Json(business))
}

pub async fn retry_provisioning(
    State(state): State<Arc<AppState>>,
    Path(id): Path<BusinessId>,
) -> Result<Json<BusinessCreated>, ApiError> {
    let result = state
        .tenants
        .service
        .retry_provisioning(id)
        .await
        .map_err(tenant_error)?;
    Ok(Json(result))
}

/// Hard delete. Storage cleanup failures are logged, not reported.
pub async fn delete_business(
    State(state): State<Arc<AppState>>,
    Path(id): Path<BusinessId>,
) -> Result<StatusCode, ApiError> {
    let outcome = state
        .tenants
        .service
        .delete(id)
        .await
        .map_err(tenant_error)?;
    tracing::debug!("Business {} deleted, storage {:?}", id, outcome);

    Ok(StatusCode::NO_CONTENT)
}
