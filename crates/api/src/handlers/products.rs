// Tenant-scoped endpoints: every access goes through the storage router

use crate::handlers::error::{database_error, route_error, validation_error, ApiError};
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use bizhub_database::ProductRepository;
use bizhub_models::{NewProduct, Product};
use bizhub_tenant::ModelCategory;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductList {
    /// Alias of the store that served the request
    pub store: String,
    pub products: Vec<Product>,
    pub total: i64,
}

pub async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ProductList>, ApiError> {
    let db = state
        .tenants
        .router
        .db_for_read(ModelCategory::Product)
        .map_err(route_error)?;
    let products = ProductRepository::new(db.pool().clone());

    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);

    Ok(Json(ProductList {
        store: db.alias().to_string(),
        products: products.list(limit, offset).await.map_err(database_error)?,
        total: products.count().await.map_err(database_error)?,
    }))
}

pub async fn create_product(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    request.validate().map_err(validation_error)?;

    let db = state
        .tenants
        .router
        .db_for_write(ModelCategory::Product)
        .map_err(route_error)?;

    let product = ProductRepository::new(db.pool().clone())
        .create(&request)
        .await
        .map_err(database_error)?;

    tracing::debug!("Created product {} in store {}", product.sku, db.alias());
    Ok((StatusCode::CREATED, Json(product)))
}
