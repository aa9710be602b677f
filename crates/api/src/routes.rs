use crate::handlers;
use crate::middleware;
use crate::AppState;
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Everything under /api runs inside the caller's tenant context
    let api = Router::new()
        .route("/api/businesses", post(handlers::business::create_business))
        .route(
            "/api/businesses/:id",
            get(handlers::business::get_business)
                .patch(handlers::business::rename_business)
                .delete(handlers::business::delete_business),
        )
        .route("/api/businesses/:id/owner", put(handlers::business::change_owner))
        .route(
            "/api/businesses/:id/deactivate",
            post(handlers::business::deactivate_business),
        )
        .route(
            "/api/businesses/:id/provision",
            post(handlers::business::retry_provisioning),
        )
        .route(
            "/api/products",
            get(handlers::products::list_products).post(handlers::products::create_product),
        )
        .layer(from_fn_with_state(state.clone(), middleware::tenant_context));

    Router::new()
        // Health check
        .route("/health", get(handlers::health::health_check))
        .merge(api)
        .with_state(state)
}
