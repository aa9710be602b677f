use crate::handlers::ErrorResponse;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use bizhub_models::UserId;
use bizhub_tenant::propagate;
use std::sync::Arc;

/// Caller identity forwarded by the authenticating gateway
pub const USER_ID_HEADER: &str = "x-bizhub-user-id";

/// Authenticated caller, if any
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub Option<UserId>);

impl Caller {
    pub fn require(self) -> Result<UserId, (StatusCode, Json<ErrorResponse>)> {
        self.0.ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new(
                    "unauthenticated",
                    "An authenticated caller is required",
                )),
            )
        })
    }
}

fn caller_from_headers(headers: &HeaderMap) -> Result<Option<UserId>, (StatusCode, Json<ErrorResponse>)> {
    let Some(value) = headers.get(USER_ID_HEADER) else {
        return Ok(None);
    };

    value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<i64>().ok())
        .map(|id| Some(UserId(id)))
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(
                    "invalid_caller",
                    "Caller id header must be a numeric user id",
                )),
            )
        })
}

/// Run the rest of the request inside the caller's tenant context
pub async fn tenant_context(
    State(state): State<Arc<crate::AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let caller = caller_from_headers(&headers)?;
    request.extensions_mut().insert(Caller(caller));

    Ok(propagate(&state.tenants.extractor, caller, next.run(request)).await)
}
