use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Product row. Tenant-scoped: lives in the owning business's dedicated store.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: i64,
    pub sku: String,
    pub name: String,
    pub price_cents: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewProduct {
    #[validate(length(min = 1, max = 64))]
    pub sku: String,

    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[validate(range(min = 0))]
    pub price_cents: i64,
}
