use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::user::UserId;

/// Numeric business (tenant) identity. Storage is keyed by this, never by name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct BusinessId(pub i64);

impl std::fmt::Display for BusinessId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for BusinessId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(BusinessId)
    }
}

/// Business (tenant) row in the shared default store
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Business {
    pub id: BusinessId,
    pub name: String,
    pub owner_id: Option<UserId>,
    pub is_active: bool,

    /// Fixed at creation; renames never touch it
    pub storage_id: Option<String>,
    pub storage_state: StorageState,

    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Business {
    pub fn is_ready(&self) -> bool {
        self.storage_state == StorageState::Ready
    }
}

/// Create new business request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateBusiness {
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    pub description: Option<String>,
}

/// Rename request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RenameBusiness {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

/// Ownership transfer request; `None` leaves the business ownerless
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeOwner {
    pub owner_id: Option<UserId>,
}

/// Provisioning state of a business's dedicated store
///
/// `Pending` and `Provisioning` are both picked up by the reconciliation
/// sweep; `Failed` stays routable only through the shared default store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageState {
    Pending,
    Provisioning,
    Ready,
    Failed,
}

impl StorageState {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageState::Pending => "pending",
            StorageState::Provisioning => "provisioning",
            StorageState::Ready => "ready",
            StorageState::Failed => "failed",
        }
    }

    /// Creation started but never reached a terminal state. The
    /// reconciliation sweep retries these; `Failed` needs an explicit retry.
    pub fn is_unfinished(&self) -> bool {
        matches!(self, StorageState::Pending | StorageState::Provisioning)
    }
}

impl std::fmt::Display for StorageState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StorageState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(StorageState::Pending),
            "provisioning" => Ok(StorageState::Provisioning),
            "ready" => Ok(StorageState::Ready),
            "failed" => Ok(StorageState::Failed),
            other => Err(format!("Invalid storage state: {}", other)),
        }
    }
}

// SQLx implementation for StorageState
impl sqlx::Type<sqlx::Sqlite> for StorageState {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <str as sqlx::Type<sqlx::Sqlite>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for StorageState {
    fn decode(
        value: sqlx::sqlite::SqliteValueRef<'r>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let s = <String as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        s.parse().map_err(Into::into)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for StorageState {
    fn encode_by_ref(
        &self,
        buf: &mut <sqlx::Sqlite as sqlx::Database>::ArgumentBuffer<'q>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <String as sqlx::Encode<'q, sqlx::Sqlite>>::encode(self.as_str().to_string(), buf)
    }
}

lazy_static::lazy_static! {
    static ref WHITESPACE_RUN: regex::Regex = regex::Regex::new(r"\s+").unwrap();
}

/// Business names are stored trimmed with inner whitespace collapsed to `_`
pub fn normalize_business_name(name: &str) -> String {
    WHITESPACE_RUN.replace_all(name.trim(), "_").into_owned()
}
