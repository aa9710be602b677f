use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::business::BusinessId;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct RoleId(pub i64);

/// Per-business role. Role catalogs are tenant-independent and live in the
/// shared default store.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BusinessRole {
    pub id: RoleId,
    pub business_id: BusinessId,
    pub name: String,
    pub description: Option<String>,
    pub is_default: bool,
    pub can_modify: bool,
    pub created_at: DateTime<Utc>,
}

/// Built-in role names
pub mod roles {
    pub const ADMINISTRATOR: &str = "Administrator";
    pub const VIEWER: &str = "Viewer";
    pub const WAITER: &str = "Waiter";
    pub const COOK: &str = "Cook";

    /// Names accepted as the administrative role when binding an owner
    pub const ADMIN_ALIASES: &[&str] = &[ADMINISTRATOR, "Admin"];
}

/// Template for a role every business starts with
#[derive(Debug, Clone, Copy)]
pub struct DefaultRole {
    pub name: &'static str,
    pub description: &'static str,
    pub can_modify: bool,
}

pub const DEFAULT_ROLES: &[DefaultRole] = &[
    DefaultRole {
        name: roles::ADMINISTRATOR,
        description: "Full access to every business function",
        can_modify: false,
    },
    DefaultRole {
        name: roles::VIEWER,
        description: "Read-only access to basic information",
        can_modify: true,
    },
    DefaultRole {
        name: roles::WAITER,
        description: "Manages orders and views inventory",
        can_modify: true,
    },
    DefaultRole {
        name: roles::COOK,
        description: "Views and updates orders",
        can_modify: true,
    },
];
