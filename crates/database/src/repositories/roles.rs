use crate::error::{DatabaseError, Result};
use bizhub_models::{roles, BusinessId, BusinessRole, DEFAULT_ROLES};
use chrono::Utc;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct RoleRepository {
    pool: SqlitePool,
}

impl RoleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list_for_business(&self, business_id: BusinessId) -> Result<Vec<BusinessRole>> {
        let roles = sqlx::query_as::<_, BusinessRole>(
            "SELECT * FROM business_roles WHERE business_id = ? ORDER BY id",
        )
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(roles)
    }

    /// The business's administrative role, matched by any accepted alias
    pub async fn find_admin_role(&self, business_id: BusinessId) -> Result<Option<BusinessRole>> {
        let all = self.list_for_business(business_id).await?;

        Ok(all
            .into_iter()
            .find(|r| roles::ADMIN_ALIASES.contains(&r.name.as_str())))
    }

    /// Create any missing built-in role. Existing roles are left untouched.
    pub async fn ensure_default_roles(&self, business_id: BusinessId) -> Result<Vec<BusinessRole>> {
        let now = Utc::now();

        for role in DEFAULT_ROLES {
            sqlx::query(
                r#"
                INSERT INTO business_roles (business_id, name, description, is_default, can_modify, created_at)
                VALUES (?, ?, ?, 1, ?, ?)
                ON CONFLICT (business_id, name) DO NOTHING
                "#,
            )
            .bind(business_id)
            .bind(role.name)
            .bind(role.description)
            .bind(role.can_modify)
            .bind(now)
            .execute(&self.pool)
            .await?;
        }

        self.list_for_business(business_id).await
    }

    /// Resolve the administrative role, creating the built-in set if absent
    pub async fn resolve_admin_role(&self, business_id: BusinessId) -> Result<BusinessRole> {
        if let Some(role) = self.find_admin_role(business_id).await? {
            return Ok(role);
        }

        let created = self.ensure_default_roles(business_id).await?;
        created
            .into_iter()
            .find(|r| r.name == roles::ADMINISTRATOR)
            .ok_or_else(|| {
                DatabaseError::Internal(format!(
                    "Administrator role missing for business {}",
                    business_id
                ))
            })
    }
}
