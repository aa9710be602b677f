use crate::error::{DatabaseError, Result};
use bizhub_models::{BusinessId, NewUser, RoleId, User, UserId};
use chrono::Utc;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let now = Utc::now();

        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, is_active, created_at, updated_at)
            VALUES (?, ?, 1, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::on_unique(e, "User", &format!("username '{}'", new_user.username)))
    }

    /// Find user by ID
    pub async fn find_by_id(&self, id: UserId) -> Result<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("User", &id.to_string()))
    }

    /// The business an active user currently belongs to, if any
    pub async fn current_business(&self, id: UserId) -> Result<Option<BusinessId>> {
        let row: Option<(Option<BusinessId>,)> =
            sqlx::query_as("SELECT business_id FROM users WHERE id = ? AND is_active = 1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.and_then(|(business_id,)| business_id))
    }

    /// Point the user at a business and role
    pub async fn set_membership(
        &self,
        id: UserId,
        business_id: BusinessId,
        role_id: RoleId,
    ) -> Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET business_id = ?, business_role_id = ?, updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(business_id)
        .bind(role_id)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("User", &id.to_string()))
    }

    /// Clear the user's membership only if it points at `business_id`.
    /// Returns true when a pointer was cleared.
    pub async fn clear_business_if(&self, id: UserId, business_id: BusinessId) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET business_id = NULL, business_role_id = NULL, updated_at = ?
            WHERE id = ? AND business_id = ?
            "#,
        )
        .bind(Utc::now())
        .bind(id)
        .bind(business_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
