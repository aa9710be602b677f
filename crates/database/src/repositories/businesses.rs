use crate::error::{DatabaseError, Result};
use bizhub_models::{Business, BusinessId, StorageState, UserId};
use chrono::Utc;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct BusinessRepository {
    pool: SqlitePool,
}

impl BusinessRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a business row in `pending` storage state
    pub async fn create(
        &self,
        name: &str,
        description: Option<&str>,
        owner_id: Option<UserId>,
    ) -> Result<Business> {
        let now = Utc::now();

        sqlx::query_as::<_, Business>(
            r#"
            INSERT INTO businesses (name, owner_id, is_active, storage_state, description, created_at, updated_at)
            VALUES (?, ?, 1, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(owner_id)
        .bind(StorageState::Pending)
        .bind(description)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::on_unique(e, "Business", &format!("name '{}'", name)))
    }

    pub async fn find_by_id(&self, id: BusinessId) -> Result<Business> {
        sqlx::query_as::<_, Business>("SELECT * FROM businesses WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Business", &id.to_string()))
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<Business>> {
        let business = sqlx::query_as::<_, Business>("SELECT * FROM businesses WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(business)
    }

    /// Active businesses, oldest first
    pub async fn list_active(&self) -> Result<Vec<Business>> {
        let businesses = sqlx::query_as::<_, Business>(
            "SELECT * FROM businesses WHERE is_active = 1 ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(businesses)
    }

    /// Persist the storage id. Only the first call takes effect.
    pub async fn assign_storage_id(&self, id: BusinessId, storage_id: &str) -> Result<Business> {
        sqlx::query_as::<_, Business>(
            r#"
            UPDATE businesses
            SET storage_id = COALESCE(storage_id, ?), updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(storage_id)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Business", &id.to_string()))
    }

    pub async fn set_storage_state(&self, id: BusinessId, state: StorageState) -> Result<Business> {
        sqlx::query_as::<_, Business>(
            "UPDATE businesses SET storage_state = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(state)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Business", &id.to_string()))
    }

    pub async fn rename(&self, id: BusinessId, name: &str) -> Result<Business> {
        sqlx::query_as::<_, Business>(
            "UPDATE businesses SET name = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(name)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::on_unique(e, "Business", &format!("name '{}'", name)))?
        .ok_or_else(|| DatabaseError::not_found("Business", &id.to_string()))
    }

    pub async fn set_owner(&self, id: BusinessId, owner_id: Option<UserId>) -> Result<Business> {
        sqlx::query_as::<_, Business>(
            "UPDATE businesses SET owner_id = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(owner_id)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Business", &id.to_string()))
    }

    pub async fn set_active(&self, id: BusinessId, is_active: bool) -> Result<Business> {
        sqlx::query_as::<_, Business>(
            "UPDATE businesses SET is_active = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(is_active)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Business", &id.to_string()))
    }

    /// Hard delete. Returns false when no row matched.
    pub async fn delete(&self, id: BusinessId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM businesses WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
