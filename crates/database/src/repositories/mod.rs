// Shared default store
pub mod businesses;
pub mod roles;
pub mod users;

// Tenant stores
pub mod products;

#[cfg(test)]
mod tests {
    use super::businesses::BusinessRepository;
    use super::products::ProductRepository;
    use super::roles::RoleRepository;
    use super::users::UserRepository;
    use crate::error::DatabaseError;
    use crate::migrate::run_migrations;
    use crate::schema::{core_migrator, tenant_migrator};
    use crate::{Database, StoreTemplate};
    use bizhub_models::{roles, NewProduct, NewUser, StorageState, DEFAULT_ROLES};

    async fn migrated_store(
        dir: &std::path::Path,
        file: &str,
        migrator: sqlx::migrate::Migrator,
    ) -> Database {
        let descriptor = StoreTemplate::default().descriptor(dir.join(file));
        let db = Database::open("test", &descriptor, true).await.unwrap();
        run_migrations(db.pool(), &migrator).await.unwrap();
        db
    }

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: None,
        }
    }

    #[tokio::test]
    async fn test_business_lifecycle_columns() {
        let dir = tempfile::tempdir().unwrap();
        let db = migrated_store(dir.path(), "db_core.sqlite3", core_migrator()).await;
        let repo = BusinessRepository::new(db.pool().clone());

        let business = repo.create("Acme", None, None).await.unwrap();
        assert_eq!(business.storage_state, StorageState::Pending);
        assert!(business.storage_id.is_none());
        assert!(business.is_active);

        let business = repo
            .assign_storage_id(business.id, "business_1")
            .await
            .unwrap();
        assert_eq!(business.storage_id.as_deref(), Some("business_1"));

        // the storage id is write-once
        let business = repo
            .assign_storage_id(business.id, "business_other")
            .await
            .unwrap();
        assert_eq!(business.storage_id.as_deref(), Some("business_1"));

        let business = repo
            .set_storage_state(business.id, StorageState::Ready)
            .await
            .unwrap();
        assert!(business.is_ready());

        let renamed = repo.rename(business.id, "Acme_Corp").await.unwrap();
        assert_eq!(renamed.name, "Acme_Corp");
        assert_eq!(renamed.storage_id.as_deref(), Some("business_1"));

        assert!(repo.delete(business.id).await.unwrap());
        assert!(!repo.delete(business.id).await.unwrap());
        assert!(matches!(
            repo.find_by_id(business.id).await,
            Err(DatabaseError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_business_name() {
        let dir = tempfile::tempdir().unwrap();
        let db = migrated_store(dir.path(), "db_core.sqlite3", core_migrator()).await;
        let repo = BusinessRepository::new(db.pool().clone());

        repo.create("Acme", None, None).await.unwrap();
        let err = repo.create("Acme", None, None).await.unwrap_err();
        assert!(matches!(err, DatabaseError::DuplicateEntry(_)));
    }

    #[tokio::test]
    async fn test_membership_pointer() {
        let dir = tempfile::tempdir().unwrap();
        let db = migrated_store(dir.path(), "db_core.sqlite3", core_migrator()).await;
        let businesses = BusinessRepository::new(db.pool().clone());
        let users = UserRepository::new(db.pool().clone());
        let role_repo = RoleRepository::new(db.pool().clone());

        let user = users.create(&new_user("ana")).await.unwrap();
        let acme = businesses.create("Acme", None, Some(user.id)).await.unwrap();
        let other = businesses.create("Other", None, None).await.unwrap();

        assert_eq!(users.current_business(user.id).await.unwrap(), None);

        let admin = role_repo.resolve_admin_role(acme.id).await.unwrap();
        assert_eq!(admin.name, roles::ADMINISTRATOR);

        users.set_membership(user.id, acme.id, admin.id).await.unwrap();
        assert_eq!(users.current_business(user.id).await.unwrap(), Some(acme.id));

        // only clears when the pointer matches
        assert!(!users.clear_business_if(user.id, other.id).await.unwrap());
        assert!(users.clear_business_if(user.id, acme.id).await.unwrap());
        assert_eq!(users.current_business(user.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_default_roles_are_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let db = migrated_store(dir.path(), "db_core.sqlite3", core_migrator()).await;
        let businesses = BusinessRepository::new(db.pool().clone());
        let role_repo = RoleRepository::new(db.pool().clone());

        let acme = businesses.create("Acme", None, None).await.unwrap();
        let first = role_repo.ensure_default_roles(acme.id).await.unwrap();
        let second = role_repo.ensure_default_roles(acme.id).await.unwrap();

        assert_eq!(first.len(), DEFAULT_ROLES.len());
        assert_eq!(second.len(), DEFAULT_ROLES.len());
        assert_eq!(
            role_repo.resolve_admin_role(acme.id).await.unwrap().id,
            role_repo.resolve_admin_role(acme.id).await.unwrap().id
        );
    }

    #[tokio::test]
    async fn test_products_in_tenant_store() {
        let dir = tempfile::tempdir().unwrap();
        let db = migrated_store(dir.path(), "db_business_1.sqlite3", tenant_migrator()).await;
        let repo = ProductRepository::new(db.pool().clone());

        let product = NewProduct {
            sku: "ESP-01".to_string(),
            name: "Espresso".to_string(),
            price_cents: 250,
        };
        let created = repo.create(&product).await.unwrap();
        assert_eq!(created.sku, "ESP-01");
        assert!(matches!(
            repo.create(&product).await,
            Err(DatabaseError::DuplicateEntry(_))
        ));

        assert_eq!(repo.count().await.unwrap(), 1);
        assert_eq!(repo.list(10, 0).await.unwrap().len(), 1);
    }
}
