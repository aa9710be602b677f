use bizhub_database::{BusinessRepository, UserRepository};
use bizhub_models::{
    normalize_business_name, Business, BusinessId, ChangeOwner, CreateBusiness, RenameBusiness,
    UserId,
};
use serde::Serialize;
use validator::Validate;

use crate::error::{Result, TenantError};
use crate::lifecycle::BusinessLifecycle;
use crate::reclaimer::ReclaimOutcome;

/// Record-level result of a create or retry. The business exists even when
/// `storage_ready` is false.
#[derive(Debug, Clone, Serialize)]
pub struct BusinessCreated {
    pub business: Business,
    pub storage_ready: bool,
}

impl From<Business> for BusinessCreated {
    fn from(business: Business) -> Self {
        Self {
            storage_ready: business.is_ready(),
            business,
        }
    }
}

/// Business CRUD that fires the lifecycle triggers
#[derive(Clone)]
pub struct BusinessService {
    businesses: BusinessRepository,
    users: UserRepository,
    lifecycle: BusinessLifecycle,
}

impl BusinessService {
    pub fn new(
        businesses: BusinessRepository,
        users: UserRepository,
        lifecycle: BusinessLifecycle,
    ) -> Self {
        Self {
            businesses,
            users,
            lifecycle,
        }
    }

    pub async fn create(
        &self,
        request: CreateBusiness,
        creator: Option<UserId>,
    ) -> Result<BusinessCreated> {
        request.validate()?;
        let name = checked_name(&request.name)?;

        if let Some(creator) = creator {
            self.users.find_by_id(creator).await?;
        }

        let business = self
            .businesses
            .create(&name, request.description.as_deref(), creator)
            .await?;
        let business = self.lifecycle.on_business_created(&business).await?;

        Ok(business.into())
    }

    pub async fn get(&self, id: BusinessId) -> Result<Business> {
        Ok(self.businesses.find_by_id(id).await?)
    }

    pub async fn rename(&self, id: BusinessId, request: RenameBusiness) -> Result<Business> {
        request.validate()?;
        let name = checked_name(&request.name)?;

        let current = self.businesses.find_by_id(id).await?;
        if current.name == name {
            return Ok(current);
        }

        let renamed = self.businesses.rename(id, &name).await?;
        self.lifecycle
            .on_business_renamed(&renamed, &current.name)
            .await;

        Ok(renamed)
    }

    pub async fn change_owner(&self, id: BusinessId, request: ChangeOwner) -> Result<Business> {
        let current = self.businesses.find_by_id(id).await?;

        if let Some(owner) = request.owner_id {
            self.users.find_by_id(owner).await?;
        }

        let updated = self.businesses.set_owner(id, request.owner_id).await?;
        self.lifecycle
            .on_owner_changed(&updated, current.owner_id, updated.owner_id)
            .await?;

        Ok(updated)
    }

    /// Soft delete. Storage and its catalog entry stay in place.
    pub async fn deactivate(&self, id: BusinessId) -> Result<Business> {
        let business = self.businesses.set_active(id, false).await?;
        tracing::info!("Business {} deactivated", id);
        Ok(business)
    }

    /// Hard delete: the row goes first, then storage is reclaimed. The
    /// outcome is informational; reclamation failures never fail the call.
    pub async fn delete(&self, id: BusinessId) -> Result<ReclaimOutcome> {
        let business = self.businesses.find_by_id(id).await?;

        if !self.businesses.delete(id).await? {
            return Err(TenantError::NotFound(format!("Business {}", id)));
        }

        Ok(self.lifecycle.on_business_deleted(&business).await)
    }

    /// Explicit retry for a business whose storage is not ready
    pub async fn retry_provisioning(&self, id: BusinessId) -> Result<BusinessCreated> {
        let business = self.businesses.find_by_id(id).await?;
        if !business.is_active {
            return Err(TenantError::InvalidInput(format!(
                "Business {} is inactive",
                id
            )));
        }

        let business = self.lifecycle.provision_storage(&business).await?;
        Ok(business.into())
    }
}

fn checked_name(raw: &str) -> Result<String> {
    let name = normalize_business_name(raw);
    if name.is_empty() {
        return Err(TenantError::InvalidInput(
            "Business name must not be blank".to_string(),
        ));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::{ModelCategory, Operation};
    use crate::context::TenantContext;
    use crate::testing::{store_files, Harness};
    use bizhub_database::DatabaseError;
    use bizhub_models::StorageState;

    fn create(name: &str) -> CreateBusiness {
        CreateBusiness {
            name: name.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_create_routes_tenant_data_to_new_store() {
        let h = Harness::new().await;
        let alice = h.user("alice").await;

        let created = h.service.create(create("Acme"), Some(alice.id)).await.unwrap();
        assert!(created.storage_ready);
        assert_eq!(h.catalog.len(), 1);

        let db = h
            .router
            .route_for(
                Some(TenantContext::new(created.business.id)),
                ModelCategory::Product,
                Operation::Write,
            )
            .unwrap();
        assert!(!db.is_default());
        assert_eq!(db.alias(), "business_1");
    }

    #[tokio::test]
    async fn test_create_normalizes_and_rejects_duplicates() {
        let h = Harness::new().await;

        let created = h.service.create(create("  Acme  Corp "), None).await.unwrap();
        assert_eq!(created.business.name, "Acme_Corp");

        let err = h.service.create(create("Acme Corp"), None).await.unwrap_err();
        assert!(matches!(
            err,
            TenantError::Database(DatabaseError::DuplicateEntry(_))
        ));
        assert_eq!(h.catalog.len(), 1);
        assert_eq!(store_files(&h).len(), 1);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name_and_unknown_creator() {
        let h = Harness::new().await;

        assert!(matches!(
            h.service.create(create("   "), None).await,
            Err(TenantError::InvalidInput(_))
        ));
        assert!(h
            .service
            .create(create("Acme"), Some(UserId(404)))
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_rename_does_not_move_storage() {
        let h = Harness::new().await;
        let created = h.service.create(create("Acme"), None).await.unwrap();
        let id = created.business.id;
        let location = h.catalog.get(id).unwrap().descriptor.location.clone();

        let renamed = h
            .service
            .rename(
                id,
                RenameBusiness {
                    name: "Acme Holdings".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(renamed.name, "Acme_Holdings");
        assert_eq!(renamed.storage_id.as_deref(), Some("business_1"));
        assert_eq!(h.catalog.get(id).unwrap().descriptor.location, location);
    }

    #[tokio::test]
    async fn test_change_owner_to_none() {
        let h = Harness::new().await;
        let alice = h.user("alice").await;
        let created = h.service.create(create("Acme"), Some(alice.id)).await.unwrap();

        let updated = h
            .service
            .change_owner(created.business.id, ChangeOwner { owner_id: None })
            .await
            .unwrap();

        assert_eq!(updated.owner_id, None);
        assert_eq!(h.users.find_by_id(alice.id).await.unwrap().business_id, None);
    }

    #[tokio::test]
    async fn test_deactivate_keeps_storage() {
        let h = Harness::new().await;
        let created = h.service.create(create("Acme"), None).await.unwrap();

        let business = h.service.deactivate(created.business.id).await.unwrap();

        assert!(!business.is_active);
        assert!(h.catalog.contains(business.id));
        assert_eq!(store_files(&h).len(), 1);
        assert!(h.service.retry_provisioning(business.id).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_reclaims_storage() {
        let h = Harness::new().await;
        let created = h.service.create(create("Acme"), None).await.unwrap();
        let id = created.business.id;

        assert_eq!(h.service.delete(id).await.unwrap(), ReclaimOutcome::Removed);

        assert!(h.service.get(id).await.unwrap_err().is_not_found());
        assert!(!h.catalog.contains(id));
        assert!(store_files(&h).is_empty());
        assert!(h.service.delete(id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_stale_provisioning_after_delete_is_refused() {
        let h = Harness::new().await;
        let created = h.service.create(create("Acme"), None).await.unwrap();
        let row = created.business;

        h.service.delete(row.id).await.unwrap();

        // a sweep or retry still holding the pre-delete row
        assert!(!h.provisioner.provision(&row).await);
        assert!(h
            .lifecycle
            .provision_storage(&row)
            .await
            .unwrap_err()
            .is_not_found());

        assert!(!h.catalog.contains(row.id));
        assert!(store_files(&h).is_empty());
        let db = h
            .router
            .route_for(
                Some(TenantContext::new(row.id)),
                ModelCategory::Product,
                Operation::Read,
            )
            .unwrap();
        assert!(db.is_default());
    }

    #[tokio::test]
    async fn test_retry_after_failure() {
        let h = Harness::new().await;
        let blocked = h.config.tenant_descriptor("business_1");
        std::fs::create_dir(blocked.location()).unwrap();

        let created = h.service.create(create("Acme"), None).await.unwrap();
        assert!(!created.storage_ready);
        assert_eq!(created.business.storage_state, StorageState::Failed);

        std::fs::remove_dir(blocked.location()).unwrap();
        let retried = h
            .service
            .retry_provisioning(created.business.id)
            .await
            .unwrap();

        assert!(retried.storage_ready);
        assert!(h.catalog.contains(created.business.id));
    }
}
