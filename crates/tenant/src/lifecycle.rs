//! Tenant Lifecycle Hook
//!
//! The four triggers business CRUD code fires: created, renamed, owner
//! changed, deleted. Storage follows the two-phase flow
//! `pending -> provisioning -> ready | failed`, persisted on the row.

use bizhub_database::{BusinessRepository, RoleRepository, UserRepository};
use bizhub_models::{Business, StorageState, UserId};
use std::sync::Arc;

use crate::error::Result;
use crate::naming::{bound_storage_id, tenant_storage_id};
use crate::provisioner::TenantProvisioner;
use crate::reclaimer::{ReclaimOutcome, TenantReclaimer};

#[derive(Clone)]
pub struct BusinessLifecycle {
    businesses: BusinessRepository,
    users: UserRepository,
    roles: RoleRepository,
    provisioner: Arc<TenantProvisioner>,
    reclaimer: TenantReclaimer,
}

impl BusinessLifecycle {
    pub fn new(
        businesses: BusinessRepository,
        users: UserRepository,
        roles: RoleRepository,
        provisioner: Arc<TenantProvisioner>,
        reclaimer: TenantReclaimer,
    ) -> Self {
        Self {
            businesses,
            users,
            roles,
            provisioner,
            reclaimer,
        }
    }

    /// Provision storage, then bind the creator as owner and administrator.
    /// Returns the row in its final storage state.
    pub async fn on_business_created(&self, business: &Business) -> Result<Business> {
        tracing::info!("Business {} ({}) created", business.id, business.name);
        self.provision_storage(business).await
    }

    /// Storage stays where it was bound at creation
    pub async fn on_business_renamed(&self, business: &Business, old_name: &str) {
        tracing::info!(
            "Business {} renamed from {} to {}; storage stays at {}",
            business.id,
            old_name,
            business.name,
            bound_storage_id(business)
        );
    }

    pub async fn on_owner_changed(
        &self,
        business: &Business,
        old_owner: Option<UserId>,
        new_owner: Option<UserId>,
    ) -> Result<()> {
        if old_owner == new_owner {
            return Ok(());
        }

        if let Some(old_owner) = old_owner {
            if self.users.clear_business_if(old_owner, business.id).await? {
                tracing::info!(
                    "Cleared business {} from previous owner {}",
                    business.id,
                    old_owner
                );
            }
        }

        match new_owner {
            Some(new_owner) => {
                let admin = self.roles.resolve_admin_role(business.id).await?;
                self.users
                    .set_membership(new_owner, business.id, admin.id)
                    .await?;
                tracing::info!(
                    "User {} now owns business {} as {}",
                    new_owner,
                    business.id,
                    admin.name
                );
            }
            None => tracing::info!("Business {} is now ownerless", business.id),
        }

        Ok(())
    }

    pub async fn on_business_deleted(&self, business: &Business) -> ReclaimOutcome {
        tracing::info!("Business {} ({}) deleted", business.id, business.name);
        self.reclaimer.reclaim(business).await
    }

    /// Drive one provisioning attempt through the persisted states. Storage
    /// failure is recorded as `failed`, not returned as an error.
    pub async fn provision_storage(&self, business: &Business) -> Result<Business> {
        let id = business.id;

        if business.storage_id.is_none() {
            self.businesses
                .assign_storage_id(id, &tenant_storage_id(business))
                .await?;
        }
        let business = self
            .businesses
            .set_storage_state(id, StorageState::Provisioning)
            .await?;

        let ready = self.provisioner.provision(&business).await;
        let state = if ready {
            StorageState::Ready
        } else {
            StorageState::Failed
        };
        let business = self.businesses.set_storage_state(id, state).await?;

        if ready {
            self.bind_owner(&business).await?;
        } else {
            tracing::warn!(
                "Business {} has no dedicated store; tenant data falls back to the default store",
                id
            );
        }

        Ok(business)
    }

    async fn bind_owner(&self, business: &Business) -> Result<()> {
        self.roles.ensure_default_roles(business.id).await?;

        let Some(owner) = business.owner_id else {
            return Ok(());
        };

        let admin = self.roles.resolve_admin_role(business.id).await?;
        self.users.set_membership(owner, business.id, admin.id).await?;
        tracing::debug!(
            "Bound owner {} to business {} as {}",
            owner,
            business.id,
            admin.name
        );

        Ok(())
    }
}
