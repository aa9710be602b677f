// Resolves the caller's business membership
// Inbound boundary with the authentication layer

use bizhub_database::UserRepository;
use bizhub_models::{BusinessId, UserId};
use std::future::Future;

use crate::error::Result;

/// `current_caller_tenant_membership()`: which business the authenticated
/// caller belongs to, if any
pub trait MembershipResolver: Send + Sync {
    fn current_business(
        &self,
        caller: UserId,
    ) -> impl Future<Output = Result<Option<BusinessId>>> + Send;
}

/// Resolves membership from the `users` table of the shared store
#[derive(Clone)]
pub struct TenantExtractor {
    users: UserRepository,
}

impl TenantExtractor {
    pub fn new(users: UserRepository) -> Self {
        Self { users }
    }
}

impl MembershipResolver for TenantExtractor {
    async fn current_business(&self, caller: UserId) -> Result<Option<BusinessId>> {
        Ok(self.users.current_business(caller).await?)
    }
}
