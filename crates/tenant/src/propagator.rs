use bizhub_models::UserId;
use std::future::Future;

use crate::context::{self, ClearOnDrop};
use crate::extractor::MembershipResolver;

/// Wrap one unit of work in a tenant context.
///
/// Opens a fresh scope, resolves the caller's business (absent when the
/// caller is anonymous, has no business, or resolution fails), runs `work`,
/// and clears the slot on every exit path.
pub async fn propagate<R, F>(resolver: &R, caller: Option<UserId>, work: F) -> F::Output
where
    R: MembershipResolver,
    F: Future,
{
    context::scope(async move {
        context::clear();
        let _guard = ClearOnDrop;

        let business = match caller {
            Some(user_id) => match resolver.current_business(user_id).await {
                Ok(business) => business,
                Err(e) => {
                    tracing::warn!(
                        "Failed to resolve business for user {}: {}",
                        user_id,
                        e
                    );
                    None
                }
            },
            None => None,
        };

        if let Some(business_id) = business {
            // cannot fail: we are inside the scope opened above
            let _ = context::set(business_id);
            tracing::debug!("Tenant context set to business {}", business_id);
        }

        work.await
    })
    .await
}
