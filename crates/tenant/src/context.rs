//! Task-scoped tenant context.
//!
//! The slot only exists inside [`scope`]; each scope starts empty and is
//! dropped with the unit of work, so an id can never outlive its request or
//! be observed by another task. Spawned tasks do not inherit the slot: pass a
//! [`TenantContext`] explicitly across `tokio::spawn`.

use bizhub_models::BusinessId;
use std::cell::Cell;
use std::future::Future;

use crate::error::ContextError;

tokio::task_local! {
    static CURRENT_TENANT: Cell<Option<BusinessId>>;
}

/// Tenant identity attached to one unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TenantContext {
    pub business_id: BusinessId,
}

impl TenantContext {
    pub fn new(business_id: BusinessId) -> Self {
        Self { business_id }
    }
}

/// Run `fut` with a fresh, empty tenant slot
pub async fn scope<F: Future>(fut: F) -> F::Output {
    CURRENT_TENANT.scope(Cell::new(None), fut).await
}

/// Set the active tenant for the enclosing scope
pub fn set(business_id: BusinessId) -> Result<(), ContextError> {
    CURRENT_TENANT
        .try_with(|slot| slot.set(Some(business_id)))
        .map_err(|_| ContextError::OutsideScope)
}

/// The active tenant, or `None` when unset or outside any scope
pub fn get() -> Option<BusinessId> {
    CURRENT_TENANT.try_with(|slot| slot.get()).ok().flatten()
}

pub fn clear() {
    let _ = CURRENT_TENANT.try_with(|slot| slot.set(None));
}

pub fn current() -> Option<TenantContext> {
    get().map(TenantContext::new)
}

/// Clears the slot when dropped, including on unwind
#[derive(Debug)]
pub(crate) struct ClearOnDrop;

impl Drop for ClearOnDrop {
    fn drop(&mut self) {
        clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_outside_scope() {
        assert_eq!(get(), None);
        assert_eq!(set(BusinessId(1)), Err(ContextError::OutsideScope));
        clear();
        assert_eq!(current(), None);
    }

    #[tokio::test]
    async fn test_set_get_clear() {
        scope(async {
            assert_eq!(get(), None);
            set(BusinessId(3)).unwrap();
            assert_eq!(get(), Some(BusinessId(3)));
            assert_eq!(current(), Some(TenantContext::new(BusinessId(3))));
            clear();
            assert_eq!(get(), None);
        })
        .await;

        assert_eq!(get(), None);
    }

    #[tokio::test]
    async fn test_scopes_start_empty() {
        scope(async {
            set(BusinessId(1)).unwrap();
        })
        .await;

        scope(async {
            assert_eq!(get(), None);
        })
        .await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_no_cross_talk_between_tasks() {
        let mut handles = Vec::new();
        for id in 1..=32i64 {
            handles.push(tokio::spawn(scope(async move {
                set(BusinessId(id)).unwrap();
                for _ in 0..10 {
                    tokio::time::sleep(Duration::from_millis(1)).await;
                    assert_eq!(get(), Some(BusinessId(id)));
                }
            })));
        }

        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_spawned_task_does_not_inherit() {
        scope(async {
            set(BusinessId(5)).unwrap();
            let seen = tokio::spawn(async { get() }).await.unwrap();
            assert_eq!(seen, None);
        })
        .await;
    }
}
