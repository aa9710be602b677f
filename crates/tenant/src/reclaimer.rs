//! Tenant Store Reclaimer
//!
//! Runs on hard deletion. The business is retired in the catalog before any
//! file is touched, so the router stops handing out the store first and no
//! later provisioning attempt can bring it back. Reclaiming holds the
//! provisioner's lock for the storage id, so it never interleaves with an
//! attempt already underway. Handles already obtained by in-flight work stay
//! valid; the pool is not closed here.

use bizhub_models::Business;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use crate::naming::bound_storage_id;
use crate::provisioner::TenantProvisioner;

/// Files SQLite may keep next to the main store file
const SIDECAR_SUFFIXES: &[&str] = &["-wal", "-shm", "-journal"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReclaimOutcome {
    /// Unregistered and physically removed
    Removed,
    /// Unregistered, but the files could not be removed
    Leaked,
    /// Nothing was registered or on disk
    Absent,
}

#[derive(Clone)]
pub struct TenantReclaimer {
    provisioner: Arc<TenantProvisioner>,
}

impl TenantReclaimer {
    pub fn new(provisioner: Arc<TenantProvisioner>) -> Self {
        Self { provisioner }
    }

    pub async fn reclaim(&self, business: &Business) -> ReclaimOutcome {
        let storage_id = bound_storage_id(business);
        let lock = self.provisioner.lock_for(&storage_id);
        let guard = lock.lock().await;

        let outcome = self.unregister_and_remove(business).await;

        self.provisioner.release_lock(&storage_id);
        drop(guard);
        outcome
    }

    async fn unregister_and_remove(&self, business: &Business) -> ReclaimOutcome {
        let location = match self.provisioner.catalog().retire(business.id) {
            Some(entry) => {
                tracing::info!(
                    "Unregistered store {} of business {}",
                    entry.storage_id,
                    business.id
                );
                entry.descriptor.location().to_path_buf()
            }
            None => self
                .provisioner
                .descriptor_for(business)
                .location()
                .to_path_buf(),
        };

        if tokio::fs::symlink_metadata(&location).await.is_err() {
            return ReclaimOutcome::Absent;
        }

        match remove_store_files(&location).await {
            Ok(()) => {
                tracing::info!(
                    "Removed store {} of business {}",
                    location.display(),
                    business.id
                );
                ReclaimOutcome::Removed
            }
            Err(e) => {
                tracing::error!(
                    "Failed to remove store {} of business {}: {}",
                    location.display(),
                    business.id,
                    e
                );
                ReclaimOutcome::Leaked
            }
        }
    }
}

async fn remove_store_files(location: &Path) -> std::io::Result<()> {
    tokio::fs::remove_file(location).await?;

    for suffix in SIDECAR_SUFFIXES {
        let mut sidecar = location.as_os_str().to_owned();
        sidecar.push(suffix);
        match tokio::fs::remove_file(&sidecar).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }

    Ok(())
}
