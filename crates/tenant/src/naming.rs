use bizhub_models::{Business, BusinessId};

/// `tenant_storage_id(tenant)`: deterministic storage identifier derived from
/// the immutable numeric id, so renames never move storage
pub fn tenant_storage_id(business: &Business) -> String {
    storage_id_for(business.id)
}

pub fn storage_id_for(id: BusinessId) -> String {
    format!("business_{}", id)
}

/// The storage id a business is bound to: the one frozen on its row, or the
/// derived one when none has been persisted yet
pub fn bound_storage_id(business: &Business) -> String {
    business
        .storage_id
        .clone()
        .unwrap_or_else(|| tenant_storage_id(business))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizhub_models::StorageState;
    use chrono::Utc;

    fn business(id: i64, name: &str, storage_id: Option<&str>) -> Business {
        Business {
            id: BusinessId(id),
            name: name.to_string(),
            owner_id: None,
            is_active: true,
            storage_id: storage_id.map(str::to_string),
            storage_state: StorageState::Pending,
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_storage_id_ignores_name() {
        assert_eq!(tenant_storage_id(&business(7, "Acme", None)), "business_7");
        assert_eq!(
            tenant_storage_id(&business(7, "Acme_Renamed", None)),
            "business_7"
        );
    }

    #[test]
    fn test_frozen_storage_id_wins() {
        let b = business(7, "Acme", Some("business_legacy"));
        assert_eq!(bound_storage_id(&b), "business_legacy");
        assert_eq!(bound_storage_id(&business(8, "Beta", None)), "business_8");
    }
}
