use serde::Serialize;

/// Data-model category of an operation. The router special-cases the
/// tenant-independent set by category, never by naming convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelCategory {
    // Tenant-independent
    Account,
    Business,
    Role,
    RolePermission,

    // Tenant-scoped
    Product,
    InventoryItem,
    Order,
    OrderLine,
}

impl ModelCategory {
    /// Categories that always live in the shared default store
    pub const TENANT_INDEPENDENT: &'static [ModelCategory] = &[
        ModelCategory::Account,
        ModelCategory::Business,
        ModelCategory::Role,
        ModelCategory::RolePermission,
    ];

    pub fn is_tenant_independent(&self) -> bool {
        Self::TENANT_INDEPENDENT.contains(self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelCategory::Account => "account",
            ModelCategory::Business => "business",
            ModelCategory::Role => "role",
            ModelCategory::RolePermission => "role_permission",
            ModelCategory::Product => "product",
            ModelCategory::InventoryItem => "inventory_item",
            ModelCategory::Order => "order",
            ModelCategory::OrderLine => "order_line",
        }
    }
}

impl std::fmt::Display for ModelCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of data access. Reads and writes route identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Read,
    Write,
}
