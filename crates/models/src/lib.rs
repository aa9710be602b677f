// Shared-store models
pub mod business;
pub mod role;
pub mod user;

// Tenant-store models
pub mod product;

// Re-export commonly used types
pub use business::{
    normalize_business_name, Business, BusinessId, ChangeOwner, CreateBusiness, RenameBusiness,
    StorageState,
};
pub use product::{NewProduct, Product};
pub use role::{roles, BusinessRole, DefaultRole, RoleId, DEFAULT_ROLES};
pub use user::{NewUser, User, UserId};
