pub mod tenant_context;

pub use tenant_context::{tenant_context, Caller, USER_ID_HEADER};
