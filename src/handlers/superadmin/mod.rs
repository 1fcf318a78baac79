// Superadmin API surface. `status` only needs an authenticated session; the
// rest sits behind the elevation middleware.

pub mod accounts;
pub mod audit_log;
pub mod delegated_call;
pub mod status;
pub mod tenant_access;

pub use accounts::{accounts_get, accounts_post};
pub use audit_log::audit_log_get;
pub use delegated_call::delegated_call_post;
pub use status::status_get;
pub use tenant_access::{tenant_access_delete, tenant_access_post};
