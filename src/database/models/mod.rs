pub mod audit_entry;
pub mod delegated_token;
pub mod session;
pub mod superadmin;

pub use audit_entry::AuditEntry;
pub use delegated_token::DelegatedToken;
pub use session::Session;
pub use superadmin::{SuperadminAccount, TenantAccess};
