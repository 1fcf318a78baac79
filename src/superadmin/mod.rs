pub mod authorizer;
pub mod registry;

pub use authorizer::TenantAuthorizer;
pub use registry::{RegistryError, SuperadminRegistry};
