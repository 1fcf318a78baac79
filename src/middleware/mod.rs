pub mod elevation;
pub mod response;
pub mod session;

pub use elevation::{require_superadmin_middleware, Elevation};
pub use response::{ApiResponse, ApiResult};
pub use session::{session_middleware, CurrentSession};
