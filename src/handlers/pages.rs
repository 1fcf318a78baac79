use axum::Extension;
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, CurrentSession};

/// GET /admin - authenticated landing payload. Page rendering is the
/// platform's concern; this surface only proves the session and hands the
/// renderer its identity data.
pub async fn admin_landing(Extension(session): Extension<CurrentSession>) -> ApiResponse<Value> {
    let session = session.0;
    ApiResponse::success(json!({
        "email": session.email,
        "name": session.name,
        "picture": session.picture,
        "provider": session.provider,
        "session_expires_at": session.expires_at,
    }))
}
