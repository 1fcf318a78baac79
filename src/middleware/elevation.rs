use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::session::CurrentSession;
use crate::database::manager::DatabaseManager;
use crate::database::models::SuperadminAccount;
use crate::error::ApiError;
use crate::superadmin::SuperadminRegistry;

/// Elevated state for this request. Injection happens only after an
/// exact-email match against an active superadmin row.
#[derive(Clone, Debug)]
pub struct Elevation {
    pub account: SuperadminAccount,
}

/// Gate for admin-only routes, layered after `session_middleware`.
/// Non-superadmin sessions get 403; storage failure denies (fail closed).
pub async fn require_superadmin_middleware(
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let session = request
        .extensions()
        .get::<CurrentSession>()
        .cloned()
        .ok_or_else(|| {
            ApiError::unauthorized("Session required before elevation").into_response()
        })?;

    let pool = DatabaseManager::main_pool()
        .await
        .map_err(|e| ApiError::from(e).into_response())?;

    let account = SuperadminRegistry::new(pool)
        .is_superadmin(&session.0.email)
        .await
        .map_err(|e| ApiError::from(e).into_response())?;

    match account {
        Some(account) => {
            tracing::debug!(superadmin = %account.email, "Elevated request");
            request.extensions_mut().insert(Elevation { account });
            Ok(next.run(request).await)
        }
        None => {
            tracing::warn!(email = %session.0.email, "Superadmin access denied");
            Err(ApiError::forbidden("Superadmin access required").into_response())
        }
    }
}
