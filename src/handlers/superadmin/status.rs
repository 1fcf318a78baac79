use axum::Extension;
use serde_json::{json, Value};

use crate::database::manager::DatabaseManager;
use crate::delegation::CredentialBroker;
use crate::middleware::{ApiResponse, ApiResult, CurrentSession};
use crate::superadmin::{SuperadminRegistry, TenantAuthorizer};

/// GET /superadmin/status - elevation report for the current session.
/// Non-superadmins get a plain all-false payload, not an error.
pub async fn status_get(Extension(session): Extension<CurrentSession>) -> ApiResult<Value> {
    let session = session.0;
    let pool = DatabaseManager::main_pool().await?;

    let account = SuperadminRegistry::new(pool.clone())
        .is_superadmin(&session.email)
        .await?;

    let account = match account {
        Some(account) => account,
        None => {
            return Ok(ApiResponse::success(json!({
                "is_superadmin": false,
                "has_delegated_access": false,
                "scopes": [],
                "tenants": [],
            })));
        }
    };

    // Broker failure downgrades the report, never the request.
    let has_delegated_access = match CredentialBroker::new(pool.clone())
        .token_for_session(&session.id)
        .await
    {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!("Delegated access unavailable for status check: {}", e);
            false
        }
    };

    let tenants: Vec<String> = TenantAuthorizer::new(pool)
        .tenants_for(account.id)
        .await?
        .into_iter()
        .map(|access| access.tenant_id)
        .collect();

    Ok(ApiResponse::success(json!({
        "is_superadmin": true,
        "has_delegated_access": has_delegated_access,
        "scopes": account.granted_scopes,
        "tenants": tenants,
    })))
}
