use axum::{http::HeaderMap, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::audit::{client_meta, AuditLog, NewAuditEntry};
use crate::database::manager::DatabaseManager;
use crate::database::models::TenantAccess;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Elevation};
use crate::superadmin::TenantAuthorizer;

#[derive(Debug, Deserialize)]
pub struct GrantAccessRequest {
    pub account_id: Uuid,
    pub tenant_id: String,
    pub access_level: Option<String>,
}

/// POST /superadmin/tenant-access - grant a (account, tenant) pair.
pub async fn tenant_access_post(
    Extension(elevation): Extension<Elevation>,
    headers: HeaderMap,
    Json(body): Json<GrantAccessRequest>,
) -> ApiResult<TenantAccess> {
    let tenant_id = body.tenant_id.trim();
    if tenant_id.is_empty() {
        return Err(ApiError::bad_request("tenant_id is required"));
    }
    let access_level = body.access_level.as_deref().unwrap_or("full");

    let pool = DatabaseManager::main_pool().await?;
    let access = TenantAuthorizer::new(pool.clone())
        .grant(body.account_id, tenant_id, access_level)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                ApiError::bad_request("Unknown account_id")
            }
            _ => ApiError::from(e),
        })?;

    let (ip, user_agent) = client_meta(&headers);
    AuditLog::new(pool).record(
        NewAuditEntry::new(elevation.account.id, "superadmin.tenant_access.grant", ip, user_agent)
            .resource("tenant", tenant_id.to_string())
            .metadata(json!({
                "account_id": body.account_id,
                "access_level": access_level,
            })),
    );

    Ok(ApiResponse::created(access))
}

#[derive(Debug, Deserialize)]
pub struct RevokeAccessRequest {
    pub account_id: Uuid,
    pub tenant_id: String,
}

/// DELETE /superadmin/tenant-access - remove the grant for exactly the pair.
pub async fn tenant_access_delete(
    Extension(elevation): Extension<Elevation>,
    headers: HeaderMap,
    Json(body): Json<RevokeAccessRequest>,
) -> ApiResult<Value> {
    let pool = DatabaseManager::main_pool().await?;
    let revoked = TenantAuthorizer::new(pool.clone())
        .revoke(body.account_id, &body.tenant_id)
        .await?;

    let (ip, user_agent) = client_meta(&headers);
    AuditLog::new(pool).record(
        NewAuditEntry::new(elevation.account.id, "superadmin.tenant_access.revoke", ip, user_agent)
            .resource("tenant", body.tenant_id.clone())
            .metadata(json!({ "account_id": body.account_id, "revoked": revoked })),
    );

    Ok(ApiResponse::success(json!({ "revoked": revoked })))
}
