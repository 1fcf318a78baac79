use axum::{http::HeaderMap, Extension, Json};
use serde::Deserialize;
use serde_json::json;

use crate::audit::{client_meta, AuditLog, NewAuditEntry};
use crate::database::manager::DatabaseManager;
use crate::database::models::SuperadminAccount;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Elevation};
use crate::superadmin::SuperadminRegistry;

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub email: String,
    pub name: String,
    pub role: Option<String>,
}

/// POST /superadmin/accounts - create an elevated account. Reaching this
/// handler already required elevation, so self-elevation through this
/// interface is impossible.
pub async fn accounts_post(
    Extension(elevation): Extension<Elevation>,
    headers: HeaderMap,
    Json(body): Json<CreateAccountRequest>,
) -> ApiResult<SuperadminAccount> {
    let email = body.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::bad_request("A valid email is required"));
    }
    let name = body.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("Name is required"));
    }
    let role = body.role.as_deref().unwrap_or("superadmin");

    let pool = DatabaseManager::main_pool().await?;
    let account = SuperadminRegistry::new(pool.clone())
        .create_account(email, name, role)
        .await?;

    let (ip, user_agent) = client_meta(&headers);
    AuditLog::new(pool).record(
        NewAuditEntry::new(elevation.account.id, "superadmin.accounts.create", ip, user_agent)
            .resource("superadmin", account.id.to_string())
            .metadata(json!({ "email": account.email, "role": account.role })),
    );

    Ok(ApiResponse::created(account))
}

/// GET /superadmin/accounts - list all accounts, active and deactivated.
pub async fn accounts_get(
    Extension(_elevation): Extension<Elevation>,
) -> ApiResult<Vec<SuperadminAccount>> {
    let pool = DatabaseManager::main_pool().await?;
    let accounts = SuperadminRegistry::new(pool).list_accounts().await?;
    Ok(ApiResponse::success(accounts))
}
