use axum::{http::HeaderMap, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::audit::{client_meta, AuditLog, NewAuditEntry};
use crate::config;
use crate::database::manager::DatabaseManager;
use crate::delegation::{is_allowed_api_url, CredentialBroker};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentSession, Elevation};
use crate::superadmin::TenantAuthorizer;

#[derive(Debug, Deserialize)]
pub struct DelegatedCallRequest {
    pub url: String,
    pub method: Option<String>,
    pub body: Option<Value>,
    /// Tenant-scoped calls additionally require an explicit access grant.
    pub tenant_id: Option<String>,
}

/// POST /superadmin/delegated-call - proxy one call to the cloud-provider
/// API using the broker's delegated token. The target URL is validated
/// against the allowed host pattern before the token is obtained or
/// attached, so the bearer credential can never travel to an arbitrary
/// endpoint.
pub async fn delegated_call_post(
    Extension(session): Extension<CurrentSession>,
    Extension(elevation): Extension<Elevation>,
    headers: HeaderMap,
    Json(body): Json<DelegatedCallRequest>,
) -> ApiResult<Value> {
    let cfg = &config::config().delegation;

    let url = Url::parse(&body.url)
        .map_err(|e| ApiError::bad_request(format!("Invalid url: {}", e)))?;
    if !is_allowed_api_url(&url, &cfg.allowed_api_hosts) {
        return Err(ApiError::forbidden(
            "URL is outside the allowed cloud-provider API hosts",
        ));
    }

    let method = match body.method.as_deref() {
        None => reqwest::Method::GET,
        Some(raw) => reqwest::Method::from_bytes(raw.to_uppercase().as_bytes())
            .map_err(|_| ApiError::bad_request(format!("Invalid method: {}", raw)))?,
    };

    let pool = DatabaseManager::main_pool().await?;

    // DelegatedCapable: a usable token, cached or freshly minted.
    let token = CredentialBroker::new(pool.clone())
        .token_for_session(&session.0.id)
        .await?;

    // TenantAuthorized, only for tenant-scoped calls. Default deny.
    if let Some(tenant_id) = body.tenant_id.as_deref() {
        let allowed = TenantAuthorizer::new(pool.clone())
            .has_tenant_access(elevation.account.id, tenant_id)
            .await?;
        if !allowed {
            return Err(ApiError::forbidden(format!(
                "No access grant for tenant {}",
                tenant_id
            )));
        }
    }

    let http = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(cfg.request_timeout_secs))
        .build()
        .unwrap_or_default();

    let mut request = http
        .request(method.clone(), url.clone())
        .bearer_auth(&token.access_token);
    if let Some(payload) = &body.body {
        request = request.json(payload);
    }

    let response = request.send().await.map_err(|e| {
        ApiError::upstream_provider("Cloud provider unreachable", e.to_string())
    })?;

    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    let payload: Value = serde_json::from_str(&text).unwrap_or(Value::String(text));

    let (ip, user_agent) = client_meta(&headers);
    AuditLog::new(pool).record(
        NewAuditEntry::new(elevation.account.id, "superadmin.delegated_call", ip, user_agent)
            .resource("url", url.to_string())
            .metadata(json!({
                "method": method.as_str(),
                "status": status,
                "tenant_id": body.tenant_id,
            })),
    );

    Ok(ApiResponse::success(json!({
        "status": status,
        "body": payload,
    })))
}
