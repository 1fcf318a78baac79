use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Platform-level elevated identity. Rows are deactivated, never hard
/// deleted, so audit entries keep a valid linkage.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SuperadminAccount {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
    pub service_account_email: Option<String>,
    pub granted_scopes: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Explicit per-(account, tenant) grant. Access exists iff a row exists for
/// that exact pair and is enabled.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TenantAccess {
    pub superadmin_id: Uuid,
    pub tenant_id: String,
    pub access_level: String,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}
