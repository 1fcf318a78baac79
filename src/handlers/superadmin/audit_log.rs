use axum::{extract::Query, Extension};
use serde::Deserialize;

use crate::audit::AuditLog;
use crate::database::manager::DatabaseManager;
use crate::database::models::AuditEntry;
use crate::middleware::{ApiResponse, ApiResult, Elevation};

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;

#[derive(Debug, Deserialize)]
pub struct AuditLogQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /superadmin/audit-log?limit=&offset= - newest-first page of entries.
pub async fn audit_log_get(
    Extension(_elevation): Extension<Elevation>,
    Query(query): Query<AuditLogQuery>,
) -> ApiResult<Vec<AuditEntry>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = query.offset.unwrap_or(0).max(0);

    let pool = DatabaseManager::main_pool().await?;
    let entries = AuditLog::new(pool).list(limit, offset).await?;
    Ok(ApiResponse::success(entries))
}
