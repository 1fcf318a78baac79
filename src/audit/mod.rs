use axum::http::HeaderMap;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::AuditEntry;

/// Fields for a new audit row, captured before the response is sent.
#[derive(Debug, Clone, Serialize)]
pub struct NewAuditEntry {
    pub superadmin_id: Uuid,
    pub action: String,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub ip: String,
    pub user_agent: String,
    pub metadata: Option<serde_json::Value>,
}

impl NewAuditEntry {
    pub fn new(superadmin_id: Uuid, action: impl Into<String>, ip: String, user_agent: String) -> Self {
        Self {
            superadmin_id,
            action: action.into(),
            resource_type: None,
            resource_id: None,
            ip,
            user_agent,
            metadata: None,
        }
    }

    pub fn resource(mut self, resource_type: impl Into<String>, resource_id: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self.resource_id = Some(resource_id.into());
        self
    }

    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Append-only record of elevated actions. Rows are never updated or
/// deleted; the whole crate contains no such statement against audit_log.
pub struct AuditLog {
    pool: PgPool,
}

impl AuditLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Write the entry on a detached task. The caller's response is already
    /// constructed by the time this runs; a failed write is logged under the
    /// `audit_fallback` target with the full entry so it can be reprocessed
    /// (at-least-once, not exactly-once). A client disconnect does not abort
    /// the task.
    pub fn record(&self, entry: NewAuditEntry) {
        let pool = self.pool.clone();
        tokio::spawn(async move {
            if let Err(e) = Self::insert(&pool, &entry).await {
                let payload = serde_json::to_string(&entry).unwrap_or_default();
                tracing::error!(
                    target: "audit_fallback",
                    error = %e,
                    entry = %payload,
                    "Audit write failed; entry preserved for reprocessing"
                );
            }
        });
    }

    async fn insert(pool: &PgPool, entry: &NewAuditEntry) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO audit_log (superadmin_id, action, resource_type, resource_id,
                                   ip, user_agent, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.superadmin_id)
        .bind(&entry.action)
        .bind(&entry.resource_type)
        .bind(&entry.resource_id)
        .bind(&entry.ip)
        .bind(&entry.user_agent)
        .bind(&entry.metadata)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Newest-first page of entries.
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<AuditEntry>, sqlx::Error> {
        sqlx::query_as::<_, AuditEntry>(
            r#"
            SELECT id, superadmin_id, action, resource_type, resource_id,
                   ip, user_agent, metadata, created_at
            FROM audit_log
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }
}

/// Client address and agent for audit rows. The platform runs behind a
/// proxy, so X-Forwarded-For wins over the socket peer.
pub fn client_meta(headers: &HeaderMap) -> (String, String) {
    let ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|v| v.trim().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string());

    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    (ip, user_agent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn forwarded_for_takes_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        headers.insert("user-agent", HeaderValue::from_static("curl/8.0"));
        let (ip, user_agent) = client_meta(&headers);
        assert_eq!(ip, "203.0.113.7");
        assert_eq!(user_agent, "curl/8.0");
    }

    #[test]
    fn missing_headers_fall_back_to_unknown() {
        let (ip, user_agent) = client_meta(&HeaderMap::new());
        assert_eq!(ip, "unknown");
        assert_eq!(user_agent, "unknown");
    }

    #[test]
    fn entry_builder_attaches_resource_and_metadata() {
        let id = Uuid::new_v4();
        let entry = NewAuditEntry::new(id, "accounts.create", "1.2.3.4".into(), "ua".into())
            .resource("superadmin", "abc")
            .metadata(serde_json::json!({"email": "a@x.com"}));
        assert_eq!(entry.action, "accounts.create");
        assert_eq!(entry.resource_type.as_deref(), Some("superadmin"));
        assert!(entry.metadata.is_some());
    }
}
