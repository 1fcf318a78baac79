use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Cached delegated access token. Rows are append-only: a new mint inserts a
/// fresh row and supersedes older ones, readers pick the freshest non-expired
/// row per session.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DelegatedToken {
    pub id: Uuid,
    pub session_id: String,
    #[serde(skip_serializing)]
    pub access_token: String,
    pub scopes: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
