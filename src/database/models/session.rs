use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Durable authenticated binding between a client and an identity,
/// referenced by the opaque cookie token in `id`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
    pub provider: String,
    #[serde(skip_serializing)]
    pub provider_tokens: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
