use chrono::{Duration, Utc};
use rand::RngCore;
use sqlx::PgPool;

use crate::config;
use crate::database::models::Session;
use crate::oauth::Identity;

/// Durable session records keyed by an opaque high-entropy token. The store
/// is the source of truth; expiry is enforced on read so an expired row is
/// unreadable even before the sweep removes it.
pub struct SessionStore {
    pool: PgPool,
}

impl SessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a new session for `identity` and return the opaque id for
    /// cookie issuance. The TTL is absolute from creation time.
    pub async fn create(&self, identity: &Identity) -> Result<String, sqlx::Error> {
        let id = generate_session_id();
        let now = Utc::now();
        let expires_at = now + Duration::seconds(config::config().session.ttl_secs);

        sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, email, name, picture, provider,
                                  provider_tokens, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&id)
        .bind(&identity.external_id)
        .bind(&identity.email)
        .bind(&identity.name)
        .bind(&identity.avatar_url)
        .bind(identity.provider.as_str())
        .bind(&identity.raw_tokens)
        .bind(now)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    /// Returns None for an unknown id or one whose expiry has passed.
    /// Storage failure propagates; callers must treat it as "no session".
    pub async fn get(&self, id: &str) -> Result<Option<Session>, sqlx::Error> {
        sqlx::query_as::<_, Session>(
            r#"
            SELECT id, user_id, email, name, picture, provider,
                   provider_tokens, created_at, expires_at
            FROM sessions
            WHERE id = $1 AND expires_at > now()
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Idempotent removal.
    pub async fn delete(&self, id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Remove rows past their expiry. Returns the number removed.
    pub async fn sweep_expired(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= now()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// 32 bytes from the OS RNG, hex-encoded. 256 bits of entropy keeps the id
/// unguessable; hex keeps it cookie-safe.
fn generate_session_id() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_64_hex_chars() {
        let id = generate_session_id();
        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn session_ids_do_not_repeat() {
        let a = generate_session_id();
        let b = generate_session_id();
        assert_ne!(a, b);
    }
}
