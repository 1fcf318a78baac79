use chrono::{Duration, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;

use super::assertion::{sign_assertion, AssertionClaims};
use crate::config;
use crate::database::models::DelegatedToken;

pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

#[derive(Debug, Error)]
pub enum BrokerError {
    /// Missing service-account configuration. The capability is reported
    /// unavailable; the rest of the request pipeline continues unaffected.
    #[error("Delegation disabled: {0}")]
    Disabled(String),

    #[error("Assertion signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("Token endpoint returned {status}: {body}")]
    TokenEndpoint { status: u16, body: String },

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    access_token: String,
    expires_in: i64,
}

/// Mints and caches delegated access tokens for platform-wide administrative
/// calls, delegated from one service-account identity. No long-lived cloud
/// credential is ever stored per human session.
pub struct CredentialBroker {
    pool: PgPool,
    http: reqwest::Client,
}

impl CredentialBroker {
    pub fn new(pool: PgPool) -> Self {
        let timeout = config::config().delegation.request_timeout_secs;
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout))
            .build()
            .unwrap_or_default();
        Self { pool, http }
    }

    /// Return a usable delegated token for the session: the freshest cached
    /// non-expired row when one exists, otherwise a fresh mint. Concurrent
    /// first mints may race and each mint a token; both results are valid,
    /// so no lock guards this path.
    pub async fn token_for_session(&self, session_id: &str) -> Result<DelegatedToken, BrokerError> {
        if let Some(cached) = self.freshest_cached(session_id).await? {
            return Ok(cached);
        }
        self.mint(session_id).await
    }

    async fn freshest_cached(
        &self,
        session_id: &str,
    ) -> Result<Option<DelegatedToken>, BrokerError> {
        let row = sqlx::query_as::<_, DelegatedToken>(
            r#"
            SELECT id, session_id, access_token, scopes, created_at, expires_at
            FROM delegated_tokens
            WHERE session_id = $1 AND expires_at > now()
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn mint(&self, session_id: &str) -> Result<DelegatedToken, BrokerError> {
        let cfg = &config::config().delegation;
        if cfg.service_account_email.is_empty() {
            return Err(BrokerError::Disabled(
                "service account email not configured".to_string(),
            ));
        }
        if cfg.private_key_pem.is_empty() {
            return Err(BrokerError::Disabled(
                "service account key not configured".to_string(),
            ));
        }

        let claims = AssertionClaims::new(&cfg.service_account_email, &cfg.scope, &cfg.token_url);
        let assertion = sign_assertion(cfg.private_key_pem.as_bytes(), &claims)?;

        let response = self
            .http
            .post(&cfg.token_url)
            .form(&[
                ("grant_type", JWT_BEARER_GRANT),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(BrokerError::TokenEndpoint {
                status: status.as_u16(),
                body,
            });
        }

        let granted: TokenEndpointResponse =
            serde_json::from_str(&body).map_err(|_| BrokerError::TokenEndpoint {
                status: status.as_u16(),
                body,
            })?;

        // Cache expiry comes from the current clock plus the lifetime the
        // provider reported, never from the assertion's own exp claim.
        let expires_at = Utc::now() + Duration::seconds(granted.expires_in);
        let scopes: Vec<String> = cfg.scope.split_whitespace().map(String::from).collect();

        // Append-only: a new row supersedes older ones, readers filter by
        // freshest non-expired.
        let token = sqlx::query_as::<_, DelegatedToken>(
            r#"
            INSERT INTO delegated_tokens (session_id, access_token, scopes, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, session_id, access_token, scopes, created_at, expires_at
            "#,
        )
        .bind(session_id)
        .bind(&granted.access_token)
        .bind(&scopes)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(
            session = %session_id,
            expires_at = %token.expires_at,
            "Minted delegated access token"
        );

        Ok(token)
    }

    /// Remove expired cache rows. Superseded-but-unexpired rows are kept;
    /// readers never select them once a fresher row exists.
    pub async fn prune_expired(&self) -> Result<u64, BrokerError> {
        let result = sqlx::query("DELETE FROM delegated_tokens WHERE expires_at <= now()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
