pub mod github;
pub mod google;

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config;

/// Supported identity providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Google,
    GitHub,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::GitHub => "github",
        }
    }
}

impl FromStr for Provider {
    type Err = OAuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(Provider::Google),
            "github" => Ok(Provider::GitHub),
            other => Err(OAuthError::UnknownProvider(other.to_string())),
        }
    }
}

/// Normalized identity produced by any provider exchange.
#[derive(Debug, Clone)]
pub struct Identity {
    pub provider: Provider,
    pub external_id: String,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
    /// Raw token response from the provider, persisted with the session.
    pub raw_tokens: serde_json::Value,
    /// True when no real email could be obtained and a placeholder of the
    /// form `<provider>_<id>@no-email.invalid` was synthesized. Callers must
    /// treat such an address as non-deliverable.
    pub email_synthesized: bool,
}

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("Missing authorization code")]
    MissingCode,

    #[error("Unknown identity provider: {0}")]
    UnknownProvider(String),

    /// Non-success from the provider. A replayed authorization code lands
    /// here: the provider invalidates codes after first use and we surface
    /// its rejection rather than retrying.
    #[error("Provider rejected the request ({status}): {body}")]
    ProviderRejected { status: u16, body: String },

    #[error("Provider response omitted the access token: {body}")]
    MissingAccessToken { body: String },

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// Seam between the callback handlers and each provider's wire protocol.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Build the provider authorization redirect URL.
    fn authorization_url(&self, redirect_uri: &str) -> String;

    /// Exchange a single-use authorization code for a normalized identity.
    async fn exchange(&self, code: &str, redirect_uri: &str) -> Result<Identity, OAuthError>;
}

pub fn provider_client(provider: Provider) -> Box<dyn IdentityProvider> {
    match provider {
        Provider::Google => Box::new(google::GoogleProvider::new()),
        Provider::GitHub => Box::new(github::GitHubProvider::new()),
    }
}

/// Callback URI registered with the provider for this deployment.
pub fn redirect_uri(provider: Provider) -> String {
    format!(
        "{}/auth/{}/callback",
        config::config().oauth.public_base_url.trim_end_matches('/'),
        provider.as_str()
    )
}

/// Shared HTTP client with the configured per-call timeout. A stalled
/// provider must not hang request handling indefinitely.
pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config::config().oauth.request_timeout_secs))
        .build()
        .unwrap_or_default()
}

/// Synthesized non-deliverable address used when a provider exposes no email.
pub(crate) fn placeholder_email(provider: Provider, external_id: &str) -> String {
    format!("{}_{}@no-email.invalid", provider.as_str(), external_id)
}
