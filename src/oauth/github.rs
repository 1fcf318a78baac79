use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use super::{http_client, placeholder_email, Identity, IdentityProvider, OAuthError, Provider};
use crate::config::{self, OAuthClient};

const SCOPES: &str = "read:user user:email";

/// GitHub requires a User-Agent on API calls.
const USER_AGENT: &str = concat!("meaux-api/", env!("CARGO_PKG_VERSION"));

pub struct GitHubProvider {
    client: &'static OAuthClient,
    http: reqwest::Client,
}

impl GitHubProvider {
    pub fn new() -> Self {
        Self {
            client: &config::config().oauth.github,
            http: http_client(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GitHubProfile {
    id: i64,
    login: String,
    name: Option<String>,
    email: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GitHubEmail {
    pub email: String,
    pub primary: bool,
    pub verified: bool,
}

/// GitHub profiles may hide the public email. The verified-emails endpoint
/// lists all addresses; only the primary-and-verified one is usable.
pub fn select_primary_verified(emails: &[GitHubEmail]) -> Option<String> {
    emails
        .iter()
        .find(|e| e.primary && e.verified)
        .map(|e| e.email.clone())
}

#[async_trait]
impl IdentityProvider for GitHubProvider {
    fn authorization_url(&self, redirect_uri: &str) -> String {
        let url = Url::parse_with_params(
            &self.client.authorize_url,
            &[
                ("client_id", self.client.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("scope", SCOPES),
            ],
        );
        match url {
            Ok(url) => url.into(),
            Err(e) => {
                tracing::error!("Invalid GitHub authorize URL in config: {}", e);
                self.client.authorize_url.clone()
            }
        }
    }

    async fn exchange(&self, code: &str, redirect_uri: &str) -> Result<Identity, OAuthError> {
        let response = self
            .http
            .post(&self.client.token_url)
            .header("Accept", "application/json")
            .form(&[
                ("client_id", self.client.client_id.as_str()),
                ("client_secret", self.client.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", redirect_uri),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(OAuthError::ProviderRejected {
                status: status.as_u16(),
                body,
            });
        }

        // GitHub reports a replayed or bad code as 200 with an error body,
        // so presence of the access token is the real success signal.
        let tokens: serde_json::Value =
            serde_json::from_str(&body).map_err(|_| OAuthError::MissingAccessToken {
                body: body.clone(),
            })?;
        let access_token = tokens
            .get("access_token")
            .and_then(|v| v.as_str())
            .ok_or(OAuthError::MissingAccessToken { body: body.clone() })?
            .to_string();

        let profile_response = self
            .http
            .get(&self.client.profile_url)
            .bearer_auth(&access_token)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT)
            .send()
            .await?;

        let profile_status = profile_response.status();
        if !profile_status.is_success() {
            let body = profile_response.text().await.unwrap_or_default();
            return Err(OAuthError::ProviderRejected {
                status: profile_status.as_u16(),
                body,
            });
        }

        let profile: GitHubProfile = profile_response.json().await?;
        let external_id = profile.id.to_string();

        let (email, email_synthesized) = match profile.email {
            Some(email) => (email, false),
            None => match self.fetch_verified_email(&access_token).await? {
                Some(email) => (email, false),
                None => (placeholder_email(Provider::GitHub, &external_id), true),
            },
        };

        Ok(Identity {
            provider: Provider::GitHub,
            external_id,
            name: profile.name.unwrap_or_else(|| profile.login.clone()),
            email,
            avatar_url: profile.avatar_url,
            raw_tokens: tokens,
            email_synthesized,
        })
    }
}

impl GitHubProvider {
    async fn fetch_verified_email(&self, access_token: &str) -> Result<Option<String>, OAuthError> {
        let url = format!("{}/emails", self.client.profile_url.trim_end_matches('/'));
        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT)
            .send()
            .await?;

        if !response.status().is_success() {
            // Email visibility can be denied by scope; fall through to the
            // placeholder rather than failing the whole login.
            tracing::warn!(
                "GitHub verified-emails lookup failed with status {}",
                response.status()
            );
            return Ok(None);
        }

        let emails: Vec<GitHubEmail> = response.json().await?;
        Ok(select_primary_verified(&emails))
    }
}
