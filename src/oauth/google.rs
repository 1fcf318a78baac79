use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use super::{http_client, Identity, IdentityProvider, OAuthError, Provider};
use crate::config::{self, OAuthClient};

/// Scopes for the Google flow: profile/email for identity, the Drive scope
/// for delegated platform calls. Offline access makes a refresh token
/// obtainable at first consent.
const SCOPES: &str = "openid email profile https://www.googleapis.com/auth/drive";

pub struct GoogleProvider {
    client: &'static OAuthClient,
    http: reqwest::Client,
}

impl GoogleProvider {
    pub fn new() -> Self {
        Self {
            client: &config::config().oauth.google,
            http: http_client(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GoogleProfile {
    id: String,
    email: String,
    name: Option<String>,
    picture: Option<String>,
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn authorization_url(&self, redirect_uri: &str) -> String {
        let url = Url::parse_with_params(
            &self.client.authorize_url,
            &[
                ("client_id", self.client.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("response_type", "code"),
                ("scope", SCOPES),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        );
        match url {
            Ok(url) => url.into(),
            // Only reachable with a malformed authorize_url override
            Err(e) => {
                tracing::error!("Invalid Google authorize URL in config: {}", e);
                self.client.authorize_url.clone()
            }
        }
    }

    async fn exchange(&self, code: &str, redirect_uri: &str) -> Result<Identity, OAuthError> {
        let response = self
            .http
            .post(&self.client.token_url)
            .form(&[
                ("code", code),
                ("client_id", self.client.client_id.as_str()),
                ("client_secret", self.client.client_secret.as_str()),
                ("redirect_uri", redirect_uri),
                ("grant_type", "authorization_code"),
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

        let profile: GoogleProfile = profile_response.json().await?;

        Ok(Identity {
            provider: Provider::Google,
            external_id: profile.id,
            name: profile.name.unwrap_or_else(|| profile.email.clone()),
            email: profile.email,
            avatar_url: profile.picture,
            raw_tokens: tokens,
            email_synthesized: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorization_url_requests_offline_drive_access() {
        let provider = GoogleProvider::new();
        let url = provider.authorization_url("http://localhost:3000/auth/google/callback");
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("prompt=consent"));
        assert!(url.contains("drive"));
        assert!(url.contains("response_type=code"));
    }
}
