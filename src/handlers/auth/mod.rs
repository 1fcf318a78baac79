// Public authentication routes: provider redirect, callback, logout.

use std::str::FromStr;

use axum::{
    extract::{Path, Query},
    response::Redirect,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use crate::config;
use crate::database::manager::DatabaseManager;
use crate::error::ApiError;
use crate::oauth::{provider_client, redirect_uri, Provider};
use crate::session::cookie::{clear_session_cookie, session_cookie};
use crate::session::SessionStore;

/// GET /auth/:provider - redirect to the provider authorization URL
pub async fn oauth_start(Path(provider): Path<String>) -> Result<Redirect, ApiError> {
    let provider = Provider::from_str(&provider)?;
    let url = provider_client(provider).authorization_url(&redirect_uri(provider));
    Ok(Redirect::to(&url))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    /// Providers report user-denied consent and similar failures here.
    pub error: Option<String>,
}

/// GET /auth/:provider/callback - exchange the single-use code, create the
/// session, set the cookie, land on the authenticated page.
pub async fn oauth_callback(
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), ApiError> {
    let provider = Provider::from_str(&provider)?;

    if let Some(error) = query.error {
        return Err(ApiError::bad_request(format!(
            "Provider returned error: {}",
            error
        )));
    }
    let code = query
        .code
        .ok_or_else(|| ApiError::bad_request("Missing authorization code"))?;

    let identity = provider_client(provider)
        .exchange(&code, &redirect_uri(provider))
        .await?;

    if identity.email_synthesized {
        tracing::warn!(
            provider = provider.as_str(),
            external_id = %identity.external_id,
            "Provider exposed no verified email; session carries a non-deliverable placeholder"
        );
    }

    let pool = DatabaseManager::main_pool().await?;
    let session_id = SessionStore::new(pool).create(&identity).await?;

    tracing::info!(
        provider = provider.as_str(),
        email = %identity.email,
        "Session created from provider callback"
    );

    let jar = jar.add(session_cookie(session_id));
    Ok((jar, Redirect::to(&config::config().session.landing_path)))
}

/// GET /auth/logout - invalidate the session and clear the cookie. Works
/// even when the session is already gone; the cookie is cleared regardless.
pub async fn logout(jar: CookieJar) -> (CookieJar, Redirect) {
    let cookie_name = &config::config().session.cookie_name;

    if let Some(cookie) = jar.get(cookie_name) {
        let token = cookie.value().to_string();
        match DatabaseManager::main_pool().await {
            Ok(pool) => {
                if let Err(e) = SessionStore::new(pool).delete(&token).await {
                    tracing::error!("Failed to delete session on logout: {}", e);
                }
            }
            Err(e) => tracing::error!("Failed to delete session on logout: {}", e),
        }
    }

    let jar = jar.add(clear_session_cookie());
    (jar, Redirect::to(&config::config().session.login_path))
}
