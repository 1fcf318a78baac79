use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use crate::config;
use crate::database::manager::DatabaseManager;
use crate::database::models::Session;
use crate::error::ApiError;
use crate::session::SessionStore;

/// Valid session for this request, injected into handler signatures as a
/// typed extension. Presence of this value is the Authenticated state.
#[derive(Clone, Debug)]
pub struct CurrentSession(pub Session);

/// Resolves the `meaux_session` cookie to a durable session. Missing,
/// expired, or unreadable sessions are all rejected the same way: 401 for
/// API paths, a redirect to the login path for page paths. Storage failure
/// is treated as "no session", never as "session valid".
pub async fn session_middleware(
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let cookie_name = &config::config().session.cookie_name;
    let token = jar.get(cookie_name).map(|c| c.value().to_string());

    let session = match token {
        Some(token) => load_session(&token).await,
        None => None,
    };

    match session {
        Some(session) => {
            request.extensions_mut().insert(CurrentSession(session));
            Ok(next.run(request).await)
        }
        None => Err(reject(request.uri().path())),
    }
}

async fn load_session(token: &str) -> Option<Session> {
    let pool = match DatabaseManager::main_pool().await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Session lookup failed, treating as unauthenticated: {}", e);
            return None;
        }
    };

    match SessionStore::new(pool).get(token).await {
        Ok(session) => session,
        Err(e) => {
            tracing::error!("Session lookup failed, treating as unauthenticated: {}", e);
            None
        }
    }
}

/// API paths answer 401 JSON; page paths bounce to the login page.
fn is_api_path(path: &str) -> bool {
    path.starts_with("/superadmin") || path.starts_with("/api")
}

fn reject(path: &str) -> Response {
    if is_api_path(path) {
        ApiError::unauthorized("Authentication required").into_response()
    } else {
        Redirect::to(&config::config().session.login_path).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn superadmin_and_api_prefixes_are_api_paths() {
        assert!(is_api_path("/superadmin/status"));
        assert!(is_api_path("/api/anything"));
        assert!(!is_api_path("/admin"));
        assert!(!is_api_path("/"));
    }

    #[tokio::test]
    async fn api_rejection_is_401() {
        let response = reject("/superadmin/accounts");
        assert_eq!(response.status(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn page_rejection_redirects_to_login() {
        let response = reject("/admin");
        assert_eq!(response.status(), axum::http::StatusCode::SEE_OTHER);
        assert_eq!(
            response
                .headers()
                .get(axum::http::header::LOCATION)
                .and_then(|v| v.to_str().ok()),
            Some("/login")
        );
    }
}
