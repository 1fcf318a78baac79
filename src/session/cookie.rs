use axum_extra::extract::cookie::{Cookie, SameSite};

use crate::config;

/// Build the session cookie for a freshly created session.
pub fn session_cookie(session_id: String) -> Cookie<'static> {
    let cfg = &config::config().session;
    Cookie::build((cfg.cookie_name.clone(), session_id))
        .path("/")
        .http_only(true)
        .secure(cfg.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(cfg.ttl_secs))
        .build()
}

/// Expire the session cookie on logout.
pub fn clear_session_cookie() -> Cookie<'static> {
    let cfg = &config::config().session;
    Cookie::build((cfg.cookie_name.clone(), ""))
        .path("/")
        .http_only(true)
        .secure(cfg.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::ZERO)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_attributes() {
        let cookie = session_cookie("abc123".to_string());
        assert_eq!(cookie.name(), "meaux_session");
        assert_eq!(cookie.value(), "abc123");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(
            cookie.max_age(),
            Some(time::Duration::seconds(604_800))
        );
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let cookie = clear_session_cookie();
        assert_eq!(cookie.name(), "meaux_session");
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
    }
}
