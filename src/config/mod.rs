use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub oauth: OAuthConfig,
    pub delegation: DelegationConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Absolute session lifetime in seconds. Fixed 7 days unless overridden.
    pub ttl_secs: i64,
    pub cookie_name: String,
    pub cookie_secure: bool,
    /// Where authenticated users land after a provider callback.
    pub landing_path: String,
    /// Where unauthenticated page requests are redirected.
    pub login_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    pub google: OAuthClient,
    pub github: OAuthClient,
    /// External base URL of this service, used to build redirect URIs.
    pub public_base_url: String,
    /// Per-call timeout for provider token and profile requests.
    pub request_timeout_secs: u64,
}

/// Client credentials plus provider endpoints. Endpoints default to the real
/// provider hosts and live in config so tests can point them at a stub.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthClient {
    pub client_id: String,
    pub client_secret: String,
    pub authorize_url: String,
    pub token_url: String,
    pub profile_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegationConfig {
    /// Service account identity the assertion is issued as.
    pub service_account_email: String,
    /// PEM-encoded RSA private key for the service account. Empty disables
    /// the broker instead of failing startup.
    pub private_key_pem: String,
    /// Administrative scope string requested in the assertion.
    pub scope: String,
    pub token_url: String,
    /// Hosts the delegated proxy may target. Exact match, or subdomain of an
    /// entry starting with a dot.
    pub allowed_api_hosts: Vec<String>,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Session overrides
        if let Ok(v) = env::var("SESSION_TTL_SECS") {
            self.session.ttl_secs = v.parse().unwrap_or(self.session.ttl_secs);
        }
        if let Ok(v) = env::var("SESSION_COOKIE_SECURE") {
            self.session.cookie_secure = v.parse().unwrap_or(self.session.cookie_secure);
        }

        // OAuth client credentials only ever come from the environment
        if let Ok(v) = env::var("GOOGLE_CLIENT_ID") {
            self.oauth.google.client_id = v;
        }
        if let Ok(v) = env::var("GOOGLE_CLIENT_SECRET") {
            self.oauth.google.client_secret = v;
        }
        if let Ok(v) = env::var("GITHUB_CLIENT_ID") {
            self.oauth.github.client_id = v;
        }
        if let Ok(v) = env::var("GITHUB_CLIENT_SECRET") {
            self.oauth.github.client_secret = v;
        }
        if let Ok(v) = env::var("PUBLIC_BASE_URL") {
            self.oauth.public_base_url = v;
        }
        if let Ok(v) = env::var("OAUTH_REQUEST_TIMEOUT_SECS") {
            self.oauth.request_timeout_secs = v.parse().unwrap_or(self.oauth.request_timeout_secs);
        }
        // Endpoint overrides, used by tests to target a local stub
        if let Ok(v) = env::var("GOOGLE_AUTHORIZE_URL") {
            self.oauth.google.authorize_url = v;
        }
        if let Ok(v) = env::var("GOOGLE_TOKEN_URL") {
            self.oauth.google.token_url = v;
        }
        if let Ok(v) = env::var("GOOGLE_PROFILE_URL") {
            self.oauth.google.profile_url = v;
        }
        if let Ok(v) = env::var("GITHUB_AUTHORIZE_URL") {
            self.oauth.github.authorize_url = v;
        }
        if let Ok(v) = env::var("GITHUB_TOKEN_URL") {
            self.oauth.github.token_url = v;
        }
        if let Ok(v) = env::var("GITHUB_PROFILE_URL") {
            self.oauth.github.profile_url = v;
        }

        // Delegation overrides
        if let Ok(v) = env::var("DELEGATION_SERVICE_ACCOUNT_EMAIL") {
            self.delegation.service_account_email = v;
        }
        if let Ok(v) = env::var("DELEGATION_PRIVATE_KEY_PEM") {
            self.delegation.private_key_pem = v;
        }
        if let Ok(path) = env::var("DELEGATION_PRIVATE_KEY_FILE") {
            match std::fs::read_to_string(&path) {
                Ok(pem) => self.delegation.private_key_pem = pem,
                Err(e) => tracing::warn!("Failed to read delegation key file {}: {}", path, e),
            }
        }
        if let Ok(v) = env::var("DELEGATION_SCOPE") {
            self.delegation.scope = v;
        }
        if let Ok(v) = env::var("DELEGATION_TOKEN_URL") {
            self.delegation.token_url = v;
        }
        if let Ok(v) = env::var("DELEGATION_ALLOWED_API_HOSTS") {
            self.delegation.allowed_api_hosts =
                v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("DELEGATION_REQUEST_TIMEOUT_SECS") {
            self.delegation.request_timeout_secs =
                v.parse().unwrap_or(self.delegation.request_timeout_secs);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        self
    }

    fn base_oauth() -> OAuthConfig {
        OAuthConfig {
            google: OAuthClient {
                client_id: String::new(),
                client_secret: String::new(),
                authorize_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
                token_url: "https://oauth2.googleapis.com/token".to_string(),
                profile_url: "https://www.googleapis.com/oauth2/v2/userinfo".to_string(),
            },
            github: OAuthClient {
                client_id: String::new(),
                client_secret: String::new(),
                authorize_url: "https://github.com/login/oauth/authorize".to_string(),
                token_url: "https://github.com/login/oauth/access_token".to_string(),
                profile_url: "https://api.github.com/user".to_string(),
            },
            public_base_url: "http://localhost:3000".to_string(),
            request_timeout_secs: 10,
        }
    }

    fn base_delegation() -> DelegationConfig {
        DelegationConfig {
            service_account_email: String::new(),
            private_key_pem: String::new(),
            scope: "https://www.googleapis.com/auth/drive".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            allowed_api_hosts: vec![
                "www.googleapis.com".to_string(),
                ".googleapis.com".to_string(),
            ],
            request_timeout_secs: 10,
        }
    }

    fn base_session(cookie_secure: bool) -> SessionConfig {
        SessionConfig {
            ttl_secs: 7 * 24 * 3600,
            cookie_name: "meaux_session".to_string(),
            cookie_secure,
            landing_path: "/admin".to_string(),
            login_path: "/login".to_string(),
        }
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 30,
            },
            session: Self::base_session(false),
            oauth: Self::base_oauth(),
            delegation: Self::base_delegation(),
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout: 10,
            },
            session: Self::base_session(true),
            oauth: Self::base_oauth(),
            delegation: Self::base_delegation(),
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.meaux.example.com".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout: 5,
            },
            session: Self::base_session(true),
            oauth: Self::base_oauth(),
            delegation: Self::base_delegation(),
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://meaux.example.com".to_string()],
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
