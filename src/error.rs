// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized (no/expired session)
    Unauthorized(String),

    // 403 Forbidden (authenticated but not elevated, or lacking tenant access)
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 502 Bad Gateway (identity or cloud provider failed; carries the raw
    // provider diagnostic so operators can tell misconfiguration from outage)
    UpstreamProvider { message: String, detail: String },

    // 503 Service Unavailable (storage down, or a capability disabled by
    // missing configuration)
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::InternalServerError(_) => 500,
            ApiError::UpstreamProvider { .. } => 502,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::UpstreamProvider { message, .. } => message,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::UpstreamProvider { .. } => "UPSTREAM_PROVIDER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::UpstreamProvider { message, detail } => {
                json!({
                    "success": false,
                    "error": message,
                    "error_code": self.error_code(),
                    "provider_detail": detail,
                })
            }
            _ => {
                json!({
                    "success": false,
                    "error": self.message(),
                    "error_code": self.error_code(),
                })
            }
        }
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn upstream_provider(message: impl Into<String>, detail: impl Into<String>) -> Self {
        ApiError::UpstreamProvider {
            message: message.into(),
            detail: detail.into(),
        }
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert other error types to ApiError

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::not_found("Record not found"),
            other => {
                // Never expose internal SQL errors to clients
                tracing::error!("Database error: {}", other);
                ApiError::service_unavailable("Storage temporarily unavailable")
            }
        }
    }
}

impl From<crate::database::manager::DatabaseError> for ApiError {
    fn from(err: crate::database::manager::DatabaseError) -> Self {
        tracing::error!("Database manager error: {}", err);
        ApiError::service_unavailable("Storage temporarily unavailable")
    }
}

impl From<crate::superadmin::RegistryError> for ApiError {
    fn from(err: crate::superadmin::RegistryError) -> Self {
        use crate::superadmin::RegistryError;
        match err {
            RegistryError::AlreadyExists(email) => {
                ApiError::conflict(format!("Superadmin already exists: {}", email))
            }
            RegistryError::Database(e) => e.into(),
        }
    }
}

impl From<crate::oauth::OAuthError> for ApiError {
    fn from(err: crate::oauth::OAuthError) -> Self {
        use crate::oauth::OAuthError;
        match err {
            OAuthError::MissingCode => ApiError::bad_request("Missing authorization code"),
            OAuthError::UnknownProvider(p) => {
                ApiError::bad_request(format!("Unknown identity provider: {}", p))
            }
            OAuthError::ProviderRejected { status, body } => ApiError::upstream_provider(
                format!("Identity provider rejected the request ({})", status),
                body,
            ),
            OAuthError::MissingAccessToken { body } => ApiError::upstream_provider(
                "Identity provider response omitted the access token",
                body,
            ),
            OAuthError::Transport(e) => {
                ApiError::upstream_provider("Identity provider unreachable", e.to_string())
            }
        }
    }
}

impl From<crate::delegation::BrokerError> for ApiError {
    fn from(err: crate::delegation::BrokerError) -> Self {
        use crate::delegation::BrokerError;
        match err {
            BrokerError::Disabled(reason) => ApiError::service_unavailable(format!(
                "Delegated access is not available: {}",
                reason
            )),
            BrokerError::TokenEndpoint { status, body } => ApiError::upstream_provider(
                format!("Token endpoint rejected the assertion ({})", status),
                body,
            ),
            BrokerError::Transport(e) => {
                ApiError::upstream_provider("Token endpoint unreachable", e.to_string())
            }
            BrokerError::Signing(e) => {
                tracing::error!("Assertion signing failed: {}", e);
                ApiError::service_unavailable("Delegated access is not available")
            }
            BrokerError::Storage(e) => {
                tracing::error!("Token cache error: {}", e);
                ApiError::service_unavailable("Storage temporarily unavailable")
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(ApiError::unauthorized("x").status_code(), 401);
        assert_eq!(ApiError::forbidden("x").status_code(), 403);
        assert_eq!(ApiError::upstream_provider("x", "y").status_code(), 502);
        assert_eq!(ApiError::service_unavailable("x").status_code(), 503);
    }

    #[test]
    fn storage_errors_fail_closed() {
        let err: ApiError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(err.status_code(), 503);
    }

    #[test]
    fn upstream_error_carries_provider_detail() {
        let err = ApiError::upstream_provider("provider failed", "raw body");
        let body = err.to_json();
        assert_eq!(body["provider_detail"], "raw body");
        assert_eq!(body["error_code"], "UPSTREAM_PROVIDER_ERROR");
    }
}
