use axum::{middleware::from_fn, routing::get, routing::post, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use meaux_api::database::manager::DatabaseManager;
use meaux_api::database::schema;
use meaux_api::handlers::{auth, pages, superadmin};
use meaux_api::middleware::{require_superadmin_middleware, session_middleware};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, client
    // credentials, and the delegation key.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Initialize configuration (this loads the config singleton)
    let config = meaux_api::config::config();
    tracing::info!("Starting Meaux API in {:?} mode", config.environment);

    // Apply schema DDL up front. A down database degrades per-request
    // (handlers fail closed) instead of aborting startup.
    match DatabaseManager::main_pool().await {
        Ok(pool) => {
            if let Err(e) = schema::ensure_schema(&pool).await {
                tracing::error!("Failed to apply schema: {}", e);
            }
        }
        Err(e) => tracing::error!("Database unavailable at startup: {}", e),
    }

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("MEAUX_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Meaux API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Public auth routes (cookie issuance and teardown)
        .merge(auth_routes())
        // Authenticated routes
        .merge(session_routes())
        // Elevated routes
        .merge(elevated_routes())
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn auth_routes() -> Router {
    Router::new()
        .route("/auth/logout", get(auth::logout))
        .route("/auth/:provider", get(auth::oauth_start))
        .route("/auth/:provider/callback", get(auth::oauth_callback))
}

/// Routes that need a valid session but no elevation. `/superadmin/status`
/// reports elevation state instead of requiring it.
fn session_routes() -> Router {
    Router::new()
        .route("/admin", get(pages::admin_landing))
        .route("/superadmin/status", get(superadmin::status_get))
        .layer(from_fn(session_middleware))
}

/// Admin-only routes: session first, then the superadmin gate.
fn elevated_routes() -> Router {
    Router::new()
        .route(
            "/superadmin/accounts",
            get(superadmin::accounts_get).post(superadmin::accounts_post),
        )
        .route(
            "/superadmin/tenant-access",
            post(superadmin::tenant_access_post).delete(superadmin::tenant_access_delete),
        )
        .route("/superadmin/audit-log", get(superadmin::audit_log_get))
        .route("/superadmin/delegated-call", post(superadmin::delegated_call_post))
        .layer(from_fn(require_superadmin_middleware))
        .layer(from_fn(session_middleware))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Meaux API",
            "version": version,
            "description": "Session and elevated-credential layer for the Meaux admin platform",
            "endpoints": {
                "home": "/ (public)",
                "auth": "/auth/{google|github}[/callback], /auth/logout (public)",
                "admin": "/admin (authenticated page)",
                "status": "/superadmin/status (authenticated)",
                "superadmin": "/superadmin/* (elevated)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
