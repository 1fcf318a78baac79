mod common;

use std::time::Duration;

use anyhow::Result;
use meaux_api::oauth::{Identity, Provider};
use meaux_api::session::SessionStore;
use meaux_api::superadmin::SuperadminRegistry;
use reqwest::redirect::Policy;
use reqwest::StatusCode;

fn no_redirect_client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(Policy::none())
        .build()
        .expect("client")
}

fn identity(email: &str) -> Identity {
    Identity {
        provider: Provider::GitHub,
        external_id: common::unique("gh"),
        email: email.to_string(),
        name: "Flow Test".to_string(),
        avatar_url: None,
        raw_tokens: serde_json::json!({ "access_token": "test" }),
        email_synthesized: false,
    }
}

fn cookie(session_id: &str) -> String {
    format!("meaux_session={}", session_id)
}

#[tokio::test]
async fn expired_session_cookie_is_unauthenticated_everywhere() -> Result<()> {
    if !common::database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let pool = common::test_pool().await?;
    let store = SessionStore::new(pool.clone());
    let client = no_redirect_client();

    let email = format!("{}@example.com", common::unique("flow-expired"));
    let session_id = store.create(&identity(&email)).await?;

    // Move the clock: created 8 days ago, so the 7-day TTL has elapsed
    sqlx::query(
        "UPDATE sessions SET created_at = now() - interval '8 days', \
         expires_at = now() - interval '1 day' WHERE id = $1",
    )
    .bind(&session_id)
    .execute(&pool)
    .await?;

    // API request: 401
    let res = client
        .get(format!("{}/superadmin/status", server.base_url))
        .header("cookie", cookie(&session_id))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Page request: redirect to the login path
    let res = client
        .get(format!("{}/admin", server.base_url))
        .header("cookie", cookie(&session_id))
        .send()
        .await?;
    assert!(res.status().is_redirection());
    assert_eq!(
        res.headers().get("location").and_then(|v| v.to_str().ok()),
        Some("/login")
    );
    Ok(())
}

#[tokio::test]
async fn non_elevated_caller_cannot_create_accounts() -> Result<()> {
    if !common::database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let pool = common::test_pool().await?;
    let store = SessionStore::new(pool.clone());
    let client = no_redirect_client();

    let email = format!("{}@example.com", common::unique("flow-plain"));
    let session_id = store.create(&identity(&email)).await?;

    // Authenticated but not on the allow-list
    let res = client
        .get(format!("{}/superadmin/status", server.base_url))
        .header("cookie", cookie(&session_id))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["data"]["is_superadmin"], false);

    // Mutation is forbidden and creates no row
    let target_email = format!("{}@example.com", common::unique("flow-target"));
    let res = client
        .post(format!("{}/superadmin/accounts", server.base_url))
        .header("cookie", cookie(&session_id))
        .json(&serde_json::json!({ "email": target_email, "name": "Target" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM superadmins WHERE email = $1")
        .bind(&target_email)
        .fetch_one(&pool)
        .await?;
    assert_eq!(count, 0, "403 must not create a row");
    Ok(())
}

#[tokio::test]
async fn elevated_caller_manages_accounts_and_grants() -> Result<()> {
    if !common::database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let pool = common::test_pool().await?;
    let store = SessionStore::new(pool.clone());
    let registry = SuperadminRegistry::new(pool.clone());
    let client = no_redirect_client();

    // Bootstrap path: the first superadmin is provisioned out-of-band
    let admin_email = format!("{}@example.com", common::unique("flow-admin"));
    registry
        .create_account(&admin_email, "Flow Admin", "superadmin")
        .await?;
    let session_id = store.create(&identity(&admin_email)).await?;

    // Create a second account through the API
    let new_email = format!("{}@example.com", common::unique("flow-new"));
    let res = client
        .post(format!("{}/superadmin/accounts", server.base_url))
        .header("cookie", cookie(&session_id))
        .json(&serde_json::json!({ "email": new_email, "name": "New Admin" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await?;
    let new_account_id = body["data"]["id"].as_str().expect("account id").to_string();

    // Listing includes it
    let res = client
        .get(format!("{}/superadmin/accounts", server.base_url))
        .header("cookie", cookie(&session_id))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await?;
    assert!(body["data"]
        .as_array()
        .expect("account list")
        .iter()
        .any(|a| a["email"] == new_email.as_str()));

    // Grant tenant access to the new account
    let tenant = common::unique("flow-tenant");
    let res = client
        .post(format!("{}/superadmin/tenant-access", server.base_url))
        .header("cookie", cookie(&session_id))
        .json(&serde_json::json!({ "account_id": new_account_id, "tenant_id": tenant }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    // The account creation shows up in the audit log
    let mut audited = false;
    for _ in 0..20 {
        let res = client
            .get(format!(
                "{}/superadmin/audit-log?limit=200",
                server.base_url
            ))
            .header("cookie", cookie(&session_id))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::OK);
        let body: serde_json::Value = res.json().await?;
        if body["data"]
            .as_array()
            .expect("audit entries")
            .iter()
            .any(|e| e["metadata"]["email"] == new_email.as_str())
        {
            audited = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(audited, "account creation was not audited");
    Ok(())
}

#[tokio::test]
async fn delegated_call_rejects_foreign_urls_before_dispatch() -> Result<()> {
    if !common::database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let pool = common::test_pool().await?;
    let store = SessionStore::new(pool.clone());
    let registry = SuperadminRegistry::new(pool.clone());
    let client = no_redirect_client();

    let admin_email = format!("{}@example.com", common::unique("flow-deleg"));
    registry
        .create_account(&admin_email, "Deleg Admin", "superadmin")
        .await?;
    let session_id = store.create(&identity(&admin_email)).await?;

    // Foreign host: rejected before any token is obtained or attached,
    // so this holds even with the broker unconfigured.
    let res = client
        .post(format!("{}/superadmin/delegated-call", server.base_url))
        .header("cookie", cookie(&session_id))
        .json(&serde_json::json!({ "url": "https://evil.example.com/x" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Unparsable URL: bad request
    let res = client
        .post(format!("{}/superadmin/delegated-call", server.base_url))
        .header("cookie", cookie(&session_id))
        .json(&serde_json::json!({ "url": "not a url" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn logout_invalidates_the_session() -> Result<()> {
    if !common::database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let pool = common::test_pool().await?;
    let store = SessionStore::new(pool.clone());
    let client = no_redirect_client();

    let email = format!("{}@example.com", common::unique("flow-logout"));
    let session_id = store.create(&identity(&email)).await?;

    let res = client
        .get(format!("{}/auth/logout", server.base_url))
        .header("cookie", cookie(&session_id))
        .send()
        .await?;
    assert!(res.status().is_redirection());

    // The durable record is gone, not just the cookie
    assert!(store.get(&session_id).await?.is_none());

    let res = client
        .get(format!("{}/superadmin/status", server.base_url))
        .header("cookie", cookie(&session_id))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
