mod common;

use std::time::Duration;

use anyhow::Result;
use meaux_api::audit::{AuditLog, NewAuditEntry};
use meaux_api::delegation::{BrokerError, CredentialBroker};
use meaux_api::oauth::{Identity, Provider};
use meaux_api::session::SessionStore;
use meaux_api::superadmin::{RegistryError, SuperadminRegistry, TenantAuthorizer};

fn test_identity(email: &str) -> Identity {
    Identity {
        provider: Provider::Google,
        external_id: common::unique("ext"),
        email: email.to_string(),
        name: "Store Test".to_string(),
        avatar_url: None,
        raw_tokens: serde_json::json!({ "access_token": "test" }),
        email_synthesized: false,
    }
}

#[tokio::test]
async fn session_lifecycle_create_get_delete() -> Result<()> {
    if !common::database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let pool = common::test_pool().await?;
    let store = SessionStore::new(pool);

    let email = format!("{}@example.com", common::unique("session"));
    let id = store.create(&test_identity(&email)).await?;
    assert_eq!(id.len(), 64);

    let session = store.get(&id).await?.expect("session should be readable");
    assert_eq!(session.email, email);
    assert!(session.expires_at > session.created_at);

    store.delete(&id).await?;
    assert!(store.get(&id).await?.is_none(), "no resurrection after delete");

    // Idempotent: deleting again is not an error
    store.delete(&id).await?;
    Ok(())
}

#[tokio::test]
async fn expired_session_is_unreadable_before_the_sweep() -> Result<()> {
    if !common::database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let pool = common::test_pool().await?;
    let store = SessionStore::new(pool.clone());

    let email = format!("{}@example.com", common::unique("expired"));
    let id = store.create(&test_identity(&email)).await?;

    // Age the row as if created 8 days ago with the 7-day TTL; the record
    // still exists but must be unreadable.
    sqlx::query(
        "UPDATE sessions SET created_at = now() - interval '8 days', \
         expires_at = now() - interval '1 day' WHERE id = $1",
    )
    .bind(&id)
    .execute(&pool)
    .await?;

    assert!(store.get(&id).await?.is_none());

    // The sweep removes it for real
    store.sweep_expired().await?;
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions WHERE id = $1")
        .bind(&id)
        .fetch_one(&pool)
        .await?;
    assert_eq!(count, 0);
    Ok(())
}

#[tokio::test]
async fn registry_matches_only_active_exact_emails() -> Result<()> {
    if !common::database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let pool = common::test_pool().await?;
    let registry = SuperadminRegistry::new(pool);

    let email = format!("{}@example.com", common::unique("admin"));
    let account = registry.create_account(&email, "Admin", "superadmin").await?;

    assert!(registry.is_superadmin(&email).await?.is_some());
    assert!(registry
        .is_superadmin(&format!("other-{}", email))
        .await?
        .is_none());

    // Duplicates are rejected, not overwritten
    let dup = registry.create_account(&email, "Admin Again", "superadmin").await;
    assert!(matches!(dup, Err(RegistryError::AlreadyExists(_))));

    // Deactivation removes elevation without deleting the row
    assert!(registry.deactivate_account(account.id).await?);
    assert!(registry.is_superadmin(&email).await?.is_none());
    let all = registry.list_accounts().await?;
    assert!(all.iter().any(|a| a.id == account.id && !a.is_active));
    Ok(())
}

#[tokio::test]
async fn tenant_access_is_default_deny_and_exact_pair() -> Result<()> {
    if !common::database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let pool = common::test_pool().await?;
    let registry = SuperadminRegistry::new(pool.clone());
    let authorizer = TenantAuthorizer::new(pool);

    let email = format!("{}@example.com", common::unique("authz"));
    let account = registry.create_account(&email, "Authz", "superadmin").await?;
    let tenant = common::unique("tenant");

    // No row: denied
    assert!(!authorizer.has_tenant_access(account.id, &tenant).await?);

    // One enabled row for exactly the pair: permitted, and only that pair
    authorizer.grant(account.id, &tenant, "full").await?;
    assert!(authorizer.has_tenant_access(account.id, &tenant).await?);
    assert!(!authorizer
        .has_tenant_access(account.id, &common::unique("other"))
        .await?);

    // Removing the row denies again
    assert!(authorizer.revoke(account.id, &tenant).await?);
    assert!(!authorizer.has_tenant_access(account.id, &tenant).await?);
    Ok(())
}

#[tokio::test]
async fn broker_is_unavailable_without_service_account_config() -> Result<()> {
    if !common::database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    if std::env::var("DELEGATION_SERVICE_ACCOUNT_EMAIL").is_ok() {
        eprintln!("skipping: delegation configured in this environment");
        return Ok(());
    }
    let pool = common::test_pool().await?;
    let broker = CredentialBroker::new(pool);

    let err = broker
        .token_for_session(&common::unique("sess-disabled"))
        .await
        .expect_err("broker should be disabled");
    assert!(matches!(err, BrokerError::Disabled(_)));
    Ok(())
}

#[tokio::test]
async fn audit_entries_land_after_the_response_path() -> Result<()> {
    if !common::database_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let pool = common::test_pool().await?;
    let registry = SuperadminRegistry::new(pool.clone());
    let audit = AuditLog::new(pool);

    let email = format!("{}@example.com", common::unique("audit"));
    let account = registry.create_account(&email, "Audit", "superadmin").await?;

    let action = common::unique("test.action");
    audit.record(
        NewAuditEntry::new(account.id, action.clone(), "127.0.0.1".into(), "tests".into())
            .resource("widget", "w-1"),
    );

    // The write is detached; poll until it lands
    let mut found = false;
    for _ in 0..20 {
        let entries = audit.list(200, 0).await?;
        if entries.iter().any(|e| e.action == action) {
            found = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(found, "audit entry did not land");
    Ok(())
}
