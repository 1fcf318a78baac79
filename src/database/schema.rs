use sqlx::PgPool;

use super::manager::DatabaseError;

/// Idempotent DDL applied at server startup. Audit rows are append-only by
/// contract: nothing in this crate issues UPDATE or DELETE against audit_log.
const DDL: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS sessions (
        id              TEXT PRIMARY KEY,
        user_id         TEXT NOT NULL,
        email           TEXT NOT NULL,
        name            TEXT NOT NULL,
        picture         TEXT,
        provider        TEXT NOT NULL,
        provider_tokens JSONB NOT NULL DEFAULT '{}'::jsonb,
        created_at      TIMESTAMPTZ NOT NULL DEFAULT now(),
        expires_at      TIMESTAMPTZ NOT NULL,
        CHECK (expires_at > created_at)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS superadmins (
        id                    UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        email                 TEXT NOT NULL UNIQUE,
        name                  TEXT NOT NULL,
        role                  TEXT NOT NULL DEFAULT 'superadmin',
        service_account_email TEXT,
        granted_scopes        TEXT[] NOT NULL DEFAULT '{}',
        is_active             BOOLEAN NOT NULL DEFAULT true,
        created_at            TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tenant_access (
        superadmin_id UUID NOT NULL REFERENCES superadmins(id),
        tenant_id     TEXT NOT NULL,
        access_level  TEXT NOT NULL DEFAULT 'full',
        enabled       BOOLEAN NOT NULL DEFAULT true,
        created_at    TIMESTAMPTZ NOT NULL DEFAULT now(),
        UNIQUE (superadmin_id, tenant_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS delegated_tokens (
        id           UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        session_id   TEXT NOT NULL,
        access_token TEXT NOT NULL,
        scopes       TEXT[] NOT NULL DEFAULT '{}',
        created_at   TIMESTAMPTZ NOT NULL DEFAULT now(),
        expires_at   TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS delegated_tokens_session_idx
        ON delegated_tokens (session_id, created_at DESC)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS audit_log (
        id            UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        superadmin_id UUID NOT NULL,
        action        TEXT NOT NULL,
        resource_type TEXT,
        resource_id   TEXT,
        ip            TEXT NOT NULL,
        user_agent    TEXT NOT NULL,
        metadata      JSONB,
        created_at    TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
];

/// Apply schema DDL. Safe to run on every startup.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), DatabaseError> {
    for statement in DDL {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
