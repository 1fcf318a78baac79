use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::SuperadminAccount;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Superadmin already exists: {0}")]
    AlreadyExists(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Allow-list of elevated accounts. Matching is exact-email against active
/// rows only; there is no role hierarchy and no derived elevation.
pub struct SuperadminRegistry {
    pool: PgPool,
}

impl SuperadminRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the account iff `email` exactly matches an active row.
    pub async fn is_superadmin(
        &self,
        email: &str,
    ) -> Result<Option<SuperadminAccount>, sqlx::Error> {
        sqlx::query_as::<_, SuperadminAccount>(
            r#"
            SELECT id, email, name, role, service_account_email, granted_scopes,
                   is_active, created_at
            FROM superadmins
            WHERE email = $1 AND is_active = true
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    /// Create an account. The HTTP surface only reaches this behind the
    /// elevation middleware; the first account comes from the CLI.
    pub async fn create_account(
        &self,
        email: &str,
        name: &str,
        role: &str,
    ) -> Result<SuperadminAccount, RegistryError> {
        let result = sqlx::query_as::<_, SuperadminAccount>(
            r#"
            INSERT INTO superadmins (email, name, role)
            VALUES ($1, $2, $3)
            RETURNING id, email, name, role, service_account_email, granted_scopes,
                      is_active, created_at
            "#,
        )
        .bind(email)
        .bind(name)
        .bind(role)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(account) => Ok(account),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(RegistryError::AlreadyExists(email.to_string()))
            }
            Err(other) => Err(RegistryError::Database(other)),
        }
    }

    pub async fn list_accounts(&self) -> Result<Vec<SuperadminAccount>, sqlx::Error> {
        sqlx::query_as::<_, SuperadminAccount>(
            r#"
            SELECT id, email, name, role, service_account_email, granted_scopes,
                   is_active, created_at
            FROM superadmins
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    /// Accounts are deactivated, never hard-deleted, so audit entries keep a
    /// valid linkage. Returns false when no such account existed.
    pub async fn deactivate_account(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE superadmins SET is_active = false WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
