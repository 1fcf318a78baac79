use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::TenantAccess;

/// Per-(account, tenant) grants. Default is deny: access exists iff an
/// explicit enabled row exists for exactly that pair. No inheritance, no
/// wildcard.
pub struct TenantAuthorizer {
    pool: PgPool,
}

impl TenantAuthorizer {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn has_tenant_access(
        &self,
        superadmin_id: Uuid,
        tenant_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM tenant_access
                WHERE superadmin_id = $1 AND tenant_id = $2 AND enabled = true
            )
            "#,
        )
        .bind(superadmin_id)
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Grant access. Re-granting an existing pair re-enables it and updates
    /// the access level.
    pub async fn grant(
        &self,
        superadmin_id: Uuid,
        tenant_id: &str,
        access_level: &str,
    ) -> Result<TenantAccess, sqlx::Error> {
        sqlx::query_as::<_, TenantAccess>(
            r#"
            INSERT INTO tenant_access (superadmin_id, tenant_id, access_level, enabled)
            VALUES ($1, $2, $3, true)
            ON CONFLICT (superadmin_id, tenant_id)
                DO UPDATE SET access_level = EXCLUDED.access_level, enabled = true
            RETURNING superadmin_id, tenant_id, access_level, enabled, created_at
            "#,
        )
        .bind(superadmin_id)
        .bind(tenant_id)
        .bind(access_level)
        .fetch_one(&self.pool)
        .await
    }

    /// Remove the grant for exactly this pair. Returns false when no row
    /// existed.
    pub async fn revoke(&self, superadmin_id: Uuid, tenant_id: &str) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM tenant_access WHERE superadmin_id = $1 AND tenant_id = $2")
                .bind(superadmin_id)
                .bind(tenant_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn tenants_for(&self, superadmin_id: Uuid) -> Result<Vec<TenantAccess>, sqlx::Error> {
        sqlx::query_as::<_, TenantAccess>(
            r#"
            SELECT superadmin_id, tenant_id, access_level, enabled, created_at
            FROM tenant_access
            WHERE superadmin_id = $1 AND enabled = true
            ORDER BY tenant_id
            "#,
        )
        .bind(superadmin_id)
        .fetch_all(&self.pool)
        .await
    }
}
