pub mod access;
pub mod sessions;
pub mod superadmin;
pub mod tokens;

use sqlx::PgPool;

use crate::database::manager::DatabaseManager;
use crate::database::schema;

/// CLI commands talk to the store directly, bypassing the HTTP surface.
/// Schema DDL is applied first so bootstrap works on a fresh database.
pub(crate) async fn store_pool() -> anyhow::Result<PgPool> {
    let pool = DatabaseManager::main_pool().await?;
    schema::ensure_schema(&pool).await?;
    Ok(pool)
}
