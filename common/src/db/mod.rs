//! Database bootstrap shared by the PostgreSQL store

use sqlx::{postgres::PgPoolOptions, PgPool, Pool, Postgres};

use crate::error::{Error, Result};

/// Database pool type
pub type DbPool = Pool<Postgres>;

/// Postgres error code for a unique constraint violation
pub const UNIQUE_VIOLATION: &str = "23505";

/// Connect a pool to the given database
pub async fn connect(database_url: &str, max_connections: u32) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Run migrations on the database
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    let migrations_path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .ok_or_else(|| Error::ConfigurationError("workspace root not found".to_string()))?
        .join("migrations");

    sqlx::migrate::Migrator::new(migrations_path)
        .await?
        .run(pool)
        .await?;

    Ok(())
}

/// Whether a database error is a unique constraint violation
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code == UNIQUE_VIOLATION)
        .unwrap_or(false)
}
