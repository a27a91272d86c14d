//! Database initialization
//!
//! Opens the local store and creates the debtor and phone cache tables on
//! first run. Table creation is idempotent and runs on every startup.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::{debug, info};

/// Initialize the local database and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    debug!("Connecting to database: {}", db_url);

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;

    // WAL lets lookups read while an enrichment writes
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    create_tables(&pool).await?;

    Ok(pool)
}

/// Open the remote identity database read-only
///
/// No timeout is set here; queries rely on the pool defaults.
pub async fn connect_remote(url: &str) -> Result<SqlitePool> {
    let url = if url.contains('?') {
        url.to_string()
    } else {
        format!("{}?mode=ro", url)
    };

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await?;

    info!("Connected to remote identity database");
    Ok(pool)
}

/// Create all local tables (idempotent)
pub async fn create_tables(pool: &SqlitePool) -> Result<()> {
    create_debtors_table(pool).await?;
    create_debtor_debts_table(pool).await?;
    create_phone_records_table(pool).await?;

    info!("Database tables initialized (debtors, debtor_debts, phone_records)");
    Ok(())
}

async fn create_debtors_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS debtors (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            identification TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Debt balances per category (land tax, rent, utilities, ...)
async fn create_debtor_debts_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS debtor_debts (
            debtor_id INTEGER NOT NULL REFERENCES debtors(id) ON DELETE CASCADE,
            category TEXT NOT NULL,
            amount REAL NOT NULL DEFAULT 0.0,
            PRIMARY KEY (debtor_id, category)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Phone cache
///
/// No uniqueness constraint on the identity: each enrichment writes a new
/// batch and readers take the latest one.
async fn create_phone_records_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS phone_records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            batch_id TEXT NOT NULL,
            client_id INTEGER,
            name TEXT NOT NULL,
            identification TEXT NOT NULL,
            phone TEXT,
            has_number INTEGER NOT NULL DEFAULT 0,
            checked INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_phone_records_client ON phone_records(client_id)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_phone_records_identity ON phone_records(name, identification)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
