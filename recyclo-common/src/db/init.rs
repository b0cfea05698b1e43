//! Database initialization
//!
//! Opens (creating if needed) the SQLite file, applies connection pragmas,
//! creates tables and brings databases from older releases up to date:
//!
//! 1. rename the legacy `classification_logs` table to `decision_logs`
//! 2. `CREATE TABLE IF NOT EXISTS`
//! 3. schema sync (add missing columns)
//! 4. row backfill (timestamps, locale, category)

use crate::db::table_schemas::sync_all_table_schemas;
use crate::db::schema_sync::SchemaIntrospector;
use crate::locale::Locale;
use crate::outcome::normalize;
use crate::time::{format_timestamp, parse_timestamp};
use crate::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use std::path::Path;
use tracing::{info, warn};

const LEGACY_TABLE: &str = "classification_logs";

/// Open or create the database at `db_path`
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;
    // Concurrent readers alongside the single writer
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    prepare_schema(&pool).await?;

    Ok(pool)
}

/// Private in-memory database for tests.
///
/// Limited to one connection that never expires: every connection to
/// `sqlite::memory:` is a separate database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    prepare_schema(&pool).await?;

    Ok(pool)
}

async fn prepare_schema(pool: &SqlitePool) -> Result<()> {
    rename_legacy_table(pool).await?;
    create_decision_logs_table(pool).await?;
    sync_all_table_schemas(pool).await?;
    backfill_legacy_rows(pool).await?;
    Ok(())
}

async fn rename_legacy_table(pool: &SqlitePool) -> Result<()> {
    let legacy = SchemaIntrospector::table_exists(pool, LEGACY_TABLE).await?;
    let current = SchemaIntrospector::table_exists(pool, "decision_logs").await?;

    match (legacy, current) {
        (true, false) => {
            sqlx::query("ALTER TABLE classification_logs RENAME TO decision_logs")
                .execute(pool)
                .await?;
            info!("Renamed legacy table {} to decision_logs", LEGACY_TABLE);
        }
        (true, true) => {
            warn!(
                "Both {} and decision_logs exist; legacy table left untouched",
                LEGACY_TABLE
            );
        }
        _ => {}
    }

    Ok(())
}

async fn create_decision_logs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS decision_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            label TEXT NOT NULL,
            category TEXT,
            confidence REAL,
            locale TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_decision_logs_user_created ON decision_logs(user_id, created_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Bring rows written by older releases to the current format.
///
/// Idempotent; on a current database every query matches nothing.
async fn backfill_legacy_rows(pool: &SqlitePool) -> Result<()> {
    // Space-separated timestamps do not sort against RFC 3339 text
    let rows = sqlx::query("SELECT id, created_at FROM decision_logs WHERE created_at LIKE '____-__-__ %'")
        .fetch_all(pool)
        .await?;
    for row in &rows {
        let id: i64 = row.get("id");
        let raw: String = row.get("created_at");
        match parse_timestamp(&raw) {
            Some(ts) => {
                sqlx::query("UPDATE decision_logs SET created_at = ? WHERE id = ?")
                    .bind(format_timestamp(&ts))
                    .bind(id)
                    .execute(pool)
                    .await?;
            }
            None => warn!("decision_logs row {}: unreadable timestamp '{}'", id, raw),
        }
    }
    if !rows.is_empty() {
        info!("Converted {} legacy timestamps", rows.len());
    }

    let columns = SchemaIntrospector::introspect_table(pool, "decision_logs").await?;
    if columns.iter().any(|c| c.name == "city") {
        let rows = sqlx::query("SELECT id, city FROM decision_logs WHERE locale IS NULL AND city IS NOT NULL")
            .fetch_all(pool)
            .await?;
        for row in &rows {
            let id: i64 = row.get("id");
            let city: String = row.get("city");
            sqlx::query("UPDATE decision_logs SET locale = ? WHERE id = ?")
                .bind(Locale::normalize(Some(&city)).key())
                .bind(id)
                .execute(pool)
                .await?;
        }
    }

    let rows = sqlx::query("SELECT id, label FROM decision_logs WHERE category IS NULL")
        .fetch_all(pool)
        .await?;
    for row in &rows {
        let id: i64 = row.get("id");
        let label: String = row.get("label");
        sqlx::query("UPDATE decision_logs SET category = ? WHERE id = ?")
            .bind(normalize(&label).as_str())
            .bind(id)
            .execute(pool)
            .await?;
    }

    Ok(())
}
