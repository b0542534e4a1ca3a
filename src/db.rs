// src/db.rs - Database migrations and setup

use sqlx::SqlitePool;
use anyhow::Result;

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(pool)
        .await?;

    // Inventory blob, one row per application key
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS app_state (
            key TEXT PRIMARY KEY CHECK(length(key) > 0 AND length(key) <= 255),
            payload TEXT NOT NULL,
            updated_at DATETIME NOT NULL
        )
        "#,
    )
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS flow_readings (
            id TEXT PRIMARY KEY,
            timestamp DATETIME NOT NULL,
            duration_seconds REAL NOT NULL CHECK(duration_seconds > 0),
            flow_rate REAL NOT NULL CHECK(flow_rate >= 0),
            operator TEXT NOT NULL CHECK(length(operator) >= 2 AND length(operator) <= 100),
            deepwell_1 REAL CHECK(deepwell_1 IS NULL OR deepwell_1 >= 0),
            deepwell_2 REAL CHECK(deepwell_2 IS NULL OR deepwell_2 >= 0),
            remark TEXT CHECK(remark IS NULL OR length(remark) <= 1000)
        )
        "#,
    )
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_flow_readings_timestamp ON flow_readings(timestamp)")
        .execute(pool)
        .await?;

    // Submitted aggregate reports carry a JSON snapshot of the readings
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS flow_reports (
            id TEXT PRIMARY KEY,
            timestamp DATETIME NOT NULL,
            readings TEXT NOT NULL,
            count INTEGER NOT NULL CHECK(count >= 0),
            mean_flow_rate REAL NOT NULL CHECK(mean_flow_rate >= 0)
        )
        "#,
    )
        .execute(pool)
        .await?;

    log::info!("Database migrations completed");
    Ok(())
}
