use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate_pool(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Creates every table and index. Safe to run repeatedly.
pub async fn migrate_pool(pool: &SqlitePool) -> Result<()> {
    // Entity metadata, overwritten on each enrichment pass
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS entities (
            owner TEXT NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            language TEXT,
            category TEXT,
            funding_stage TEXT,
            funding_amount TEXT,
            is_big_tech INTEGER NOT NULL DEFAULT 0,
            first_seen TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(owner, name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // One row per entity per calendar day (YYYY-MM-DD, sorts lexically)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS snapshots (
            owner TEXT NOT NULL,
            name TEXT NOT NULL,
            snapshot_date TEXT NOT NULL,
            stars INTEGER,
            forks INTEGER,
            contributors INTEGER,
            dependents INTEGER,
            downloads INTEGER,
            download_source TEXT,
            commits INTEGER,
            issues INTEGER,
            prs INTEGER,
            UNIQUE(owner, name, snapshot_date)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS growth_records (
            owner TEXT NOT NULL,
            name TEXT NOT NULL,
            calculated_at TEXT NOT NULL,
            stars_wow REAL,
            stars_mom REAL,
            stars_acceleration REAL,
            forks_wow REAL,
            forks_mom REAL,
            downloads_wow REAL,
            downloads_mom REAL,
            contributors_wow REAL,
            contributors_mom REAL,
            traction_score INTEGER,
            investability_score INTEGER,
            series_a_fit INTEGER,
            UNIQUE(owner, name, calculated_at)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_snapshots_entity_date ON snapshots(owner, name, snapshot_date)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_growth_entity_date ON growth_records(owner, name, calculated_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
