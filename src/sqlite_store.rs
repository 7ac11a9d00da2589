//! SQLite-backed [`SnapshotStore`] implementation.
//!
//! Dates are stored as `YYYY-MM-DD` text so lexical order matches calendar
//! order, and every write is an `ON CONFLICT ... DO UPDATE` upsert keyed
//! by the same uniqueness constraint as the in-memory backend.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use traction_scout_core::models::{EntityId, EntityRecord, GrowthRecord, Metrics, Snapshot};
use traction_scout_core::store::SnapshotStore;

const DATE_FMT: &str = "%Y-%m-%d";

/// SQLite implementation of the [`SnapshotStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FMT).to_string()
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FMT).with_context(|| format!("bad stored date '{}'", raw))
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("bad stored timestamp '{}'", raw))?
        .with_timezone(&Utc))
}

fn parse_label<T: std::str::FromStr<Err = String>>(raw: Option<String>) -> Result<Option<T>> {
    raw.map(|s| s.parse::<T>().map_err(anyhow::Error::msg))
        .transpose()
}

fn entity_from_row(row: &SqliteRow) -> Result<EntityRecord> {
    let first_seen: String = row.get("first_seen");
    let updated_at: String = row.get("updated_at");
    let is_big_tech: i64 = row.get("is_big_tech");
    Ok(EntityRecord {
        id: EntityId::new(row.get::<String, _>("owner"), row.get::<String, _>("name")),
        description: row.get("description"),
        language: row.get("language"),
        category: parse_label(row.get("category"))?,
        funding_stage: parse_label(row.get("funding_stage"))?,
        funding_amount: row.get("funding_amount"),
        is_big_tech: is_big_tech != 0,
        first_seen: parse_ts(&first_seen)?,
        updated_at: parse_ts(&updated_at)?,
    })
}

fn snapshot_from_row(row: &SqliteRow) -> Result<Snapshot> {
    let date: String = row.get("snapshot_date");
    Ok(Snapshot {
        entity: EntityId::new(row.get::<String, _>("owner"), row.get::<String, _>("name")),
        date: parse_date(&date)?,
        metrics: Metrics {
            stars: row.get("stars"),
            forks: row.get("forks"),
            contributors: row.get("contributors"),
            dependents: row.get("dependents"),
            downloads: row.get("downloads"),
            download_source: row.get("download_source"),
            commits: row.get("commits"),
            prs: row.get("prs"),
            issues: row.get("issues"),
        },
    })
}

fn score_u8(value: Option<i64>) -> Option<u8> {
    value.map(|v| v.clamp(0, u8::MAX as i64) as u8)
}

fn growth_from_row(row: &SqliteRow) -> Result<GrowthRecord> {
    let calculated_at: String = row.get("calculated_at");
    Ok(GrowthRecord {
        entity: EntityId::new(row.get::<String, _>("owner"), row.get::<String, _>("name")),
        calculated_at: parse_date(&calculated_at)?,
        stars_wow: row.get("stars_wow"),
        stars_mom: row.get("stars_mom"),
        stars_acceleration: row.get("stars_acceleration"),
        forks_wow: row.get("forks_wow"),
        forks_mom: row.get("forks_mom"),
        downloads_wow: row.get("downloads_wow"),
        downloads_mom: row.get("downloads_mom"),
        contributors_wow: row.get("contributors_wow"),
        contributors_mom: row.get("contributors_mom"),
        traction_score: row.get("traction_score"),
        investability_score: score_u8(row.get("investability_score")),
        series_a_fit: score_u8(row.get("series_a_fit")),
    })
}

const SNAPSHOT_COLUMNS: &str = "owner, name, snapshot_date, stars, forks, contributors, \
     dependents, downloads, download_source, commits, issues, prs";

const GROWTH_COLUMNS: &str = "owner, name, calculated_at, stars_wow, stars_mom, \
     stars_acceleration, forks_wow, forks_mom, downloads_wow, downloads_mom, \
     contributors_wow, contributors_mom, traction_score, investability_score, series_a_fit";

#[async_trait]
impl SnapshotStore for SqliteStore {
    async fn upsert_entity(&self, entity: &EntityRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO entities (owner, name, description, language, category,
                                  funding_stage, funding_amount, is_big_tech,
                                  first_seen, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(owner, name) DO UPDATE SET
                description = excluded.description,
                language = excluded.language,
                category = excluded.category,
                funding_stage = excluded.funding_stage,
                funding_amount = excluded.funding_amount,
                is_big_tech = excluded.is_big_tech,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&entity.id.owner)
        .bind(&entity.id.name)
        .bind(&entity.description)
        .bind(&entity.language)
        .bind(entity.category.map(|c| c.as_str()))
        .bind(entity.funding_stage.map(|f| f.as_str()))
        .bind(&entity.funding_amount)
        .bind(entity.is_big_tech as i64)
        .bind(entity.first_seen.to_rfc3339())
        .bind(entity.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_entity(&self, id: &EntityId) -> Result<Option<EntityRecord>> {
        let row = sqlx::query("SELECT * FROM entities WHERE owner = ? AND name = ?")
            .bind(&id.owner)
            .bind(&id.name)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(entity_from_row).transpose()
    }

    async fn list_entities(&self) -> Result<Vec<EntityRecord>> {
        let rows = sqlx::query("SELECT * FROM entities ORDER BY owner ASC, name ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(entity_from_row).collect()
    }

    async fn upsert_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        let m = &snapshot.metrics;
        sqlx::query(&format!(
            r#"
            INSERT INTO snapshots ({})
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(owner, name, snapshot_date) DO UPDATE SET
                stars = excluded.stars,
                forks = excluded.forks,
                contributors = excluded.contributors,
                dependents = excluded.dependents,
                downloads = excluded.downloads,
                download_source = excluded.download_source,
                commits = excluded.commits,
                issues = excluded.issues,
                prs = excluded.prs
            "#,
            SNAPSHOT_COLUMNS
        ))
        .bind(&snapshot.entity.owner)
        .bind(&snapshot.entity.name)
        .bind(format_date(snapshot.date))
        .bind(m.stars)
        .bind(m.forks)
        .bind(m.contributors)
        .bind(m.dependents)
        .bind(m.downloads)
        .bind(&m.download_source)
        .bind(m.commits)
        .bind(m.issues)
        .bind(m.prs)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn nearest_on_or_before(
        &self,
        id: &EntityId,
        on_or_before: NaiveDate,
    ) -> Result<Option<Snapshot>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM snapshots WHERE owner = ? AND name = ? AND snapshot_date <= ? \
             ORDER BY snapshot_date DESC LIMIT 1",
            SNAPSHOT_COLUMNS
        ))
        .bind(&id.owner)
        .bind(&id.name)
        .bind(format_date(on_or_before))
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(snapshot_from_row).transpose()
    }

    // Unbounded: `NaiveDate::MAX` does not format as a four-digit year.
    async fn latest_snapshot(&self, id: &EntityId) -> Result<Option<Snapshot>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM snapshots WHERE owner = ? AND name = ? \
             ORDER BY snapshot_date DESC LIMIT 1",
            SNAPSHOT_COLUMNS
        ))
        .bind(&id.owner)
        .bind(&id.name)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(snapshot_from_row).transpose()
    }

    async fn snapshots_between(
        &self,
        id: &EntityId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Snapshot>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM snapshots WHERE owner = ? AND name = ? \
             AND snapshot_date >= ? AND snapshot_date <= ? ORDER BY snapshot_date ASC",
            SNAPSHOT_COLUMNS
        ))
        .bind(&id.owner)
        .bind(&id.name)
        .bind(format_date(from))
        .bind(format_date(to))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(snapshot_from_row).collect()
    }

    async fn upsert_growth(&self, record: &GrowthRecord) -> Result<()> {
        sqlx::query(&format!(
            r#"
            INSERT INTO growth_records ({})
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(owner, name, calculated_at) DO UPDATE SET
                stars_wow = excluded.stars_wow,
                stars_mom = excluded.stars_mom,
                stars_acceleration = excluded.stars_acceleration,
                forks_wow = excluded.forks_wow,
                forks_mom = excluded.forks_mom,
                downloads_wow = excluded.downloads_wow,
                downloads_mom = excluded.downloads_mom,
                contributors_wow = excluded.contributors_wow,
                contributors_mom = excluded.contributors_mom,
                traction_score = excluded.traction_score,
                investability_score = excluded.investability_score,
                series_a_fit = excluded.series_a_fit
            "#,
            GROWTH_COLUMNS
        ))
        .bind(&record.entity.owner)
        .bind(&record.entity.name)
        .bind(format_date(record.calculated_at))
        .bind(record.stars_wow)
        .bind(record.stars_mom)
        .bind(record.stars_acceleration)
        .bind(record.forks_wow)
        .bind(record.forks_mom)
        .bind(record.downloads_wow)
        .bind(record.downloads_mom)
        .bind(record.contributors_wow)
        .bind(record.contributors_mom)
        .bind(record.traction_score)
        .bind(record.investability_score.map(i64::from))
        .bind(record.series_a_fit.map(i64::from))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn latest_growth(&self, id: &EntityId) -> Result<Option<GrowthRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM growth_records WHERE owner = ? AND name = ? \
             ORDER BY calculated_at DESC LIMIT 1",
            GROWTH_COLUMNS
        ))
        .bind(&id.owner)
        .bind(&id.name)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(growth_from_row).transpose()
    }

    async fn growth_history(&self, id: &EntityId) -> Result<Vec<GrowthRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM growth_records WHERE owner = ? AND name = ? \
             ORDER BY calculated_at ASC",
            GROWTH_COLUMNS
        ))
        .bind(&id.owner)
        .bind(&id.name)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(growth_from_row).collect()
    }

    async fn snapshot_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM snapshots")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn tracked_entity_count(&self) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM (SELECT DISTINCT owner, name FROM snapshots)")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
