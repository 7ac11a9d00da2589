//! Per-entity history: snapshots within a trailing window plus every
//! growth record. Shared by `scout history` and `GET /api/history`.

use anyhow::{bail, Result};
use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;

use traction_scout_core::models::{EntityId, GrowthRecord, Snapshot};
use traction_scout_core::store::SnapshotStore;

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

#[derive(Debug, Clone, Serialize)]
pub struct EntityHistory {
    pub entity: String,
    pub days: i64,
    pub snapshots: Vec<Snapshot>,
    pub growth: Vec<GrowthRecord>,
}

/// Snapshots from the last `days` days up to `today`, oldest first.
pub async fn entity_history(
    store: &dyn SnapshotStore,
    id: &EntityId,
    days: i64,
    today: NaiveDate,
) -> Result<EntityHistory> {
    let from = today - Duration::days(days);
    let snapshots = store.snapshots_between(id, from, today).await?;
    let growth = store
        .growth_history(id)
        .await?
        .into_iter()
        .filter(|g| g.calculated_at >= from && g.calculated_at <= today)
        .collect();
    Ok(EntityHistory {
        entity: id.full_name(),
        days,
        snapshots,
        growth,
    })
}

fn fmt_rate(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:+.2}%", v))
        .unwrap_or_else(|| "-".to_string())
}

fn fmt_count(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

pub async fn run_history(config: &Config, full_name: &str, json: bool) -> Result<()> {
    let id = match EntityId::parse(full_name) {
        Some(id) => id,
        None => bail!("expected <owner>/<name>, got '{}'", full_name),
    };

    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());
    let history = entity_history(&store, &id, config.history.days, Utc::now().date_naive()).await?;
    pool.close().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }

    if history.snapshots.is_empty() {
        println!("No snapshots for {} in the last {} days.", id, history.days);
        return Ok(());
    }

    println!("{} — last {} days", id, history.days);
    println!();
    println!(
        "  {:<12} {:>9} {:>8} {:>12} {:>8}",
        "DATE", "STARS", "FORKS", "DOWNLOADS", "CONTRIB"
    );
    for s in &history.snapshots {
        println!(
            "  {:<12} {:>9} {:>8} {:>12} {:>8}",
            s.date,
            fmt_count(s.metrics.stars),
            fmt_count(s.metrics.forks),
            fmt_count(s.metrics.downloads),
            fmt_count(s.metrics.contributors)
        );
    }

    if let Some(latest) = history.growth.last() {
        println!();
        println!("  Growth as of {}:", latest.calculated_at);
        println!(
            "    stars      WoW {}  MoM {}  accel {}",
            fmt_rate(latest.stars_wow),
            fmt_rate(latest.stars_mom),
            fmt_rate(latest.stars_acceleration)
        );
        println!(
            "    downloads  WoW {}  MoM {}",
            fmt_rate(latest.downloads_wow),
            fmt_rate(latest.downloads_mom)
        );
        println!(
            "    scores     investability {}  series-a fit {}  traction {}",
            latest.investability_score.map(|v| v.to_string()).unwrap_or_else(|| "-".into()),
            latest.series_a_fit.map(|v| v.to_string()).unwrap_or_else(|| "-".into()),
            fmt_count(latest.traction_score)
        );
    }

    Ok(())
}
