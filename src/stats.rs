//! Summary statistics over the tracked set.
//!
//! [`Stats`] is computed from enriched records after each refresh and
//! served by `GET /api/data`; `scout stats` prints the same summary.

use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;

use traction_scout_core::models::EnrichedRecord;
use traction_scout_core::store::SnapshotStore;

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;
use crate::state;

/// Counts over one result set plus ledger totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Stats {
    pub total: usize,
    pub npm_tracked: usize,
    pub pypi_tracked: usize,
    pub crates_tracked: usize,
    pub by_language: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,
    pub snapshot_count: i64,
    pub tracked_entities: i64,
}

fn download_source_is(record: &EnrichedRecord, prefix: &str) -> bool {
    record
        .raw
        .download_source
        .as_deref()
        .is_some_and(|s| s.to_lowercase().starts_with(prefix))
}

impl Stats {
    pub fn from_records(records: &[EnrichedRecord], snapshot_count: i64, tracked_entities: i64) -> Self {
        let mut stats = Stats {
            total: records.len(),
            snapshot_count,
            tracked_entities,
            ..Default::default()
        };

        for record in records {
            if download_source_is(record, "npm") {
                stats.npm_tracked += 1;
            } else if download_source_is(record, "pypi") {
                stats.pypi_tracked += 1;
            } else if download_source_is(record, "crates") {
                stats.crates_tracked += 1;
            }

            let language = record
                .raw
                .language
                .clone()
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| "Unknown".to_string());
            *stats.by_language.entry(language).or_insert(0) += 1;
            *stats
                .by_category
                .entry(record.category.as_str().to_string())
                .or_insert(0) += 1;
        }

        stats
    }

    /// Recomputes the ledger totals from the store.
    pub async fn compute(store: &dyn SnapshotStore, records: &[EnrichedRecord]) -> Result<Self> {
        let snapshot_count = store.snapshot_count().await?;
        let tracked = store.tracked_entity_count().await?;
        Ok(Self::from_records(records, snapshot_count, tracked))
    }
}

/// Run the stats command: load the last-known state and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());
    let catalog = config.load_catalog()?;

    let records = state::load_records(&store, &catalog).await?;
    let stats = Stats::compute(&store, &records).await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Traction Scout — Ledger Stats");
    println!("=============================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Entities:    {}", stats.total);
    println!("  Tracked:     {}", stats.tracked_entities);
    println!("  Snapshots:   {}", stats.snapshot_count);
    println!(
        "  Downloads:   npm {}  pypi {}  crates {}",
        stats.npm_tracked, stats.pypi_tracked, stats.crates_tracked
    );

    print_breakdown("By category:", "CATEGORY", &stats.by_category);
    print_breakdown("By language:", "LANGUAGE", &stats.by_language);

    println!();

    pool.close().await;
    Ok(())
}

fn print_breakdown(title: &str, header: &str, counts: &BTreeMap<String, usize>) {
    if counts.is_empty() {
        return;
    }
    let mut rows: Vec<_> = counts.iter().collect();
    rows.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    println!();
    println!("  {}", title);
    println!("  {:<24} {:>8}", header, "COUNT");
    println!("  {}", "-".repeat(33));
    for (name, count) in rows {
        println!("  {:<24} {:>8}", name, count);
    }
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
