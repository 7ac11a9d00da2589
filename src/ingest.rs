//! One-shot ingestion of a records file through the enrichment pipeline.
//!
//! `scout ingest <file>` treats every record as an observation for one
//! date (today unless `--date` is given), so historical exports can be
//! replayed oldest first to build up the snapshot ledger.

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use std::path::Path;

use traction_scout_core::pipeline::EnrichmentPipeline;

use crate::config::Config;
use crate::db;
use crate::refresh::error_chain;
use crate::source::read_records;
use crate::sqlite_store::SqliteStore;

/// Counts from one ingest run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestSummary {
    pub enriched: usize,
    pub failed: usize,
}

/// Parses a `YYYY-MM-DD` observation date, defaulting to today (UTC).
pub fn parse_as_of(date: Option<&str>) -> Result<NaiveDate> {
    match date {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .with_context(|| format!("invalid --date '{}', expected YYYY-MM-DD", raw)),
        None => Ok(Utc::now().date_naive()),
    }
}

pub async fn run_ingest(config: &Config, path: &Path, date: Option<&str>) -> Result<IngestSummary> {
    let as_of = parse_as_of(date)?;
    let records = read_records(path)?;

    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());
    let catalog = config.load_catalog()?;
    let pipeline = EnrichmentPipeline::new(&store, &catalog);

    let mut summary = IngestSummary::default();
    for raw in records {
        let id = raw.id();
        match pipeline.enrich(raw, as_of).await {
            Ok(record) => {
                summary.enriched += 1;
                tracing::debug!(entity = %id, score = record.investability_score, "ingested");
            }
            Err(e) => {
                summary.failed += 1;
                tracing::warn!(entity = %id, error = %error_chain(e), "ingest failed");
            }
        }
    }

    println!(
        "Ingested {} records for {} ({} failed).",
        summary.enriched, as_of, summary.failed
    );

    pool.close().await;
    Ok(summary)
}
