//! Ranked listing of the last-known enriched records.

use anyhow::{Context, Result};

use traction_scout_core::models::{Category, EnrichedRecord};

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;
use crate::state::{load_records, sort_by_investability};

/// Filters for `scout top`.
#[derive(Debug, Clone)]
pub struct TopFilter {
    pub limit: usize,
    pub category: Option<Category>,
    pub include_big_tech: bool,
    pub include_non_investable: bool,
}

impl Default for TopFilter {
    fn default() -> Self {
        Self {
            limit: 20,
            category: None,
            include_big_tech: false,
            include_non_investable: false,
        }
    }
}

/// Applies `filter` and returns at most `filter.limit` records, best first.
pub fn rank(mut records: Vec<EnrichedRecord>, filter: &TopFilter) -> Vec<EnrichedRecord> {
    records.retain(|r| {
        (filter.include_big_tech || !r.is_big_tech)
            && (filter.include_non_investable || !r.is_non_investable)
            && filter.category.map_or(true, |c| r.category == c)
    });
    sort_by_investability(&mut records);
    records.truncate(filter.limit);
    records
}

pub fn parse_category(raw: &str) -> Result<Category> {
    raw.parse::<Category>()
        .map_err(anyhow::Error::msg)
        .with_context(|| "valid categories: ai-ml, devtools, infrastructure, data, security, observability, frontend, backend, fintech, other")
}

fn fmt_growth(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:+.1}%", v))
        .unwrap_or_else(|| "-".to_string())
}

pub async fn run_top(config: &Config, filter: &TopFilter, json: bool) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());
    let catalog = config.load_catalog()?;
    let records = rank(load_records(&store, &catalog).await?, filter);
    pool.close().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No matching entities.");
        return Ok(());
    }

    println!(
        "  {:<4} {:<36} {:<15} {:>6} {:>5} {:>5} {:>9}   {}",
        "#", "ENTITY", "CATEGORY", "STARS", "INV", "FIT", "STARS MoM", "FUNDING"
    );
    println!("  {}", "-".repeat(100));
    for (idx, r) in records.iter().enumerate() {
        println!(
            "  {:<4} {:<36} {:<15} {:>6} {:>5} {:>5} {:>9}   {}",
            idx + 1,
            r.id().full_name(),
            r.category.as_str(),
            r.raw.stars.unwrap_or(0),
            r.investability_score,
            r.series_a_fit,
            fmt_growth(r.growth.as_ref().and_then(|g| g.stars_mom)),
            r.funding_status.as_str()
        );
    }

    Ok(())
}
