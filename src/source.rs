//! Metric sources: where raw metric records come from.
//!
//! A [`MetricSource`] discovers candidate entities and then fetches one
//! full [`RawMetricRecord`] per candidate. Platform fetchers (repository
//! host APIs, registry download counters) plug in behind this trait; the
//! built-in [`FileSource`] reads records that were exported to disk.
//!
//! ```text
//!   MetricSource::discover()  ──►  Vec<Candidate>
//!           │                          │ filter fork ratio, sort by stars
//!           ▼                          ▼
//!   MetricSource::fetch(c)    ──►  RawMetricRecord ──► EnrichmentPipeline
//! ```

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use traction_scout_core::models::{EntityId, RawMetricRecord};

/// A discovered entity, with just enough data to filter and order it.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: EntityId,
    pub stars: i64,
    pub forks: i64,
}

impl Candidate {
    /// Forks per star. Entities with no stars have a ratio of zero.
    pub fn fork_ratio(&self) -> f64 {
        if self.stars <= 0 {
            0.0
        } else {
            self.forks as f64 / self.stars as f64
        }
    }
}

/// Supplies candidates and their raw metric records.
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Label used in logs and progress output.
    fn name(&self) -> &str;

    /// Lists candidate entities for a refresh cycle.
    async fn discover(&self) -> Result<Vec<Candidate>>;

    /// Fetches the full metric record for one candidate.
    async fn fetch(&self, candidate: &Candidate) -> Result<RawMetricRecord>;
}

/// Parses a JSON array or JSON-lines document of raw metric records.
pub fn parse_records(content: &str) -> Result<Vec<RawMetricRecord>> {
    let trimmed = content.trim_start();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).context("Failed to parse JSON array of records");
    }

    let mut records = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: RawMetricRecord = serde_json::from_str(line)
            .with_context(|| format!("Failed to parse record on line {}", idx + 1))?;
        records.push(record);
    }
    Ok(records)
}

/// Reads a records file from disk.
pub fn read_records(path: &Path) -> Result<Vec<RawMetricRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read records file: {}", path.display()))?;
    parse_records(&content).with_context(|| format!("Invalid records file: {}", path.display()))
}

/// File-backed source. The file is re-read on every [`discover`](MetricSource::discover).
pub struct FileSource {
    path: PathBuf,
    label: String,
    records: RwLock<HashMap<EntityId, RawMetricRecord>>,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let label = format!("file:{}", path.display());
        Self {
            path,
            label,
            records: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl MetricSource for FileSource {
    fn name(&self) -> &str {
        &self.label
    }

    async fn discover(&self) -> Result<Vec<Candidate>> {
        let records = read_records(&self.path)?;
        let candidates = records
            .iter()
            .map(|r| Candidate {
                id: r.id(),
                stars: r.stars.unwrap_or(0),
                forks: r.forks.unwrap_or(0),
            })
            .collect();

        let mut cache = self.records.write().unwrap();
        cache.clear();
        for record in records {
            cache.insert(record.id(), record);
        }
        Ok(candidates)
    }

    async fn fetch(&self, candidate: &Candidate) -> Result<RawMetricRecord> {
        match self.records.read().unwrap().get(&candidate.id) {
            Some(record) => Ok(record.clone()),
            None => bail!("{} not present in {}", candidate.id, self.label),
        }
    }
}

/// Drops candidates whose fork/star ratio exceeds `max_fork_ratio`, then
/// orders the rest by stars, highest first, keeping at most `limit`.
pub fn select_candidates(
    candidates: Vec<Candidate>,
    max_fork_ratio: f64,
    limit: Option<usize>,
) -> Vec<Candidate> {
    let mut kept: Vec<Candidate> = candidates
        .into_iter()
        .filter(|c| {
            let keep = c.fork_ratio() <= max_fork_ratio;
            if !keep {
                tracing::debug!(entity = %c.id, ratio = c.fork_ratio(), "skipping high fork ratio");
            }
            keep
        })
        .collect();
    kept.sort_by(|a, b| b.stars.cmp(&a.stars));
    if let Some(limit) = limit {
        kept.truncate(limit);
    }
    kept
}
