//! Process-wide application state shared by the refresh task and readers.
//!
//! Readers see the last-known result set while a refresh is running. Each
//! entity's record is replaced as soon as it is enriched; a completed
//! refresh then replaces the whole set with that cycle's results. At most one refresh runs at a time:
//! [`AppState::try_begin_refresh`] hands out a single [`RefreshGuard`].

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use traction_scout_core::catalog::Catalog;
use traction_scout_core::classify::check_non_investable;
use traction_scout_core::funding::resolve_funding;
use traction_scout_core::models::{
    Category, CommercialSignals, EnrichedRecord, FundingStage, RawMetricRecord,
};
use traction_scout_core::store::SnapshotStore;

use crate::progress::{RefreshProgress, RefreshProgressEvent, RefreshProgressReporter};
use crate::stats::Stats;

/// What `GET /api/data` returns.
#[derive(Debug, Clone, Serialize)]
pub struct DataView {
    pub records: Vec<EnrichedRecord>,
    pub last_updated: Option<DateTime<Utc>>,
    pub is_loading: bool,
    pub progress: RefreshProgress,
    pub stats: Option<Stats>,
    pub snapshot_count: i64,
}

pub struct AppState {
    records: RwLock<Vec<EnrichedRecord>>,
    is_loading: AtomicBool,
    progress: RwLock<RefreshProgress>,
    last_updated: RwLock<Option<DateTime<Utc>>>,
    stats: RwLock<Option<Stats>>,
}

/// Held for the duration of a refresh; clears the loading flag on drop.
pub struct RefreshGuard {
    state: Arc<AppState>,
}

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        self.state.is_loading.store(false, Ordering::SeqCst);
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            is_loading: AtomicBool::new(false),
            progress: RwLock::new(RefreshProgress::default()),
            last_updated: RwLock::new(None),
            stats: RwLock::new(None),
        }
    }

    /// Builds state from what the store already holds.
    pub async fn load(store: &dyn SnapshotStore, catalog: &Catalog) -> Result<Self> {
        let records = load_records(store, catalog).await?;
        let stats = Stats::compute(store, &records).await?;
        let state = Self::new();
        if !records.is_empty() {
            *state.last_updated.write().unwrap() = Some(Utc::now());
        }
        *state.records.write().unwrap() = records;
        *state.stats.write().unwrap() = Some(stats);
        Ok(state)
    }

    /// Claims the single refresh slot. `None` when a refresh is in flight.
    pub fn try_begin_refresh(self: &Arc<Self>) -> Option<RefreshGuard> {
        self.is_loading
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| RefreshGuard {
                state: Arc::clone(self),
            })
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading.load(Ordering::SeqCst)
    }

    pub fn progress(&self) -> RefreshProgress {
        self.progress.read().unwrap().clone()
    }

    /// Replaces (or appends) the record for one entity.
    pub fn upsert_record(&self, record: EnrichedRecord) {
        let mut records = self.records.write().unwrap();
        let id = record.id();
        match records.iter_mut().find(|r| r.id() == id) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
    }

    /// Installs a completed cycle's results as the whole set, ordered by
    /// investability, and publishes its stats.
    pub fn finish_refresh(&self, mut records: Vec<EnrichedRecord>, stats: Stats) {
        sort_by_investability(&mut records);
        *self.records.write().unwrap() = records;
        *self.stats.write().unwrap() = Some(stats);
        *self.last_updated.write().unwrap() = Some(Utc::now());
    }

    pub fn records(&self) -> Vec<EnrichedRecord> {
        self.records.read().unwrap().clone()
    }

    pub fn view(&self) -> DataView {
        let stats = self.stats.read().unwrap().clone();
        DataView {
            records: self.records(),
            last_updated: *self.last_updated.read().unwrap(),
            is_loading: self.is_loading(),
            progress: self.progress(),
            snapshot_count: stats.as_ref().map(|s| s.snapshot_count).unwrap_or(0),
            stats,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshProgressReporter for AppState {
    fn report(&self, event: RefreshProgressEvent) {
        event.apply(&mut self.progress.write().unwrap());
    }
}

/// Highest investability first; stars break ties.
pub fn sort_by_investability(records: &mut [EnrichedRecord]) {
    records.sort_by(|a, b| {
        b.investability_score
            .cmp(&a.investability_score)
            .then_with(|| b.raw.stars.unwrap_or(0).cmp(&a.raw.stars.unwrap_or(0)))
    });
}

/// Rebuilds the last-known enriched record of every stored entity from its
/// metadata, latest snapshot, and latest growth record, ordered by stars.
///
/// Commercial signals are not persisted and come back empty.
pub async fn load_records(store: &dyn SnapshotStore, catalog: &Catalog) -> Result<Vec<EnrichedRecord>> {
    let mut records = Vec::new();
    for entity in store.list_entities().await? {
        let snapshot = match store.latest_snapshot(&entity.id).await? {
            Some(snapshot) => snapshot,
            None => continue,
        };
        let growth = store.latest_growth(&entity.id).await?;
        let m = snapshot.metrics;

        let raw = RawMetricRecord {
            owner: entity.id.owner.clone(),
            name: entity.id.name.clone(),
            description: entity.description.clone(),
            language: entity.language.clone(),
            stars: m.stars,
            forks: m.forks,
            contributors: m.contributors,
            dependents: m.dependents,
            downloads: m.downloads,
            download_source: m.download_source,
            commits: m.commits,
            issues: m.issues,
            prs: m.prs,
            ..Default::default()
        };
        let non_investable =
            check_non_investable(catalog, &entity.id.name, entity.description.as_deref());
        let funding_source = resolve_funding(catalog, &entity.id.owner, entity.description.as_deref()).source;

        records.push(EnrichedRecord {
            raw,
            category: entity.category.unwrap_or(Category::Other),
            funding_status: entity.funding_stage.unwrap_or(FundingStage::Unknown),
            funding_amount: entity.funding_amount.clone(),
            funding_source,
            is_big_tech: entity.is_big_tech,
            is_non_investable: non_investable.is_some(),
            non_investable_reason: non_investable.map(|m| m.reason()),
            commercial_signals: CommercialSignals::default(),
            commercial_score: 0,
            has_pricing: false,
            has_enterprise: false,
            investability_score: growth.as_ref().and_then(|g| g.investability_score).unwrap_or(0),
            series_a_fit: growth.as_ref().and_then(|g| g.series_a_fit).unwrap_or(0),
            traction_score: growth.as_ref().and_then(|g| g.traction_score).unwrap_or(0),
            growth,
        });
    }
    records.sort_by(|a, b| b.raw.stars.unwrap_or(0).cmp(&a.raw.stars.unwrap_or(0)));
    Ok(records)
}
