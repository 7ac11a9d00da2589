//! The refresh cycle: discover, filter, fetch, enrich, publish.
//!
//! ```text
//!  searching ──► analyzing (1..=N) ──► complete
//!      │                                  ▲
//!      └──── discovery failed / empty ──► error
//! ```
//!
//! Entities are processed one at a time. A failed fetch or enrichment is
//! logged and skipped; it never stops the cycle.

use anyhow::{bail, Result};
use chrono::{NaiveDate, Utc};
use std::sync::Arc;

use traction_scout_core::catalog::Catalog;
use traction_scout_core::models::EnrichedRecord;
use traction_scout_core::pipeline::EnrichmentPipeline;
use traction_scout_core::store::SnapshotStore;

use crate::config::Config;
use crate::progress::{RefreshProgressEvent, RefreshProgressReporter};
use crate::source::{select_candidates, Candidate, MetricSource};
use crate::state::{sort_by_investability, AppState};
use crate::stats::Stats;

/// Candidate selection knobs, taken from `[source]`.
#[derive(Debug, Clone)]
pub struct RefreshSettings {
    pub max_fork_ratio: f64,
    pub limit: Option<usize>,
}

impl RefreshSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_fork_ratio: config.source.max_fork_ratio,
            limit: config.source.limit,
        }
    }
}

/// Result of one completed cycle.
#[derive(Debug)]
pub struct RefreshOutcome {
    pub analyzed: u64,
    pub failed: u64,
    pub records: Vec<EnrichedRecord>,
    pub stats: Stats,
}

/// Everything a background refresh needs.
pub struct RefreshContext {
    pub store: Arc<dyn SnapshotStore>,
    pub catalog: Arc<Catalog>,
    pub source: Option<Arc<dyn MetricSource>>,
    pub settings: RefreshSettings,
    pub state: Arc<AppState>,
}

/// Whether [`spawn_refresh`] started a new cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshStart {
    Started,
    AlreadyRunning,
}

impl RefreshStart {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshStart::Started => "refreshing",
            RefreshStart::AlreadyRunning => "already_running",
        }
    }
}

fn emit(state: &AppState, reporter: &dyn RefreshProgressReporter, event: RefreshProgressEvent) {
    state.report(event.clone());
    reporter.report(event);
}

fn fail(state: &AppState, reporter: &dyn RefreshProgressReporter, message: String) -> anyhow::Error {
    tracing::error!(%message, "refresh failed");
    emit(state, reporter, RefreshProgressEvent::Failed {
        message: message.clone(),
    });
    anyhow::anyhow!(message)
}

/// Renders an error with its full `source()` chain, outermost first.
pub(crate) fn error_chain(err: impl Into<anyhow::Error>) -> String {
    format!("{:#}", err.into())
}

/// Fetches and enriches one candidate. Failures are logged with their
/// full cause chain and yield `None`.
async fn process_candidate(
    pipeline: &EnrichmentPipeline<'_>,
    source: &dyn MetricSource,
    candidate: &Candidate,
    as_of: NaiveDate,
) -> Option<EnrichedRecord> {
    let raw = match source.fetch(candidate).await {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(entity = %candidate.id, error = %error_chain(e), "fetch failed");
            return None;
        }
    };

    match pipeline.enrich(raw, as_of).await {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::warn!(entity = %candidate.id, error = %error_chain(e), "enrichment failed");
            None
        }
    }
}

/// Runs one full cycle as of `as_of`, publishing into `state` as it goes.
pub async fn run_refresh(
    store: &dyn SnapshotStore,
    catalog: &Catalog,
    source: &dyn MetricSource,
    settings: &RefreshSettings,
    as_of: NaiveDate,
    state: &AppState,
    reporter: &dyn RefreshProgressReporter,
) -> Result<RefreshOutcome> {
    tracing::info!(source = source.name(), %as_of, "refresh started");
    emit(state, reporter, RefreshProgressEvent::Searching {
        source: source.name().to_string(),
    });

    let candidates = match source.discover().await {
        Ok(candidates) => candidates,
        Err(e) => return Err(fail(state, reporter, format!("discovery failed: {:#}", e))),
    };
    let discovered = candidates.len();
    let candidates = select_candidates(candidates, settings.max_fork_ratio, settings.limit);
    if candidates.is_empty() {
        return Err(fail(
            state,
            reporter,
            format!("no candidates to analyze ({} discovered)", discovered),
        ));
    }

    let pipeline = EnrichmentPipeline::new(store, catalog);
    let total = candidates.len() as u64;
    let mut records = Vec::with_capacity(candidates.len());
    let mut failed = 0u64;

    for (idx, candidate) in candidates.iter().enumerate() {
        match process_candidate(&pipeline, source, candidate, as_of).await {
            Some(record) => {
                state.upsert_record(record.clone());
                records.push(record);
            }
            None => failed += 1,
        }

        emit(state, reporter, RefreshProgressEvent::Analyzing {
            entity: candidate.id.full_name(),
            n: idx as u64 + 1,
            total,
        });
    }

    sort_by_investability(&mut records);
    let stats = Stats::compute(store, &records).await?;
    state.finish_refresh(records.clone(), stats.clone());

    let analyzed = records.len() as u64;
    emit(state, reporter, RefreshProgressEvent::Complete { analyzed, failed });
    tracing::info!(analyzed, failed, "refresh complete");

    Ok(RefreshOutcome {
        analyzed,
        failed,
        records,
        stats,
    })
}

/// Starts a background refresh unless one is already in flight.
pub fn spawn_refresh(ctx: Arc<RefreshContext>) -> RefreshStart {
    let guard = match ctx.state.try_begin_refresh() {
        Some(guard) => guard,
        None => return RefreshStart::AlreadyRunning,
    };

    tokio::spawn(async move {
        let _guard = guard;
        let reporter = crate::progress::NoProgress;
        let source = match ctx.source.as_ref() {
            Some(source) => source,
            None => {
                let _ = fail(&ctx.state, &reporter, "no [source] configured".to_string());
                return;
            }
        };
        let as_of = Utc::now().date_naive();
        if let Err(e) = run_refresh(
            ctx.store.as_ref(),
            &ctx.catalog,
            source.as_ref(),
            &ctx.settings,
            as_of,
            &ctx.state,
            &reporter,
        )
        .await
        {
            tracing::debug!(error = %format!("{:#}", e), "background refresh ended with error");
        }
    });

    RefreshStart::Started
}

/// `scout refresh`: one foreground cycle from the configured source.
pub async fn run_refresh_cmd(config: &Config, reporter: &dyn RefreshProgressReporter) -> Result<()> {
    let source_path = match &config.source.path {
        Some(path) => path.clone(),
        None => bail!("source.path must be set to run a refresh"),
    };

    let pool = crate::db::connect(config).await?;
    let store = crate::sqlite_store::SqliteStore::new(pool.clone());
    let catalog = config.load_catalog()?;
    let source = crate::source::FileSource::new(source_path);
    let state = AppState::load(&store, &catalog).await?;

    let outcome = run_refresh(
        &store,
        &catalog,
        &source,
        &RefreshSettings::from_config(config),
        Utc::now().date_naive(),
        &state,
        reporter,
    )
    .await?;

    println!(
        "Refresh complete: {} analyzed, {} failed, {} snapshots stored.",
        outcome.analyzed, outcome.failed, outcome.stats.snapshot_count
    );

    pool.close().await;
    Ok(())
}
