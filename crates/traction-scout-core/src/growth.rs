//! Growth and acceleration math over the snapshot ledger.
//!
//! Comparisons always fall back to the nearest earlier snapshot, because
//! refresh cycles do not run on a fixed daily cadence:
//!
//! ```text
//!   T-30d        T-14d      T-7d        T
//!    │             │          │         │
//!  month        two weeks   week     current
//!    └──── MoM ────────────────────────┘
//!                  └─ prev WoW ─┘└ WoW ┘
//!                  acceleration = WoW - prev WoW
//! ```

use anyhow::Result;
use chrono::{Duration, NaiveDate};

use crate::models::{EntityId, GrowthRecord, Snapshot, TrackedMetric};
use crate::store::SnapshotStore;

pub const WEEK_DAYS: i64 = 7;
pub const MONTH_DAYS: i64 = 30;

/// Rounds to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage growth from `previous` to `current`.
///
/// `None` when either value is absent or `previous` is zero.
pub fn growth_rate(current: Option<i64>, previous: Option<i64>) -> Option<f64> {
    let current = current?;
    let previous = previous?;
    if previous == 0 {
        return None;
    }
    Some(round2(
        ((current - previous) as f64 / previous as f64) * 100.0,
    ))
}

/// Change in week-over-week growth between two consecutive weeks.
pub fn acceleration(current_wow: Option<f64>, previous_wow: Option<f64>) -> Option<f64> {
    Some(round2(current_wow? - previous_wow?))
}

fn metric_growth(
    metric: TrackedMetric,
    current: &Snapshot,
    prior: Option<&Snapshot>,
) -> Option<f64> {
    let prior = prior?;
    growth_rate(
        metric.value(&current.metrics),
        metric.value(&prior.metrics),
    )
}

/// The snapshots a growth calculation looks at.
#[derive(Debug, Clone, Default)]
pub struct GrowthWindow {
    pub current: Option<Snapshot>,
    pub week_ago: Option<Snapshot>,
    pub two_weeks_ago: Option<Snapshot>,
    pub month_ago: Option<Snapshot>,
}

impl GrowthWindow {
    /// Derives the growth record for `calculated_at`.
    ///
    /// Returns `None` when there is no current snapshot.
    pub fn growth(&self, entity: &EntityId, calculated_at: NaiveDate) -> Option<GrowthRecord> {
        let current = self.current.as_ref()?;
        let week = self.week_ago.as_ref();
        let month = self.month_ago.as_ref();

        let mut record = GrowthRecord::empty(entity.clone(), calculated_at);
        record.stars_wow = metric_growth(TrackedMetric::Stars, current, week);
        record.stars_mom = metric_growth(TrackedMetric::Stars, current, month);
        record.forks_wow = metric_growth(TrackedMetric::Forks, current, week);
        record.forks_mom = metric_growth(TrackedMetric::Forks, current, month);
        record.downloads_wow = metric_growth(TrackedMetric::Downloads, current, week);
        record.downloads_mom = metric_growth(TrackedMetric::Downloads, current, month);
        record.contributors_wow = metric_growth(TrackedMetric::Contributors, current, week);
        record.contributors_mom = metric_growth(TrackedMetric::Contributors, current, month);

        if let (Some(week), Some(two_weeks)) = (week, self.two_weeks_ago.as_ref()) {
            let previous_wow = metric_growth(TrackedMetric::Stars, week, Some(two_weeks));
            record.stars_acceleration = acceleration(record.stars_wow, previous_wow);
        }

        Some(record)
    }
}

/// Derives WoW/MoM growth and star acceleration from a [`SnapshotStore`].
pub struct GrowthCalculator<'a> {
    store: &'a dyn SnapshotStore,
}

impl<'a> GrowthCalculator<'a> {
    pub fn new(store: &'a dyn SnapshotStore) -> Self {
        Self { store }
    }

    /// Loads the snapshots nearest to `T`, `T-7d`, `T-14d`, and `T-30d`.
    pub async fn window(&self, id: &EntityId, today: NaiveDate) -> Result<GrowthWindow> {
        let days_ago = |days: i64| today - Duration::days(days);
        let store = self.store;
        Ok(GrowthWindow {
            current: store.nearest_on_or_before(id, today).await?,
            week_ago: store.nearest_on_or_before(id, days_ago(WEEK_DAYS)).await?,
            two_weeks_ago: store
                .nearest_on_or_before(id, days_ago(2 * WEEK_DAYS))
                .await?,
            month_ago: store.nearest_on_or_before(id, days_ago(MONTH_DAYS)).await?,
        })
    }

    /// Computes growth as of `today` without persisting it.
    pub async fn compute(&self, id: &EntityId, today: NaiveDate) -> Result<Option<GrowthRecord>> {
        Ok(self.window(id, today).await?.growth(id, today))
    }

    /// Computes growth as of `today` and stores it, replacing any record
    /// for the same date. Returns `None` (and writes nothing) when the
    /// entity has no snapshot on or before `today`.
    pub async fn calculate(&self, id: &EntityId, today: NaiveDate) -> Result<Option<GrowthRecord>> {
        let record = self.compute(id, today).await?;
        if let Some(ref record) = record {
            self.store.upsert_growth(record).await?;
        }
        Ok(record)
    }
}
