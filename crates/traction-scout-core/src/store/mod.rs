//! Storage abstraction for the snapshot ledger.
//!
//! The [`SnapshotStore`] trait is the only durable dependency of the
//! analytics core: a key-ordered store of entity metadata, one
//! [`Snapshot`] per `(entity, date)`, and one [`GrowthRecord`] per
//! `(entity, calculation date)`. Backends are pluggable (SQLite in the
//! `traction-scout` crate, [`memory::InMemoryStore`] for tests).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{EntityId, EntityRecord, GrowthRecord, Snapshot};

/// Durable, idempotent per-entity-per-day metric ledger.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`upsert_entity`](SnapshotStore::upsert_entity) | Insert or overwrite entity metadata (keeps `first_seen`) |
/// | [`upsert_snapshot`](SnapshotStore::upsert_snapshot) | Last-write-wins write keyed by `(entity, date)` |
/// | [`nearest_on_or_before`](SnapshotStore::nearest_on_or_before) | Most recent snapshot not after a date |
/// | [`snapshots_between`](SnapshotStore::snapshots_between) | History window, oldest first |
/// | [`upsert_growth`](SnapshotStore::upsert_growth) | Replace the growth record for `(entity, date)` |
/// | [`latest_growth`](SnapshotStore::latest_growth) | Most recent growth record |
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Insert or overwrite entity metadata. An existing `first_seen` is kept.
    async fn upsert_entity(&self, entity: &EntityRecord) -> Result<()>;

    async fn get_entity(&self, id: &EntityId) -> Result<Option<EntityRecord>>;

    /// All known entities, ordered by `owner/name`.
    async fn list_entities(&self) -> Result<Vec<EntityRecord>>;

    /// Write a snapshot, fully replacing any snapshot for the same
    /// `(entity, date)`. Safe to retry.
    async fn upsert_snapshot(&self, snapshot: &Snapshot) -> Result<()>;

    /// The most recent snapshot with `date <= on_or_before`, if any.
    async fn nearest_on_or_before(
        &self,
        id: &EntityId,
        on_or_before: NaiveDate,
    ) -> Result<Option<Snapshot>>;

    /// Snapshots with `from <= date <= to`, oldest first.
    async fn snapshots_between(
        &self,
        id: &EntityId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Snapshot>>;

    /// Write a growth record, replacing any record for the same
    /// `(entity, calculated_at)`. Records for other dates are retained.
    async fn upsert_growth(&self, record: &GrowthRecord) -> Result<()>;

    /// The growth record with the latest `calculated_at`, if any.
    async fn latest_growth(&self, id: &EntityId) -> Result<Option<GrowthRecord>>;

    /// All growth records for an entity, oldest first.
    async fn growth_history(&self, id: &EntityId) -> Result<Vec<GrowthRecord>>;

    /// Total number of stored snapshots.
    async fn snapshot_count(&self) -> Result<i64>;

    /// Number of distinct entities with at least one snapshot.
    async fn tracked_entity_count(&self) -> Result<i64>;

    /// The newest snapshot regardless of date.
    async fn latest_snapshot(&self, id: &EntityId) -> Result<Option<Snapshot>> {
        self.nearest_on_or_before(id, NaiveDate::MAX).await
    }
}
