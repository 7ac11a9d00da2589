//! In-memory [`SnapshotStore`] implementation for tests and dry runs.
//!
//! Uses `BTreeMap`s keyed by `(entity, date)` behind `std::sync::RwLock`,
//! so nearest-earlier lookups are a reverse range scan.

use std::collections::BTreeMap;
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{EntityId, EntityRecord, GrowthRecord, Snapshot};

use super::SnapshotStore;

/// In-memory snapshot ledger.
pub struct InMemoryStore {
    entities: RwLock<BTreeMap<EntityId, EntityRecord>>,
    snapshots: RwLock<BTreeMap<(EntityId, NaiveDate), Snapshot>>,
    growth: RwLock<BTreeMap<(EntityId, NaiveDate), GrowthRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            entities: RwLock::new(BTreeMap::new()),
            snapshots: RwLock::new(BTreeMap::new()),
            growth: RwLock::new(BTreeMap::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn key_range(id: &EntityId, from: NaiveDate, to: NaiveDate) -> std::ops::RangeInclusive<(EntityId, NaiveDate)> {
    (id.clone(), from)..=(id.clone(), to)
}

#[async_trait]
impl SnapshotStore for InMemoryStore {
    async fn upsert_entity(&self, entity: &EntityRecord) -> Result<()> {
        let mut entities = self.entities.write().unwrap();
        let mut record = entity.clone();
        if let Some(existing) = entities.get(&entity.id) {
            record.first_seen = existing.first_seen;
        }
        entities.insert(entity.id.clone(), record);
        Ok(())
    }

    async fn get_entity(&self, id: &EntityId) -> Result<Option<EntityRecord>> {
        Ok(self.entities.read().unwrap().get(id).cloned())
    }

    async fn list_entities(&self) -> Result<Vec<EntityRecord>> {
        Ok(self.entities.read().unwrap().values().cloned().collect())
    }

    async fn upsert_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        self.snapshots.write().unwrap().insert(
            (snapshot.entity.clone(), snapshot.date),
            snapshot.clone(),
        );
        Ok(())
    }

    async fn nearest_on_or_before(
        &self,
        id: &EntityId,
        on_or_before: NaiveDate,
    ) -> Result<Option<Snapshot>> {
        let snapshots = self.snapshots.read().unwrap();
        Ok(snapshots
            .range(key_range(id, NaiveDate::MIN, on_or_before))
            .next_back()
            .map(|(_, s)| s.clone()))
    }

    async fn snapshots_between(
        &self,
        id: &EntityId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Snapshot>> {
        if from > to {
            return Ok(Vec::new());
        }
        let snapshots = self.snapshots.read().unwrap();
        Ok(snapshots
            .range(key_range(id, from, to))
            .map(|(_, s)| s.clone())
            .collect())
    }

    async fn upsert_growth(&self, record: &GrowthRecord) -> Result<()> {
        self.growth.write().unwrap().insert(
            (record.entity.clone(), record.calculated_at),
            record.clone(),
        );
        Ok(())
    }

    async fn latest_growth(&self, id: &EntityId) -> Result<Option<GrowthRecord>> {
        let growth = self.growth.read().unwrap();
        Ok(growth
            .range(key_range(id, NaiveDate::MIN, NaiveDate::MAX))
            .next_back()
            .map(|(_, g)| g.clone()))
    }

    async fn growth_history(&self, id: &EntityId) -> Result<Vec<GrowthRecord>> {
        let growth = self.growth.read().unwrap();
        Ok(growth
            .range(key_range(id, NaiveDate::MIN, NaiveDate::MAX))
            .map(|(_, g)| g.clone())
            .collect())
    }

    async fn snapshot_count(&self) -> Result<i64> {
        Ok(self.snapshots.read().unwrap().len() as i64)
    }

    async fn tracked_entity_count(&self) -> Result<i64> {
        let snapshots = self.snapshots.read().unwrap();
        let mut count = 0i64;
        let mut last: Option<&EntityId> = None;
        for (id, _) in snapshots.keys() {
            if last != Some(id) {
                count += 1;
                last = Some(id);
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Metrics;
    use chrono::Utc;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn snap(id: &EntityId, date: NaiveDate, stars: i64) -> Snapshot {
        Snapshot {
            entity: id.clone(),
            date,
            metrics: Metrics {
                stars: Some(stars),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn upsert_same_day_overwrites() {
        let store = InMemoryStore::new();
        let id = EntityId::new("acme", "widget");
        store.upsert_snapshot(&snap(&id, day(10), 100)).await.unwrap();
        store.upsert_snapshot(&snap(&id, day(10), 250)).await.unwrap();

        assert_eq!(store.snapshot_count().await.unwrap(), 1);
        let got = store.nearest_on_or_before(&id, day(10)).await.unwrap().unwrap();
        assert_eq!(got.metrics.stars, Some(250));
    }

    #[tokio::test]
    async fn nearest_falls_back_to_earlier_snapshot() {
        let store = InMemoryStore::new();
        let id = EntityId::new("acme", "widget");
        let other = EntityId::new("acme", "gadget");
        store.upsert_snapshot(&snap(&id, day(1), 10)).await.unwrap();
        store.upsert_snapshot(&snap(&id, day(5), 50)).await.unwrap();
        store.upsert_snapshot(&snap(&other, day(3), 999)).await.unwrap();

        let got = store.nearest_on_or_before(&id, day(4)).await.unwrap().unwrap();
        assert_eq!(got.date, day(1));
        let got = store.nearest_on_or_before(&id, day(20)).await.unwrap().unwrap();
        assert_eq!(got.date, day(5));
        assert!(store
            .nearest_on_or_before(&id, NaiveDate::from_ymd_opt(2026, 2, 28).unwrap())
            .await
            .unwrap()
            .is_none());
        assert_eq!(store.tracked_entity_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn history_is_oldest_first_and_bounded() {
        let store = InMemoryStore::new();
        let id = EntityId::new("acme", "widget");
        for d in [9, 1, 5] {
            store.upsert_snapshot(&snap(&id, day(d), d as i64)).await.unwrap();
        }
        let history = store.snapshots_between(&id, day(2), day(9)).await.unwrap();
        let dates: Vec<_> = history.iter().map(|s| s.date).collect();
        assert_eq!(dates, vec![day(5), day(9)]);
    }

    #[tokio::test]
    async fn entity_upsert_keeps_first_seen() {
        let store = InMemoryStore::new();
        let id = EntityId::new("acme", "widget");
        let first = Utc::now() - chrono::Duration::days(10);
        let record = EntityRecord {
            id: id.clone(),
            description: Some("old".into()),
            language: None,
            category: None,
            funding_stage: None,
            funding_amount: None,
            is_big_tech: false,
            first_seen: first,
            updated_at: first,
        };
        store.upsert_entity(&record).await.unwrap();

        let mut updated = record.clone();
        updated.description = Some("new".into());
        updated.first_seen = Utc::now();
        updated.updated_at = Utc::now();
        store.upsert_entity(&updated).await.unwrap();

        let got = store.get_entity(&id).await.unwrap().unwrap();
        assert_eq!(got.description.as_deref(), Some("new"));
        assert_eq!(got.first_seen, first);
    }

    #[tokio::test]
    async fn latest_growth_picks_newest_date() {
        let store = InMemoryStore::new();
        let id = EntityId::new("acme", "widget");
        let mut g = GrowthRecord::empty(id.clone(), day(1));
        store.upsert_growth(&g).await.unwrap();
        g.calculated_at = day(8);
        g.stars_wow = Some(3.5);
        store.upsert_growth(&g).await.unwrap();

        let latest = store.latest_growth(&id).await.unwrap().unwrap();
        assert_eq!(latest.calculated_at, day(8));
        assert_eq!(store.growth_history(&id).await.unwrap().len(), 2);
    }
}
