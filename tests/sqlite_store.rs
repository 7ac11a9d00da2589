//! The SQLite ledger behind the enrichment pipeline.

use chrono::{Duration, NaiveDate, Utc};
use tempfile::TempDir;

use traction_scout::sqlite_store::SqliteStore;
use traction_scout::{db, migrate};
use traction_scout_core::catalog::Catalog;
use traction_scout_core::models::{
    Category, EntityId, EntityRecord, FundingStage, Metrics, RawMetricRecord, Snapshot,
};
use traction_scout_core::pipeline::EnrichmentPipeline;
use traction_scout_core::store::SnapshotStore;

async fn open_store(tmp: &TempDir) -> SqliteStore {
    let pool = db::connect_path(&tmp.path().join("data").join("scout.sqlite"))
        .await
        .unwrap();
    migrate::migrate_pool(&pool).await.unwrap();
    SqliteStore::new(pool)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn snapshot(id: &EntityId, on: NaiveDate, stars: i64) -> Snapshot {
    Snapshot {
        entity: id.clone(),
        date: on,
        metrics: Metrics {
            stars: Some(stars),
            download_source: Some("npm".into()),
            ..Default::default()
        },
    }
}

#[tokio::test]
async fn same_day_snapshot_is_replaced() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    let id = EntityId::new("acme", "widget");
    let day = date(2026, 3, 1);

    store.upsert_snapshot(&snapshot(&id, day, 10)).await.unwrap();
    store.upsert_snapshot(&snapshot(&id, day, 25)).await.unwrap();

    assert_eq!(store.snapshot_count().await.unwrap(), 1);
    let latest = store.latest_snapshot(&id).await.unwrap().unwrap();
    assert_eq!(latest.metrics.stars, Some(25));
    assert_eq!(latest.metrics.download_source.as_deref(), Some("npm"));
}

#[tokio::test]
async fn nearest_snapshot_falls_back_to_earlier_date() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    let id = EntityId::new("acme", "widget");

    store.upsert_snapshot(&snapshot(&id, date(2026, 3, 1), 10)).await.unwrap();
    store.upsert_snapshot(&snapshot(&id, date(2026, 3, 20), 30)).await.unwrap();

    let found = store.nearest_on_or_before(&id, date(2026, 3, 15)).await.unwrap().unwrap();
    assert_eq!(found.date, date(2026, 3, 1));
    assert!(store
        .nearest_on_or_before(&id, date(2026, 2, 1))
        .await
        .unwrap()
        .is_none());

    let window = store
        .snapshots_between(&id, date(2026, 2, 1), date(2026, 4, 1))
        .await
        .unwrap();
    let stars: Vec<_> = window.iter().map(|s| s.metrics.stars).collect();
    assert_eq!(stars, vec![Some(10), Some(30)]);
}

#[tokio::test]
async fn entity_upsert_keeps_first_seen() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    let id = EntityId::new("acme", "widget");
    let first = Utc::now() - Duration::days(10);

    let mut entity = EntityRecord {
        id: id.clone(),
        description: Some("widgets".into()),
        language: Some("Rust".into()),
        category: Some(Category::Devtools),
        funding_stage: Some(FundingStage::Seed),
        funding_amount: None,
        is_big_tech: false,
        first_seen: first,
        updated_at: first,
    };
    store.upsert_entity(&entity).await.unwrap();

    entity.first_seen = Utc::now();
    entity.updated_at = Utc::now();
    entity.category = Some(Category::Security);
    store.upsert_entity(&entity).await.unwrap();

    let stored = store.get_entity(&id).await.unwrap().unwrap();
    assert_eq!(stored.first_seen.timestamp(), first.timestamp());
    assert_eq!(stored.category, Some(Category::Security));
    assert_eq!(stored.funding_stage, Some(FundingStage::Seed));
    assert_eq!(store.list_entities().await.unwrap().len(), 1);
}

#[tokio::test]
async fn pipeline_persists_growth_with_scores() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    let catalog = Catalog::builtin();
    let pipeline = EnrichmentPipeline::new(&store, &catalog);

    let raw = |stars: i64| RawMetricRecord {
        owner: "acme".into(),
        name: "vectordb".into(),
        description: Some("Vector database for LLM apps".into()),
        stars: Some(stars),
        contributors: Some(8),
        ..Default::default()
    };

    pipeline.enrich(raw(1000), date(2026, 1, 1)).await.unwrap();
    let record = pipeline.enrich(raw(1400), date(2026, 1, 31)).await.unwrap();

    let growth = record.growth.clone().unwrap();
    assert_eq!(growth.stars_mom, Some(40.0));

    let id = EntityId::new("acme", "vectordb");
    let stored = store.latest_growth(&id).await.unwrap().unwrap();
    assert_eq!(stored.calculated_at, date(2026, 1, 31));
    assert_eq!(stored.stars_mom, Some(40.0));
    assert_eq!(stored.investability_score, Some(record.investability_score));
    assert_eq!(stored.series_a_fit, Some(record.series_a_fit));
    assert_eq!(stored.traction_score, Some(record.traction_score));

    assert_eq!(store.growth_history(&id).await.unwrap().len(), 2);
    assert_eq!(store.snapshot_count().await.unwrap(), 2);
    assert_eq!(store.tracked_entity_count().await.unwrap(), 1);
}

#[tokio::test]
async fn latest_snapshot_and_last_known_state_load() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    let catalog = Catalog::builtin();
    let id = EntityId::new("acme", "widget");

    store.upsert_snapshot(&snapshot(&id, date(2026, 3, 1), 10)).await.unwrap();
    store.upsert_snapshot(&snapshot(&id, date(2026, 3, 9), 12)).await.unwrap();
    let latest = store.latest_snapshot(&id).await.unwrap().unwrap();
    assert_eq!(latest.date, date(2026, 3, 9));

    let pipeline = EnrichmentPipeline::new(&store, &catalog);
    for (name, stars) in [("small", 40), ("large", 4000)] {
        let raw = RawMetricRecord {
            owner: "acme".into(),
            name: name.into(),
            stars: Some(stars),
            contributors: Some(5),
            ..Default::default()
        };
        pipeline.enrich(raw, date(2026, 3, 10)).await.unwrap();
    }

    let records = traction_scout::state::load_records(&store, &catalog).await.unwrap();
    let names: Vec<_> = records.iter().map(|r| r.raw.name.as_str()).collect();
    assert_eq!(names, vec!["large", "small"]);
    assert!(records[0].investability_score > 0);

    let state = traction_scout::state::AppState::load(&store, &catalog).await.unwrap();
    assert_eq!(state.records().len(), 2);
    assert_eq!(state.view().snapshot_count, 4);
}
