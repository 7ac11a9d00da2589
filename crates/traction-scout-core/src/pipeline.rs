//! Per-entity enrichment: snapshot write, growth, classification, scoring.
//!
//! # Order of operations
//!
//! 1. Upsert today's [`Snapshot`].
//! 2. Recalculate growth for today (persists a [`GrowthRecord`]).
//! 3. Classify, check big-tech, resolve funding, filter, detect signals.
//! 4. Score: investability without growth, Series-A fit, investability
//!    again once growth is known, and traction.
//! 5. Upsert entity metadata and re-persist growth with scores attached.
//!
//! Missing inputs only leave downstream fields at their defaults. Store
//! failures abort the entity with [`PipelineError::Storage`].

use chrono::{NaiveDate, Utc};

use crate::catalog::Catalog;
use crate::classify::{check_non_investable, classify, is_big_tech};
use crate::error::PipelineError;
use crate::funding::resolve_funding;
use crate::growth::GrowthCalculator;
use crate::models::{EnrichedRecord, EntityRecord, RawMetricRecord, Snapshot};
use crate::scoring::{investability_score, series_a_fit, traction_score, ScoreInputs};
use crate::signals::detect_commercial_signals;
use crate::store::SnapshotStore;

/// Enriches raw metric records against a [`SnapshotStore`].
pub struct EnrichmentPipeline<'a> {
    store: &'a dyn SnapshotStore,
    catalog: &'a Catalog,
}

impl<'a> EnrichmentPipeline<'a> {
    pub fn new(store: &'a dyn SnapshotStore, catalog: &'a Catalog) -> Self {
        Self { store, catalog }
    }

    pub async fn enrich(
        &self,
        raw: RawMetricRecord,
        as_of: NaiveDate,
    ) -> Result<EnrichedRecord, PipelineError> {
        let id = raw.id();
        let metrics = raw.metrics();

        let snapshot = Snapshot {
            entity: id.clone(),
            date: as_of,
            metrics: metrics.clone(),
        };
        self.store
            .upsert_snapshot(&snapshot)
            .await
            .map_err(|e| PipelineError::storage(&id, "writing snapshot", e))?;

        let growth = GrowthCalculator::new(self.store)
            .calculate(&id, as_of)
            .await
            .map_err(|e| PipelineError::storage(&id, "calculating growth", e))?;

        let description = raw.description.as_deref();
        let category = classify(self.catalog, description, &raw.topics, raw.readme.as_deref());
        let big_tech = is_big_tech(self.catalog, &raw.owner);
        let funding = resolve_funding(self.catalog, &raw.owner, description);
        let non_investable = check_non_investable(self.catalog, &raw.name, description);
        let signals = detect_commercial_signals(
            self.catalog,
            description,
            raw.readme.as_deref(),
            raw.homepage.as_deref(),
        );

        let mut inputs = ScoreInputs {
            metrics: &metrics,
            growth: None,
            funding: funding.stage,
            category: Some(category),
            name: Some(raw.name.as_str()),
            description,
            created_at: raw.created_at.as_deref(),
            as_of,
        };
        let mut investability = investability_score(self.catalog, &inputs);
        let fit = series_a_fit(&inputs, Some(&signals));
        if let Some(ref growth) = growth {
            inputs.growth = Some(growth);
            investability = investability_score(self.catalog, &inputs);
        }
        let traction = traction_score(&metrics);

        tracing::debug!(
            entity = %id,
            %category,
            funding = %funding.stage,
            investability,
            series_a_fit = fit,
            traction,
            "enriched"
        );

        let now = Utc::now();
        let entity = EntityRecord {
            id: id.clone(),
            description: raw.description.clone(),
            language: raw.language.clone(),
            category: Some(category),
            funding_stage: Some(funding.stage),
            funding_amount: funding.amount.clone(),
            is_big_tech: big_tech,
            first_seen: now,
            updated_at: now,
        };
        self.store
            .upsert_entity(&entity)
            .await
            .map_err(|e| PipelineError::storage(&id, "writing entity", e))?;

        let growth = match growth {
            Some(mut record) => {
                record.traction_score = Some(traction);
                record.investability_score = Some(investability);
                record.series_a_fit = Some(fit);
                self.store
                    .upsert_growth(&record)
                    .await
                    .map_err(|e| PipelineError::storage(&id, "writing scores", e))?;
                Some(record)
            }
            None => None,
        };

        Ok(EnrichedRecord {
            raw,
            category,
            funding_status: funding.stage,
            funding_amount: funding.amount,
            funding_source: funding.source,
            is_big_tech: big_tech,
            is_non_investable: non_investable.is_some(),
            non_investable_reason: non_investable.map(|m| m.reason()),
            commercial_signals: signals,
            commercial_score: signals.commercial_score,
            has_pricing: signals.has_pricing,
            has_enterprise: signals.has_enterprise,
            investability_score: investability,
            series_a_fit: fit,
            traction_score: traction,
            growth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, EntityId, FundingStage, GrowthRecord};
    use crate::store::memory::InMemoryStore;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use chrono::Duration;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 1).unwrap() + Duration::days(offset)
    }

    fn raw(stars: i64) -> RawMetricRecord {
        RawMetricRecord {
            owner: "acme".into(),
            name: "vectordb".into(),
            description: Some("Embedding vector search for LLM apps".into()),
            homepage: Some("https://acme.dev".into()),
            created_at: Some("2026-01-15T00:00:00Z".into()),
            stars: Some(stars),
            forks: Some(stars / 20),
            contributors: Some(8),
            downloads: Some(2_000),
            commits: Some(40),
            prs: Some(6),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn first_run_writes_snapshot_and_entity() {
        let store = InMemoryStore::new();
        let catalog = Catalog::builtin();
        let pipeline = EnrichmentPipeline::new(&store, &catalog);

        let out = pipeline.enrich(raw(1500), day(0)).await.unwrap();
        assert_eq!(out.category, Category::AiMl);
        assert_eq!(out.funding_status, FundingStage::Unknown);
        assert!(!out.is_non_investable);
        assert!(out.commercial_signals.has_docs_site);
        assert!(out.investability_score > 0);

        let id = EntityId::new("acme", "vectordb");
        assert_eq!(store.snapshot_count().await.unwrap(), 1);
        let entity = store.get_entity(&id).await.unwrap().unwrap();
        assert_eq!(entity.category, Some(Category::AiMl));

        // single snapshot: growth exists but every rate is undefined
        let growth = out.growth.unwrap();
        assert_eq!(growth.stars_wow, None);
        assert_eq!(growth.investability_score, Some(out.investability_score));
        assert_eq!(growth.series_a_fit, Some(out.series_a_fit));
    }

    #[tokio::test]
    async fn second_pass_includes_growth() {
        let store = InMemoryStore::new();
        let catalog = Catalog::builtin();
        let pipeline = EnrichmentPipeline::new(&store, &catalog);

        pipeline.enrich(raw(1000), day(0)).await.unwrap();
        pipeline.enrich(raw(1100), day(7)).await.unwrap();
        let out = pipeline.enrich(raw(1400), day(30)).await.unwrap();

        let growth = out.growth.clone().unwrap();
        assert_eq!(growth.stars_mom, Some(40.0));
        let stored = store
            .latest_growth(&out.id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.calculated_at, day(30));
        assert_eq!(stored.traction_score, Some(out.traction_score));
        assert_eq!(stored.investability_score, Some(out.investability_score));
    }

    #[tokio::test]
    async fn same_day_rerun_is_idempotent() {
        let store = InMemoryStore::new();
        let catalog = Catalog::builtin();
        let pipeline = EnrichmentPipeline::new(&store, &catalog);

        let first = pipeline.enrich(raw(1500), day(0)).await.unwrap();
        let second = pipeline.enrich(raw(1500), day(0)).await.unwrap();
        assert_eq!(first.investability_score, second.investability_score);
        assert_eq!(store.snapshot_count().await.unwrap(), 1);
        assert_eq!(store.growth_history(&first.id()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_fields_do_not_abort() {
        let store = InMemoryStore::new();
        let catalog = Catalog::builtin();
        let pipeline = EnrichmentPipeline::new(&store, &catalog);
        let bare = RawMetricRecord {
            owner: "someone".into(),
            name: "thing".into(),
            created_at: Some("garbage".into()),
            ..Default::default()
        };
        let out = pipeline.enrich(bare, day(0)).await.unwrap();
        assert_eq!(out.category, Category::Other);
        assert_eq!(out.investability_score, 0);
        assert_eq!(out.traction_score, 0);
    }

    #[tokio::test]
    async fn non_investable_is_flagged_with_reason() {
        let store = InMemoryStore::new();
        let catalog = Catalog::builtin();
        let pipeline = EnrichmentPipeline::new(&store, &catalog);
        let mut list = raw(5000);
        list.name = "awesome-tools".into();
        let out = pipeline.enrich(list, day(0)).await.unwrap();
        assert!(out.is_non_investable);
        assert_eq!(out.non_investable_reason.as_deref(), Some("name matches 'awesome-'"));
    }

    struct FailingStore;

    #[async_trait]
    impl SnapshotStore for FailingStore {
        async fn upsert_entity(&self, _: &EntityRecord) -> Result<()> {
            Ok(())
        }
        async fn get_entity(&self, _: &EntityId) -> Result<Option<EntityRecord>> {
            Ok(None)
        }
        async fn list_entities(&self) -> Result<Vec<EntityRecord>> {
            Ok(Vec::new())
        }
        async fn upsert_snapshot(&self, _: &Snapshot) -> Result<()> {
            Err(anyhow!("disk full"))
        }
        async fn nearest_on_or_before(&self, _: &EntityId, _: NaiveDate) -> Result<Option<Snapshot>> {
            Ok(None)
        }
        async fn snapshots_between(&self, _: &EntityId, _: NaiveDate, _: NaiveDate) -> Result<Vec<Snapshot>> {
            Ok(Vec::new())
        }
        async fn upsert_growth(&self, _: &GrowthRecord) -> Result<()> {
            Ok(())
        }
        async fn latest_growth(&self, _: &EntityId) -> Result<Option<GrowthRecord>> {
            Ok(None)
        }
        async fn growth_history(&self, _: &EntityId) -> Result<Vec<GrowthRecord>> {
            Ok(Vec::new())
        }
        async fn snapshot_count(&self) -> Result<i64> {
            Ok(0)
        }
        async fn tracked_entity_count(&self) -> Result<i64> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn storage_failure_surfaces() {
        let catalog = Catalog::builtin();
        let pipeline = EnrichmentPipeline::new(&FailingStore, &catalog);
        let err = pipeline.enrich(raw(10), day(0)).await.unwrap_err();
        let PipelineError::Storage { action, .. } = &err;
        assert_eq!(*action, "writing snapshot");
        assert!(err.to_string().contains("acme/vectordb"));
    }
}
