//! Core data models shared by the store, growth, and scoring layers.
//!
//! An [`EntityId`] (owner + name) is the aggregate root. Every
//! [`Snapshot`] and [`GrowthRecord`] hangs off exactly one entity and is
//! keyed by `(entity, date)`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identity of a tracked open-source project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId {
    pub owner: String,
    pub name: String,
}

impl EntityId {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// `owner/name`, the form used in logs, progress, and the HTTP API.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Parses `owner/name`. Both halves must be non-empty.
    pub fn parse(full_name: &str) -> Option<Self> {
        let (owner, name) = full_name.split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self::new(owner, name))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Domain category assigned by the keyword classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    AiMl,
    Devtools,
    Infrastructure,
    Data,
    Security,
    Observability,
    Frontend,
    Backend,
    Fintech,
    Other,
}

impl Category {
    /// Categories that carry keyword lists, in tie-break order.
    pub const SCORED: [Category; 9] = [
        Category::AiMl,
        Category::Devtools,
        Category::Infrastructure,
        Category::Data,
        Category::Security,
        Category::Observability,
        Category::Frontend,
        Category::Backend,
        Category::Fintech,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::AiMl => "ai-ml",
            Category::Devtools => "devtools",
            Category::Infrastructure => "infrastructure",
            Category::Data => "data",
            Category::Security => "security",
            Category::Observability => "observability",
            Category::Frontend => "frontend",
            Category::Backend => "backend",
            Category::Fintech => "fintech",
            Category::Other => "other",
        }
    }

    /// Categories that earn the hot-category bonus.
    pub fn is_hot(&self) -> bool {
        matches!(
            self,
            Category::AiMl | Category::Security | Category::Infrastructure | Category::Devtools
        )
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ai-ml" => Ok(Category::AiMl),
            "devtools" => Ok(Category::Devtools),
            "infrastructure" => Ok(Category::Infrastructure),
            "data" => Ok(Category::Data),
            "security" => Ok(Category::Security),
            "observability" => Ok(Category::Observability),
            "frontend" => Ok(Category::Frontend),
            "backend" => Ok(Category::Backend),
            "fintech" => Ok(Category::Fintech),
            "other" => Ok(Category::Other),
            other => Err(format!("unknown category: '{}'", other)),
        }
    }
}

/// Coarse funding label. `Unknown` means "no signal", never "confirmed unfunded".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FundingStage {
    Unfunded,
    Seed,
    SeriesA,
    SeriesB,
    SeriesC,
    SeriesD,
    Acquired,
    #[default]
    Unknown,
}

impl FundingStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FundingStage::Unfunded => "unfunded",
            FundingStage::Seed => "seed",
            FundingStage::SeriesA => "series-a",
            FundingStage::SeriesB => "series-b",
            FundingStage::SeriesC => "series-c",
            FundingStage::SeriesD => "series-d",
            FundingStage::Acquired => "acquired",
            FundingStage::Unknown => "unknown",
        }
    }

    /// No confirmed institutional round: `unfunded` or `unknown`.
    pub fn is_unconfirmed(&self) -> bool {
        matches!(self, FundingStage::Unfunded | FundingStage::Unknown)
    }

    /// Already raised a priced round at Series A or beyond.
    pub fn is_series_a_or_later(&self) -> bool {
        matches!(
            self,
            FundingStage::SeriesA
                | FundingStage::SeriesB
                | FundingStage::SeriesC
                | FundingStage::SeriesD
        )
    }
}

impl fmt::Display for FundingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FundingStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unfunded" => Ok(FundingStage::Unfunded),
            "seed" => Ok(FundingStage::Seed),
            "series-a" => Ok(FundingStage::SeriesA),
            "series-b" => Ok(FundingStage::SeriesB),
            "series-c" => Ok(FundingStage::SeriesC),
            "series-d" => Ok(FundingStage::SeriesD),
            "acquired" => Ok(FundingStage::Acquired),
            "unknown" => Ok(FundingStage::Unknown),
            other => Err(format!("unknown funding stage: '{}'", other)),
        }
    }
}

/// Metric values captured by one snapshot. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub stars: Option<i64>,
    pub forks: Option<i64>,
    pub contributors: Option<i64>,
    pub dependents: Option<i64>,
    pub downloads: Option<i64>,
    pub download_source: Option<String>,
    /// Commits in the collaborator's activity window.
    pub commits: Option<i64>,
    /// Pull requests opened in the last 30 days.
    pub prs: Option<i64>,
    /// Issues opened in the last 30 days.
    pub issues: Option<i64>,
}

/// Metrics that get week-over-week and month-over-month growth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackedMetric {
    Stars,
    Forks,
    Downloads,
    Contributors,
}

impl TrackedMetric {
    pub fn value(&self, metrics: &Metrics) -> Option<i64> {
        match self {
            TrackedMetric::Stars => metrics.stars,
            TrackedMetric::Forks => metrics.forks,
            TrackedMetric::Downloads => metrics.downloads,
            TrackedMetric::Contributors => metrics.contributors,
        }
    }
}

/// One dated observation of an entity's metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub entity: EntityId,
    pub date: NaiveDate,
    #[serde(flatten)]
    pub metrics: Metrics,
}

/// Growth derived from the snapshot ledger as of `calculated_at`.
///
/// Percentages are rounded to two decimals. Scores are attached by the
/// enrichment pipeline after they are known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthRecord {
    pub entity: EntityId,
    pub calculated_at: NaiveDate,
    pub stars_wow: Option<f64>,
    pub stars_mom: Option<f64>,
    pub stars_acceleration: Option<f64>,
    pub forks_wow: Option<f64>,
    pub forks_mom: Option<f64>,
    pub downloads_wow: Option<f64>,
    pub downloads_mom: Option<f64>,
    pub contributors_wow: Option<f64>,
    pub contributors_mom: Option<f64>,
    pub traction_score: Option<i64>,
    pub investability_score: Option<u8>,
    pub series_a_fit: Option<u8>,
}

impl GrowthRecord {
    /// A record with every growth value undefined.
    pub fn empty(entity: EntityId, calculated_at: NaiveDate) -> Self {
        Self {
            entity,
            calculated_at,
            stars_wow: None,
            stars_mom: None,
            stars_acceleration: None,
            forks_wow: None,
            forks_mom: None,
            downloads_wow: None,
            downloads_mom: None,
            contributors_wow: None,
            contributors_mom: None,
            traction_score: None,
            investability_score: None,
            series_a_fit: None,
        }
    }
}

/// Mutable per-entity metadata, overwritten on each enrichment pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: EntityId,
    pub description: Option<String>,
    pub language: Option<String>,
    pub category: Option<Category>,
    pub funding_stage: Option<FundingStage>,
    pub funding_amount: Option<String>,
    pub is_big_tech: bool,
    pub first_seen: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Commercial-intent signals detected in a project's text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommercialSignals {
    pub has_company: bool,
    pub has_pricing: bool,
    pub has_enterprise: bool,
    pub has_cloud: bool,
    pub has_docs_site: bool,
    /// Bounded to `0..=10`.
    pub commercial_score: u8,
}

/// Raw metric record handed over by the external fetch collaborators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMetricRecord {
    pub owner: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    /// ISO-8601 creation timestamp, passed through unparsed.
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing)]
    pub readme: Option<String>,
    #[serde(default)]
    pub stars: Option<i64>,
    #[serde(default)]
    pub forks: Option<i64>,
    #[serde(default)]
    pub contributors: Option<i64>,
    #[serde(default)]
    pub dependents: Option<i64>,
    #[serde(default)]
    pub downloads: Option<i64>,
    #[serde(default)]
    pub download_source: Option<String>,
    #[serde(default, alias = "commits_3mo", alias = "commits_30d")]
    pub commits: Option<i64>,
    #[serde(default, alias = "issues_30d")]
    pub issues: Option<i64>,
    #[serde(default, alias = "prs_30d")]
    pub prs: Option<i64>,
}

impl RawMetricRecord {
    pub fn id(&self) -> EntityId {
        EntityId::new(self.owner.clone(), self.name.clone())
    }

    pub fn metrics(&self) -> Metrics {
        Metrics {
            stars: self.stars,
            forks: self.forks,
            contributors: self.contributors,
            dependents: self.dependents,
            downloads: self.downloads,
            download_source: self.download_source.clone(),
            commits: self.commits,
            prs: self.prs,
            issues: self.issues,
        }
    }
}

/// Input fields plus everything the enrichment pipeline derives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub raw: RawMetricRecord,
    pub category: Category,
    pub funding_status: FundingStage,
    pub funding_amount: Option<String>,
    pub funding_source: Option<String>,
    pub is_big_tech: bool,
    pub is_non_investable: bool,
    pub non_investable_reason: Option<String>,
    pub commercial_signals: CommercialSignals,
    pub commercial_score: u8,
    pub has_pricing: bool,
    pub has_enterprise: bool,
    pub investability_score: u8,
    pub series_a_fit: u8,
    pub traction_score: i64,
    pub growth: Option<GrowthRecord>,
}

impl EnrichedRecord {
    pub fn id(&self) -> EntityId {
        self.raw.id()
    }
}
