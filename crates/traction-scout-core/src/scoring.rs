//! Composite scoring: investability, Series-A fit, and raw traction.
//!
//! Both 0–100 scores are additive: independent bucket contributions, then
//! penalties, then bonuses, then a clamp. Every threshold below is a
//! "highest bucket met wins" ladder; buckets never stack within one signal.
//!
//! Time-dependent rules take an explicit `as_of` date so the same inputs
//! always score the same way.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::catalog::Catalog;
use crate::classify::check_non_investable;
use crate::error::InputError;
use crate::models::{Category, CommercialSignals, FundingStage, GrowthRecord, Metrics};

pub const MAX_SCORE: i32 = 100;

/// Age below which a project counts as a breakout candidate.
pub const BREAKOUT_MAX_AGE_DAYS: i64 = 180;
const STALE_AGE_DAYS: i64 = 730;
const VERY_STALE_AGE_DAYS: i64 = 1095;

const NON_INVESTABLE_PENALTY: i32 = 30;
const SINGLE_MAINTAINER_PENALTY: i32 = 15;
const HOT_CATEGORY_BONUS: i32 = 5;

/// Everything a score may look at.
#[derive(Debug, Clone)]
pub struct ScoreInputs<'a> {
    pub metrics: &'a Metrics,
    pub growth: Option<&'a GrowthRecord>,
    pub funding: FundingStage,
    pub category: Option<Category>,
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub created_at: Option<&'a str>,
    pub as_of: NaiveDate,
}

impl<'a> ScoreInputs<'a> {
    /// Inputs with only metrics and a reference date set.
    pub fn new(metrics: &'a Metrics, as_of: NaiveDate) -> Self {
        Self {
            metrics,
            growth: None,
            funding: FundingStage::Unknown,
            category: None,
            name: None,
            description: None,
            created_at: None,
            as_of,
        }
    }

    fn age_days(&self) -> Option<i64> {
        let raw = self.created_at?;
        match age_days(raw, self.as_of) {
            Ok(days) => Some(days),
            Err(err) => {
                tracing::debug!(error = %err, "skipping age-based scoring");
                None
            }
        }
    }
}

fn count(value: Option<i64>) -> i64 {
    value.unwrap_or(0)
}

fn rate(value: Option<f64>) -> f64 {
    value.unwrap_or(0.0)
}

/// Parses an ISO-8601 creation timestamp to a calendar date.
///
/// Accepts RFC 3339 (`2024-01-05T10:00:00Z`), a naive date-time, or a bare
/// date.
pub fn parse_created_at(raw: &str) -> Result<NaiveDate, InputError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(InputError::Missing("created_at"));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.naive_utc().date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(dt.date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(dt.date());
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| InputError::Unparsable {
        field: "created_at",
        value: raw.to_string(),
    })
}

/// Whole days between creation and `as_of`. Future dates are rejected.
pub fn age_days(created_at: &str, as_of: NaiveDate) -> Result<i64, InputError> {
    let created = parse_created_at(created_at)?;
    let days = (as_of - created).num_days();
    if days < 0 {
        return Err(InputError::InFuture {
            field: "created_at",
            value: created_at.to_string(),
        });
    }
    Ok(days)
}

fn star_points(stars: i64) -> i32 {
    match stars {
        s if s >= 10_000 => 15,
        s if s >= 5_000 => 12,
        s if s >= 1_000 => 9,
        s if s >= 500 => 6,
        _ => 0,
    }
}

fn download_points(downloads: i64) -> i32 {
    match downloads {
        d if d >= 100_000 => 20,
        d if d >= 10_000 => 15,
        d if d >= 1_000 => 10,
        d if d > 0 => 5,
        _ => 0,
    }
}

fn dependent_points(dependents: i64) -> i32 {
    match dependents {
        d if d >= 500 => 25,
        d if d >= 100 => 20,
        d if d >= 50 => 15,
        d if d >= 10 => 10,
        d if d > 0 => 5,
        _ => 0,
    }
}

fn contributor_points(contributors: i64) -> i32 {
    match contributors {
        c if c >= 50 => 10,
        c if c >= 20 => 7,
        c if c >= 5 => 5,
        c if c > 1 => 2,
        _ => 0,
    }
}

fn activity_points(prs: i64, commits: i64) -> i32 {
    if prs >= 50 || commits >= 200 {
        10
    } else if prs >= 20 || commits >= 100 {
        7
    } else if prs >= 5 || commits >= 30 {
        4
    } else {
        0
    }
}

fn growth_points(growth: &GrowthRecord) -> i32 {
    let mut points = 0;

    let stars_mom = rate(growth.stars_mom);
    points += if stars_mom >= 100.0 {
        12
    } else if stars_mom >= 50.0 {
        10
    } else if stars_mom >= 20.0 {
        7
    } else if stars_mom >= 10.0 {
        4
    } else {
        0
    };

    let accel = rate(growth.stars_acceleration);
    points += if accel > 10.0 {
        8
    } else if accel > 5.0 {
        6
    } else if accel > 0.0 {
        3
    } else {
        0
    };

    let downloads_mom = rate(growth.downloads_mom);
    points += if downloads_mom >= 50.0 {
        5
    } else if downloads_mom >= 20.0 {
        3
    } else {
        0
    };

    points
}

/// Investability score in `0..=100`.
pub fn investability_score(catalog: &Catalog, inputs: &ScoreInputs<'_>) -> u8 {
    let m = inputs.metrics;
    let stars = count(m.stars);
    let downloads = count(m.downloads);
    let dependents = count(m.dependents);
    let contributors = count(m.contributors);
    let prs = count(m.prs);
    let commits = count(m.commits);

    let mut score = star_points(stars)
        + download_points(downloads)
        + dependent_points(dependents)
        + contributor_points(contributors)
        + activity_points(prs, commits);

    if let Some(growth) = inputs.growth {
        score += growth_points(growth);
    }

    if inputs.funding.is_unconfirmed() {
        if stars >= 5_000 || downloads >= 10_000 {
            score += 5;
        } else if stars >= 1_000 {
            score += 3;
        }
    }

    if inputs.category.is_some_and(|c| c.is_hot()) {
        score += HOT_CATEGORY_BONUS;
    }

    if let Some(name) = inputs.name {
        if check_non_investable(catalog, name, inputs.description).is_some() {
            score -= NON_INVESTABLE_PENALTY;
        }
    }

    if contributors <= 1 && prs < 5 && commits < 20 {
        score -= SINGLE_MAINTAINER_PENALTY;
    }

    let age = inputs.age_days();

    if inputs.funding.is_unconfirmed() {
        match age {
            Some(days) if days > VERY_STALE_AGE_DAYS => score -= 15,
            Some(days) if days > STALE_AGE_DAYS => score -= 10,
            _ => {}
        }
    }

    if age.is_some_and(|days| days < BREAKOUT_MAX_AGE_DAYS) {
        if stars >= 1_000 || dependents >= 20 {
            score += 10;
        } else if stars >= 500 || dependents >= 10 {
            score += 5;
        }
    }

    score.clamp(0, MAX_SCORE) as u8
}

/// Series-A fit score in `0..=100`, starting from a neutral 50.
pub fn series_a_fit(inputs: &ScoreInputs<'_>, signals: Option<&CommercialSignals>) -> u8 {
    let m = inputs.metrics;
    let stars = count(m.stars);
    let contributors = count(m.contributors);
    let dependents = count(m.dependents);
    let downloads = count(m.downloads);

    let mut score: i32 = 50;

    score += match stars {
        s if (1_000..=30_000).contains(&s) => 15,
        s if (500..1_000).contains(&s) => 10,
        s if (30_001..=50_000).contains(&s) => 5,
        s if s > 50_000 => -15,
        s if s < 200 => -10,
        _ => 0,
    };

    score += match contributors {
        c if (5..=50).contains(&c) => 10,
        c if c > 50 => 5,
        c if c <= 2 => -15,
        _ => 0,
    };

    score += if dependents >= 50 || downloads >= 10_000 {
        15
    } else if dependents >= 10 || downloads >= 1_000 {
        10
    } else if dependents > 0 || downloads > 0 {
        5
    } else {
        0
    };

    if let Some(days) = inputs.age_days() {
        let months = days as f64 / 30.0;
        score += if (6.0..=24.0).contains(&months) {
            10
        } else if (3.0..6.0).contains(&months) {
            5
        } else if months > 36.0 {
            -10
        } else {
            0
        };
    }

    score += match inputs.funding {
        FundingStage::Seed => 15,
        FundingStage::Unknown => 10,
        stage if stage.is_series_a_or_later() => -20,
        _ => 0,
    };

    if let Some(signals) = signals {
        score += i32::from(signals.commercial_score);
        if signals.has_pricing {
            score += 5;
        }
        if signals.has_enterprise {
            score += 5;
        }
    }

    score.clamp(0, MAX_SCORE) as u8
}

/// Unbounded raw traction figure used for ranking within the tracked set.
pub fn traction_score(metrics: &Metrics) -> i64 {
    let value = count(metrics.dependents) as f64 * 10.0
        + count(metrics.downloads) as f64 / 100.0
        + count(metrics.commits) as f64 * 5.0
        + count(metrics.contributors) as f64 * 20.0
        + count(metrics.prs) as f64 * 50.0;
    value as i64
}
