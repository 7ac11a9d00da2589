//! Commercial-intent detection.
//!
//! Four independent keyword checks plus a homepage check, each adding a
//! fixed number of points to a score capped at [`MAX_COMMERCIAL_SCORE`].
//!
//! | Signal | Trigger | Points |
//! |--------|---------|--------|
//! | pricing | any pricing/commercial term | 2 |
//! | enterprise | at least `enterprise_min_matches` distinct terms | 3 |
//! | cloud | any hosted/SaaS term | 2 |
//! | company | any company-identity term | 2 |
//! | docs site | homepage off the source-hosting domain | 1 |

use crate::catalog::Catalog;
use crate::models::CommercialSignals;

/// README characters considered by the detector.
pub const SIGNAL_README_CHARS: usize = 5000;
pub const MAX_COMMERCIAL_SCORE: u8 = 10;

const PRICING_POINTS: u8 = 2;
const ENTERPRISE_POINTS: u8 = 3;
const CLOUD_POINTS: u8 = 2;
const COMPANY_POINTS: u8 = 2;
const DOCS_SITE_POINTS: u8 = 1;

fn any_present(keywords: &[String], text: &str) -> bool {
    keywords
        .iter()
        .any(|kw| !kw.is_empty() && text.contains(kw.as_str()))
}

fn distinct_present(keywords: &[String], text: &str) -> usize {
    keywords
        .iter()
        .filter(|kw| !kw.is_empty() && text.contains(kw.as_str()))
        .count()
}

fn signal_text(description: Option<&str>, readme: Option<&str>) -> String {
    let mut text = String::new();
    if let Some(description) = description {
        text.push_str(&description.to_lowercase());
        text.push(' ');
    }
    if let Some(readme) = readme {
        let lowered = readme.to_lowercase();
        text.extend(lowered.chars().take(SIGNAL_README_CHARS));
        text.push(' ');
    }
    text
}

/// Detects commercial intent from description, README, and homepage.
pub fn detect_commercial_signals(
    catalog: &Catalog,
    description: Option<&str>,
    readme: Option<&str>,
    homepage: Option<&str>,
) -> CommercialSignals {
    let keywords = &catalog.commercial;
    let text = signal_text(description, readme);
    let mut signals = CommercialSignals::default();
    let mut score = 0u8;

    if any_present(&keywords.pricing, &text) {
        signals.has_pricing = true;
        score += PRICING_POINTS;
    }

    if distinct_present(&keywords.enterprise, &text) >= keywords.enterprise_min_matches.max(1) {
        signals.has_enterprise = true;
        score += ENTERPRISE_POINTS;
    }

    if any_present(&keywords.cloud, &text) {
        signals.has_cloud = true;
        score += CLOUD_POINTS;
    }

    if any_present(&keywords.company, &text) {
        signals.has_company = true;
        score += COMPANY_POINTS;
    }

    if let Some(homepage) = homepage.map(str::trim).filter(|h| !h.is_empty()) {
        let homepage = homepage.to_lowercase();
        if !homepage.contains(&keywords.source_host.to_lowercase()) {
            signals.has_docs_site = true;
            score += DOCS_SITE_POINTS;
        }
    }

    signals.commercial_score = score.min(MAX_COMMERCIAL_SCORE);
    signals
}
