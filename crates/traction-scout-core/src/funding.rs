//! Coarse funding-stage resolution.
//!
//! A curated owner table is consulted first, then accelerator phrases in
//! the description. Anything else is [`FundingStage::Unknown`], which
//! means "no signal", not "confirmed unfunded".

use serde::Serialize;

use crate::catalog::Catalog;
use crate::models::FundingStage;

/// Resolved funding label with optional amount and source attribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct FundingInfo {
    pub stage: FundingStage,
    pub amount: Option<String>,
    pub source: Option<String>,
}

impl FundingInfo {
    pub fn unknown() -> Self {
        Self::default()
    }
}

/// Maps an owner (and description text) to a funding label.
pub fn resolve_funding(catalog: &Catalog, owner: &str, description: Option<&str>) -> FundingInfo {
    if let Some(known) = catalog
        .known_funded
        .iter()
        .find(|k| k.owner.eq_ignore_ascii_case(owner))
    {
        return FundingInfo {
            stage: known.stage,
            amount: known.amount.clone(),
            source: known.source.clone(),
        };
    }

    let description = description.unwrap_or("").to_lowercase();
    catalog
        .accelerators
        .iter()
        .find(|a| !a.phrase.is_empty() && description.contains(&a.phrase.to_lowercase()))
        .map(|a| FundingInfo {
            stage: FundingStage::Seed,
            amount: Some(a.label.clone()),
            source: Some(a.source.clone()),
        })
        .unwrap_or_else(FundingInfo::unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_owner_wins() {
        let info = resolve_funding(&Catalog::builtin(), "Supabase", Some("Backed by Y Combinator"));
        assert_eq!(info.stage, FundingStage::SeriesC);
        assert_eq!(info.amount.as_deref(), Some("$116M"));
        assert_eq!(info.source.as_deref(), Some("Known"));
    }

    #[test]
    fn accelerator_phrase_means_seed() {
        let info = resolve_funding(&Catalog::builtin(), "tiny-co", Some("Open-source CRM (YC W24)"));
        assert_eq!(info.stage, FundingStage::Seed);
        assert_eq!(info.amount.as_deref(), Some("YC-backed"));
        assert_eq!(info.source.as_deref(), Some("YC"));
    }

    #[test]
    fn no_signal_is_unknown() {
        let catalog = Catalog::builtin();
        assert_eq!(resolve_funding(&catalog, "tiny-co", Some("A parser")), FundingInfo::unknown());
        assert_eq!(resolve_funding(&catalog, "tiny-co", None).stage, FundingStage::Unknown);
    }
}
