//! Text classification: category tagging, non-investable filtering, and
//! big-tech detection.
//!
//! All functions are pure over a [`Catalog`]; matching is lower-cased
//! substring search, not tokenization, so `"ml"` also fires inside
//! `"html"`. That is the accepted precision of the heuristic.

use serde::Serialize;

use crate::catalog::Catalog;
use crate::models::Category;

/// README characters considered by the category classifier.
pub const CATEGORY_README_CHARS: usize = 2000;

fn prefix_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Builds the lower-cased classification text from description, topic
/// tags, and the first [`CATEGORY_README_CHARS`] characters of a README.
pub fn classification_text(
    description: Option<&str>,
    topics: &[String],
    readme: Option<&str>,
) -> String {
    let mut text = description.unwrap_or("").to_lowercase();
    if !topics.is_empty() {
        text.push(' ');
        text.push_str(&topics.join(" ").to_lowercase());
    }
    if let Some(readme) = readme {
        text.push(' ');
        text.push_str(prefix_chars(&readme.to_lowercase(), CATEGORY_README_CHARS));
    }
    text
}

/// Number of distinct keywords of `category` present in `text`.
///
/// Each keyword contributes at most once.
pub fn category_score(catalog: &Catalog, category: Category, text: &str) -> usize {
    catalog
        .keywords_for(category)
        .iter()
        .filter(|kw| !kw.is_empty() && text.contains(kw.as_str()))
        .count()
}

/// Maps already lower-cased text to one category.
///
/// The strictly highest nonzero score wins; ties go to the category that
/// comes first in [`Category::SCORED`]. No match at all yields `Other`.
pub fn classify_text(catalog: &Catalog, text: &str) -> Category {
    let mut best = Category::Other;
    let mut best_score = 0usize;
    for category in Category::SCORED {
        let score = category_score(catalog, category, text);
        if score > best_score {
            best = category;
            best_score = score;
        }
    }
    best
}

/// Classifies a project from its description, topics, and README.
pub fn classify(
    catalog: &Catalog,
    description: Option<&str>,
    topics: &[String],
    readme: Option<&str>,
) -> Category {
    classify_text(catalog, &classification_text(description, topics, readme))
}

/// Which input matched a non-investable pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchField {
    Name,
    Description,
}

/// The first non-investable pattern that matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NonInvestableMatch {
    pub field: MatchField,
    pub pattern: String,
}

impl NonInvestableMatch {
    /// Human-readable reason, e.g. `name matches 'awesome-'`.
    pub fn reason(&self) -> String {
        let field = match self.field {
            MatchField::Name => "name",
            MatchField::Description => "description",
        };
        format!("{} matches '{}'", field, self.pattern)
    }
}

/// Flags repositories that are lists, tutorials, or personal configuration.
///
/// Name patterns are checked before description patterns; the first match
/// wins. `None` means the repository looks like a product.
pub fn check_non_investable(
    catalog: &Catalog,
    name: &str,
    description: Option<&str>,
) -> Option<NonInvestableMatch> {
    let name = name.to_lowercase();
    let patterns = &catalog.non_investable;
    if let Some(p) = patterns
        .name_patterns
        .iter()
        .find(|p| !p.is_empty() && name.contains(p.as_str()))
    {
        return Some(NonInvestableMatch {
            field: MatchField::Name,
            pattern: p.clone(),
        });
    }

    let description = description.unwrap_or("").to_lowercase();
    patterns
        .description_patterns
        .iter()
        .find(|p| !p.is_empty() && description.contains(p.as_str()))
        .map(|p| NonInvestableMatch {
            field: MatchField::Description,
            pattern: p.clone(),
        })
}

/// Case-insensitive membership of `owner` in the big-tech organization list.
pub fn is_big_tech(catalog: &Catalog, owner: &str) -> bool {
    catalog
        .big_tech_orgs
        .iter()
        .any(|org| org.eq_ignore_ascii_case(owner))
}
