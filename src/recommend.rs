//! Joins ranked scores back onto catalog items.

use serde::Serialize;

use crate::catalog::CatalogItem;
use crate::ranker::{rank, Ranked};
use crate::vectorizer::FeatureSpace;

/// A catalog item with its similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredItem {
    /// The matched item.
    pub item: CatalogItem,
    /// Cosine similarity in `[0, 1]`.
    pub score: f32,
}

/// Wire form of a recommendation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    /// Product name.
    pub name: String,
    /// Product URL.
    pub url: String,
    /// Remote testing support.
    pub remote: bool,
    /// Adaptive/IRT support.
    pub adaptive: bool,
    /// Similarity rounded to four decimals.
    pub score: f64,
}

impl From<&ScoredItem> for Recommendation {
    fn from(scored: &ScoredItem) -> Self {
        Self {
            name: scored.item.name.clone(),
            url: scored.item.url.clone(),
            remote: scored.item.supports_remote,
            adaptive: scored.item.supports_adaptive,
            score: round_score(scored.score),
        }
    }
}

/// Rounds to four decimal places.
pub fn round_score(score: f32) -> f64 {
    (f64::from(score) * 10_000.0).round() / 10_000.0
}

/// Pairs each ranked index with its item, keeping at most `top_n` entries.
///
/// Indices that fall outside `items` are skipped.
pub fn assemble(items: &[CatalogItem], ranked: &[Ranked], top_n: usize) -> Vec<ScoredItem> {
    ranked
        .iter()
        .filter_map(|r| {
            items.get(r.index).map(|item| ScoredItem {
                item: item.clone(),
                score: r.score,
            })
        })
        .take(top_n)
        .collect()
}

/// Runs fit, rank and assemble for `query` over `items`.
pub fn recommend(items: &[CatalogItem], query: &str, top_n: usize) -> Vec<ScoredItem> {
    if items.is_empty() || top_n == 0 {
        return Vec::new();
    }
    let corpus: Vec<&str> = items.iter().map(|item| item.name.as_str()).collect();
    let space = FeatureSpace::fit(&corpus);
    let ranked = rank(&space.transform(query), space.documents(), top_n);
    assemble(items, &ranked, top_n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<CatalogItem> {
        vec![
            CatalogItem::new("Verify Coding Skills Test", "https://x/1", true, false),
            CatalogItem::new("Personality Questionnaire", "https://x/2", false, true),
            CatalogItem::new("Numerical Reasoning Test", "https://x/3", true, true),
        ]
    }

    #[test]
    fn recommends_best_match_first() {
        let results = recommend(&items(), "coding skills", 2);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].item.name, "Verify Coding Skills Test");
        assert!(results[0].score > 0.0);
        assert!(results[1].score >= 0.0);
    }

    #[test]
    fn empty_inputs_give_empty_results() {
        assert!(recommend(&[], "coding", 5).is_empty());
        assert!(recommend(&items(), "coding", 0).is_empty());
    }

    #[test]
    fn assemble_truncates_and_skips_stale_indices() {
        let ranked = [
            Ranked { index: 2, score: 0.9 },
            Ranked { index: 7, score: 0.5 },
            Ranked { index: 0, score: 0.1 },
            Ranked { index: 1, score: 0.0 },
        ];
        let scored = assemble(&items(), &ranked, 2);
        let names: Vec<&str> = scored.iter().map(|s| s.item.name.as_str()).collect();
        assert_eq!(names, vec!["Numerical Reasoning Test", "Verify Coding Skills Test"]);
    }

    #[test]
    fn wire_form_rounds_score() {
        let scored = ScoredItem {
            item: items().remove(2),
            score: 0.123_456,
        };
        let rec = Recommendation::from(&scored);
        assert_eq!(rec.score, 0.1235);
        assert!(rec.remote && rec.adaptive);
    }
}
