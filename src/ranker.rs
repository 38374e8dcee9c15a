//! Cosine scoring and deterministic top-N selection.

use crate::vectorizer::SparseVector;

/// Corpus position paired with its similarity to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ranked {
    /// Index into the corpus (and the item list it mirrors).
    pub index: usize,
    /// Cosine similarity in `[0, 1]`.
    pub score: f32,
}

/// Cosine similarity of two non-negative vectors; zero-norm inputs score 0.
pub fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f32 {
    let denom = a.norm() * b.norm();
    if denom <= f32::EPSILON {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(0.0, 1.0)
}

/// Scores `query` against every document and keeps the best `top_n`.
///
/// Ordering is by descending score; equal scores keep corpus order.
pub fn rank(query: &SparseVector, documents: &[SparseVector], top_n: usize) -> Vec<Ranked> {
    let mut scored: Vec<Ranked> = documents
        .iter()
        .enumerate()
        .map(|(index, doc)| Ranked {
            index,
            score: cosine_similarity(query, doc),
        })
        .collect();
    // `sort_by` is stable, which gives the index tie-break.
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(top_n);
    scored
}
