use std::cmp::Ordering;

use crate::matrix::ConfidenceMatrix;
use crate::types::decision::{DecisionResult, ScoredCategory};

/// Resolve a set of candidate categories by their mean score.
///
/// Every category whose mean lies in `[max - margin_error, max]` is kept.
/// The best one is the decision, the rest are `others`, both ordered by
/// mean descending with ties left in row order.
///
/// Returns `None` only for a matrix without rows, which construction rules out.
pub fn second_stage(candidates: &ConfidenceMatrix, margin_error: f64) -> Option<DecisionResult> {
    let means: Vec<ScoredCategory> = candidates
        .rows()
        .iter()
        .map(|row| ScoredCategory::new(row.category.as_str(), row.mean()))
        .collect();

    let best = means
        .iter()
        .map(|candidate| candidate.score)
        .fold(f64::NEG_INFINITY, f64::max);
    let floor = best - margin_error;

    let mut in_range: Vec<ScoredCategory> = means
        .into_iter()
        .filter(|candidate| candidate.score >= floor && candidate.score <= best)
        .collect();

    // sort_by is stable: equal means keep row order
    in_range.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    debug_assert!(in_range.windows(2).all(|w| w[0].score >= w[1].score));

    let mut ranked = in_range.into_iter();
    let decision = ranked.next()?;
    Some(DecisionResult {
        decision,
        others: ranked.collect(),
    })
}
