use std::borrow::Cow;

use crate::matrix::ConfidenceMatrix;
use crate::types::decision::ScoredCategory;

/// Result of screening the matrix against the confidence threshold.
#[derive(Debug, Clone, PartialEq)]
pub enum FirstStageOutcome<'m> {
    /// Exactly one cell met the threshold. Carries that cell's raw score.
    Decided(ScoredCategory),
    /// Averaging is required over `candidates`.
    ///
    /// With no qualifying cell this is the whole input matrix. With several,
    /// it is the full rows of every category owning a qualifying cell.
    Escalate {
        candidates: Cow<'m, ConfidenceMatrix>,
        qualifying_cells: usize,
    },
}

pub fn first_stage(matrix: &ConfidenceMatrix, threshold: f64) -> FirstStageOutcome<'_> {
    let mut qualifying = matrix.rows().iter().flat_map(|row| {
        row.scores
            .iter()
            .filter(move |&&score| score >= threshold)
            .map(move |&score| (row, score))
    });

    let first = match qualifying.next() {
        Some(cell) => cell,
        None => {
            return FirstStageOutcome::Escalate {
                candidates: Cow::Borrowed(matrix),
                qualifying_cells: 0,
            }
        }
    };

    let rest = qualifying.count();
    if rest == 0 {
        let (row, score) = first;
        return FirstStageOutcome::Decided(ScoredCategory::new(row.category.as_str(), score));
    }

    let candidates = matrix
        .retain_rows(|row| row.scores.iter().any(|&score| score >= threshold))
        .map(Cow::Owned)
        .unwrap_or(Cow::Borrowed(matrix));

    FirstStageOutcome::Escalate {
        candidates,
        qualifying_cells: rest + 1,
    }
}
