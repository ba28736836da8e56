use serde::{Deserialize, Serialize};

use crate::matrix::MatrixError;
use crate::store::StoreError;
use crate::types::identifiers::MatrixFingerprint;

/// A category paired with the score that earned it a place in the result.
///
/// The score is either a single source's raw confidence (first-stage
/// decision) or the category's mean across all sources (second stage).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCategory {
    pub area: String,
    #[serde(rename = "porc_conf")]
    pub score: f64,
}

impl ScoredCategory {
    pub fn new(area: impl Into<String>, score: f64) -> Self {
        Self {
            area: area.into(),
            score,
        }
    }
}

/// The final result of a decision.
/// `others` is ordered by score descending, ties in input row order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionResult {
    pub decision: ScoredCategory,
    pub others: Vec<ScoredCategory>,
}

impl DecisionResult {
    pub fn single(decision: ScoredCategory) -> Self {
        Self {
            decision,
            others: Vec::new(),
        }
    }
}

/// Which path through the filters produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStage {
    /// Exactly one cell met the threshold; no averaging.
    SingleSignal,
    /// Several cells met the threshold; averaged over their categories.
    Contested,
    /// No cell met the threshold; averaged over the whole matrix.
    NoStrongSignal,
}

/// A decision together with how it was reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionReport {
    pub result: DecisionResult,
    pub stage: DecisionStage,
    pub matrix_fingerprint: MatrixFingerprint,
    pub qualifying_cells: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    #[error("Required parameter missing: {0}")]
    ConfigMissing(String),

    #[error("Parameter {name} has invalid value {value}")]
    InvalidParameter { name: String, value: f64 },

    #[error("Invalid input: {0}")]
    InvalidInput(#[from] MatrixError),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for DecisionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ParameterNotFound(name) => DecisionError::ConfigMissing(name),
            other => DecisionError::StoreUnavailable(other.to_string()),
        }
    }
}
