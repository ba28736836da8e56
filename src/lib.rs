//! Deterministic category decisions over multi-source confidence scores.
//!
//! `decision-core` takes a matrix of confidence scores (categories ×
//! evidence sources) and picks one category. A single score at or above the
//! confidence threshold decides alone; otherwise categories are compared by
//! their mean score and every category within the margin of error of the
//! best mean is reported. Parameters and the category registry live behind
//! the [`store`] traits. Identical inputs always produce identical outputs.

pub mod config;
pub mod matrix;
pub mod selection;
pub mod store;
pub mod types;

pub use config::Parameters;
pub use matrix::{ConfidenceMatrix, EvidenceTable, MatrixError};
pub use selection::DecisionEngine;
pub use store::{CategoryRegistry, MemoryStore, ParameterStore, SqliteStore, StoreError};
pub use types::{DecisionError, DecisionReport, DecisionResult, DecisionStage, ScoredCategory};
