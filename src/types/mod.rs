pub mod decision;
pub mod identifiers;

pub use decision::{DecisionError, DecisionReport, DecisionResult, DecisionStage, ScoredCategory};
pub use identifiers::{CategoryName, MatrixFingerprint, SourceName};
