pub mod confidence;
pub mod table;

pub use confidence::{ConfidenceMatrix, MatrixError, MatrixRow};
pub use table::{EvidenceTable, METADATA_COLUMNS};
