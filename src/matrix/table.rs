//! Evidence tables as produced by the upstream classifiers.
//!
//! A table has one row per evidence source and one column per category,
//! plus a few bookkeeping columns that carry no evidence. Tables use the
//! "split" JSON layout so that column order survives serialization:
//!
//! ```json
//! {"columns": ["path", "tipo", ".pred_class", "civil", "penal"],
//!  "index": ["text", "metadata"],
//!  "data": [["a.pdf", "pdf", "civil", 0.91, null],
//!           ["a.pdf", "pdf", "civil", 0.40, 0.12]]}
//! ```

use std::fs;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use super::confidence::{ConfidenceMatrix, MatrixError};
use crate::types::identifiers::{CategoryName, SourceName};

/// Columns that describe the input file rather than score a category.
pub const METADATA_COLUMNS: [&str; 3] = ["path", "tipo", ".pred_class"];

#[derive(Debug, Clone, Deserialize)]
pub struct EvidenceTable {
    pub columns: Vec<String>,
    #[serde(default)]
    pub index: Option<Vec<Value>>,
    pub data: Vec<Vec<Value>>,
}

impl EvidenceTable {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, MatrixError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, MatrixError> {
        let f = fs::File::open(path)?;
        Self::from_reader(f)
    }

    /// Strip the default metadata columns and transpose into a matrix.
    pub fn into_matrix(self) -> Result<ConfidenceMatrix, MatrixError> {
        self.into_matrix_without(&METADATA_COLUMNS)
    }

    /// Strip `metadata` columns, fill missing values with 0.0, and transpose
    /// so that categories become rows and sources become columns.
    pub fn into_matrix_without(self, metadata: &[&str]) -> Result<ConfidenceMatrix, MatrixError> {
        let width = self.columns.len();
        let sources = self.source_names()?;

        let category_columns: Vec<usize> = (0..width)
            .filter(|&col| !metadata.contains(&self.columns[col].as_str()))
            .collect();

        let mut rows: Vec<(CategoryName, Vec<f64>)> = category_columns
            .iter()
            .map(|&col| {
                (
                    CategoryName::new(self.columns[col].clone()),
                    Vec::with_capacity(self.data.len()),
                )
            })
            .collect();

        for (row_idx, cells) in self.data.iter().enumerate() {
            if cells.len() != width {
                return Err(MatrixError::RaggedTable {
                    row: row_idx,
                    expected: width,
                    found: cells.len(),
                });
            }
            for (out, &col) in rows.iter_mut().zip(&category_columns) {
                let score = parse_cell(&cells[col]).ok_or_else(|| MatrixError::InvalidCell {
                    row: row_idx,
                    column: self.columns[col].clone(),
                    value: cells[col].to_string(),
                })?;
                out.1.push(score);
            }
        }

        ConfidenceMatrix::new(sources, rows)
    }

    fn source_names(&self) -> Result<Vec<SourceName>, MatrixError> {
        match &self.index {
            Some(index) => {
                if index.len() != self.data.len() {
                    return Err(MatrixError::IndexLength {
                        expected: self.data.len(),
                        found: index.len(),
                    });
                }
                Ok(index
                    .iter()
                    .map(|label| match label {
                        Value::String(s) => SourceName::new(s.clone()),
                        other => SourceName::new(other.to_string()),
                    })
                    .collect())
            }
            None => Ok((0..self.data.len())
                .map(|i| SourceName::new(i.to_string()))
                .collect()),
        }
    }
}

/// Missing values (null, empty, NA, NaN) count as no evidence.
fn parse_cell(value: &Value) -> Option<f64> {
    match value {
        Value::Null => Some(0.0),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let t = s.trim();
            if t.is_empty() || t.eq_ignore_ascii_case("na") || t.eq_ignore_ascii_case("nan") {
                Some(0.0)
            } else {
                t.parse::<f64>().ok()
            }
        }
        _ => None,
    }
}
