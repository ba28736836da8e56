use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::types::identifiers::{CategoryName, MatrixFingerprint, SourceName};

#[derive(Debug, Error)]
pub enum MatrixError {
    #[error("Matrix has no categories")]
    Empty,
    #[error("Matrix has no evidence sources")]
    NoSources,
    #[error("Score {score} for category {category}, source {source_name} is outside [0, 1]")]
    ScoreOutOfRange {
        category: String,
        source_name: String,
        score: f64,
    },
    #[error("Duplicate category: {0}")]
    DuplicateCategory(String),
    #[error("Duplicate source: {0}")]
    DuplicateSource(String),
    #[error("Row {category} has {found} scores, expected {expected}")]
    RowLength {
        category: String,
        expected: usize,
        found: usize,
    },
    #[error("Table row {row} has {found} cells, expected {expected}")]
    RaggedTable {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Table index has {found} entries for {expected} rows")]
    IndexLength { expected: usize, found: usize },
    #[error("Cell at row {row}, column {column} is not a confidence value: {value}")]
    InvalidCell {
        row: usize,
        column: String,
        value: String,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed table: {0}")]
    Json(#[from] serde_json::Error),
}

/// One category's scores, one per source, in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixRow {
    pub category: CategoryName,
    pub scores: Vec<f64>,
}

impl MatrixRow {
    /// Mean over every source of the matrix; absent evidence counts as 0.
    ///
    /// Summed in ascending order so that rows holding the same scores in a
    /// different source order get bit-identical means.
    pub fn mean(&self) -> f64 {
        let mut sorted = self.scores.clone();
        sorted.sort_by(f64::total_cmp);
        sorted.iter().sum::<f64>() / sorted.len() as f64
    }
}

/// Categories × evidence sources.
///
/// Dense: every row holds exactly one score per source, absent evidence
/// having been filled with 0.0 at construction. Row order is input order
/// and is what breaks ties downstream, so it is never re-sorted.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfidenceMatrix {
    sources: Vec<SourceName>,
    rows: Vec<MatrixRow>,
}

impl ConfidenceMatrix {
    /// Build a matrix from dense rows.
    ///
    /// This validates every invariant: at least one category and one source,
    /// unique names, rectangular shape, and every score finite in [0, 1].
    pub fn new(
        sources: Vec<SourceName>,
        rows: Vec<(CategoryName, Vec<f64>)>,
    ) -> Result<Self, MatrixError> {
        if rows.is_empty() {
            return Err(MatrixError::Empty);
        }
        if sources.is_empty() {
            return Err(MatrixError::NoSources);
        }

        let mut seen_sources = BTreeSet::new();
        for source in &sources {
            if !seen_sources.insert(source.as_str()) {
                return Err(MatrixError::DuplicateSource(source.to_string()));
            }
        }

        let mut seen_categories = BTreeSet::new();
        let mut matrix_rows = Vec::with_capacity(rows.len());
        for (category, scores) in rows {
            if !seen_categories.insert(category.clone()) {
                return Err(MatrixError::DuplicateCategory(category.to_string()));
            }
            if scores.len() != sources.len() {
                return Err(MatrixError::RowLength {
                    category: category.to_string(),
                    expected: sources.len(),
                    found: scores.len(),
                });
            }
            for (source, &score) in sources.iter().zip(&scores) {
                if !score.is_finite() || !(0.0..=1.0).contains(&score) {
                    return Err(MatrixError::ScoreOutOfRange {
                        category: category.to_string(),
                        source_name: source.to_string(),
                        score,
                    });
                }
            }
            matrix_rows.push(MatrixRow { category, scores });
        }

        Ok(Self {
            sources,
            rows: matrix_rows,
        })
    }

    /// Build a matrix from sparse rows: category → (source → score).
    ///
    /// Sources are the union over all rows in first-seen order; a source a
    /// row does not mention scores 0.0 for that row.
    pub fn from_sparse<C, S, R>(rows: impl IntoIterator<Item = (C, R)>) -> Result<Self, MatrixError>
    where
        C: Into<CategoryName>,
        S: Into<SourceName>,
        R: IntoIterator<Item = (S, f64)>,
    {
        let mut sources: Vec<SourceName> = Vec::new();
        let mut source_index: BTreeMap<SourceName, usize> = BTreeMap::new();
        let mut sparse = Vec::new();

        for (category, cells) in rows {
            let category = category.into();
            let mut row_cells: BTreeMap<usize, f64> = BTreeMap::new();
            for (source, score) in cells {
                let source = source.into();
                let idx = match source_index.get(&source) {
                    Some(&idx) => idx,
                    None => {
                        let idx = sources.len();
                        source_index.insert(source.clone(), idx);
                        sources.push(source.clone());
                        idx
                    }
                };
                if row_cells.insert(idx, score).is_some() {
                    return Err(MatrixError::DuplicateSource(source.to_string()));
                }
            }
            sparse.push((category, row_cells));
        }

        let width = sources.len();
        let dense = sparse
            .into_iter()
            .map(|(category, cells)| {
                let mut scores = vec![0.0; width];
                for (idx, score) in cells {
                    scores[idx] = score;
                }
                (category, scores)
            })
            .collect();

        Self::new(sources, dense)
    }

    pub fn sources(&self) -> &[SourceName] {
        &self.sources
    }

    pub fn rows(&self) -> &[MatrixRow] {
        &self.rows
    }

    pub fn categories(&self) -> impl Iterator<Item = &CategoryName> {
        self.rows.iter().map(|row| &row.category)
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Always false for a constructed matrix.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, category: &str) -> Option<&MatrixRow> {
        self.rows.iter().find(|row| row.category.as_str() == category)
    }

    pub fn score(&self, category: &str, source: &str) -> Option<f64> {
        let col = self.sources.iter().position(|s| s.as_str() == source)?;
        self.row(category).map(|row| row.scores[col])
    }

    /// Sub-matrix of the rows matching `keep`, full rows, input order.
    /// Returns `None` when no row matches.
    pub fn retain_rows(&self, mut keep: impl FnMut(&MatrixRow) -> bool) -> Option<Self> {
        let rows: Vec<MatrixRow> = self.rows.iter().filter(|row| keep(row)).cloned().collect();
        if rows.is_empty() {
            return None;
        }
        Some(Self {
            sources: self.sources.clone(),
            rows,
        })
    }

    pub fn fingerprint(&self) -> MatrixFingerprint {
        let mut canonical = String::new();
        for source in &self.sources {
            canonical.push_str("source:");
            canonical.push_str(source.as_str());
            canonical.push('\n');
        }
        for row in &self.rows {
            canonical.push_str("row:");
            canonical.push_str(row.category.as_str());
            for score in &row.scores {
                // Debug formatting of f64 round-trips exactly
                canonical.push_str(&format!(":{score:?}"));
            }
            canonical.push('\n');
        }
        MatrixFingerprint::from_bytes(canonical.as_bytes())
    }
}
