//! The mutable carrier threaded through the handler chain.

use crate::error::{DataError, Result};
use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// How many raw salary strings of dropped rows are kept for diagnostics.
pub const MAX_DROPPED_EXAMPLES: usize = 20;

/// Dense row-major matrix of `f64` features with named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    rows: usize,
    values: Vec<f64>,
}

impl FeatureMatrix {
    /// Build a matrix from column-major data.
    ///
    /// Every column must hold exactly `rows` values.
    pub fn from_columns(names: Vec<String>, columns: Vec<Vec<f64>>, rows: usize) -> Result<Self> {
        if names.len() != columns.len() {
            return Err(DataError::RowMismatch {
                expected: names.len(),
                actual: columns.len(),
            });
        }
        if let Some(bad) = columns.iter().find(|c| c.len() != rows) {
            return Err(DataError::RowMismatch {
                expected: rows,
                actual: bad.len(),
            });
        }

        let mut values = Vec::with_capacity(rows * columns.len());
        for row in 0..rows {
            values.extend(columns.iter().map(|column| column[row]));
        }

        Ok(Self {
            columns: names,
            rows,
            values,
        })
    }

    pub fn nrows(&self) -> usize {
        self.rows
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows(), self.ncols())
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// Value at `(row, col)`, if in bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows || col >= self.ncols() {
            return None;
        }
        self.values.get(row * self.ncols() + col).copied()
    }

    /// One row of features, if in bounds.
    pub fn row(&self, row: usize) -> Option<&[f64]> {
        if row >= self.rows {
            return None;
        }
        let width = self.ncols();
        self.values.get(row * width..(row + 1) * width)
    }

    /// Index of a named column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Row-major backing slice.
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

/// Counters and samples collected while the chain runs.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    pub rows_loaded: usize,
    pub rows_dropped: usize,
    pub columns_dropped: Vec<String>,
    pub currency_counts: BTreeMap<String, usize>,
    pub fx_rates_source: Option<String>,
    pub dropped_salary_examples: Vec<String>,
}

/// Working state for one pipeline run.
///
/// Created once per run, moved through every handler exactly once and
/// consumed when the runner extracts the final arrays.
#[derive(Debug)]
pub struct Context {
    /// Input file the loader reads.
    pub source: PathBuf,
    /// The dataset as it is cleaned and derived.
    pub raw_table: DataFrame,
    /// Model input columns, in registration order.
    pub feature_columns: Vec<String>,
    /// Column holding the normalised salary.
    pub target_column: Option<String>,
    pub feature_matrix: Option<FeatureMatrix>,
    pub target_vector: Option<Vec<f64>>,
    pub diagnostics: Diagnostics,
}

impl Context {
    /// Fresh context for a run over `source`.
    pub fn new(source: impl AsRef<Path>) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
            raw_table: DataFrame::empty(),
            feature_columns: Vec::new(),
            target_column: None,
            feature_matrix: None,
            target_vector: None,
            diagnostics: Diagnostics::default(),
        }
    }

    /// Context with an already loaded table; the loader is not needed.
    pub fn from_frame(df: DataFrame) -> Self {
        let mut ctx = Self::new("<memory>");
        ctx.diagnostics.rows_loaded = df.height();
        ctx.raw_table = df;
        ctx
    }

    /// The loaded table, or [`DataError::NotLoaded`].
    pub fn table(&self) -> Result<&DataFrame> {
        if self.raw_table.width() == 0 {
            return Err(DataError::NotLoaded);
        }
        Ok(&self.raw_table)
    }

    /// Number of rows currently in the table.
    pub fn height(&self) -> usize {
        self.raw_table.height()
    }

    /// Append a feature column name, keeping registration order and uniqueness.
    pub fn register_feature(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.feature_columns.contains(&name) {
            self.feature_columns.push(name);
        }
    }

    /// Keep only rows whose flag is `true`.
    ///
    /// The table and, when present, the target vector are filtered together.
    /// Returns the number of rows removed.
    pub fn retain_rows(&mut self, keep: &[bool]) -> Result<usize> {
        let height = self.height();
        if keep.len() != height {
            return Err(DataError::RowMismatch {
                expected: height,
                actual: keep.len(),
            });
        }

        if let Some(target) = &self.target_vector
            && target.len() != height
        {
            return Err(DataError::RowMismatch {
                expected: height,
                actual: target.len(),
            });
        }

        let dropped = keep.iter().filter(|&&k| !k).count();
        if dropped == 0 {
            return Ok(0);
        }

        let mask = BooleanChunked::from_slice("keep".into(), keep);
        self.raw_table = self.raw_table.filter(&mask)?;

        if let Some(target) = self.target_vector.take() {
            let filtered = target
                .into_iter()
                .zip(keep)
                .filter_map(|(value, &k)| k.then_some(value))
                .collect();
            self.target_vector = Some(filtered);
        }

        Ok(dropped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_matrix_from_columns() {
        let matrix = FeatureMatrix::from_columns(
            vec!["a".to_string(), "b".to_string()],
            vec![vec![1.0, 2.0, 3.0], vec![10.0, 20.0, 30.0]],
            3,
        )
        .unwrap();

        assert_eq!(matrix.shape(), (3, 2));
        assert_eq!(matrix.row(1), Some(&[2.0, 20.0][..]));
        assert_eq!(matrix.row(3), None);
        assert_eq!(matrix.get(2, 1), Some(30.0));
        assert_eq!(matrix.get(3, 0), None);
        assert_eq!(matrix.column_index("b"), Some(1));
        assert_eq!(matrix.as_slice(), &[1.0, 10.0, 2.0, 20.0, 3.0, 30.0]);
    }

    #[test]
    fn test_feature_matrix_ragged_columns() {
        let err = FeatureMatrix::from_columns(
            vec!["a".to_string(), "b".to_string()],
            vec![vec![1.0, 2.0], vec![1.0]],
            2,
        )
        .unwrap_err();
        assert!(matches!(err, DataError::RowMismatch { expected: 2, actual: 1 }));
    }

    #[test]
    fn test_table_not_loaded() {
        let ctx = Context::new("data.csv");
        assert!(matches!(ctx.table(), Err(DataError::NotLoaded)));
    }

    #[test]
    fn test_register_feature_keeps_order() {
        let mut ctx = Context::new("data.csv");
        ctx.register_feature("age");
        ctx.register_feature("has_car");
        ctx.register_feature("age");
        assert_eq!(ctx.feature_columns, vec!["age", "has_car"]);
    }

    #[test]
    fn test_retain_rows_keeps_target_aligned() {
        let df = df! { "x" => [1.0f64, 2.0, 3.0, 4.0] }.unwrap();
        let mut ctx = Context::from_frame(df);
        ctx.target_vector = Some(vec![10.0, 20.0, 30.0, 40.0]);

        let dropped = ctx.retain_rows(&[true, false, true, false]).unwrap();

        assert_eq!(dropped, 2);
        assert_eq!(ctx.height(), 2);
        assert_eq!(ctx.target_vector, Some(vec![10.0, 30.0]));
    }

    #[test]
    fn test_retain_rows_rejects_wrong_mask_length() {
        let df = df! { "x" => [1.0f64, 2.0] }.unwrap();
        let mut ctx = Context::from_frame(df);
        let err = ctx.retain_rows(&[true]).unwrap_err();
        assert!(matches!(err, DataError::RowMismatch { expected: 2, actual: 1 }));
    }
}
