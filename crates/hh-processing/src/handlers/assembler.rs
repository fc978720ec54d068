//! Terminal stage: numeric arrays out of the cleaned table.

use crate::error::{DataError, Result};
use crate::pipeline::context::{Context, FeatureMatrix};
use crate::pipeline::handler::Transform;
use crate::utils::f64_values;
use tracing::info;

/// Builds the feature matrix from the registered feature columns, in
/// registration order, and the target vector from the target column.
///
/// Fails on any missing or NaN value rather than filling it.
#[derive(Debug, Clone, Default)]
pub struct Assembler;

fn dense_column(ctx: &Context, name: &str) -> Result<Vec<f64>> {
    f64_values(ctx.table()?, name)?
        .into_iter()
        .enumerate()
        .map(|(row, value)| match value {
            Some(v) if !v.is_nan() => Ok(v),
            _ => Err(DataError::MissingValue {
                column: name.to_string(),
                row,
            }),
        })
        .collect()
}

impl Transform for Assembler {
    fn transform(&self, mut ctx: Context) -> Result<Context> {
        let target_column = ctx
            .target_column
            .clone()
            .ok_or_else(|| DataError::ColumnNotFound("<target>".to_string()))?;

        let rows = ctx.height();
        let target = dense_column(&ctx, &target_column)?;

        if let Some(existing) = &ctx.target_vector
            && existing.len() != rows
        {
            return Err(DataError::RowMismatch {
                expected: rows,
                actual: existing.len(),
            });
        }

        let columns = ctx
            .feature_columns
            .iter()
            .map(|name| dense_column(&ctx, name))
            .collect::<Result<Vec<_>>>()?;

        let matrix = FeatureMatrix::from_columns(ctx.feature_columns.clone(), columns, rows)?;
        info!(
            "Assembled feature matrix {:?} and target vector of {}",
            matrix.shape(),
            target.len()
        );

        ctx.feature_matrix = Some(matrix);
        ctx.target_vector = Some(target);
        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn context(df: DataFrame, features: &[&str]) -> Context {
        let mut ctx = Context::from_frame(df);
        ctx.target_column = Some("target_salary".to_string());
        ctx.target_vector = Some(vec![0.0; ctx.height()]);
        for f in features {
            ctx.register_feature(*f);
        }
        ctx
    }

    #[test]
    fn test_assembles_in_registration_order() {
        let df = df! {
            "a" => [1.0f64, 2.0],
            "b" => [10.0f64, 20.0],
            "target_salary" => [50000.0f64, 60000.0],
            "city" => ["москва", "омск"],
        }
        .unwrap();

        let ctx = Assembler.transform(context(df, &["b", "a"])).unwrap();

        let matrix = ctx.feature_matrix.unwrap();
        assert_eq!(matrix.shape(), (2, 2));
        assert_eq!(matrix.column_names(), &["b".to_string(), "a".to_string()]);
        assert_eq!(matrix.row(0), Some(&[10.0, 1.0][..]));
        assert_eq!(ctx.target_vector, Some(vec![50000.0, 60000.0]));
    }

    #[test]
    fn test_rejects_nan() {
        let df = df! {
            "a" => [1.0f64, f64::NAN],
            "target_salary" => [1.0f64, 2.0],
        }
        .unwrap();

        let err = Assembler.transform(context(df, &["a"])).unwrap_err();
        assert!(matches!(err, DataError::MissingValue { row: 1, .. }));
    }

    #[test]
    fn test_rejects_null() {
        let df = df! {
            "a" => [Some(1.0f64), None],
            "target_salary" => [1.0f64, 2.0],
        }
        .unwrap();

        let err = Assembler.transform(context(df, &["a"])).unwrap_err();
        assert!(matches!(err, DataError::MissingValue { .. }));
    }

    #[test]
    fn test_requires_target() {
        let df = df! { "a" => [1.0f64] }.unwrap();
        let mut ctx = Context::from_frame(df);
        ctx.register_feature("a");
        let err = Assembler.transform(ctx).unwrap_err();
        assert!(matches!(err, DataError::ColumnNotFound(_)));
    }

    #[test]
    fn test_unknown_feature_column() {
        let df = df! { "target_salary" => [1.0f64] }.unwrap();
        let err = Assembler.transform(context(df, &["ghost"])).unwrap_err();
        assert!(matches!(err, DataError::ColumnNotFound(name) if name == "ghost"));
    }
}
