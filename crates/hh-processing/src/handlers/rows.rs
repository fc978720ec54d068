//! Row-level cleaning: drop rows without a usable target, impute the rest.

use crate::config::FxRates;
use crate::error::Result;
use crate::handlers::salary::SalaryParser;
use crate::pipeline::context::{Context, MAX_DROPPED_EXAMPLES};
use crate::pipeline::handler::Transform;
use crate::utils::{column_names, fill_string_nulls, is_numeric_dtype, string_values};
use polars::prelude::*;
use tracing::{debug, info};

/// Drops rows whose salary cannot be parsed and imputes missing feature values.
///
/// Rows are dropped, never imputed, when the target is unusable. Missing
/// feature cells are filled instead of dropped: text columns get the sentinel
/// category, numeric columns get the numeric fill value.
#[derive(Debug, Clone)]
pub struct RowCleaner {
    salary_column: String,
    parser: SalaryParser,
    missing_category: String,
    numeric_fill: f64,
}

impl RowCleaner {
    pub fn new(
        salary_column: impl Into<String>,
        fx: FxRates,
        missing_category: impl Into<String>,
        numeric_fill: f64,
    ) -> Self {
        Self {
            salary_column: salary_column.into(),
            parser: SalaryParser::new(fx),
            missing_category: missing_category.into(),
            numeric_fill,
        }
    }

    fn impute(&self, df: &mut DataFrame) -> Result<()> {
        for name in column_names(df) {
            if name == self.salary_column {
                continue;
            }

            let column = df.column(&name)?;
            if column.null_count() == 0 {
                continue;
            }

            let series = column.as_materialized_series();
            let filled = if series.dtype() == &DataType::String {
                fill_string_nulls(series, &self.missing_category)?
            } else if is_numeric_dtype(series.dtype()) {
                let values: Vec<f64> = series
                    .cast(&DataType::Float64)?
                    .f64()?
                    .into_iter()
                    .map(|v| v.unwrap_or(self.numeric_fill))
                    .collect();
                Series::new(series.name().clone(), values)
            } else {
                continue;
            };

            debug!("Imputed {} missing values in '{}'", column.null_count(), name);
            df.replace(&name, filled)?;
        }
        Ok(())
    }
}

impl Transform for RowCleaner {
    fn transform(&self, mut ctx: Context) -> Result<Context> {
        let salaries = string_values(ctx.table()?, &self.salary_column)?;

        let mut keep = Vec::with_capacity(salaries.len());
        let mut examples = Vec::new();
        for value in &salaries {
            let usable = self.parser.parse(value.as_deref()).is_ok();
            if !usable
                && examples.len() < MAX_DROPPED_EXAMPLES
                && let Some(raw) = value
            {
                examples.push(raw.clone());
            }
            keep.push(usable);
        }

        let dropped = ctx.retain_rows(&keep)?;
        if dropped > 0 {
            let pct = (dropped as f64 / salaries.len() as f64) * 100.0;
            info!(
                "Removed {} rows without a usable salary ({:.1}%)",
                dropped, pct
            );
        } else {
            debug!("All rows have a usable salary");
        }
        ctx.diagnostics.rows_dropped += dropped;
        ctx.diagnostics.dropped_salary_examples.extend(examples);

        self.impute(&mut ctx.raw_table)?;
        Ok(ctx)
    }
}
