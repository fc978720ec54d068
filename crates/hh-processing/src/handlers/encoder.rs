//! One-hot encoding of categorical columns.
//!
//! The vocabulary is the sorted set of values seen in this run, so every row
//! maps to exactly one indicator. A column with a single distinct value carries
//! no information and is dropped without emitting indicators.

use crate::error::Result;
use crate::pipeline::context::Context;
use crate::pipeline::handler::Transform;
use crate::utils::{indicator_series, require_column, string_values};
use polars::prelude::*;
use std::collections::BTreeSet;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct CategoricalEncoder {
    columns: Vec<String>,
    missing_category: String,
}

impl CategoricalEncoder {
    pub fn new<I, S>(columns: I, missing_category: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            missing_category: missing_category.into(),
        }
    }

    fn encode(&self, ctx: &mut Context, column: &str) -> Result<usize> {
        let values: Vec<String> = string_values(&ctx.raw_table, column)?
            .into_iter()
            .map(|v| v.unwrap_or_else(|| self.missing_category.clone()))
            .collect();

        let vocabulary: BTreeSet<&str> = values.iter().map(String::as_str).collect();

        let mut emitted = 0;
        if vocabulary.len() > 1 {
            for category in &vocabulary {
                let flags: Vec<bool> = values.iter().map(|v| v.as_str() == *category).collect();
                let name = format!("{column}={category}");
                ctx.raw_table.with_column(indicator_series(&name, &flags))?;
                ctx.register_feature(name);
                emitted += 1;
            }
        } else {
            debug!("Column '{}' has a single value; dropped", column);
        }

        ctx.raw_table = ctx.raw_table.drop(column)?;
        Ok(emitted)
    }
}

impl Transform for CategoricalEncoder {
    fn transform(&self, mut ctx: Context) -> Result<Context> {
        for column in &self.columns {
            require_column(ctx.table()?, column)?;
            let emitted = self.encode(&mut ctx, column)?;
            if emitted == 0 {
                ctx.diagnostics.columns_dropped.push(column.clone());
            }
            info!("One-hot encoded '{}' into {} columns", column, emitted);
        }
        Ok(ctx)
    }
}
