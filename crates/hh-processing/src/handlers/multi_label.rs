//! Indicator encoding for multi-valued fields.
//!
//! HH stores employment type and schedule as comma separated lists
//! (`полная занятость, частичная занятость`). Each distinct token becomes one
//! 0/1 column, so a row may have several indicators set.

use crate::config::MultiLabelSpec;
use crate::error::Result;
use crate::pipeline::context::Context;
use crate::pipeline::handler::Transform;
use crate::utils::{indicator_series, present, split_multi_categories, string_values};
use polars::prelude::*;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct MultiLabelEncoder {
    specs: Vec<MultiLabelSpec>,
    missing_category: String,
}

impl MultiLabelEncoder {
    pub fn new(specs: Vec<MultiLabelSpec>, missing_category: impl Into<String>) -> Self {
        Self {
            specs,
            missing_category: missing_category.into(),
        }
    }

    fn encode(&self, ctx: &mut Context, spec: &MultiLabelSpec) -> Result<()> {
        let tokens: Vec<Vec<String>> = string_values(&ctx.raw_table, &spec.column)?
            .iter()
            .map(|v| {
                present(v.as_deref(), &self.missing_category)
                    .map(split_multi_categories)
                    .unwrap_or_default()
            })
            .collect();

        let vocabulary: BTreeSet<&str> = tokens.iter().flatten().map(String::as_str).collect();

        let mut emitted = 0;
        for token in &vocabulary {
            let flags: Vec<bool> = tokens
                .iter()
                .map(|row| row.iter().any(|t| t.as_str() == *token))
                .collect();

            if flags.iter().all(|&f| f) {
                debug!("Skipping constant indicator '{}={}'", spec.prefix, token);
                continue;
            }

            let name = format!("{}={}", spec.prefix, token);
            ctx.raw_table.with_column(indicator_series(&name, &flags))?;
            ctx.register_feature(name);
            emitted += 1;
        }

        ctx.raw_table = ctx.raw_table.drop(&spec.column)?;
        ctx.diagnostics.columns_dropped.push(spec.column.clone());
        info!(
            "Encoded '{}' into {} indicators ({} distinct values)",
            spec.column,
            emitted,
            vocabulary.len()
        );
        Ok(())
    }
}

impl Transform for MultiLabelEncoder {
    fn transform(&self, mut ctx: Context) -> Result<Context> {
        ctx.table()?;

        for spec in &self.specs {
            if ctx.raw_table.column(&spec.column).is_err() {
                warn!("Multi-valued column '{}' not found; skipping", spec.column);
                continue;
            }
            self.encode(&mut ctx, spec)?;
        }
        Ok(ctx)
    }
}
