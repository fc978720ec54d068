//! Column-name hygiene.

use crate::error::Result;
use crate::pipeline::context::Context;
use crate::pipeline::handler::Transform;
use crate::utils::{column_names, normalize_spaces};
use polars::prelude::*;
use tracing::{debug, info};

/// Trims column names and drops index artefacts left by spreadsheet/pandas
/// exports (`Unnamed: 0`, blank headers).
#[derive(Debug, Clone, Default)]
pub struct ColumnCleaner;

impl Transform for ColumnCleaner {
    fn transform(&self, mut ctx: Context) -> Result<Context> {
        ctx.table()?;

        for name in column_names(&ctx.raw_table) {
            let trimmed = normalize_spaces(&name);
            if trimmed != name {
                debug!("Renaming column '{}' -> '{}'", name, trimmed);
                ctx.raw_table.rename(&name, trimmed.into())?;
            }
        }

        let drop_cols: Vec<String> = column_names(&ctx.raw_table)
            .into_iter()
            .filter(|name| name.is_empty() || name.to_lowercase().starts_with("unnamed"))
            .collect();

        if !drop_cols.is_empty() {
            let cols_ref: Vec<PlSmallStr> = drop_cols.iter().map(|s| s.as_str().into()).collect();
            ctx.raw_table = ctx.raw_table.drop_many(cols_ref);
            info!("Dropped columns: {:?}", drop_cols);
            ctx.diagnostics.columns_dropped.extend(drop_cols);
        }

        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_trims_and_drops_index_columns() {
        let df = df! {
            "Unnamed: 0" => ["0", "1"],
            " ЗП " => ["50000", "60000"],
            "Город\u{a0}" => ["Москва", "Казань"],
        }
        .unwrap();

        let ctx = ColumnCleaner.transform(Context::from_frame(df)).unwrap();

        assert_eq!(column_names(&ctx.raw_table), vec!["ЗП", "Город"]);
        assert_eq!(ctx.diagnostics.columns_dropped, vec!["Unnamed: 0"]);
    }

    #[test]
    fn test_clean_frame_is_untouched() {
        let df = df! { "ЗП" => ["50000"], "Город" => ["Москва"] }.unwrap();
        let ctx = ColumnCleaner.transform(Context::from_frame(df)).unwrap();
        assert_eq!(ctx.raw_table.width(), 2);
        assert!(ctx.diagnostics.columns_dropped.is_empty());
    }
}
