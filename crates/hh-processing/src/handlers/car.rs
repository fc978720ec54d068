//! Car ownership flag from the Авто column.

use crate::error::Result;
use crate::pipeline::context::Context;
use crate::pipeline::handler::Transform;
use crate::utils::{contains_any, find_column, indicator_series, safe_lower, string_values};
use tracing::warn;

const OWNS_CAR: [&str; 3] = ["имеется собственный автомобиль", "has a car", "own car"];

/// Derives the `has_car` indicator from the `Авто` column.
#[derive(Debug, Clone, Default)]
pub struct CarOwnershipParser;

impl Transform for CarOwnershipParser {
    fn transform(&self, mut ctx: Context) -> Result<Context> {
        let height = ctx.table()?.height();

        let flags: Vec<bool> = match find_column(&ctx.raw_table, "авто") {
            Some(source) => string_values(&ctx.raw_table, &source)?
                .iter()
                .map(|v| contains_any(&safe_lower(v.as_deref()), &OWNS_CAR))
                .collect(),
            None => {
                warn!("Car column not found; has_car set to 0");
                vec![false; height]
            }
        };

        ctx.raw_table.with_column(indicator_series("has_car", &flags))?;
        ctx.register_feature("has_car");
        Ok(ctx)
    }
}
