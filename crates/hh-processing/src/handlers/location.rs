//! City and mobility features from the `Город` column.

use crate::error::Result;
use crate::pipeline::context::Context;
use crate::pipeline::handler::Transform;
use crate::utils::{contains_any, indicator_series, normalize_city_name, present, safe_lower, string_values};
use polars::prelude::*;
use tracing::{info, warn};

/// Source column with city, relocation and business-trip readiness.
pub const CITY_SOURCE_COLUMN: &str = "Город";

const NOT_RELOCATE: [&str; 3] = [
    "не готов к переезду",
    "not ready to relocate",
    "not willing to relocate",
];
const RELOCATE: [&str; 3] = ["готов к переезду", "ready to relocate", "willing to relocate"];

const NO_TRIPS: [&str; 2] = ["не готов к командировкам", "not ready for business trips"];
const TRIPS: [&str; 4] = [
    "готов к командировкам",
    "готов к редким командировкам",
    "ready for business trips",
    "willing to travel",
];

/// Readiness flag: negative phrases win over positive ones.
fn ready(text: &str, negative: &[&str], positive: &[&str]) -> bool {
    !contains_any(text, negative) && contains_any(text, positive)
}

/// Derives `city` plus the `relocate_ready` and `trips_ready` indicators.
#[derive(Debug, Clone)]
pub struct LocationParser {
    missing_category: String,
}

impl LocationParser {
    pub fn new(missing_category: impl Into<String>) -> Self {
        Self {
            missing_category: missing_category.into(),
        }
    }

    /// City of residence: the part before the first comma.
    pub fn parse_city(&self, value: Option<&str>) -> String {
        present(value, &self.missing_category)
            .and_then(|v| v.split(',').next())
            .map(normalize_city_name)
            .filter(|city| !city.is_empty())
            .unwrap_or_else(|| self.missing_category.clone())
    }
}

impl Transform for LocationParser {
    fn transform(&self, mut ctx: Context) -> Result<Context> {
        let height = ctx.table()?.height();

        let (cities, relocate, trips) = if ctx.raw_table.column(CITY_SOURCE_COLUMN).is_ok() {
            let values = string_values(&ctx.raw_table, CITY_SOURCE_COLUMN)?;
            let cities: Vec<String> = values.iter().map(|v| self.parse_city(v.as_deref())).collect();
            let lowered: Vec<String> = values.iter().map(|v| safe_lower(v.as_deref())).collect();
            let relocate: Vec<bool> = lowered.iter().map(|t| ready(t, &NOT_RELOCATE, &RELOCATE)).collect();
            let trips: Vec<bool> = lowered.iter().map(|t| ready(t, &NO_TRIPS, &TRIPS)).collect();
            (cities, relocate, trips)
        } else {
            warn!("Column '{}' not found; using defaults", CITY_SOURCE_COLUMN);
            (
                vec![self.missing_category.clone(); height],
                vec![false; height],
                vec![false; height],
            )
        };

        info!(
            "Location: {} ready to relocate, {} ready for trips",
            relocate.iter().filter(|&&r| r).count(),
            trips.iter().filter(|&&t| t).count()
        );

        ctx.raw_table.with_column(Series::new("city".into(), cities))?;
        ctx.raw_table.with_column(indicator_series("relocate_ready", &relocate))?;
        ctx.raw_table.with_column(indicator_series("trips_ready", &trips))?;
        ctx.register_feature("relocate_ready");
        ctx.register_feature("trips_ready");
        Ok(ctx)
    }
}
