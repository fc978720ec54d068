//! Education level and graduation year from `Образование и ВУЗ`.

use crate::error::Result;
use crate::pipeline::context::Context;
use crate::pipeline::handler::Transform;
use crate::utils::{contains_any, safe_lower, string_values};
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;
use std::ops::RangeInclusive;
use tracing::warn;

pub const EDUCATION_SOURCE_COLUMN: &str = "Образование и ВУЗ";

static YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(19\d{2}|20\d{2})").expect("Invalid regex: year"));

/// Plausible graduation years.
pub const YEAR_RANGE: RangeInclusive<u32> = 1950..=2035;

/// Keyword rules, first match wins.
const LEVELS: [(&[&str], &str); 6] = [
    (&["доктор"], "Доктор наук"),
    (&["кандидат"], "Кандидат наук"),
    (&["неокончен", "incomplete higher"], "Неоконченное высшее"),
    (
        &["высшее", "higher education", "bachelor", "master"],
        "Высшее",
    ),
    (
        &["среднее специаль", "college", "vocational"],
        "Среднее специальное",
    ),
    (&["среднее", "secondary"], "Среднее"),
];

/// Education level from lowercase text.
pub fn parse_level(text: &str) -> Option<&'static str> {
    LEVELS
        .iter()
        .find(|(keywords, _)| contains_any(text, keywords))
        .map(|(_, level)| *level)
}

/// First plausible four-digit year.
pub fn parse_year(text: &str) -> Option<f64> {
    YEAR_RE
        .captures(text)
        .and_then(|caps| caps[1].parse::<u32>().ok())
        .filter(|year| YEAR_RANGE.contains(year))
        .map(f64::from)
}

/// Derives `education_level` (categorical) and `education_year` (numeric).
#[derive(Debug, Clone)]
pub struct EducationParser {
    missing_category: String,
    numeric_fill: f64,
}

impl EducationParser {
    pub fn new(missing_category: impl Into<String>, numeric_fill: f64) -> Self {
        Self {
            missing_category: missing_category.into(),
            numeric_fill,
        }
    }
}

impl Transform for EducationParser {
    fn transform(&self, mut ctx: Context) -> Result<Context> {
        let height = ctx.table()?.height();

        let lowered: Vec<String> = if ctx.raw_table.column(EDUCATION_SOURCE_COLUMN).is_ok() {
            string_values(&ctx.raw_table, EDUCATION_SOURCE_COLUMN)?
                .iter()
                .map(|v| safe_lower(v.as_deref()))
                .collect()
        } else {
            warn!("Column '{}' not found; using defaults", EDUCATION_SOURCE_COLUMN);
            vec![String::new(); height]
        };

        let levels: Vec<String> = lowered
            .iter()
            .map(|t| {
                parse_level(t)
                    .map(str::to_string)
                    .unwrap_or_else(|| self.missing_category.clone())
            })
            .collect();
        let years: Vec<f64> = lowered
            .iter()
            .map(|t| parse_year(t).unwrap_or(self.numeric_fill))
            .collect();

        ctx.raw_table
            .with_column(Series::new("education_level".into(), levels))?;
        ctx.raw_table
            .with_column(Series::new("education_year".into(), years))?;
        ctx.register_feature("education_year");
        Ok(ctx)
    }
}
