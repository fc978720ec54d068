//! Work experience in years.
//!
//! Resumes state experience either as a duration (`Опыт работы 6 лет 1 месяц`)
//! or as one of the HH filter buckets (`от 1 года до 3 лет`, `более 6 лет`).
//! Durations become fractional years, buckets become their numeric midpoint.

use crate::error::Result;
use crate::pipeline::context::Context;
use crate::pipeline::handler::Transform;
use crate::utils::{contains_any, find_column, safe_lower, string_values};
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;
use tracing::{debug, warn};

/// Output column.
pub const EXPERIENCE_COLUMN: &str = "experience_years";

static DURATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:опыт работы|work experience)\s*(?:(\d+)\s*(?:год|лет|years?))?\s*(?:(\d+)\s*(?:месяц|months?))?",
    )
    .expect("Invalid regex: experience duration")
});

static RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:от|from)\s*(\d+)\s*(?:года|год|лет|years?)?\s*(?:до|to)\s*(\d+)")
        .expect("Invalid regex: experience range")
});

static DASH_RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+)\s*[-–—]\s*(\d+)\s*(?:года|год|лет|years?)")
        .expect("Invalid regex: experience dash range")
});

static OVER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:более|больше|свыше|more than|over)\s*(\d+)")
        .expect("Invalid regex: experience lower bound")
});

const NO_EXPERIENCE: [&str; 3] = ["нет опыта", "без опыта", "no experience"];

fn capture_f64(caps: &regex::Captures<'_>, group: usize) -> Option<f64> {
    caps.get(group).and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Parse experience in years from lowercase text.
pub fn parse_experience(text: &str) -> Option<f64> {
    if text.is_empty() {
        return None;
    }
    if contains_any(text, &NO_EXPERIENCE) {
        return Some(0.0);
    }

    if let Some(caps) = DURATION_RE.captures(text) {
        let years = capture_f64(&caps, 1);
        let months = capture_f64(&caps, 2);
        if years.is_some() || months.is_some() {
            return Some(years.unwrap_or(0.0) + months.unwrap_or(0.0) / 12.0);
        }
    }

    if let Some(caps) = RANGE_RE.captures(text).or_else(|| DASH_RANGE_RE.captures(text))
        && let (Some(low), Some(high)) = (capture_f64(&caps, 1), capture_f64(&caps, 2))
    {
        return Some((low + high) / 2.0);
    }

    OVER_RE.captures(text).and_then(|caps| capture_f64(&caps, 1))
}

/// Derives [`EXPERIENCE_COLUMN`] from the column whose name mentions `опыт`.
#[derive(Debug, Clone)]
pub struct ExperienceParser {
    numeric_fill: f64,
}

impl ExperienceParser {
    pub fn new(numeric_fill: f64) -> Self {
        Self { numeric_fill }
    }
}

impl Transform for ExperienceParser {
    fn transform(&self, mut ctx: Context) -> Result<Context> {
        let height = ctx.table()?.height();

        let years: Vec<f64> = match find_column(&ctx.raw_table, "опыт") {
            Some(source) => {
                let parsed: Vec<Option<f64>> = string_values(&ctx.raw_table, &source)?
                    .iter()
                    .map(|v| parse_experience(&safe_lower(v.as_deref())))
                    .collect();
                debug!(
                    "Experience parsed for {}/{} rows",
                    parsed.iter().filter(|p| p.is_some()).count(),
                    parsed.len()
                );
                parsed
                    .into_iter()
                    .map(|p| p.unwrap_or(self.numeric_fill))
                    .collect()
            }
            None => {
                warn!("Experience column not found; filling with {}", self.numeric_fill);
                vec![self.numeric_fill; height]
            }
        };

        ctx.raw_table
            .with_column(Series::new(EXPERIENCE_COLUMN.into(), years))?;
        ctx.register_feature(EXPERIENCE_COLUMN);
        Ok(ctx)
    }
}
