//! Gender and age from the combined `Пол, возраст` column.

use crate::error::Result;
use crate::pipeline::context::Context;
use crate::pipeline::handler::Transform;
use crate::utils::{find_column, safe_lower, string_values};
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;
use std::ops::RangeInclusive;
use tracing::{debug, warn};

static AGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,3})\s*(?:год|лет|years?\b)").expect("Invalid regex: age")
});

/// Ages outside this range are treated as unparseable.
pub const AGE_RANGE: RangeInclusive<u32> = 14..=100;

/// Parse gender from lowercase text.
pub fn parse_gender(text: &str) -> Option<&'static str> {
    // Feminine forms first: "female" contains "male".
    if text.contains("женщина") || text.contains("female") {
        Some("Женщина")
    } else if text.contains("мужчина") || text.contains("male") {
        Some("Мужчина")
    } else {
        None
    }
}

/// Parse age in years from lowercase text.
pub fn parse_age(text: &str) -> Option<f64> {
    AGE_RE
        .captures(text)
        .and_then(|caps| caps[1].parse::<u32>().ok())
        .filter(|age| AGE_RANGE.contains(age))
        .map(f64::from)
}

/// Derives `gender` (categorical) and `age` (numeric).
#[derive(Debug, Clone)]
pub struct DemographicsParser {
    missing_category: String,
    numeric_fill: f64,
}

impl DemographicsParser {
    pub fn new(missing_category: impl Into<String>, numeric_fill: f64) -> Self {
        Self {
            missing_category: missing_category.into(),
            numeric_fill,
        }
    }
}

impl Transform for DemographicsParser {
    fn transform(&self, mut ctx: Context) -> Result<Context> {
        let height = ctx.table()?.height();

        let (genders, ages) = match find_column(&ctx.raw_table, "возраст") {
            Some(source) => {
                let lowered: Vec<String> = string_values(&ctx.raw_table, &source)?
                    .iter()
                    .map(|v| safe_lower(v.as_deref()))
                    .collect();

                let genders: Vec<String> = lowered
                    .iter()
                    .map(|t| {
                        parse_gender(t)
                            .map(str::to_string)
                            .unwrap_or_else(|| self.missing_category.clone())
                    })
                    .collect();

                let parsed: Vec<Option<f64>> = lowered.iter().map(|t| parse_age(t)).collect();
                let unparsed = parsed.iter().filter(|a| a.is_none()).count();
                if unparsed > 0 {
                    debug!("Age unparseable in {} rows; filled with {}", unparsed, self.numeric_fill);
                }
                let ages: Vec<f64> = parsed
                    .into_iter()
                    .map(|a| a.unwrap_or(self.numeric_fill))
                    .collect();

                (genders, ages)
            }
            None => {
                warn!("Gender/age column not found; using defaults");
                (
                    vec![self.missing_category.clone(); height],
                    vec![self.numeric_fill; height],
                )
            }
        };

        ctx.raw_table.with_column(Series::new("gender".into(), genders))?;
        ctx.raw_table.with_column(Series::new("age".into(), ages))?;
        ctx.register_feature("age");
        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::f64_values;

    #[test]
    fn test_parse_gender() {
        assert_eq!(parse_gender("мужчина , 39 лет"), Some("Мужчина"));
        assert_eq!(parse_gender("женщина , 25 лет"), Some("Женщина"));
        assert_eq!(parse_gender("female, 30 years"), Some("Женщина"));
        assert_eq!(parse_gender("male, 30 years"), Some("Мужчина"));
        assert_eq!(parse_gender("39 лет"), None);
    }

    #[test]
    fn test_parse_age() {
        assert_eq!(parse_age("мужчина , 39 лет , родился 27 ноября 1979"), Some(39.0));
        assert_eq!(parse_age("женщина , 21 год"), Some(21.0));
        assert_eq!(parse_age("женщина , 22 года"), Some(22.0));
        assert_eq!(parse_age("male, 45 years old"), Some(45.0));
        assert_eq!(parse_age("мужчина , 7 лет"), None);
        assert_eq!(parse_age("мужчина"), None);
    }

    #[test]
    fn test_derives_gender_and_age() {
        let df = df! {
            "Пол, возраст" => [Some("Мужчина , 39 лет"), Some("Женщина , 25 лет"), None],
        }
        .unwrap();

        let ctx = DemographicsParser::new("Не указано", 0.0)
            .transform(Context::from_frame(df))
            .unwrap();

        let genders = string_values(&ctx.raw_table, "gender").unwrap();
        assert_eq!(
            genders,
            vec![
                Some("Мужчина".to_string()),
                Some("Женщина".to_string()),
                Some("Не указано".to_string())
            ]
        );
        assert_eq!(
            f64_values(&ctx.raw_table, "age").unwrap(),
            vec![Some(39.0), Some(25.0), Some(0.0)]
        );
        assert_eq!(ctx.feature_columns, vec!["age"]);
    }
}
