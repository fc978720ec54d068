//! Shared utilities for the preprocessing handlers.
//!
//! Text normalisation for the free-form HH fields and small helpers for
//! pulling typed values out of polars columns.

use crate::error::{DataError, Result};
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;

// =============================================================================
// Text Utilities
// =============================================================================

static SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("Invalid regex: spaces"));

static MULTI_SPLIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[,;/]").expect("Invalid regex: multi-value separators"));

static CITY_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(г\.|город)\s*").expect("Invalid regex: city prefix"));

/// Common missing value markers in data.
pub const MISSING_MARKERS: [&str; 8] = ["nan", "null", "none", "n/a", "na", "#n/a", "-", "—"];

/// Collapse runs of whitespace (including NBSP) to a single space and trim.
pub fn normalize_spaces(s: &str) -> String {
    SPACE_RE
        .replace_all(&s.replace('\u{a0}', " "), " ")
        .trim()
        .to_string()
}

/// Normalised lowercase form of an optional value; empty when missing.
pub fn safe_lower(s: Option<&str>) -> String {
    s.map(|v| normalize_spaces(v).to_lowercase())
        .unwrap_or_default()
}

/// Check if a string is blank or a missing value marker.
///
/// # Example
///
/// ```rust,ignore
/// assert!(is_missing_marker("  "));
/// assert!(is_missing_marker("N/A"));
/// assert!(!is_missing_marker("Москва"));
/// ```
pub fn is_missing_marker(s: &str) -> bool {
    let lower = normalize_spaces(s).to_lowercase();
    lower.is_empty() || MISSING_MARKERS.iter().any(|&marker| lower == marker)
}

/// The value if it carries information, `None` when it is missing, a missing
/// marker, or the imputation sentinel.
pub fn present<'a>(value: Option<&'a str>, sentinel: &str) -> Option<&'a str> {
    value.filter(|v| !is_missing_marker(v) && normalize_spaces(v) != sentinel)
}

/// Split a multi-value HH field like `"полная занятость, частичная занятость"`
/// into lowercase tokens.
pub fn split_multi_categories(text: &str) -> Vec<String> {
    MULTI_SPLIT_RE
        .split(&normalize_spaces(text))
        .map(|part| normalize_spaces(part).to_lowercase())
        .filter(|part| !part.is_empty())
        .collect()
}

/// True when `haystack` contains any of `needles`.
pub fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

/// Normalise a city name for grouping.
///
/// Lowercases, strips `г.`/`город` prefixes, unifies dashes and maps common
/// English or abbreviated spellings onto the Russian name.
pub fn normalize_city_name(value: &str) -> String {
    let lower = normalize_spaces(value).to_lowercase().replace('\u{feff}', "");
    let stripped = CITY_PREFIX_RE.replace(&lower, "");
    let unified = stripped.trim().replace(['—', '–'], "-");

    let canonical = match unified.as_str() {
        "msk" | "moscow" => "москва",
        "spb" | "saint petersburg" | "st petersburg" | "st. petersburg" | "petersburg"
        | "saint-petersburg" | "санкт петербург" | "питер" => "санкт-петербург",
        other => other,
    };
    canonical.to_string()
}

// =============================================================================
// Column Access Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Names of all columns, in frame order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// First column whose lowercase name contains `needle`.
pub fn find_column(df: &DataFrame, needle: &str) -> Option<String> {
    let needle = needle.to_lowercase();
    column_names(df)
        .into_iter()
        .find(|name| name.to_lowercase().contains(&needle))
}

/// Fetch a column, mapping absence to [`DataError::ColumnNotFound`].
pub fn require_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name)
        .map_err(|_| DataError::ColumnNotFound(name.to_string()))
}

/// Read a column as optional owned strings.
pub fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = require_column(df, name)?.cast(&DataType::String)?;
    let values = column
        .as_materialized_series()
        .str()?
        .into_iter()
        .map(|opt| opt.map(str::to_string))
        .collect();
    Ok(values)
}

/// Read a column as optional `f64` values.
pub fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = require_column(df, name)?.cast(&DataType::Float64)?;
    let values = column.as_materialized_series().f64()?.into_iter().collect();
    Ok(values)
}

/// Fill null values in a string Series with a specific value.
pub fn fill_string_nulls(series: &Series, fill_value: &str) -> PolarsResult<Series> {
    let str_series = series.str()?;
    let filled: Vec<String> = str_series
        .into_iter()
        .map(|opt| opt.unwrap_or(fill_value).to_string())
        .collect();

    Ok(Series::new(series.name().clone(), filled))
}

/// Build a 0/1 `f64` series from booleans.
pub fn indicator_series(name: &str, flags: &[bool]) -> Series {
    let values: Vec<f64> = flags.iter().map(|&f| if f { 1.0 } else { 0.0 }).collect();
    Series::new(name.into(), values)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_spaces() {
        assert_eq!(normalize_spaces("  a \u{a0} b\t\nc "), "a b c");
        assert_eq!(normalize_spaces(""), "");
    }

    #[test]
    fn test_safe_lower() {
        assert_eq!(safe_lower(Some("  Москва  ")), "москва");
        assert_eq!(safe_lower(None), "");
    }

    #[test]
    fn test_is_missing_marker() {
        assert!(is_missing_marker(""));
        assert!(is_missing_marker("   "));
        assert!(is_missing_marker("N/A"));
        assert!(is_missing_marker("nan"));
        assert!(!is_missing_marker("42"));
        assert!(!is_missing_marker("Москва"));
    }

    #[test]
    fn test_present() {
        assert_eq!(present(Some("Москва"), "Не указано"), Some("Москва"));
        assert_eq!(present(Some(" Не указано "), "Не указано"), None);
        assert_eq!(present(Some("nan"), "Не указано"), None);
        assert_eq!(present(None, "Не указано"), None);
    }

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_split_multi_categories() {
        assert_eq!(
            split_multi_categories(" полная занятость, Частичная занятость;стажировка/ "),
            vec!["полная занятость", "частичная занятость", "стажировка"]
        );
        assert!(split_multi_categories("  ").is_empty());
    }

    #[test]
    fn test_normalize_city_name() {
        assert_eq!(normalize_city_name("Moscow"), "москва");
        assert_eq!(normalize_city_name("г. Казань"), "казань");
        assert_eq!(normalize_city_name("Питер"), "санкт-петербург");
        assert_eq!(normalize_city_name("Ростов–на–Дону"), "ростов-на-дону");
    }

    #[test]
    fn test_find_column() {
        let df = df! {
            "Ищет работу на должность:" => ["a"],
            "ЗП" => ["1"],
        }
        .unwrap();
        assert_eq!(
            find_column(&df, "ищет работу на должность"),
            Some("Ищет работу на должность:".to_string())
        );
        assert_eq!(find_column(&df, "опыт"), None);
    }

    #[test]
    fn test_string_values_missing_column() {
        let df = df! { "a" => ["x"] }.unwrap();
        let err = string_values(&df, "b").unwrap_err();
        assert!(matches!(err, DataError::ColumnNotFound(name) if name == "b"));
    }

    #[test]
    fn test_fill_string_nulls() {
        let series = Series::new("test".into(), &[Some("a"), None, Some("c")]);
        let filled = fill_string_nulls(&series, "Не указано").unwrap();
        let values: Vec<Option<&str>> = filled.str().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some("a"), Some("Не указано"), Some("c")]);
    }
}
