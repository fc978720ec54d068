//! Salary parsing and target extraction.
//!
//! Salaries arrive as free text (`"50 000 руб."`, `"1 500 USD"`,
//! `"от 40 до 60 тыс. руб."`). [`SalaryParser`] turns one such string into an
//! amount in the reference currency. The row cleaner uses it to decide which
//! rows to keep and [`TargetExtractor`] uses it to build the target column.

use crate::config::FxRates;
use crate::error::{DataError, Result};
use crate::pipeline::context::Context;
use crate::pipeline::handler::Transform;
use crate::utils::{is_missing_marker, normalize_spaces, string_values};
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Column holding the normalised salary.
pub const TARGET_COLUMN: &str = "target_salary";

/// Column holding the detected currency code.
pub const CURRENCY_COLUMN: &str = "salary_currency";

static NUM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d[\d ]*").expect("Invalid regex: digit groups"));

static THOUSANDS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d\s*(?:тыс|k\b)").expect("Invalid regex: thousands suffix"));

/// Why a salary string was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SalaryRejection {
    /// Empty or a missing marker.
    Missing,
    /// "по договорённости" and similar.
    Negotiable,
    /// No digits found.
    NoAmount,
    /// A digit group does not fit in a `u64`.
    AmountTooLarge,
    /// Currency marker not present in the rate table.
    UnknownCurrency,
    /// Amount converts to zero or less.
    NonPositive,
}

impl SalaryRejection {
    pub fn description(&self) -> &'static str {
        match self {
            Self::Missing => "salary is missing",
            Self::Negotiable => "salary is negotiable",
            Self::NoAmount => "no amount found",
            Self::AmountTooLarge => "amount is too large",
            Self::UnknownCurrency => "currency not in rate table",
            Self::NonPositive => "amount is not positive",
        }
    }
}

/// A successfully parsed salary.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSalary {
    /// Amount in the reference currency.
    pub amount: f64,
    /// Currency the value was quoted in.
    pub currency: String,
}

/// Detect a currency code from lowercase salary text.
pub fn detect_currency(text: &str) -> Option<&'static str> {
    const MARKERS: [(&[&str], &str); 10] = [
        (&["руб", "rur", "rub", "₽"], "RUB"),
        (&["usd", "$"], "USD"),
        (&["eur", "€"], "EUR"),
        (&["kzt", "тенге"], "KZT"),
        (&["byn", "бел"], "BYN"),
        (&["uah", "грн"], "UAH"),
        (&["uzs", "сум"], "UZS"),
        (&["gel", "лари"], "GEL"),
        (&["amd", "драм"], "AMD"),
        (&["azn", "манат"], "AZN"),
    ];

    MARKERS
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| text.contains(*n)))
        .map(|(_, code)| *code)
}

/// Integers in order of appearance; digit groups may contain spaces.
///
/// Fails with [`SalaryRejection::AmountTooLarge`] when a group overflows `u64`.
pub fn extract_numbers(text: &str) -> std::result::Result<Vec<u64>, SalaryRejection> {
    NUM_RE
        .find_iter(text)
        .map(|m| {
            m.as_str()
                .replace(' ', "")
                .parse::<u64>()
                .map_err(|_| SalaryRejection::AmountTooLarge)
        })
        .collect()
}

/// Parses salary text into the reference currency.
#[derive(Debug, Clone)]
pub struct SalaryParser {
    fx: FxRates,
}

impl SalaryParser {
    pub fn new(fx: FxRates) -> Self {
        Self { fx }
    }

    pub fn fx(&self) -> &FxRates {
        &self.fx
    }

    /// Parse one salary value.
    ///
    /// A range collapses to the midpoint of its first two numbers; a
    /// `тыс`/`k` suffix multiplies by 1000; text without a currency marker is
    /// taken to be in the reference currency.
    pub fn parse(&self, raw: Option<&str>) -> std::result::Result<ParsedSalary, SalaryRejection> {
        let Some(raw) = raw.filter(|r| !is_missing_marker(r)) else {
            return Err(SalaryRejection::Missing);
        };

        let text = normalize_spaces(raw);
        let lower = text.to_lowercase();
        if lower.contains("договор") || lower.contains("negotiable") {
            return Err(SalaryRejection::Negotiable);
        }

        let currency = detect_currency(&lower).unwrap_or(self.fx.reference.as_str());

        let numbers = extract_numbers(&text)?;
        let mut amount = match numbers.as_slice() {
            [] => return Err(SalaryRejection::NoAmount),
            [single] => *single as f64,
            [low, high, ..] => (*low as f64 + *high as f64) / 2.0,
        };

        if THOUSANDS_RE.is_match(&lower) {
            amount *= 1000.0;
        }

        let rate = self
            .fx
            .rate(currency)
            .ok_or(SalaryRejection::UnknownCurrency)?;

        let value = amount * rate;
        if value <= 0.0 {
            return Err(SalaryRejection::NonPositive);
        }

        Ok(ParsedSalary {
            amount: value,
            currency: currency.to_string(),
        })
    }
}

/// Writes the parsed salary into [`TARGET_COLUMN`] and the context's target vector.
///
/// Precondition: every row's salary parses (the row cleaner guarantees this).
#[derive(Debug, Clone)]
pub struct TargetExtractor {
    salary_column: String,
    parser: SalaryParser,
}

impl TargetExtractor {
    pub fn new(salary_column: impl Into<String>, fx: FxRates) -> Self {
        Self {
            salary_column: salary_column.into(),
            parser: SalaryParser::new(fx),
        }
    }
}

impl Transform for TargetExtractor {
    fn transform(&self, mut ctx: Context) -> Result<Context> {
        let raw = string_values(ctx.table()?, &self.salary_column)?;

        let mut targets = Vec::with_capacity(raw.len());
        let mut currencies = Vec::with_capacity(raw.len());
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();

        for (row, value) in raw.iter().enumerate() {
            let parsed = self.parser.parse(value.as_deref()).map_err(|rejection| {
                DataError::invalid_value(
                    &self.salary_column,
                    row,
                    value.clone().unwrap_or_default(),
                    rejection.description(),
                )
            })?;

            *counts.entry(parsed.currency.clone()).or_insert(0) += 1;
            targets.push(parsed.amount);
            currencies.push(parsed.currency);
        }

        debug!("Salary currencies: {:?}", counts);

        ctx.raw_table
            .with_column(Series::new(TARGET_COLUMN.into(), targets.clone()))?;
        ctx.raw_table
            .with_column(Series::new(CURRENCY_COLUMN.into(), currencies))?;

        ctx.target_column = Some(TARGET_COLUMN.to_string());
        ctx.target_vector = Some(targets);
        ctx.diagnostics.currency_counts = counts;
        ctx.diagnostics.fx_rates_source = Some(self.parser.fx().source.clone());

        info!(
            "Extracted target '{}' for {} rows ({} reference)",
            TARGET_COLUMN,
            ctx.height(),
            self.parser.fx().reference
        );
        Ok(ctx)
    }
}
