//! Job-title grouping.
//!
//! Free-text titles (`Ведущий Python-разработчик`, `Senior QA Engineer`) are
//! folded into a small set of coarse categories by keyword. Rules are ordered
//! and the first match wins, so narrower roles come before broader ones.

use crate::error::Result;
use crate::pipeline::context::Context;
use crate::pipeline::handler::Transform;
use crate::utils::{contains_any, find_column, safe_lower, string_values};
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;
use tracing::{info, warn};

pub const DESIRED_TITLE_HINT: &str = "ищет работу на должность";
pub const CURRENT_TITLE_HINT: &str = "нынешняя должность";
pub const EMPLOYER_HINT: &str = "место работы";

/// Fallback for titles no rule recognises.
pub const OTHER_CATEGORY: &str = "Прочее";

static IT_WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bit\b").expect("Invalid regex: it word"));

struct Rule {
    category: &'static str,
    keywords: &'static [&'static str],
}

const SPECIALIST_RULES: &[Rule] = &[
    Rule {
        category: "Системный администратор",
        keywords: &["системный администратор", "system administrator", "sysadmin"],
    },
    Rule {
        category: "DevOps/SRE",
        keywords: &["devops", "sre", "site reliability"],
    },
    Rule {
        category: "Администратор баз данных",
        keywords: &["dba", "администратор баз данных", "database administrator"],
    },
    Rule {
        category: "Data Scientist/ML",
        keywords: &["data scientist", "ds ", "ml engineer", "machine learning"],
    },
    Rule {
        category: "Аналитик",
        keywords: &["аналитик данных", "data analyst", "bi analyst", "business analyst"],
    },
    Rule {
        category: "Тестировщик",
        keywords: &["тестировщик", "qa", "quality assurance"],
    },
    Rule {
        category: "Программист/Разработчик",
        keywords: &[
            "разработчик",
            "программист",
            "developer",
            "software engineer",
            "backend",
            "frontend",
            "fullstack",
            "ios",
            "android",
            "java",
            "python",
            "c++",
            "golang",
            "php",
            "javascript",
            "node.js",
            "react",
            "vue",
            "1c",
            "1с",
            "unity",
        ],
    },
];

const GENERAL_RULES: &[Rule] = &[
    Rule {
        category: "Менеджер проектов/Продукта",
        keywords: &[
            "product manager",
            "product owner",
            "продакт",
            "product",
            "проектный менеджер",
            "project manager",
            "pm ",
        ],
    },
    Rule {
        category: "Маркетинг/PR/Контент",
        keywords: &[
            "маркетолог",
            "marketing",
            "smm",
            "таргет",
            "seo",
            "контент",
            "pr",
            "copywriter",
            "копирайтер",
        ],
    },
    Rule {
        category: "Продажи/Клиенты",
        keywords: &[
            "продаж",
            "sales",
            "account manager",
            "менеджер по работе с клиентами",
            "клиентами",
            "торговый представитель",
            "кассир",
        ],
    },
    Rule {
        category: "Финансы/Бухгалтерия",
        keywords: &["бухгалтер", "accountant", "финанс", "экономист", "аудитор"],
    },
    Rule {
        category: "HR/Рекрутер",
        keywords: &["hr", "рекрутер", "подбор персонала", "recruiter", "talent"],
    },
    Rule {
        category: "Юрист",
        keywords: &["юрист", "lawyer", "legal"],
    },
    Rule {
        category: "Логистика/Склад/Транспорт",
        keywords: &[
            "логист",
            "logistics",
            "склад",
            "warehouse",
            "курьер",
            "доставка",
            "водитель",
            "driver",
        ],
    },
    Rule {
        category: "Дизайн/Креатив",
        keywords: &[
            "дизайнер",
            "designer",
            "ux",
            "ui",
            "graphic",
            "графический",
            "иллюстратор",
            "illustrator",
            "3d",
            "2d",
        ],
    },
    Rule {
        category: "Инженерия/Производство/Строительство",
        keywords: &[
            "инженер",
            "engineer",
            "технолог",
            "электрик",
            "mechanic",
            "механик",
            "строител",
            "construction",
        ],
    },
    Rule {
        category: "Административный персонал",
        keywords: &[
            "секретарь",
            "assistant",
            "ассистент",
            "офис-менеджер",
            "администратор",
            "reception",
        ],
    },
    Rule {
        category: "Оператор",
        keywords: &["оператор", "operator"],
    },
    Rule {
        category: "Специалист (общий)",
        keywords: &["специалист", "specialist"],
    },
];

fn first_match(rules: &[Rule], text: &str) -> Option<&'static str> {
    rules
        .iter()
        .find(|rule| contains_any(text, rule.keywords))
        .map(|rule| rule.category)
}

/// Coarse category for a job title; `None` when the title is blank.
pub fn categorize_job_title(title: Option<&str>) -> Option<&'static str> {
    let lower = safe_lower(title);
    if lower.is_empty() {
        return None;
    }
    // Trailing space lets "ds "/"pm " match at the end of a title.
    let text = format!("{lower} ");

    let category = first_match(SPECIALIST_RULES, &text)
        .or_else(|| {
            (IT_WORD_RE.is_match(&text) || text.contains("айти")).then_some("IT-специалист")
        })
        .or_else(|| first_match(GENERAL_RULES, &text))
        .unwrap_or(OTHER_CATEGORY);
    Some(category)
}

/// Derives `job_category` and `current_job_category`, then drops the raw
/// title and employer columns.
#[derive(Debug, Clone)]
pub struct JobCategoryParser {
    missing_category: String,
}

impl JobCategoryParser {
    pub fn new(missing_category: impl Into<String>) -> Self {
        Self {
            missing_category: missing_category.into(),
        }
    }

    fn categorize(&self, df: &DataFrame, source: Option<&str>, target: &str) -> Result<Series> {
        let categories: Vec<String> = match source {
            Some(name) => string_values(df, name)?
                .iter()
                .map(|v| {
                    let title = v.as_deref().filter(|t| *t != self.missing_category);
                    categorize_job_title(title)
                        .map(str::to_string)
                        .unwrap_or_else(|| self.missing_category.clone())
                })
                .collect(),
            None => {
                warn!("Source column for '{}' not found; using '{}'", target, self.missing_category);
                vec![self.missing_category.clone(); df.height()]
            }
        };
        Ok(Series::new(target.into(), categories))
    }
}

impl Transform for JobCategoryParser {
    fn transform(&self, mut ctx: Context) -> Result<Context> {
        let df = ctx.table()?;
        let desired = find_column(df, DESIRED_TITLE_HINT);
        let current = find_column(df, CURRENT_TITLE_HINT);

        let job = self.categorize(df, desired.as_deref(), "job_category")?;
        let current_job = self.categorize(df, current.as_deref(), "current_job_category")?;
        ctx.raw_table.with_column(job)?;
        ctx.raw_table.with_column(current_job)?;

        let mut drop_cols: Vec<String> = desired.into_iter().chain(current).collect();
        if let Some(employer) = find_column(&ctx.raw_table, EMPLOYER_HINT)
            && !drop_cols.contains(&employer)
        {
            drop_cols.push(employer);
        }

        if !drop_cols.is_empty() {
            let cols_ref: Vec<PlSmallStr> = drop_cols.iter().map(|s| s.as_str().into()).collect();
            ctx.raw_table = ctx.raw_table.drop_many(cols_ref);
            info!("Dropped job title columns: {:?}", drop_cols);
            ctx.diagnostics.columns_dropped.extend(drop_cols);
        }

        Ok(ctx)
    }
}
