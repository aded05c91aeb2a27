//! Per-column metadata derived at import time: the inferred value type and
//! whether the column carries any information at all.

use std::fmt;

use chrono::NaiveDate;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d.%m.%Y"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnType {
    #[default]
    String,
    Integer,
    Float,
    Boolean,
    Date,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Boolean => "boolean",
            ColumnType::Date => "date",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
struct TypeCandidate {
    seen_value: bool,
    possible_integer: bool,
    possible_float: bool,
    possible_boolean: bool,
    possible_date: bool,
}

impl TypeCandidate {
    fn new() -> Self {
        Self {
            seen_value: false,
            possible_integer: true,
            possible_float: true,
            possible_boolean: true,
            possible_date: true,
        }
    }

    fn update(&mut self, raw: &str) {
        let value = strip_quotes(raw.trim());
        if value.is_empty() {
            return;
        }
        self.seen_value = true;
        if self.possible_boolean
            && !matches!(
                value.to_ascii_lowercase().as_str(),
                "true" | "false" | "yes" | "no"
            )
        {
            self.possible_boolean = false;
        }
        if self.possible_integer && value.parse::<i64>().is_err() {
            self.possible_integer = false;
        }
        if self.possible_float && value.parse::<f64>().is_err() {
            self.possible_float = false;
        }
        if self.possible_date && !looks_like_date(value) {
            self.possible_date = false;
        }
    }

    fn decide(&self) -> ColumnType {
        if !self.seen_value {
            ColumnType::String
        } else if self.possible_boolean {
            ColumnType::Boolean
        } else if self.possible_integer {
            ColumnType::Integer
        } else if self.possible_float {
            ColumnType::Float
        } else if self.possible_date {
            ColumnType::Date
        } else {
            ColumnType::String
        }
    }
}

fn strip_quotes(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

fn looks_like_date(value: &str) -> bool {
    DATE_FORMATS
        .iter()
        .any(|format| NaiveDate::parse_from_str(value, format).is_ok())
}

/// Infers a column type from every non-empty value. A type wins only when all
/// values parse as it; an all-empty column is a string column.
pub fn infer_column_type(values: &[String]) -> ColumnType {
    let mut candidate = TypeCandidate::new();
    for value in values {
        candidate.update(value);
    }
    candidate.decide()
}

/// True when at least two values differ. Empty and single-row columns never vary.
pub fn has_variable_content(values: &[String]) -> bool {
    match values.split_first() {
        Some((first, rest)) => rest.iter().any(|value| value != first),
        None => false,
    }
}
