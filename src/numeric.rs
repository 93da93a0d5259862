//! Locale-aware numeric parsing for trial balance cells.
//!
//! Turkish exports mix "1.234,56", "1234.56", "1,234.56" and currency
//! suffixes within a single file. Parsing returns an explicit issue instead
//! of silently coercing; the caller decides whether default-to-zero applies.

use crate::schema::Cell;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NumericIssue {
    #[error("cell is empty")]
    Empty,

    #[error("no digits in '{0}'")]
    NoDigits(String),

    #[error("could not parse '{0}' as a number")]
    Unparseable(String),
}

/// Parse a string with locale-mixed separators.
///
/// When both '.' and ',' appear, whichever occurs last is taken as the
/// decimal separator and the other is stripped as grouping. A lone ','
/// is treated as a decimal comma. All remaining characters outside
/// `[0-9.-]` (currency symbols, spaces) are stripped before parsing.
pub fn parse_locale_number(raw: &str) -> Result<f64, NumericIssue> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(NumericIssue::Empty);
    }
    if !trimmed.chars().any(|c| c.is_ascii_digit()) {
        return Err(NumericIssue::NoDigits(trimmed.to_string()));
    }

    let last_dot = trimmed.rfind('.');
    let last_comma = trimmed.rfind(',');

    let normalized: String = match (last_dot, last_comma) {
        (Some(d), Some(c)) => {
            let (decimal, grouping) = if c > d { (',', '.') } else { ('.', ',') };
            trimmed
                .chars()
                .filter(|&ch| ch != grouping)
                .map(|ch| if ch == decimal { '.' } else { ch })
                .collect()
        }
        (None, Some(_)) => trimmed.replace(',', "."),
        _ => trimmed.to_string(),
    };

    let cleaned: String = normalized
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    cleaned
        .parse::<f64>()
        .map_err(|_| NumericIssue::Unparseable(trimmed.to_string()))
}

/// Parse a grid cell. Numbers pass through untouched; text goes through
/// the locale rules above.
pub fn parse_numeric_cell(cell: &Cell) -> Result<f64, NumericIssue> {
    match cell {
        Cell::Number(n) => Ok(*n),
        Cell::Empty => Err(NumericIssue::Empty),
        Cell::Text(s) => parse_locale_number(s),
    }
}
