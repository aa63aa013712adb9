//! Date coercion for the detected date column.
//!
//! Each cell is parsed independently. A cell that does not look like a date
//! becomes null; if no cell of the column parses, the column is left as it was.

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{Cell, Table};

/// Full date/time formats, tried in order.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y.%m.%d %H:%M:%S",
];

/// Date-only formats, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y. %m. %d"];

/// `20240115`
static COMPACT_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})(\d{2})(\d{2})$").expect("valid regex"));

/// `2024년 1월 15일`
static KOREAN_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})\s*년\s*(\d{1,2})\s*월\s*(\d{1,2})\s*일$").expect("valid regex")
});

/// `2024-01`, `2024.01`, `2024/1`, `202401`, `2024년 01월`
static YEAR_MONTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})(?:\s*[-./]\s*|\s*년\s*)?(\d{1,2})\s*(?:월|\.)?$").expect("valid regex")
});

/// `2024`, `2024년`
static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4})\s*년?$").expect("valid regex"));

/// Parse one textual value into a timestamp.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }

    if let Some(caps) = COMPACT_DATE.captures(s) {
        return ymd(&caps[1], &caps[2], Some(&caps[3]));
    }
    if let Some(caps) = KOREAN_DATE.captures(s) {
        return ymd(&caps[1], &caps[2], Some(&caps[3]));
    }
    if let Some(caps) = YEAR_MONTH.captures(s) {
        return ymd(&caps[1], &caps[2], None);
    }
    if let Some(caps) = YEAR.captures(s) {
        return ymd(&caps[1], "1", None);
    }

    None
}

fn ymd(year: &str, month: &str, day: Option<&str>) -> Option<NaiveDateTime> {
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    let day: u32 = day.map_or(Some(1), |d| d.parse().ok())?;
    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)
}

/// Coerce a single cell. Integers are read through their decimal digits
/// (`202401` is January 2024).
pub fn coerce_cell(cell: &Cell) -> Cell {
    let parsed = match cell {
        Cell::Date(d) => Some(*d),
        Cell::Text(s) => parse_datetime(s),
        Cell::Int(i) => parse_datetime(&i.to_string()),
        Cell::Null | Cell::Float(_) => None,
    };
    parsed.map_or(Cell::Null, Cell::Date)
}

/// Coerce `column` of `table` to timestamps in place.
///
/// Returns the number of cells that parsed. When that number is zero the
/// column is not modified.
pub fn coerce_date_column(table: &mut Table, column: &str) -> usize {
    let Some(source) = table.column(column).map(|c| c.values.clone()) else {
        return 0;
    };
    coerce_date_column_from(table, column, &source)
}

/// Like [`coerce_date_column`], but reads the values to coerce from `source`
/// (one cell per row, usually the field text before type inference).
pub fn coerce_date_column_from(table: &mut Table, column: &str, source: &[Cell]) -> usize {
    let Some(col) = table.column_mut(column) else {
        return 0;
    };

    let coerced: Vec<Cell> = source.iter().map(coerce_cell).collect();
    let parsed = coerced.iter().filter(|c| !c.is_null()).count();

    if parsed > 0 && coerced.len() == col.values.len() {
        col.values = coerced;
        parsed
    } else {
        0
    }
}
