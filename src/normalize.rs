// src/normalize.rs
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::error::{Diagnostics, Warning};
use crate::table::{Cell, Table};

// --- Date Parsing ---

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y%m%d"];

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

// 2025年10月1日 / 2025年10月
static IDEOGRAPHIC_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})\s*年\s*(\d{1,2})\s*月\s*(?:(\d{1,2})\s*日)?$")
        .expect("ideographic date pattern is valid")
});

// 2025-11 / 2025/11 / 2025.11
static YEAR_MONTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})[-/.](\d{1,2})$").expect("year-month pattern is valid"));

/// Turns any supported date representation into a calendar date.
///
/// Never fails: anything that cannot be read unambiguously is `None`, and
/// callers treat `None` as "date absent". Time-of-day is discarded.
pub fn parse_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Empty => None,
        Cell::Date(d) => Some(*d),
        Cell::DateTime(dt) => Some(dt.date()),
        Cell::Number(n) => parse_date_text(&n.normalize().to_string()),
        Cell::Text(s) => parse_date_text(s),
    }
}

pub fn parse_date_text(raw: &str) -> Option<NaiveDate> {
    let text = raw.trim();
    if crate::table::is_blank_text(text) {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date);
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.date());
        }
    }

    if let Some(caps) = IDEOGRAPHIC_DATE.captures(text) {
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let day = match caps.get(3) {
            Some(d) => d.as_str().parse().ok()?,
            None => 1,
        };
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if let Some(caps) = YEAR_MONTH.captures(text) {
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, 1);
    }

    debug!("Unparseable date value: {:?}", raw);
    None
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

// --- Bonus Month ---

pub const BONUS_MONTH_COLUMN: &str = "奖金月份";

pub fn default_bonus_month() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 11, 1).unwrap_or(NaiveDate::MIN)
}

/// Resolves the first day of the bonus month.
///
/// Order: explicit override, first non-blank `奖金月份` value in the
/// criteria table, then the default month.
pub fn resolve_bonus_month(
    explicit: Option<&str>,
    criteria: Option<&Table>,
    diag: &mut Diagnostics,
) -> NaiveDate {
    let from_criteria = criteria.and_then(|table| {
        table
            .rows()
            .find_map(|row| row.value(BONUS_MONTH_COLUMN).cloned())
    });

    let candidate = match (explicit, from_criteria) {
        (Some(value), _) if !crate::table::is_blank_text(value) => Cell::text(value),
        (_, Some(cell)) => cell,
        _ => return default_bonus_month(),
    };

    match parse_date(&candidate) {
        Some(date) => first_of_month(date),
        None => {
            let fallback = default_bonus_month();
            diag.warn(Warning::InvalidBonusMonth {
                value: candidate.key_string(),
                fallback,
            });
            fallback
        }
    }
}

// --- Deduplication ---

/// Keeps the first row for every key value of `key_column`, in original order.
///
/// Rows with a blank key are kept untouched (they can never be looked up).
/// Raises one `DuplicateKeys` warning per table listing every colliding key.
pub fn dedupe_by_key(table: &Table, key_column: &str, diag: &mut Diagnostics) -> Table {
    let Some(key_idx) = table.column_index(key_column) else {
        return table.clone();
    };

    let mut seen: HashSet<&Cell> = HashSet::new();
    let mut duplicates: Vec<&Cell> = Vec::new();
    let mut duplicate_set: HashSet<&Cell> = HashSet::new();
    let mut keep = Vec::with_capacity(table.len());

    for row in table.rows() {
        let key = &row.cells()[key_idx];
        if key.is_blank() {
            keep.push(true);
            continue;
        }
        if seen.insert(key) {
            keep.push(true);
        } else {
            keep.push(false);
            if duplicate_set.insert(key) {
                duplicates.push(key);
            }
        }
    }

    if duplicates.is_empty() {
        return table.clone();
    }

    diag.warn(Warning::DuplicateKeys {
        table: table.name().to_string(),
        column: key_column.to_string(),
        keys: duplicates.iter().map(|k| k.key_string()).collect(),
    });
    table.select_rows(&keep)
}

/// Position of the first row for each key of `key_column`.
pub fn first_positions(table: &Table, key_column: &str) -> HashMap<Cell, usize> {
    let mut positions = HashMap::new();
    if let Some(key_idx) = table.column_index(key_column) {
        for row in table.rows() {
            let key = &row.cells()[key_idx];
            if !key.is_blank() {
                positions.entry(key.clone()).or_insert(row.index());
            }
        }
    }
    positions
}
