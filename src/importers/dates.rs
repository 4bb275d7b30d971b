//! Billing date normalization
//!
//! Date columns mix two encodings across exports: spreadsheet day serials and
//! human-entered text. Serials are counted from 1899-12-30 at 86 400 000 ms per
//! day and truncated to the calendar date, which keeps the historical 1900
//! leap-year offset for serials below 61 (serial 1 is 1899-12-31).

use calamine::{Data, DataType};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta};

const MS_PER_DAY: f64 = 86_400_000.0;

/// Date-only text layouts, tried in order (month-first before day-first)
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%b %d, %Y",
    "%b %d %Y",
    "%d %b %Y",
    "%d-%b-%Y",
    "%a %b %d %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

fn excel_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Convert a spreadsheet day serial into a calendar date
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() {
        return None;
    }
    let millis = (serial * MS_PER_DAY).trunc() as i64;
    let delta = TimeDelta::try_milliseconds(millis)?;
    excel_epoch()
        .checked_add_signed(delta)
        .map(|dt| dt.date())
}

/// Best-effort parse of a free-text date
pub fn parse_text_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.date_naive());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt.date());
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

/// Normalize a date cell, whatever its encoding.
///
/// Numeric cells and purely numeric strings are read as day serials.
/// Returns `None` for empty or unparseable cells.
pub fn normalize_date(cell: &Data) -> Option<NaiveDate> {
    match cell {
        Data::Float(f) => serial_to_date(*f),
        Data::Int(i) => serial_to_date(*i as f64),
        Data::DateTime(dt) => serial_to_date(dt.as_f64()),
        Data::DateTimeIso(s) => parse_text_date(s),
        Data::String(s) => match s.trim().parse::<f64>() {
            Ok(serial) => serial_to_date(serial),
            Err(_) => parse_text_date(s),
        },
        _ => {
            if !cell.is_empty() {
                tracing::debug!("Ignoring non-date cell {:?}", cell);
            }
            None
        }
    }
}

/// Normalize a date cell to its `YYYY-MM-DD` form
pub fn normalize_date_iso(cell: &Data) -> Option<String> {
    normalize_date(cell).map(|d| d.format("%Y-%m-%d").to_string())
}
