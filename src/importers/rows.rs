//! Row extraction and cell coercion
//!
//! Coercion never fails: a quantity that cannot be read counts as zero and a
//! date that cannot be read is reported as absent.

use calamine::{Data, DataType};
use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

use super::dates;
use super::schema::GroupDimension;
use super::SalesSheet;

/// Key used for rows whose grouping column is empty
pub const UNKNOWN_GROUP: &str = "UNKNOWN";

/// Leading numeric prefix, as a lenient float parser reads it ("12.5 kg" -> 12.5)
static NUMERIC_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?").expect("valid numeric prefix regex")
});

static EMPTY_CELL: Data = Data::Empty;

/// One normalized data row, keyed by normalized column label in sheet order
pub type Record = serde_json::Map<String, Value>;

/// Render a cell the way it reads in the sheet
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Float(f) => format_float(*f),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => format_float(dt.as_f64()),
        _ => String::new(),
    }
}

fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

fn decimal_from_f64(f: f64) -> Option<Decimal> {
    if !f.is_finite() {
        return None;
    }
    Decimal::from_str(&f.to_string())
        .ok()
        .or_else(|| Decimal::from_f64(f))
}

/// Read a quantity cell; anything non-numeric is zero
pub fn coerce_quantity(cell: &Data) -> Decimal {
    let value = match cell {
        Data::Float(f) => decimal_from_f64(*f),
        Data::Int(i) => Some(Decimal::from(*i)),
        Data::DateTime(dt) => decimal_from_f64(dt.as_f64()),
        Data::String(s) => parse_numeric_prefix(s),
        _ => None,
    };
    value.unwrap_or_else(|| {
        if !cell.is_empty() {
            tracing::debug!("Quantity cell {:?} is not numeric, counting as 0", cell);
        }
        Decimal::ZERO
    })
}

fn parse_numeric_prefix(text: &str) -> Option<Decimal> {
    let m = NUMERIC_PREFIX.find(text.trim_start())?;
    let literal = m.as_str();
    Decimal::from_str(literal)
        .ok()
        .or_else(|| Decimal::from_scientific(literal).ok())
        .or_else(|| literal.parse::<f64>().ok().and_then(decimal_from_f64))
}

/// Convert a cell into its JSON pass-through value
pub fn cell_to_json(cell: &Data) -> Value {
    match cell {
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Value::String(s.clone()),
        Data::Int(i) => Value::from(*i),
        Data::Float(f) => float_to_json(*f),
        Data::DateTime(dt) => float_to_json(dt.as_f64()),
        Data::Bool(b) => Value::Bool(*b),
        _ => Value::Null,
    }
}

fn float_to_json(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() < 9.0e15 {
        Value::from(f as i64)
    } else {
        serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// A data row read through the header of its validated sheet
#[derive(Debug, Clone, Copy)]
pub struct SalesRow<'a> {
    sheet: &'a SalesSheet,
    cells: &'a [Data],
}

impl<'a> SalesRow<'a> {
    pub(crate) fn new(sheet: &'a SalesSheet, cells: &'a [Data]) -> Self {
        Self { sheet, cells }
    }

    /// Cell under a header label; short rows and absent columns read as empty
    pub fn cell(&self, label: &str) -> &'a Data {
        self.sheet
            .column(label)
            .and_then(|idx| self.cells.get(idx))
            .unwrap_or(&EMPTY_CELL)
    }

    pub fn quantity(&self) -> Decimal {
        coerce_quantity(self.cell(self.sheet.schema.quantity_column()))
    }

    /// Trimmed customer code, `None` when blank
    pub fn customer_code(&self) -> Option<String> {
        let code = cell_text(self.cell(self.sheet.schema.customer_column()));
        let code = code.trim();
        (!code.is_empty()).then(|| code.to_string())
    }

    pub fn billing_date(&self) -> Option<NaiveDate> {
        dates::normalize_date(self.cell(self.sheet.schema.date_column()))
    }

    pub fn billing_year(&self) -> Option<i32> {
        self.billing_date().map(|d| d.year())
    }

    /// Grouping key for a dimension; blank values group under `UNKNOWN`
    pub fn group_key(&self, dimension: GroupDimension) -> String {
        let value = cell_text(self.cell(self.sheet.schema.group_column(dimension)));
        let value = value.trim();
        if value.is_empty() {
            UNKNOWN_GROUP.to_string()
        } else {
            value.to_string()
        }
    }

    /// Build the row's record when every date column falls in `year`/`month`.
    ///
    /// Date columns are rewritten to `YYYY-MM-DD`; other columns pass through.
    pub fn record_in_month(&self, year: i32, month: u32) -> Option<Record> {
        let mut record = Record::new();
        for (idx, label) in self.sheet.header.iter().enumerate() {
            if label.is_empty() {
                continue;
            }
            let cell = self.cells.get(idx).unwrap_or(&EMPTY_CELL);
            let value = if label.contains("date") {
                let date = dates::normalize_date(cell)?;
                if date.year() != year || date.month() != month {
                    return None;
                }
                Value::String(date.format("%Y-%m-%d").to_string())
            } else {
                cell_to_json(cell)
            };
            record.insert(label.clone(), value);
        }
        Some(record)
    }
}
