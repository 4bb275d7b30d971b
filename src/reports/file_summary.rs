//! Per-file aggregation
//!
//! Each pass walks the validated sheets of one workbook and accumulates its
//! own projection. Sheets of the same file are summed (or concatenated for the
//! table pass) before the file's contribution is handed to the merger.

use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

use crate::importers::{GroupDimension, Record, SalesSheet};

/// A quantity sum left the range `Decimal` can represent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("quantity sum overflowed")]
pub struct QuantityOverflow;

/// `*acc += value`, refusing to leave the representable range
pub fn checked_accumulate(acc: &mut Decimal, value: Decimal) -> Result<(), QuantityOverflow> {
    *acc = acc.checked_add(value).ok_or(QuantityOverflow)?;
    Ok(())
}

/// Which projection a pass accumulates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Totals,
    Yearly,
    Grouped(GroupDimension),
    Table { year: i32, month: u32 },
}

/// One file's share of every requested projection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileContribution {
    /// Distinct customer codes seen in this file
    pub customers: HashSet<String>,
    pub orders: u64,
    pub sales: Decimal,
    pub by_year: BTreeMap<String, Decimal>,
    pub by_group: BTreeMap<String, Decimal>,
    pub rows: Vec<Record>,
}

impl FileContribution {
    /// Run the requested passes over every sheet of one file.
    ///
    /// Fails only when a quantity sum overflows; the caller drops the file.
    pub fn from_sheets(sheets: &[SalesSheet], passes: &[Pass]) -> Result<Self, QuantityOverflow> {
        let mut contribution = FileContribution::default();
        for sheet in sheets {
            for pass in passes {
                match *pass {
                    Pass::Totals => contribution.add_totals(sheet)?,
                    Pass::Yearly => contribution.add_yearly(sheet)?,
                    Pass::Grouped(dimension) => contribution.add_grouped(sheet, dimension)?,
                    Pass::Table { year, month } => contribution.add_table(sheet, year, month),
                }
            }
        }
        Ok(contribution)
    }

    /// Count every row as an order, sum quantities, collect customer codes
    pub fn add_totals(&mut self, sheet: &SalesSheet) -> Result<(), QuantityOverflow> {
        for row in sheet.rows() {
            self.orders += 1;
            checked_accumulate(&mut self.sales, row.quantity())?;
            if let Some(code) = row.customer_code() {
                self.customers.insert(code);
            }
        }
        Ok(())
    }

    /// Sum quantities by billing year; rows without a readable date are skipped
    pub fn add_yearly(&mut self, sheet: &SalesSheet) -> Result<(), QuantityOverflow> {
        for row in sheet.rows() {
            if let Some(year) = row.billing_year() {
                let sum = self.by_year.entry(format!("{:04}", year)).or_default();
                checked_accumulate(sum, row.quantity())?;
            }
        }
        Ok(())
    }

    pub fn add_grouped(
        &mut self,
        sheet: &SalesSheet,
        dimension: GroupDimension,
    ) -> Result<(), QuantityOverflow> {
        for row in sheet.rows() {
            let sum = self.by_group.entry(row.group_key(dimension)).or_default();
            checked_accumulate(sum, row.quantity())?;
        }
        Ok(())
    }

    /// Keep rows billed in `year`/`month`, in sheet order
    pub fn add_table(&mut self, sheet: &SalesSheet, year: i32, month: u32) {
        self.rows
            .extend(sheet.rows().filter_map(|row| row.record_in_month(year, month)));
    }

    pub fn user_count(&self) -> u64 {
        self.customers.len() as u64
    }
}
