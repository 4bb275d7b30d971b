//! Aggregation façade
//!
//! Every operation rebuilds its result from the current store contents; there
//! is no cache, so uploads and deletions are visible on the next call. State
//! such as the set of seen customer codes lives only for one call.

pub mod file_summary;
pub mod merge;

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::error::{DigestError, Result};
use crate::importers::{self, GroupDimension, Record};
use crate::store::{Category, FileStore};
pub use file_summary::{FileContribution, Pass, QuantityOverflow};
pub use merge::CategoryBucket;

/// Headline figures across both categories
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub total_users: u64,
    pub total_orders: u64,
    pub total_sales: Decimal,
}

/// Quantity sums keyed by 4-digit billing year
pub type YearlySeries = BTreeMap<String, Decimal>;

/// Quantity sums keyed by the value of a grouping column
pub type GroupedSums = BTreeMap<String, Decimal>;

/// Rows billed in one month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilteredTable {
    pub year: i32,
    pub month: u32,
    pub rows: Vec<Record>,
}

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Map an English month name (any case) or a number 1-12 to its month number
pub fn parse_month(month: &str) -> Result<u32> {
    let normalized = month.trim().to_lowercase();
    if let Some(idx) = MONTH_NAMES.iter().position(|m| *m == normalized) {
        return Ok(idx as u32 + 1);
    }
    match normalized.parse::<u32>() {
        Ok(n) if (1..=12).contains(&n) => Ok(n),
        _ => Err(DigestError::invalid(format!("invalid month '{}'", month))),
    }
}

pub fn parse_year(year: &str) -> Result<i32> {
    year.trim()
        .parse::<i32>()
        .map_err(|_| DigestError::invalid(format!("invalid year '{}'", year)))
}

pub fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|idx| MONTH_NAMES.get(idx as usize))
        .copied()
        .unwrap_or("unknown")
}

/// Read-only aggregation over a file store
pub struct Aggregator<'a, S: FileStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: FileStore + ?Sized> Aggregator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Run the passes over every spreadsheet of a category and merge the results.
    ///
    /// A read failure aborts the whole call; nothing partial is returned.
    pub fn bucket(&self, category: Category, passes: &[Pass]) -> Result<CategoryBucket> {
        let files = self.store.list_files(category)?;
        let mut contributions = Vec::with_capacity(files.len());

        for file in files {
            if !importers::is_spreadsheet_name(&file.name) {
                debug!("Ignoring non-spreadsheet file {}/{}", category, file.name);
                continue;
            }
            let bytes = self.store.read_file(category, &file.name)?;
            let sheets = importers::sales_sheets(&file.name, &bytes);
            match FileContribution::from_sheets(&sheets, passes) {
                Ok(contribution) => contributions.push(contribution),
                Err(e) => warn!("Skipping {}/{}: {}", category, file.name, e),
            }
        }

        let bucket = CategoryBucket::merge(contributions);
        info!(
            "Aggregated {} files in {} ({} orders)",
            bucket.files, category, bucket.orders
        );
        Ok(bucket)
    }

    fn combined(&self, passes: &[Pass]) -> Result<CategoryBucket> {
        let mut combined = CategoryBucket::default();
        for category in Category::ALL {
            combined.combine(self.bucket(category, passes)?)?;
        }
        Ok(combined)
    }

    /// Distinct customers, row count and quantity sum over both categories
    pub fn totals(&self) -> Result<Totals> {
        Ok(self.combined(&[Pass::Totals])?.totals())
    }

    /// Quantity sums per billing year over both categories
    pub fn yearly_series(&self) -> Result<YearlySeries> {
        Ok(self.combined(&[Pass::Yearly])?.by_year)
    }

    /// Quantity sums per grouping key within one category
    pub fn grouped(&self, dimension: GroupDimension, category: Category) -> Result<GroupedSums> {
        Ok(self.bucket(category, &[Pass::Grouped(dimension)])?.by_group)
    }

    /// String-parameter form of [`Aggregator::grouped`]; the category is mandatory
    pub fn grouped_by(&self, dimension: &str, category: Option<&str>) -> Result<GroupedSums> {
        let category: Category = category
            .ok_or_else(|| {
                DigestError::invalid("category is required. Use \"lubricants\" or \"petroleum\"")
            })?
            .parse()?;
        let dimension: GroupDimension = dimension.parse()?;
        self.grouped(dimension, category)
    }

    /// Rows of both categories billed in the given month
    pub fn table(&self, year: i32, month: u32) -> Result<FilteredTable> {
        if !(1..=12).contains(&month) {
            return Err(DigestError::invalid(format!("invalid month '{}'", month)));
        }
        let rows = self.combined(&[Pass::Table { year, month }])?.rows;
        Ok(FilteredTable { year, month, rows })
    }

    /// String-parameter form of [`Aggregator::table`]
    pub fn filtered_table(&self, year: &str, month: &str) -> Result<FilteredTable> {
        let year = parse_year(year)?;
        let month = parse_month(month)?;
        self.table(year, month)
    }
}
