//! Sales Digest - lubricants and petroleum sales spreadsheet aggregation
//!
//! This library validates sales export workbooks against the two known header
//! layouts, stores them per product line, and aggregates every stored file
//! into totals, yearly series, grouped sums and month-filtered tables.

pub mod config;
pub mod error;
pub mod importers;
pub mod reports;
pub mod store;
pub mod utils;

pub use error::{DigestError, Result};
pub use importers::{GroupDimension, HeaderSchema};
pub use reports::{Aggregator, FilteredTable, GroupedSums, Totals, YearlySeries};
pub use store::{Category, DirectoryStore, FileStore, MemoryStore};
