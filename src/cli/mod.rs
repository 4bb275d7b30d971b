use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod formatters;

#[derive(Parser)]
#[command(name = "sales-digest")]
#[command(
    version,
    about = "Lubricants and petroleum sales spreadsheet aggregation"
)]
#[command(
    long_about = "Store sales export workbooks per product line and summarize them: totals, yearly sales, sums by sales group / customer / material, and month-filtered row tables."
)]
pub struct Cli {
    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Output results in JSON format
    #[arg(long = "json", global = true)]
    pub json: bool,

    /// Root directory of the spreadsheet store
    #[arg(long = "data-dir", global = true, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Store up to 5 .xlsx files under a product line
    Upload {
        /// Product line: lubricants or petroleum
        category: String,

        /// Paths to the .xlsx files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// List stored files for both product lines
    Files,

    /// Delete one stored file
    Delete {
        /// Product line: lubricants or petroleum
        category: String,

        /// Stored file name, as shown by `files`
        name: String,
    },

    /// Delete every stored file of a product line
    DeleteAll {
        /// Product line: lubricants or petroleum
        category: String,
    },

    /// Check which header schema each sheet of a workbook matches
    Check {
        /// Path to the .xlsx file
        file: PathBuf,
    },

    /// Distinct customers, orders and total quantity across both product lines
    Totals,

    /// Total quantity per billing year across both product lines
    Yearly,

    /// Total quantity grouped by a column within one product line
    Grouped {
        /// Grouping column: "sales grp", "customer code" or "material code"
        dimension: String,

        /// Product line: lubricants or petroleum
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Rows billed in a given month, across both product lines
    Table {
        /// Year (e.g., 2023)
        year: String,

        /// Month name (e.g., March) or number 1-12
        month: String,

        /// Also write the rows to a CSV file
        #[arg(long, value_name = "CSV")]
        export: Option<PathBuf>,
    },
}
