//! Output formatting module for CLI display
//!
//! This module handles all terminal output formatting, separating
//! the concerns of aggregation from presentation.

use anyhow::{Context, Result};
use colored::Colorize;
use itertools::Itertools;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tabled::{
    builder::Builder,
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

use sales_digest::importers::SheetCheck;
use sales_digest::reports::{month_name, FilteredTable, Totals};
use sales_digest::store::FileListing;
use sales_digest::utils::format_quantity;

/// Pretty JSON for any result shape
pub fn format_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize result as JSON")
}

pub fn format_totals(totals: &Totals) -> String {
    let mut output = format!("\n{} Sales Overview\n", "📊".cyan().bold());
    output.push_str(&format!(
        "\n{:<16} {}",
        "Customers:".bold(),
        totals.total_users
    ));
    output.push_str(&format!("\n{:<16} {}", "Orders:".bold(), totals.total_orders));
    output.push_str(&format!(
        "\n{:<16} {}\n",
        "Quantity (SU):".bold(),
        format_quantity(totals.total_sales).green()
    ));
    output
}

/// Two-column table of a key -> quantity mapping, followed by its total
pub fn format_sums(title: &str, key_header: &str, sums: &BTreeMap<String, Decimal>) -> String {
    if sums.is_empty() {
        return format!("{} No data for {}\n", "ℹ".blue().bold(), title);
    }

    let mut builder = Builder::default();
    builder.push_record([key_header.to_string(), "Quantity (SU)".to_string()]);
    for (key, qty) in sums {
        builder.push_record([key.clone(), format_quantity(*qty)]);
    }
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()));

    let total: Decimal = sums.values().copied().sum();
    format!(
        "\n{} {}\n\n{}\n{:<16} {}\n",
        "📈".cyan().bold(),
        title.bold(),
        table,
        "Total:".bold(),
        format_quantity(total).green()
    )
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Column labels of a row table: every record's keys, in first-seen order
pub fn table_columns(table: &FilteredTable) -> Vec<String> {
    table
        .rows
        .iter()
        .flat_map(|r| r.keys().cloned())
        .unique()
        .collect()
}

pub fn format_filtered_table(table: &FilteredTable) -> String {
    let period = format!("{} {}", month_name(table.month), table.year);
    if table.rows.is_empty() {
        return format!("{} No rows billed in {}\n", "ℹ".blue().bold(), period);
    }

    let columns = table_columns(table);
    let mut builder = Builder::default();
    builder.push_record(columns.iter().cloned());
    for row in &table.rows {
        builder.push_record(
            columns
                .iter()
                .map(|c| row.get(c).map(value_text).unwrap_or_default()),
        );
    }
    let mut rendered = builder.build();
    rendered.with(Style::rounded());

    format!(
        "\n{} Rows billed in {} ({})\n\n{}\n",
        "📋".cyan().bold(),
        period,
        table.rows.len(),
        rendered
    )
}

/// Write the row table as CSV, one column per record key
pub fn write_table_csv(table: &FilteredTable, path: &Path) -> Result<()> {
    let columns = table_columns(table);
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file {:?}", path))?;
    writer.write_record(&columns)?;
    for row in &table.rows {
        writer.write_record(
            columns
                .iter()
                .map(|c| row.get(c).map(value_text).unwrap_or_default()),
        )?;
    }
    writer.flush().context("Failed to flush CSV file")?;
    Ok(())
}

pub fn format_listing(listing: &FileListing) -> String {
    let mut output = String::new();
    for (label, files) in [
        ("lubricants", &listing.lubricants),
        ("petroleum", &listing.petroleum),
    ] {
        output.push_str(&format!(
            "\n{} {} ({} files)\n",
            "📁".cyan().bold(),
            label.yellow().bold(),
            files.len()
        ));
        for file in files.iter() {
            output.push_str(&format!("  • {}\n", file.name));
        }
    }
    output
}

pub fn format_checks(file: &str, checks: &[SheetCheck]) -> String {
    #[derive(Tabled)]
    struct CheckRow {
        #[tabled(rename = "Sheet")]
        sheet: String,
        #[tabled(rename = "Schema")]
        schema: String,
        #[tabled(rename = "Rows")]
        rows: usize,
    }

    let rows: Vec<CheckRow> = checks
        .iter()
        .map(|c| CheckRow {
            sheet: c.name.clone(),
            schema: c
                .schema
                .map(|s| s.name().to_string())
                .unwrap_or_else(|| "none (skipped)".to_string()),
            rows: c.rows,
        })
        .collect();

    let accepted = checks.iter().filter(|c| c.schema.is_some()).count();
    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..)).with(Alignment::right()))
        .to_string();

    let verdict = if accepted > 0 {
        format!("{} {} of {} sheets accepted", "✓".green().bold(), accepted, checks.len())
    } else {
        format!("{} no sheet matches a known header", "✗".red().bold())
    };
    format!("\n{} {}\n\n{}\n{}\n", "📊".cyan().bold(), file, table, verdict)
}
