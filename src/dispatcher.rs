//! Command dispatcher that routes parsed clap Commands to the store and the
//! aggregation engine, then prints either JSON or formatted tables.

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::Path;
use tracing::info;

use crate::cli::formatters;
use crate::cli::Commands;
use sales_digest::config::Config;
use sales_digest::importers::check_workbook;
use sales_digest::{Aggregator, Category, DirectoryStore};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadResult {
    category: Category,
    stored: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteResult {
    category: Category,
    deleted: usize,
}

fn open_store(config: &Config) -> Result<DirectoryStore> {
    let store = DirectoryStore::open(&config.data_dir)
        .with_context(|| format!("Failed to open store at {:?}", config.data_dir))?;
    info!("Using store at {:?}", store.root());
    Ok(store)
}

fn dispatch_check(file: &Path, json_output: bool) -> Result<()> {
    let bytes = std::fs::read(file).with_context(|| format!("Failed to read {:?}", file))?;
    let checks =
        check_workbook(&bytes).with_context(|| format!("Failed to open workbook {:?}", file))?;
    if json_output {
        let shaped: Vec<_> = checks
            .iter()
            .map(|c| {
                serde_json::json!({
                    "sheet": c.name,
                    "schema": c.schema.map(|s| s.name()),
                    "rows": c.rows,
                })
            })
            .collect();
        println!("{}", formatters::format_json(&shaped)?);
    } else {
        print!(
            "{}",
            formatters::format_checks(&file.display().to_string(), &checks)
        );
    }
    Ok(())
}

/// Route a parsed command to its handler
pub fn dispatch(command: Commands, config: &Config, json_output: bool) -> Result<()> {
    match command {
        Commands::Check { file } => dispatch_check(&file, json_output),

        Commands::Upload { category, files } => {
            let category: Category = category.parse()?;
            let stored = open_store(config)?.upload_many(category, &files)?;
            if json_output {
                let result = UploadResult { category, stored };
                println!("{}", formatters::format_json(&result)?);
            } else {
                println!(
                    "\n{} Stored {} file(s) under {}",
                    "✓".green().bold(),
                    stored.len(),
                    category.to_string().yellow().bold()
                );
                for name in &stored {
                    println!("  • {}", name);
                }
            }
            Ok(())
        }

        Commands::Files => {
            let listing = open_store(config)?.listing()?;
            if json_output {
                println!("{}", formatters::format_json(&listing)?);
            } else {
                print!("{}", formatters::format_listing(&listing));
            }
            Ok(())
        }

        Commands::Delete { category, name } => {
            let category: Category = category.parse()?;
            open_store(config)?.delete(category, &name)?;
            if json_output {
                let result = DeleteResult {
                    category,
                    deleted: 1,
                };
                println!("{}", formatters::format_json(&result)?);
            } else {
                println!("{} Deleted {}/{}", "✓".green().bold(), category, name);
            }
            Ok(())
        }

        Commands::DeleteAll { category } => {
            let category: Category = category.parse()?;
            let deleted = open_store(config)?.delete_all(category)?;
            if json_output {
                let result = DeleteResult { category, deleted };
                println!("{}", formatters::format_json(&result)?);
            } else {
                println!(
                    "{} Deleted {} file(s) from {}",
                    "✓".green().bold(),
                    deleted,
                    category
                );
            }
            Ok(())
        }

        Commands::Totals => {
            let totals = Aggregator::new(&open_store(config)?).totals()?;
            if json_output {
                println!("{}", formatters::format_json(&totals)?);
            } else {
                print!("{}", formatters::format_totals(&totals));
            }
            Ok(())
        }

        Commands::Yearly => {
            let series = Aggregator::new(&open_store(config)?).yearly_series()?;
            if json_output {
                println!("{}", formatters::format_json(&series)?);
            } else {
                print!("{}", formatters::format_sums("Sales by year", "Year", &series));
            }
            Ok(())
        }

        Commands::Grouped {
            dimension,
            category,
        } => {
            let store = open_store(config)?;
            let sums = Aggregator::new(&store).grouped_by(&dimension, category.as_deref())?;
            if json_output {
                println!("{}", formatters::format_json(&sums)?);
            } else {
                let title = format!(
                    "Sales by {} ({})",
                    dimension.trim(),
                    category.as_deref().unwrap_or_default().trim()
                );
                print!("{}", formatters::format_sums(&title, dimension.trim(), &sums));
            }
            Ok(())
        }

        Commands::Table {
            year,
            month,
            export,
        } => {
            let table = Aggregator::new(&open_store(config)?).filtered_table(&year, &month)?;
            if let Some(path) = &export {
                formatters::write_table_csv(&table, path)?;
                info!("Exported {} rows to {:?}", table.rows.len(), path);
            }
            if json_output {
                println!("{}", formatters::format_json(&table)?);
            } else {
                print!("{}", formatters::format_filtered_table(&table));
                if let Some(path) = &export {
                    println!(
                        "{} Exported {} rows to {}",
                        "✓".green().bold(),
                        table.rows.len(),
                        path.display()
                    );
                }
            }
            Ok(())
        }
    }
}
