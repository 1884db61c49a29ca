//! Command dispatcher that routes parsed CLI commands to their handlers.
//!
//! Extraction, parsing and database work are blocking, so they run on
//! tokio's blocking pool.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

use crate::cli::{formatters, Commands};
use hortifruti::db::{self, ImportRecord};
use hortifruti::error::ImportError;
use hortifruti::{importers, ingest, utils};

/// Options shared by every command
pub struct GlobalOptions {
    pub json: bool,
    pub db_path: Option<PathBuf>,
}

/// Route a parsed command to its handler
pub async fn dispatch_command(command: Commands, options: GlobalOptions) -> Result<()> {
    match command {
        Commands::Import {
            file,
            date,
            dry_run,
        } => dispatch_import(file, &date, dry_run, options).await,
        Commands::History => dispatch_history(options).await,
    }
}

async fn dispatch_import(
    file: String,
    date: &str,
    dry_run: bool,
    options: GlobalOptions,
) -> Result<()> {
    let import_date = utils::parse_sale_date(date)?;
    info!("Importing sales report {} for {}", file, import_date);

    let (upload, analysis) = tokio::task::spawn_blocking(move || -> Result<_, ImportError> {
        let upload = importers::read_report_file(&file)?;
        let analysis = importers::analyze_pdf(&upload.bytes)?;
        Ok((upload, analysis))
    })
    .await
    .context("Report analysis task failed")??;

    if !options.json {
        println!(
            "\n{} Found {} sale rows in {} ({} other lines skipped)\n",
            "✓".green().bold(),
            analysis.items.len(),
            upload.file_name,
            analysis.skipped_lines
        );
        if !analysis.is_empty() {
            println!("{}", formatters::format_preview_table(&analysis.items));
        }
        if analysis.items.len() > formatters::PREVIEW_ROWS {
            println!(
                "\n... and {} more rows",
                analysis.items.len() - formatters::PREVIEW_ROWS
            );
        }
    }

    if dry_run {
        if options.json {
            println!(
                "{}",
                formatters::format_analysis_json(&upload.file_name, &analysis)
            );
        } else {
            println!("\n{} Dry run - no changes saved", "ℹ".blue().bold());
        }
        return Ok(());
    }

    let sales = analysis.items.len();
    let skipped_lines = analysis.skipped_lines;
    let db_path = options.db_path;
    let file_name = upload.file_name;

    let record: ImportRecord = tokio::task::spawn_blocking(move || -> Result<ImportRecord> {
        if analysis.is_empty() {
            return Err(ImportError::NoValidRecords.into());
        }
        db::init_database(db_path.clone())?;
        let mut conn = db::open_db(db_path)?;
        Ok(ingest::persist_batch(
            &mut conn,
            &file_name,
            &analysis.items,
            import_date,
        )?)
    })
    .await
    .context("Import task failed")??;

    if options.json {
        println!(
            "{}",
            formatters::format_import_json(&record, sales, skipped_lines)
        );
    } else {
        println!("\n{} Import complete!", "✓".green().bold());
        println!("  Import:    #{}", record.id.unwrap_or_default());
        println!("  Sale date: {}", record.import_date.format("%d/%m/%Y"));
        println!("  Sales:     {}", sales.to_string().green());
        println!(
            "  Revenue:   {}",
            record
                .total_revenue
                .map(utils::format_currency)
                .unwrap_or_default()
        );
        println!("  Status:    {}", record.status.as_str());
    }

    Ok(())
}

async fn dispatch_history(options: GlobalOptions) -> Result<()> {
    let db_path = options.db_path;
    let records = tokio::task::spawn_blocking(move || -> Result<Vec<ImportRecord>> {
        db::init_database(db_path.clone())?;
        let conn = db::open_db(db_path)?;
        db::list_import_history(&conn)
    })
    .await
    .context("History task failed")??;

    if options.json {
        println!("{}", formatters::format_history_json(&records));
    } else if records.is_empty() {
        println!("{} No imports found", "ℹ".blue().bold());
    } else {
        println!("\n{} Import history\n", "📦".cyan().bold());
        println!("{}", formatters::format_history_table(&records));
    }

    Ok(())
}
