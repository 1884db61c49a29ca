use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod formatters;

#[derive(Parser)]
#[command(name = "hortifruti")]
#[command(version, about = "Produce retailer back-office: sales report import")]
#[command(
    long_about = "Import daily sales reports (PDF) exported by the point of sale, reconcile the sold items with the product catalog and keep an import history."
)]
pub struct Cli {
    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Output results in JSON format
    #[arg(long = "json", global = true)]
    pub json: bool,

    /// Database file (defaults to $HORTIFRUTI_DB or ~/.hortifruti/data.db)
    #[arg(long = "db", global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import a PDF sales report
    Import {
        /// Path to the PDF report
        file: String,

        /// Date the sales happened (YYYY-MM-DD or DD/MM/YYYY)
        #[arg(short, long)]
        date: String,

        /// Preview only, don't save to database
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the import history, most recent sale date first
    History,
}
