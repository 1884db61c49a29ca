mod cli;
mod dispatcher;

use clap::Parser;
use cli::Cli;
use colored::Colorize;
use dispatcher::GlobalOptions;
use hortifruti::error::ImportError;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize logging (RUST_LOG overrides; quiet by default so tables stay readable)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let options = GlobalOptions {
        json: cli.json,
        db_path: cli.db,
    };

    if let Err(err) = dispatcher::dispatch_command(cli.command, options).await {
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        if err
            .downcast_ref::<ImportError>()
            .is_some_and(ImportError::is_retryable)
        {
            eprintln!("Another import created the same record concurrently; run the import again.");
        }
        std::process::exit(1);
    }
}
