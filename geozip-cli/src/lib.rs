//! Command-line interface for geozip region ingestion.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod error;
mod ingest;

pub use error::CliError;

use ingest::{IngestArgs, run_ingest};

const ARG_INPUT: &str = "input";
const ARG_RETRY_LEDGER: &str = "retry-ledger";

const DEFAULT_INPUT: &str = "output.txt";
const DEFAULT_STORE: &str = "geo_zip.db";
const DEFAULT_LEDGER: &str = "new_errors.csv";
const DEFAULT_RETRY_LEDGER: &str = "errors.csv";

/// Run the geozip CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Ingest(args) => {
            run_ingest(args)?;
        }
    }
    Ok(())
}

#[derive(Debug, Parser)]
#[command(
    name = "geozip",
    about = "Bulk loading of postal region boundaries into a key-value store",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Upsert region records from a newline-delimited JSON file.
    Ingest(IngestArgs),
}

#[cfg(test)]
mod tests;
