//! syncline CLI - offline tooling for workflow definitions
//!
//! - `validate`: load a workflow and compile its expressions
//! - `map`: map a JSON record through a workflow
//! - `diff`: show what an export would change on an existing record

use clap::{Parser, Subcommand};

use syncline_cli::commands;
use syncline_cli::error::CliResult;
use syncline_cli::logging::init_logging;

/// syncline - declarative record synchronization
#[derive(Parser)]
#[command(name = "syncline")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Print results and logs as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging for syncline crates
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a workflow definition
    Validate(commands::validate::ValidateArgs),

    /// Map a record through a workflow
    Map(commands::map::MapArgs),

    /// Diff a mapped record against an existing endpoint record
    Diff(commands::diff::DiffArgs),
}

fn main() {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json);

    match run(cli) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            tracing::debug!(exit_code = e.exit_code(), "command failed");
            e.print();
            std::process::exit(e.exit_code());
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    match cli.command {
        Commands::Validate(args) => commands::validate::execute(args, cli.json),
        Commands::Map(args) => commands::map::execute(args, cli.json),
        Commands::Diff(args) => commands::diff::execute(args, cli.json),
    }
}
