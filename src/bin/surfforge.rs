use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{LogLevel, inspect, process};

#[derive(Parser, Debug)]
#[command(
    name = "surfforge",
    about = "Maps features and binding-site labels onto molecular surface meshes and maintains per-structure array bundles.",
    version,
    author,
    arg_required_else_help = true
)]
struct Cli {
    /// Minimum level of messages written to the log.
    #[arg(long, value_enum, default_value_t = LogLevel::Info, global = true)]
    log_level: LogLevel,
    /// Directory receiving run.log.
    #[arg(long, value_name = "DIR", default_value = ".", global = true)]
    log_dir: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build or update the bundles of every structure in a list file.
    Process(process::ProcessArgs),
    /// Print the arrays stored in a bundle.
    Inspect(inspect::InspectArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Process(args) => {
            let show_progress = commands::stderr_is_terminal();
            let _logger = commands::init_logging(cli.log_level, &cli.log_dir, show_progress)?;
            process::run(&args, show_progress)?;
        }
        Command::Inspect(args) => {
            inspect::run(&args)?;
        }
    }

    Ok(())
}
