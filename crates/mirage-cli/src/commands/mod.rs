//! CLI command definitions and dispatch.

pub mod serve;
pub mod simulate;

use clap::{Parser, Subcommand, ValueEnum};

/// Mirage — in-memory stand-in for a container backend.
#[derive(Parser, Debug)]
#[command(name = "mirage", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text, env = "MIRAGE_LOG_FORMAT")]
    pub log_format: LogFormat,
}

/// Log line encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Host the in-memory backend until interrupted.
    Serve(serve::ServeArgs),
    /// Run one simulated process and report its exit code.
    Simulate(simulate::SimulateArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => serve::execute(args),
        Command::Simulate(args) => simulate::execute(args),
    }
}
