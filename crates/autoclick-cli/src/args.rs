//! CLI argument parsing with clap derive macros.

use clap::{Parser, Subcommand};

/// Default delay between ticks.
pub const DEFAULT_INTERVAL_MS: u64 = 100;

/// Default per-axis movement that still counts as "not moved".
pub const DEFAULT_TOLERANCE: u32 = 10;

const BACKEND_HELP: &str =
    "Pointer backend executable [default: $AUTOCLICK_BACKEND, then cliclick]";

/// Click at the pointer until you move it.
///
/// Clicks at the current pointer position on a fixed interval. Moving the
/// mouse further than the tolerance between two ticks stops the loop, as
/// does Ctrl+C. Pointer reads and clicks are delegated to an external
/// backend tool (cliclick by default).
#[derive(Debug, Parser)]
#[command(name = "autoclick", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// The selected command, falling back to `run` with defaults.
    pub fn into_command(self) -> Commands {
        self.command
            .unwrap_or_else(|| Commands::Run(RunArgs::default()))
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start clicking (the default when no command is given)
    #[command(after_help = "\
Examples:
  autoclick                             # Click every 100ms, stop on movement > 10
  autoclick run --interval 500          # Click twice a second
  autoclick run --tolerance 0           # Stop on any movement at all
  autoclick run --json                  # Print a JSON summary on exit")]
    Run(RunArgs),

    /// Print the current pointer position and exit
    #[command(after_help = "\
Useful for checking that the backend is installed and permitted to read
the pointer before starting a run.")]
    Position(PositionArgs),
}

#[derive(Debug, clap::Args)]
pub struct RunArgs {
    /// Milliseconds between clicks
    #[arg(
        short,
        long,
        default_value_t = DEFAULT_INTERVAL_MS,
        value_name = "MS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub interval: u64,

    /// Largest per-axis pointer movement between ticks that keeps clicking
    #[arg(short, long, default_value_t = DEFAULT_TOLERANCE, value_name = "UNITS")]
    pub tolerance: u32,

    #[arg(short, long, value_name = "PROGRAM", help = BACKEND_HELP)]
    pub backend: Option<String>,

    /// Print a JSON run summary to stdout on exit
    #[arg(long)]
    pub json: bool,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL_MS,
            tolerance: DEFAULT_TOLERANCE,
            backend: None,
            json: false,
        }
    }
}

#[derive(Debug, clap::Args)]
pub struct PositionArgs {
    #[arg(short, long, value_name = "PROGRAM", help = BACKEND_HELP)]
    pub backend: Option<String>,
}
