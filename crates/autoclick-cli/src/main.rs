//! autoclick entry point.

mod args;
mod clicker;
mod config;
mod console;

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, error, info};

use crate::args::{Cli, Commands, PositionArgs, RunArgs};
use crate::clicker::{Backend, BackendCommand, LoopConfig, StopSignal};
use crate::console::Console;

fn main() -> ExitCode {
    // Logs go to stderr so --json output owns stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.into_command() {
        Commands::Run(args) => run_clicker(args),
        Commands::Position(args) => print_position(args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Run the click loop until movement, interrupt, or failure.
///
/// Returns the process exit code for the run.
fn run_clicker(args: RunArgs) -> anyhow::Result<u8> {
    let mut backend = BackendCommand::cliclick(config::backend_program(args.backend.as_deref()));
    let loop_config = LoopConfig {
        interval: Duration::from_millis(args.interval),
        tolerance: args.tolerance,
    };

    let runtime = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;

    let mut console = Console::stdio(args.json);
    console.banner(args.interval, args.tolerance, backend.program())?;

    let report = runtime.block_on(async {
        let stop = StopSignal::new();
        tokio::spawn(listen_for_interrupts(stop.clone()));
        clicker::run(&mut backend, &loop_config, &stop).await
    });

    console.outcome(&report)?;
    console.summary(&report)?;

    Ok(report.exit_code())
}

/// Probe the pointer once and print it as `x,y`.
fn print_position(args: PositionArgs) -> anyhow::Result<u8> {
    let mut backend = BackendCommand::cliclick(config::backend_program(args.backend.as_deref()));
    let runtime = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    let mut console = Console::stdio(false);

    match runtime.block_on(backend.position()) {
        Ok(pos) => {
            console.position(pos.x, pos.y)?;
            Ok(0)
        }
        Err(e) => {
            console.backend_error("reading the pointer position", &e)?;
            Ok(1)
        }
    }
}

/// Turn SIGINT/SIGTERM into stop requests for as long as the runtime lives.
///
/// Repeated signals are harmless: the stop signal only fires once.
async fn listen_for_interrupts(stop: StopSignal) {
    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    tracing::warn!("Failed to listen for Ctrl+C: {}", e);
                    return;
                }
                info!("Received SIGINT, stopping");
            }
            _ = sigterm() => {
                info!("Received SIGTERM, stopping");
            }
        }

        if !stop.request() {
            debug!("Stop already requested, ignoring signal");
        }
    }
}

/// Wait for SIGTERM signal (Unix only).
///
/// If signal registration fails, logs a warning and waits indefinitely so
/// Ctrl+C keeps working.
#[cfg(unix)]
async fn sigterm() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            tracing::warn!(
                "Failed to register SIGTERM handler: {}, only SIGINT will stop the loop",
                e
            );
            std::future::pending::<()>().await;
        }
    }
}

/// SIGTERM is not available on non-Unix platforms; use a never-completing future.
#[cfg(not(unix))]
async fn sigterm() {
    std::future::pending::<()>().await;
}
