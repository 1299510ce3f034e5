//! whatnext - a personal task timer CLI
//!
//! This tool tracks one task at a time with a countdown and overtime:
//! - Start a challenge or recharge task with a target duration
//! - Reaching the target flips the timer into overtime instead of stopping
//! - Idle mode nudges you to pick the next task

use anyhow::Result;
use clap::{CommandFactory, Parser};

pub mod bus;
pub mod cli;
pub mod daemon;
pub mod notification;
pub mod store;
pub mod types;

use cli::{Cli, Commands, Display, IpcClient};
use types::TimerConfig;

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose);

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&e.to_string());
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_filter = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Start(args)) => {
            let client = IpcClient::new();
            let response = client.start(&args).await?;
            Display::show_start_success(&response);
        }
        Some(Commands::Complete) => {
            let client = IpcClient::new();
            let response = client.complete().await?;
            Display::show_complete_success(&response);
        }
        Some(Commands::Idle) => {
            let client = IpcClient::new();
            let response = client.idle().await?;
            Display::show_idle_success(&response);
        }
        Some(Commands::Status) => {
            let client = IpcClient::new();
            let response = client.status().await?;
            Display::show_status(&response);
        }
        Some(Commands::Show) => {
            let client = IpcClient::new();
            let response = client.show().await?;
            Display::show_status(&response);
        }
        Some(Commands::Daemon(args)) => {
            let socket_path = args
                .socket
                .clone()
                .unwrap_or_else(daemon::default_socket_path);
            daemon::run(TimerConfig::default(), &socket_path).await?;
        }
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
        }
        None => {
            // No command provided, show help
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================
