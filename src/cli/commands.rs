//! Command definitions for the task timer CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::notification::MAX_TASK_NAME_LENGTH;
use crate::types::Category;

// ============================================================================
// CLI Structure
// ============================================================================

/// Task timer CLI with overtime tracking and idle nudges
#[derive(Parser, Debug)]
#[command(
    name = "whatnext",
    version,
    about = "A personal task timer with overtime tracking and idle nudges",
    long_about = "Count down toward a task target, keep counting after the target\n\
                  passes, and get periodic nudges while deciding what to do next.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start a task with a target duration
    Start(StartArgs),

    /// Complete the current task
    Complete,

    /// Enter idle mode (periodic nudges until the next task)
    Idle,

    /// Show current timer status
    Status,

    /// Bring the timer to the foreground
    Show,

    /// Run the timer daemon in the foreground
    Daemon(DaemonArgs),

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ============================================================================
// Start Command Arguments
// ============================================================================

/// Arguments for the start command
#[derive(Args, Debug, Clone)]
pub struct StartArgs {
    /// Task name
    #[arg(value_parser = validate_task_name)]
    pub name: String,

    /// Task category: challenge (focused work) or recharge (rest)
    #[arg(short, long, default_value = "challenge", value_parser = parse_category)]
    pub category: Category,

    /// Target hours (0-24)
    #[arg(
        long,
        default_value = "0",
        value_parser = clap::value_parser!(u32).range(0..=24)
    )]
    pub hours: u32,

    /// Target minutes (0-600)
    #[arg(
        short,
        long,
        default_value = "30",
        value_parser = clap::value_parser!(u32).range(0..=600)
    )]
    pub minutes: u32,
}

impl StartArgs {
    /// Returns the combined target duration in milliseconds.
    pub fn duration_millis(&self) -> u64 {
        (u64::from(self.hours) * 60 + u64::from(self.minutes)) * 60_000
    }
}

// ============================================================================
// Daemon Command Arguments
// ============================================================================

/// Arguments for the daemon command
#[derive(Args, Debug, Clone)]
pub struct DaemonArgs {
    /// Socket path (defaults to ~/.whatnext/whatnext.sock)
    #[arg(long)]
    pub socket: Option<PathBuf>,
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Validates the task name.
///
/// - Must not be empty or whitespace-only
/// - Must not exceed 100 characters
fn validate_task_name(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        return Err("task name must not be empty".to_string());
    }
    if s.chars().count() > MAX_TASK_NAME_LENGTH {
        return Err(format!(
            "task name must be at most {MAX_TASK_NAME_LENGTH} characters"
        ));
    }
    Ok(s.to_string())
}

/// Parses a category argument.
fn parse_category(s: &str) -> Result<Category, String> {
    s.parse()
}

// ============================================================================
// Tests
// ============================================================================
