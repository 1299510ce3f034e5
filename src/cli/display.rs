//! Display utilities for the task timer CLI.
//!
//! This module provides formatted output for:
//! - Success messages
//! - Error messages
//! - Status display
//! - Timer information

use crate::notification::format_hms;
use crate::types::{IpcResponse, ResponseData};

/// One hour in milliseconds, the threshold for the split suggestion.
const HOUR_MILLIS: u64 = 60 * 60 * 1000;

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows a success message for task start.
    pub fn show_start_success(response: &IpcResponse) {
        println!("* Task started");

        if let Some(data) = &response.data {
            if let Some(task_name) = &data.task_name {
                println!("  Task: {}", task_name);
            }
            if let Some(category) = &data.category {
                println!("  Category: {}", Self::category_label(category));
            }
            if let Some(remaining) = data.remaining_millis {
                println!("  Target: {}", format_hms(remaining));
            }
            if Self::needs_split_hint(data) {
                println!("  💡 Over an hour. How about splitting it into smaller pieces?");
            }
        }
    }

    /// Shows a success message for task completion.
    pub fn show_complete_success(_response: &IpcResponse) {
        println!("* Task completed");
        println!("  Next: 'whatnext start <NAME>' or 'whatnext idle'");
    }

    /// Shows a success message for entering idle mode.
    pub fn show_idle_success(_response: &IpcResponse) {
        println!("* Idle mode started");
        println!("  Nudges will arrive every few minutes until the next task");
    }

    /// Shows the current timer status.
    pub fn show_status(response: &IpcResponse) {
        println!("Task Timer Status");
        println!("─────────────────");

        if let Some(data) = &response.data {
            let mode = data.mode.as_deref().unwrap_or("unknown");
            let mode_display = match mode {
                "idle" => "Idle",
                "running" => "Running",
                "overtime" => "Overtime",
                _ => mode,
            };
            println!("Mode: {}", mode_display);

            if mode == "idle" {
                println!("Start the next task with 'whatnext start <NAME>'");
            } else {
                if let Some(task) = &data.task_name {
                    println!("Task: {}", task);
                }
                if let Some(category) = &data.category {
                    println!("Category: {}", Self::category_label(category));
                }
                if mode == "overtime" {
                    if let Some(overtime) = data.overtime_millis {
                        println!("Overtime: +{}", format_hms(overtime));
                    }
                } else if let Some(remaining) = data.remaining_millis {
                    println!("Remaining: {}", format_hms(remaining));
                }
            }
        } else {
            println!("The timer is not running");
        }
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("Error: {}", message);
    }

    /// Formats a category identifier for display.
    fn category_label(category: &str) -> &str {
        match category {
            "challenge" => "🔥 Challenge",
            "recharge" => "🌿 Recharge",
            other => other,
        }
    }

    /// Returns true when a started challenge is long enough to suggest
    /// splitting it up.
    fn needs_split_hint(data: &ResponseData) -> bool {
        data.category.as_deref() == Some("challenge")
            && data
                .remaining_millis
                .is_some_and(|millis| millis > HOUR_MILLIS)
    }
}

// ============================================================================
// Tests
// ============================================================================
