//! Notification content construction.
//!
//! This module provides a builder for creating notification content
//! with a type-safe fluent API, plus the content constructors for every
//! situation the engine notifies about, the shared time formatting and
//! the idle reminder message rotation.

use crate::bus::TimerCommand;
use crate::types::{Task, TimerMode, TimerState};

/// Maximum length for task names in notifications.
pub const MAX_TASK_NAME_LENGTH: usize = 100;

/// Idle reminder bodies, shown in rotation.
pub const IDLE_MESSAGES: [&str; 4] = [
    "How will you spend this time?",
    "Right now, what do you want to do?",
    "Ready to pick your next task?",
    "Challenge or recharge?",
];

// ============================================================================
// Content model
// ============================================================================

/// Notification urgency, mapped to channel importance by presenters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationPriority {
    /// Quiet, persistent status card.
    Low,
    /// Attention-grabbing transient push.
    High,
}

/// What tapping a notification (or one of its buttons) asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationAction {
    /// Surface the timer UI.
    ShowTimer,
    /// Complete the current task.
    Complete,
}

impl NotificationAction {
    /// Returns the button label for this action.
    pub fn label(&self) -> &'static str {
        match self {
            NotificationAction::ShowTimer => "Open",
            NotificationAction::Complete => "Complete",
        }
    }

    /// Returns the bus command a presenter should publish for this action.
    pub fn to_command(self) -> TimerCommand {
        match self {
            NotificationAction::ShowTimer => TimerCommand::ShowTimerRequested,
            NotificationAction::Complete => TimerCommand::CompleteRequested,
        }
    }
}

/// A fully described notification, ready for a presenter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    pub priority: NotificationPriority,
    /// Command issued when the notification itself is tapped.
    pub tap_action: NotificationAction,
    /// Additional action buttons.
    pub actions: Vec<NotificationAction>,
}

/// Builder for constructing notification content.
///
/// Provides a fluent API for setting notification properties.
pub struct NotificationContentBuilder {
    content: NotificationContent,
}

impl NotificationContentBuilder {
    /// Creates a new builder. Defaults to a low-priority card that
    /// surfaces the timer UI when tapped.
    #[must_use]
    pub fn new() -> Self {
        Self {
            content: NotificationContent {
                title: String::new(),
                body: String::new(),
                priority: NotificationPriority::Low,
                tap_action: NotificationAction::ShowTimer,
                actions: Vec::new(),
            },
        }
    }

    /// Sets the notification title.
    #[must_use]
    pub fn title(mut self, title: &str) -> Self {
        self.content.title = title.to_string();
        self
    }

    /// Sets the notification body text.
    #[must_use]
    pub fn body(mut self, body: &str) -> Self {
        self.content.body = body.to_string();
        self
    }

    /// Sets the notification priority.
    #[must_use]
    pub fn priority(mut self, priority: NotificationPriority) -> Self {
        self.content.priority = priority;
        self
    }

    /// Sets the tap action.
    #[must_use]
    pub fn tap_action(mut self, action: NotificationAction) -> Self {
        self.content.tap_action = action;
        self
    }

    /// Appends an action button.
    #[must_use]
    pub fn action(mut self, action: NotificationAction) -> Self {
        self.content.actions.push(action);
        self
    }

    /// Builds and returns the notification content.
    #[must_use]
    pub fn build(self) -> NotificationContent {
        self.content
    }
}

impl Default for NotificationContentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Validates a task name for use in notifications.
///
/// Returns the sanitized task name or None if invalid.
pub fn validate_task_name(task_name: &str) -> Option<String> {
    // Truncate to max length
    let truncated: String = task_name.chars().take(MAX_TASK_NAME_LENGTH).collect();

    // Remove control characters
    let sanitized: String = truncated.chars().filter(|c| !c.is_control()).collect();

    if sanitized.is_empty() {
        None
    } else {
        Some(sanitized)
    }
}

/// Formats a millisecond duration as `MM:SS`, or `H:MM:SS` once a full
/// hour is reached. Hours are unpadded; minutes and seconds always pad
/// to two digits.
pub fn format_hms(total_millis: u64) -> String {
    let total_seconds = total_millis / 1_000;
    let hours = total_seconds / 3_600;
    let minutes = (total_seconds % 3_600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

fn task_title(task: &Task) -> String {
    let name = validate_task_name(&task.name).unwrap_or_else(|| "Task".to_string());
    format!("{} {}", task.category.emoji(), name)
}

// ============================================================================
// Content constructors
// ============================================================================

/// Ongoing card while counting down.
#[must_use]
pub fn create_running_ongoing(task: &Task, remaining_millis: u64) -> NotificationContent {
    NotificationContentBuilder::new()
        .title(&task_title(task))
        .body(&format!("Remaining: {}", format_hms(remaining_millis)))
        .priority(NotificationPriority::Low)
        .tap_action(NotificationAction::ShowTimer)
        .action(NotificationAction::Complete)
        .build()
}

/// Ongoing card while tracking overtime.
#[must_use]
pub fn create_overtime_ongoing(task: &Task, overtime_millis: u64) -> NotificationContent {
    NotificationContentBuilder::new()
        .title(&task_title(task))
        .body(&format!("Overtime: +{}", format_hms(overtime_millis)))
        .priority(NotificationPriority::Low)
        .tap_action(NotificationAction::ShowTimer)
        .action(NotificationAction::Complete)
        .build()
}

/// Ongoing card while idle between tasks.
#[must_use]
pub fn create_idle_ongoing() -> NotificationContent {
    NotificationContentBuilder::new()
        .title("⏱️ Right now")
        .body("What's next?")
        .priority(NotificationPriority::Low)
        .tap_action(NotificationAction::ShowTimer)
        .build()
}

/// Ongoing card for the current state.
#[must_use]
pub fn create_ongoing_for(state: &TimerState) -> NotificationContent {
    match (&state.task, state.mode) {
        (Some(task), TimerMode::Running) => create_running_ongoing(task, state.remaining_millis),
        (Some(task), TimerMode::Overtime) => create_overtime_ongoing(task, state.overtime_millis),
        _ => create_idle_ongoing(),
    }
}

/// Transient push raised once when the target duration is reached.
#[must_use]
pub fn create_target_reached(task: &Task) -> NotificationContent {
    NotificationContentBuilder::new()
        .title(&task_title(task))
        .body("⏰ Target time reached!")
        .priority(NotificationPriority::High)
        .tap_action(NotificationAction::Complete)
        .action(NotificationAction::Complete)
        .build()
}

/// Transient push raised every few minutes of overtime.
///
/// `overtime_minutes` is the truncated full-minute count.
#[must_use]
pub fn create_overtime_push(task: &Task, overtime_minutes: u64) -> NotificationContent {
    NotificationContentBuilder::new()
        .title(&task_title(task))
        .body(&format!(
            "⏰ {overtime_minutes} min over! Finish up or move on?"
        ))
        .priority(NotificationPriority::High)
        .tap_action(NotificationAction::Complete)
        .action(NotificationAction::Complete)
        .build()
}

/// Transient push nudging an idle user toward the next task.
#[must_use]
pub fn create_idle_reminder(message: &str) -> NotificationContent {
    NotificationContentBuilder::new()
        .title("⏱️ Hey!")
        .body(message)
        .priority(NotificationPriority::High)
        .tap_action(NotificationAction::ShowTimer)
        .build()
}

// ============================================================================
// Idle message rotation
// ============================================================================

/// Round-robin selection over `IDLE_MESSAGES`.
///
/// Every message is shown before any repeats.
#[derive(Debug, Default)]
pub struct IdleMessages {
    cursor: usize,
}

impl IdleMessages {
    /// Creates a rotation starting at the first message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next message and advances the rotation.
    pub fn next_message(&mut self) -> &'static str {
        let message = IDLE_MESSAGES[self.cursor % IDLE_MESSAGES.len()];
        self.cursor = self.cursor.wrapping_add(1);
        message
    }
}
