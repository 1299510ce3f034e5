//! Shared type definitions for the task timer.
//!
//! This module contains:
//! - Task model: `Task`, `Category`
//! - Timer state: `TimerMode`, `TimerState`
//! - Configuration: `TimerConfig` with interval defaults and validation
//! - IPC protocol types: `IpcRequest`, `IpcResponse`, `ResponseData`, `StartParams`

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Countdown/overtime tick interval in milliseconds.
pub const TICK_INTERVAL_MS: u64 = 1_000;

/// Interval between idle reminder notifications in milliseconds.
pub const IDLE_REMINDER_INTERVAL_MS: u64 = 180_000;

/// Interval between overtime push notifications in milliseconds.
pub const OVERTIME_PUSH_INTERVAL_MS: u64 = 180_000;

// ============================================================================
// Category
// ============================================================================

/// Task category chosen at start time.
///
/// The category never changes engine behavior; it only flavors
/// notification titles and upstream suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Focused work toward a goal.
    Challenge,
    /// Rest and recovery.
    Recharge,
}

impl Category {
    /// Returns the wire/display name of this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Challenge => "challenge",
            Category::Recharge => "recharge",
        }
    }

    /// Returns the emoji shown in front of task names.
    pub fn emoji(&self) -> &'static str {
        match self {
            Category::Challenge => "🔥",
            Category::Recharge => "🌿",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "challenge" => Ok(Category::Challenge),
            "recharge" => Ok(Category::Recharge),
            other => Err(format!(
                "unknown category '{other}' (expected 'challenge' or 'recharge')"
            )),
        }
    }
}

// ============================================================================
// Task
// ============================================================================

/// A started task. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// User-given task name.
    pub name: String,
    /// Category chosen at start time.
    pub category: Category,
    /// Target duration in milliseconds. Zero is a valid target.
    pub target_duration_millis: u64,
}

impl Task {
    /// Creates a new task.
    pub fn new(name: impl Into<String>, category: Category, target_duration_millis: u64) -> Self {
        Self {
            name: name.into(),
            category,
            target_duration_millis,
        }
    }
}

// ============================================================================
// TimerMode
// ============================================================================

/// The three modes of the timer state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    /// No task; idle reminders may be scheduled.
    Idle,
    /// Counting down toward the target duration.
    Running,
    /// Target reached; tracking elapsed overtime.
    Overtime,
}

impl TimerMode {
    /// Returns the wire/display name of this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerMode::Idle => "idle",
            TimerMode::Running => "running",
            TimerMode::Overtime => "overtime",
        }
    }

    /// Returns true while a task is underway (Running or Overtime).
    pub fn is_active(&self) -> bool {
        matches!(self, TimerMode::Running | TimerMode::Overtime)
    }
}

impl fmt::Display for TimerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// TimerState
// ============================================================================

/// Snapshot of the timer state machine.
///
/// Invariant: `task` is `Some` exactly when `mode` is Running or Overtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub mode: TimerMode,
    pub task: Option<Task>,
    pub remaining_millis: u64,
    pub overtime_millis: u64,
}

impl TimerState {
    /// Returns the idle state with no task.
    pub fn new_idle() -> Self {
        Self {
            mode: TimerMode::Idle,
            task: None,
            remaining_millis: 0,
            overtime_millis: 0,
        }
    }

    /// Begins a task: Running with the full target remaining.
    pub fn begin(&mut self, task: Task) {
        self.remaining_millis = task.target_duration_millis;
        self.overtime_millis = 0;
        self.mode = TimerMode::Running;
        self.task = Some(task);
    }

    /// Crosses into overtime. The task is kept; counters restart at zero.
    pub fn enter_overtime(&mut self) {
        self.mode = TimerMode::Overtime;
        self.remaining_millis = 0;
        self.overtime_millis = 0;
    }

    /// Updates the countdown counter.
    pub fn tick_running(&mut self, remaining_millis: u64) {
        self.remaining_millis = remaining_millis;
    }

    /// Updates the overtime counter.
    pub fn tick_overtime(&mut self, overtime_millis: u64) {
        self.overtime_millis = overtime_millis;
    }

    /// Drops the task and returns to idle with zeroed counters.
    pub fn reset_idle(&mut self) {
        self.mode = TimerMode::Idle;
        self.task = None;
        self.remaining_millis = 0;
        self.overtime_millis = 0;
    }

    /// Returns true while a task is underway.
    pub fn is_active(&self) -> bool {
        self.mode.is_active()
    }

    /// Returns the current task name, if any.
    pub fn task_name(&self) -> Option<&str> {
        self.task.as_ref().map(|task| task.name.as_str())
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new_idle()
    }
}

// ============================================================================
// TimerConfig
// ============================================================================

/// Timing configuration for the engine.
///
/// Defaults match the application constants; tests shrink them to keep
/// scenarios fast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerConfig {
    /// Countdown/overtime tick interval in milliseconds.
    pub tick_interval_ms: u64,
    /// Idle reminder interval in milliseconds.
    pub idle_reminder_interval_ms: u64,
    /// Overtime push interval in milliseconds.
    pub overtime_push_interval_ms: u64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: TICK_INTERVAL_MS,
            idle_reminder_interval_ms: IDLE_REMINDER_INTERVAL_MS,
            overtime_push_interval_ms: OVERTIME_PUSH_INTERVAL_MS,
        }
    }
}

impl TimerConfig {
    /// Sets the tick interval.
    pub fn with_tick_interval_ms(mut self, millis: u64) -> Self {
        self.tick_interval_ms = millis;
        self
    }

    /// Sets the idle reminder interval.
    pub fn with_idle_reminder_interval_ms(mut self, millis: u64) -> Self {
        self.idle_reminder_interval_ms = millis;
        self
    }

    /// Sets the overtime push interval.
    pub fn with_overtime_push_interval_ms(mut self, millis: u64) -> Self {
        self.overtime_push_interval_ms = millis;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.tick_interval_ms == 0 {
            return Err("tick interval must be greater than 0".to_string());
        }
        if self.idle_reminder_interval_ms == 0 {
            return Err("idle reminder interval must be greater than 0".to_string());
        }
        if self.overtime_push_interval_ms == 0 {
            return Err("overtime push interval must be greater than 0".to_string());
        }
        Ok(())
    }
}

// ============================================================================
// IPC Protocol Types
// ============================================================================

/// Parameters for the start command.
///
/// The wire duration is signed: clients may pass through unvalidated
/// input, and the daemon clamps negatives to zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartParams {
    pub name: String,
    pub category: Category,
    pub duration_millis: i64,
}

impl StartParams {
    /// Returns the duration with negative values clamped to zero.
    pub fn clamped_duration(&self) -> u64 {
        self.duration_millis.max(0) as u64
    }
}

/// Request sent from the CLI to the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum IpcRequest {
    /// Start a task.
    Start { params: StartParams },
    /// Complete the current task.
    Complete,
    /// Enter idle mode and schedule reminders.
    Idle,
    /// Request that the timer UI be surfaced.
    Show,
    /// Query the current state.
    Status,
}

/// State fields included in daemon responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_millis: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overtime_millis: Option<u64>,
}

impl ResponseData {
    /// Builds response data from a timer state snapshot.
    pub fn from_timer_state(state: &TimerState) -> Self {
        Self {
            mode: Some(state.mode.as_str().to_string()),
            task_name: state.task_name().map(String::from),
            category: state
                .task
                .as_ref()
                .map(|task| task.category.as_str().to_string()),
            remaining_millis: Some(state.remaining_millis),
            overtime_millis: Some(state.overtime_millis),
        }
    }
}

/// Response sent from the daemon to the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpcResponse {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl IpcResponse {
    /// Creates a success response.
    pub fn success(message: &str, data: Option<ResponseData>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.to_string(),
            data,
        }
    }

    /// Creates an error response.
    pub fn error(message: &str) -> Self {
        Self {
            status: "error".to_string(),
            message: message.to_string(),
            data: None,
        }
    }

    /// Returns true if the response reports success.
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

// ============================================================================
// Tests
// ============================================================================
