//! Task Timer Library
//!
//! This library provides the core functionality for the whatnext CLI.
//! It includes:
//! - Timer engine driving countdown, overtime, and idle reminders
//! - Typed command/event bus connecting collaborators to the engine
//! - IPC server/client for daemon-CLI communication
//! - CLI command parsing and display utilities
//! - Notification content and delivery abstraction
//! - Read-side state store with display projection

pub mod bus;
pub mod cli;
pub mod daemon;
pub mod notification;
pub mod store;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    Category, IpcRequest, IpcResponse, ResponseData, StartParams, Task, TimerConfig, TimerMode,
    TimerState,
};

// Re-export bus types
pub use bus::{EventBus, TimerCommand, TimerEvent};

// Re-export notification types
pub use notification::{
    IdleMessages, LogNotificationSender, MockNotificationSender, NotificationContent,
    NotificationError, NotificationPriority, NotificationSender,
};

// Re-export daemon types
pub use daemon::{default_socket_path, IpcServer, RequestHandler, TimerEngine};

// Re-export store types
pub use store::{StateStore, UiState};
