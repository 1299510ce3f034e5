//! Notification system error types.
//!
//! Errors a notification presenter can report back to the engine. The
//! engine swallows these at the boundary; they surface only in logs and
//! in startup diagnostics.

use thiserror::Error;

/// Errors that can occur in the notification system.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// Delivering a notification to the presenter failed.
    #[error("Failed to deliver notification: {0}")]
    DeliveryFailed(String),

    /// No notification presenter is available.
    #[error("Notification presenter is unavailable")]
    Unavailable,
}

impl NotificationError {
    /// Returns true if the presenter cannot deliver anything at all.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, NotificationError::Unavailable)
    }

    /// Returns a user-facing suggestion for resolving this error.
    pub fn suggestion(&self) -> &'static str {
        match self {
            NotificationError::DeliveryFailed(_) => {
                "The timer keeps running; check the daemon log for details"
            }
            NotificationError::Unavailable => {
                "Run the daemon in a session with a notification service available"
            }
        }
    }
}
