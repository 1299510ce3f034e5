//! Notification layer for the task timer.
//!
//! The engine talks to an abstract [`NotificationSender`]; presentation
//! is a collaborator concern. This module provides:
//!
//! - The `NotificationSender` trait with the two notification classes
//!   the timer uses: one perpetually-updated ongoing card and one
//!   replaceable transient push
//! - [`LogNotificationSender`], the daemon's default presenter, which
//!   renders notifications into the structured log
//! - [`MockNotificationSender`] for tests
//!
//! # Example
//!
//! ```rust,ignore
//! use whatnext::notification::{create_idle_ongoing, LogNotificationSender, NotificationSender};
//!
//! # async fn demo() {
//! let sender = LogNotificationSender::new();
//! let _ = sender.update_ongoing(&create_idle_ongoing()).await;
//! # }
//! ```

pub mod content;
pub mod error;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

pub use content::{
    create_idle_ongoing, create_idle_reminder, create_ongoing_for, create_overtime_ongoing,
    create_overtime_push, create_running_ongoing, create_target_reached, format_hms, IdleMessages,
    NotificationAction, NotificationContent, NotificationContentBuilder, NotificationPriority,
    IDLE_MESSAGES, MAX_TASK_NAME_LENGTH,
};
pub use error::NotificationError;

// ============================================================================
// NotificationSender Trait
// ============================================================================

/// Abstraction over notification delivery.
///
/// Implementations own two notification slots: one ongoing status card
/// updated in place, and a transient push slot where each new push
/// replaces the previous one. The engine swallows every error returned
/// from these methods.
#[allow(async_fn_in_trait)]
pub trait NotificationSender {
    /// Creates or updates the single ongoing status card.
    async fn update_ongoing(
        &self,
        content: &NotificationContent,
    ) -> Result<(), NotificationError>;

    /// Raises a transient push, replacing any previous push.
    async fn push(&self, content: &NotificationContent) -> Result<(), NotificationError>;

    /// Dismisses the ongoing card and any outstanding push.
    async fn clear_all(&self) -> Result<(), NotificationError>;

    /// Returns true if notifications can currently be delivered.
    fn is_available(&self) -> bool;
}

// ============================================================================
// LogNotificationSender
// ============================================================================

/// Presenter that renders notifications into the daemon log.
///
/// Ongoing updates arrive every second while a task runs, so they log
/// at debug; pushes are the user-facing moments and log at info.
#[derive(Debug, Default)]
pub struct LogNotificationSender;

impl LogNotificationSender {
    /// Creates a new log-backed presenter.
    pub fn new() -> Self {
        Self
    }
}

impl NotificationSender for LogNotificationSender {
    async fn update_ongoing(
        &self,
        content: &NotificationContent,
    ) -> Result<(), NotificationError> {
        tracing::debug!(title = %content.title, body = %content.body, "ongoing notification");
        Ok(())
    }

    async fn push(&self, content: &NotificationContent) -> Result<(), NotificationError> {
        tracing::info!(title = %content.title, body = %content.body, "push notification");
        Ok(())
    }

    async fn clear_all(&self) -> Result<(), NotificationError> {
        tracing::debug!("notifications cleared");
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }
}

// ============================================================================
// MockNotificationSender
// ============================================================================

/// Mock notification sender for testing.
///
/// Records every delivered content and supports failure injection so
/// tests can verify that the engine swallows presenter errors.
#[derive(Debug)]
pub struct MockNotificationSender {
    ongoing_updates: Mutex<Vec<NotificationContent>>,
    pushes: Mutex<Vec<NotificationContent>>,
    clear_calls: AtomicUsize,
    should_fail: AtomicBool,
    available: AtomicBool,
}

impl MockNotificationSender {
    /// Creates a new mock sender.
    pub fn new() -> Self {
        Self {
            ongoing_updates: Mutex::new(Vec::new()),
            pushes: Mutex::new(Vec::new()),
            clear_calls: AtomicUsize::new(0),
            should_fail: AtomicBool::new(false),
            available: AtomicBool::new(true),
        }
    }

    /// Makes subsequent sends fail (or succeed again).
    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    /// Sets the reported availability.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Returns all ongoing-card updates in delivery order.
    pub fn ongoing_updates(&self) -> Vec<NotificationContent> {
        self.ongoing_updates.lock().unwrap().clone()
    }

    /// Returns the most recent ongoing-card content.
    pub fn last_ongoing(&self) -> Option<NotificationContent> {
        self.ongoing_updates.lock().unwrap().last().cloned()
    }

    /// Returns all pushes in delivery order.
    pub fn pushes(&self) -> Vec<NotificationContent> {
        self.pushes.lock().unwrap().clone()
    }

    /// Returns the number of pushes delivered.
    pub fn push_count(&self) -> usize {
        self.pushes.lock().unwrap().len()
    }

    /// Returns how many times `clear_all` was called.
    pub fn clear_count(&self) -> usize {
        self.clear_calls.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> Result<(), NotificationError> {
        if self.should_fail.load(Ordering::SeqCst) {
            Err(NotificationError::DeliveryFailed(
                "mock failure".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

impl Default for MockNotificationSender {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationSender for MockNotificationSender {
    async fn update_ongoing(
        &self,
        content: &NotificationContent,
    ) -> Result<(), NotificationError> {
        self.check_failure()?;
        self.ongoing_updates.lock().unwrap().push(content.clone());
        Ok(())
    }

    async fn push(&self, content: &NotificationContent) -> Result<(), NotificationError> {
        self.check_failure()?;
        self.pushes.lock().unwrap().push(content.clone());
        Ok(())
    }

    async fn clear_all(&self) -> Result<(), NotificationError> {
        self.check_failure()?;
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}
