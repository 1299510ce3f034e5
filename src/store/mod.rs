//! Read-side state mirror for serving status queries.
//!
//! This module provides:
//! - [`UiState`]: a display-oriented snapshot derived from [`TimerState`]
//! - [`StateStore`]: a handle over the engine's snapshot channel
//!
//! The engine owns the authoritative [`TimerState`] and publishes every
//! change over a watch channel. The store wraps the receiving side so
//! request handlers can read the latest snapshot, or wait for the next
//! one, without talking to the engine task directly.

use tokio::sync::watch;

use crate::notification::format_hms;
use crate::types::{Category, TimerMode, TimerState};

// ============================================================================
// Constants
// ============================================================================

/// Emoji shown while no task is active.
const IDLE_EMOJI: &str = "⏱️";

// ============================================================================
// UiState
// ============================================================================

/// Display-oriented snapshot of the timer.
///
/// Everything a status surface needs, flattened out of [`TimerState`]
/// so the surface never has to reach into the task option itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
    /// Current timer mode
    pub mode: TimerMode,
    /// Active task name, if any
    pub task_name: Option<String>,
    /// Active task category, if any
    pub category: Option<Category>,
    /// Remaining countdown in milliseconds
    pub remaining_millis: u64,
    /// Accumulated overtime in milliseconds
    pub overtime_millis: u64,
}

impl UiState {
    /// Derives the display snapshot from an engine snapshot.
    pub fn from_timer_state(state: &TimerState) -> Self {
        Self {
            mode: state.mode,
            task_name: state.task_name().map(str::to_string),
            category: state.task.as_ref().map(|task| task.category),
            remaining_millis: state.remaining_millis,
            overtime_millis: state.overtime_millis,
        }
    }

    /// Generates a one-line summary for compact surfaces.
    ///
    /// Format:
    /// - Running: "🔥 MM:SS" (category emoji, time remaining)
    /// - Overtime: "🔥 +MM:SS" (category emoji, time over target)
    /// - Idle: "⏱️ Idle"
    pub fn headline(&self) -> String {
        let emoji = self
            .category
            .map(|category| category.emoji())
            .unwrap_or(IDLE_EMOJI);
        match self.mode {
            TimerMode::Running => format!("{} {}", emoji, format_hms(self.remaining_millis)),
            TimerMode::Overtime => format!("{} +{}", emoji, format_hms(self.overtime_millis)),
            TimerMode::Idle => format!("{} Idle", IDLE_EMOJI),
        }
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::from_timer_state(&TimerState::new_idle())
    }
}

// ============================================================================
// StateStore
// ============================================================================

/// Cheap, cloneable read handle over the engine's snapshot channel.
#[derive(Debug, Clone)]
pub struct StateStore {
    states: watch::Receiver<TimerState>,
}

impl StateStore {
    /// Wraps the receiving side of the engine's snapshot channel.
    pub fn new(states: watch::Receiver<TimerState>) -> Self {
        Self { states }
    }

    /// Returns a clone of the latest engine snapshot.
    pub fn current(&self) -> TimerState {
        self.states.borrow().clone()
    }

    /// Returns the latest snapshot in display form.
    pub fn ui(&self) -> UiState {
        UiState::from_timer_state(&self.states.borrow())
    }

    /// Returns a fresh receiver for waiting on snapshot changes.
    ///
    /// The latest snapshot is marked seen before the receiver is handed
    /// out, so `changed()` resolves only for publishes that happen
    /// after this call.
    pub fn watch(&self) -> watch::Receiver<TimerState> {
        let mut receiver = self.states.clone();
        receiver.borrow_and_update();
        receiver
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Task;

    fn running_state(name: &str, category: Category, remaining_millis: u64) -> TimerState {
        let mut state = TimerState::new_idle();
        state.begin(Task::new(name, category, remaining_millis));
        state
    }

    // ------------------------------------------------------------------------
    // UiState Tests
    // ------------------------------------------------------------------------

    mod ui_state_tests {
        use super::*;

        #[test]
        fn test_from_idle_state() {
            let ui = UiState::from_timer_state(&TimerState::new_idle());

            assert_eq!(ui.mode, TimerMode::Idle);
            assert!(ui.task_name.is_none());
            assert!(ui.category.is_none());
            assert_eq!(ui.remaining_millis, 0);
            assert_eq!(ui.overtime_millis, 0);
        }

        #[test]
        fn test_from_running_state() {
            let state = running_state("Write report", Category::Challenge, 1_800_000);
            let ui = UiState::from_timer_state(&state);

            assert_eq!(ui.mode, TimerMode::Running);
            assert_eq!(ui.task_name.as_deref(), Some("Write report"));
            assert_eq!(ui.category, Some(Category::Challenge));
            assert_eq!(ui.remaining_millis, 1_800_000);
        }

        #[test]
        fn test_from_overtime_state() {
            let mut state = running_state("Nap", Category::Recharge, 0);
            state.enter_overtime();
            state.tick_overtime(95_000);
            let ui = UiState::from_timer_state(&state);

            assert_eq!(ui.mode, TimerMode::Overtime);
            assert_eq!(ui.category, Some(Category::Recharge));
            assert_eq!(ui.remaining_millis, 0);
            assert_eq!(ui.overtime_millis, 95_000);
        }

        #[test]
        fn test_default_is_idle() {
            assert_eq!(UiState::default().mode, TimerMode::Idle);
        }
    }

    // ------------------------------------------------------------------------
    // Headline Tests
    // ------------------------------------------------------------------------

    mod headline_tests {
        use super::*;

        #[test]
        fn test_idle_headline() {
            let ui = UiState::from_timer_state(&TimerState::new_idle());
            assert_eq!(ui.headline(), "⏱️ Idle");
        }

        #[test]
        fn test_running_headline_challenge() {
            let state = running_state("Write report", Category::Challenge, 1_530_000);
            let ui = UiState::from_timer_state(&state);
            assert_eq!(ui.headline(), "🔥 25:30");
        }

        #[test]
        fn test_running_headline_recharge() {
            let state = running_state("Nap", Category::Recharge, 65_000);
            let ui = UiState::from_timer_state(&state);
            assert_eq!(ui.headline(), "🌿 01:05");
        }

        #[test]
        fn test_running_headline_over_an_hour() {
            let state = running_state("Deep work", Category::Challenge, 5_400_000);
            let ui = UiState::from_timer_state(&state);
            assert_eq!(ui.headline(), "🔥 1:30:00");
        }

        #[test]
        fn test_overtime_headline_is_plus_prefixed() {
            let mut state = running_state("Write report", Category::Challenge, 0);
            state.enter_overtime();
            state.tick_overtime(192_000);
            let ui = UiState::from_timer_state(&state);
            assert_eq!(ui.headline(), "🔥 +03:12");
        }
    }

    // ------------------------------------------------------------------------
    // StateStore Tests
    // ------------------------------------------------------------------------

    mod state_store_tests {
        use super::*;
        use tokio::sync::watch;

        #[test]
        fn test_current_returns_latest_snapshot() {
            let (tx, rx) = watch::channel(TimerState::new_idle());
            let store = StateStore::new(rx);

            assert_eq!(store.current().mode, TimerMode::Idle);

            tx.send_replace(running_state("Write report", Category::Challenge, 60_000));
            assert_eq!(store.current().mode, TimerMode::Running);
            assert_eq!(store.current().task_name(), Some("Write report"));
        }

        #[test]
        fn test_ui_tracks_snapshot() {
            let (tx, rx) = watch::channel(TimerState::new_idle());
            let store = StateStore::new(rx);

            assert_eq!(store.ui().headline(), "⏱️ Idle");

            tx.send_replace(running_state("Nap", Category::Recharge, 300_000));
            assert_eq!(store.ui().headline(), "🌿 05:00");
        }

        #[tokio::test]
        async fn test_watch_sees_only_later_publishes() {
            let (tx, rx) = watch::channel(TimerState::new_idle());
            let store = StateStore::new(rx);

            // Published before watch() is already considered seen.
            tx.send_replace(running_state("Write report", Category::Challenge, 60_000));
            let mut watcher = store.watch();
            assert!(!watcher.has_changed().unwrap());

            tx.send_replace(running_state("Nap", Category::Recharge, 300_000));
            assert!(watcher.has_changed().unwrap());
            assert_eq!(watcher.borrow_and_update().task_name(), Some("Nap"));
        }

        #[test]
        fn test_clones_share_the_channel() {
            let (tx, rx) = watch::channel(TimerState::new_idle());
            let store = StateStore::new(rx);
            let clone = store.clone();

            tx.send_replace(running_state("Nap", Category::Recharge, 300_000));
            assert_eq!(store.current(), clone.current());
        }
    }
}
