//! Timer engine: the countdown/overtime/idle state machine.
//!
//! This module provides the core timer functionality:
//! - State transitions (Idle → Running → Overtime → Idle)
//! - Wall-clock-anchored countdown and overtime tracking
//! - Periodic overtime pushes and idle reminders
//! - Snapshot and event publishing over the bus
//!
//! The engine runs as a single task. Commands from the bus and due
//! deadlines from the [`ReminderSchedule`] are processed one at a time,
//! so every entry point runs to completion before the next is
//! dispatched and no locking is needed. Elapsed time is always
//! recomputed from an anchor instant, never accumulated per tick, so
//! late timer delivery self-corrects instead of drifting.

use std::sync::Arc;

use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::bus::{self, EventBus, TimerCommand, TimerEvent};
use crate::notification::{content, IdleMessages, NotificationContent, NotificationSender};
use crate::types::{Category, Task, TimerConfig, TimerMode, TimerState};

use super::schedule::{Concern, ReminderSchedule};

// ============================================================================
// Constants
// ============================================================================

/// Stand-in deadline for target durations beyond the clock's range,
/// about thirty years out.
const DISTANT_DEADLINE_SECS: u64 = 86_400 * 365 * 30;

// ============================================================================
// TimerEngine
// ============================================================================

/// The timer state machine.
///
/// Construct with [`TimerEngine::new`], then either call the operation
/// methods directly or hand the engine to [`TimerEngine::run`] and
/// drive it through the returned [`EventBus`].
pub struct TimerEngine<N: NotificationSender> {
    config: TimerConfig,
    state: TimerState,
    schedule: ReminderSchedule,
    /// Anchor of the countdown tick grid (the start instant).
    countdown_started_at: Option<Instant>,
    /// Instant at which the target duration elapses.
    countdown_deadline: Option<Instant>,
    /// Anchor of overtime tracking; overtime is now minus this.
    overtime_started_at: Option<Instant>,
    /// Anchor of the idle reminder cadence.
    idle_entered_at: Option<Instant>,
    idle_messages: IdleMessages,
    commands: tokio::sync::mpsc::UnboundedReceiver<TimerCommand>,
    events: tokio::sync::broadcast::Sender<TimerEvent>,
    snapshots: tokio::sync::watch::Sender<TimerState>,
    notifier: Arc<N>,
}

impl<N: NotificationSender> TimerEngine<N> {
    /// Creates an idle engine wired to a fresh bus.
    pub fn new(config: TimerConfig, notifier: Arc<N>) -> (Self, EventBus) {
        let (bus, ports) = bus::wire(TimerState::new_idle());
        let engine = Self {
            config,
            state: TimerState::new_idle(),
            schedule: ReminderSchedule::new(),
            countdown_started_at: None,
            countdown_deadline: None,
            overtime_started_at: None,
            idle_entered_at: None,
            idle_messages: IdleMessages::new(),
            commands: ports.commands,
            events: ports.events,
            snapshots: ports.snapshots,
            notifier,
        };
        (engine, bus)
    }

    /// Returns the current state.
    pub fn state(&self) -> &TimerState {
        &self.state
    }

    /// Processes commands and due deadlines until every bus handle is
    /// dropped.
    pub async fn run(mut self) {
        debug!("Timer engine loop started");
        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    match command {
                        Some(command) => self.dispatch(command).await,
                        None => break,
                    }
                }
                Some(concern) = self.schedule.sleep_until_due() => {
                    self.on_due(concern).await;
                }
            }
        }
        debug!("Timer engine loop stopped");
    }

    async fn dispatch(&mut self, command: TimerCommand) {
        match command {
            TimerCommand::Start {
                name,
                category,
                duration_millis,
            } => self.start(&name, category, duration_millis).await,
            TimerCommand::CompleteRequested => self.complete().await,
            TimerCommand::EnterIdle => self.enter_idle_mode().await,
            // Show never touches timer state; republish so a surfacing
            // UI has a fresh snapshot to render.
            TimerCommand::ShowTimerRequested => self.publish_snapshot(),
        }
    }

    async fn on_due(&mut self, concern: Concern) {
        match concern {
            Concern::CountdownTick => self.on_countdown_tick().await,
            Concern::OvertimeTick => self.on_overtime_tick().await,
            Concern::OvertimePush => self.on_overtime_push().await,
            Concern::IdlePush => self.on_idle_push().await,
        }
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Starts a task, atomically replacing whatever was active.
    ///
    /// All timers of the previous state are canceled before the new
    /// countdown is armed. A zero duration is valid and crosses into
    /// overtime on the next tick.
    pub async fn start(&mut self, name: &str, category: Category, duration_millis: u64) {
        self.schedule.clear();

        let now = Instant::now();
        let deadline = now
            .checked_add(Duration::from_millis(duration_millis))
            .unwrap_or_else(|| now + Duration::from_secs(DISTANT_DEADLINE_SECS));
        let task = Task::new(name, category, duration_millis);
        info!(task = %task.name, category = %task.category, duration_millis, "Task started");

        self.state.begin(task);
        self.countdown_started_at = Some(now);
        self.countdown_deadline = Some(deadline);
        self.overtime_started_at = None;
        self.idle_entered_at = None;

        self.schedule.arm(
            Concern::CountdownTick,
            Self::next_on_grid(now, now, self.tick_interval()).min(deadline),
        );
        self.publish_snapshot();
        self.publish_tick();
        self.update_ongoing_card().await;
    }

    /// Completes the current task: cancels every timer, dismisses
    /// notifications and returns to idle.
    ///
    /// Idle reminders are NOT rescheduled here; entering idle-reminder
    /// mode is a separate explicit step.
    pub async fn complete(&mut self) {
        self.schedule.clear();
        self.countdown_started_at = None;
        self.countdown_deadline = None;
        self.overtime_started_at = None;
        self.idle_entered_at = None;

        if let Some(name) = self.state.task_name() {
            info!(task = %name, "Task completed");
        }
        self.state.reset_idle();
        self.publish_snapshot();
        let _ = self.events.send(TimerEvent::Completed);

        if let Err(error) = self.notifier.clear_all().await {
            warn!(%error, "Failed to clear notifications");
        }
    }

    /// Enters idle-reminder mode. Idempotent; calling it again resets
    /// the reminder cadence.
    pub async fn enter_idle_mode(&mut self) {
        self.schedule.clear();
        self.countdown_started_at = None;
        self.countdown_deadline = None;
        self.overtime_started_at = None;

        let now = Instant::now();
        self.idle_entered_at = Some(now);
        self.state.reset_idle();
        self.schedule
            .arm(Concern::IdlePush, now + self.idle_reminder_interval());
        info!(
            first_reminder_millis = self.config.idle_reminder_interval_ms,
            "Idle mode entered"
        );

        self.publish_snapshot();
        self.update_ongoing_card().await;
    }

    // ========================================================================
    // Scheduled concerns
    // ========================================================================

    async fn on_countdown_tick(&mut self) {
        if self.state.mode != TimerMode::Running {
            return;
        }
        let (Some(started_at), Some(deadline)) =
            (self.countdown_started_at, self.countdown_deadline)
        else {
            return;
        };

        let now = Instant::now();
        let remaining = deadline.saturating_duration_since(now);
        if remaining.is_zero() {
            self.transition_to_overtime(now).await;
            return;
        }

        self.state.tick_running(remaining.as_millis() as u64);
        self.schedule.arm(
            Concern::CountdownTick,
            Self::next_on_grid(started_at, now, self.tick_interval()).min(deadline),
        );
        self.publish_snapshot();
        self.publish_tick();
        self.update_ongoing_card().await;
    }

    /// Crosses from Running into Overtime. Fires exactly once per
    /// started task: the countdown concern that triggers it is disarmed
    /// and the mode leaves Running.
    async fn transition_to_overtime(&mut self, now: Instant) {
        self.schedule.clear();
        self.countdown_started_at = None;
        self.countdown_deadline = None;
        self.overtime_started_at = Some(now);

        self.state.enter_overtime();
        if let Some(name) = self.state.task_name() {
            info!(task = %name, "Target duration reached, tracking overtime");
        }

        self.schedule
            .arm(Concern::OvertimeTick, now + self.tick_interval());
        self.schedule
            .arm(Concern::OvertimePush, now + self.overtime_push_interval());

        self.publish_snapshot();
        self.publish_tick();
        if let Some(task) = &self.state.task {
            let content = content::create_target_reached(task);
            self.send_push(content).await;
        }
        self.update_ongoing_card().await;
    }

    async fn on_overtime_tick(&mut self) {
        if self.state.mode != TimerMode::Overtime {
            return;
        }
        let Some(started_at) = self.overtime_started_at else {
            return;
        };

        let now = Instant::now();
        let overtime = now.saturating_duration_since(started_at);
        self.state.tick_overtime(overtime.as_millis() as u64);
        self.schedule.arm(
            Concern::OvertimeTick,
            Self::next_on_grid(started_at, now, self.tick_interval()),
        );
        self.publish_snapshot();
        self.publish_tick();
        self.update_ongoing_card().await;
    }

    async fn on_overtime_push(&mut self) {
        if self.state.mode != TimerMode::Overtime {
            return;
        }
        let Some(started_at) = self.overtime_started_at else {
            return;
        };

        let now = Instant::now();
        let overtime_millis = now.saturating_duration_since(started_at).as_millis() as u64;
        let minutes = overtime_millis / 60_000;
        self.schedule.arm(
            Concern::OvertimePush,
            Self::next_on_grid(started_at, now, self.overtime_push_interval()),
        );
        if let Some(task) = &self.state.task {
            let content = content::create_overtime_push(task, minutes);
            self.send_push(content).await;
        }
    }

    async fn on_idle_push(&mut self) {
        if self.state.mode != TimerMode::Idle {
            return;
        }
        let Some(entered_at) = self.idle_entered_at else {
            return;
        };

        let now = Instant::now();
        self.schedule.arm(
            Concern::IdlePush,
            Self::next_on_grid(entered_at, now, self.idle_reminder_interval()),
        );
        let message = self.idle_messages.next_message();
        debug!(message, "Idle reminder due");
        self.send_push(content::create_idle_reminder(message)).await;
    }

    // ========================================================================
    // Publishing
    // ========================================================================

    fn publish_snapshot(&self) {
        self.snapshots.send_replace(self.state.clone());
    }

    fn publish_tick(&self) {
        // No subscribers is fine; the engine advances regardless.
        let _ = self.events.send(TimerEvent::Tick {
            remaining_millis: self.state.remaining_millis,
            is_overtime: self.state.mode == TimerMode::Overtime,
            overtime_millis: self.state.overtime_millis,
        });
    }

    async fn update_ongoing_card(&self) {
        let content = content::create_ongoing_for(&self.state);
        if let Err(error) = self.notifier.update_ongoing(&content).await {
            if error.is_unavailable() {
                debug!("Ongoing update skipped, no presenter available");
            } else {
                warn!(%error, "Failed to update ongoing notification");
            }
        }
    }

    async fn send_push(&self, content: NotificationContent) {
        if let Err(error) = self.notifier.push(&content).await {
            if error.is_unavailable() {
                debug!("Push skipped, no presenter available");
            } else {
                warn!(%error, "Failed to send push notification");
            }
        }
    }

    // ========================================================================
    // Timing helpers
    // ========================================================================

    fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.config.tick_interval_ms)
    }

    fn idle_reminder_interval(&self) -> Duration {
        Duration::from_millis(self.config.idle_reminder_interval_ms)
    }

    fn overtime_push_interval(&self) -> Duration {
        Duration::from_millis(self.config.overtime_push_interval_ms)
    }

    /// Next deadline on the `period` grid anchored at `anchor`.
    ///
    /// After delivery delay (or a suspend), this lands on the upcoming
    /// grid point instead of bursting through the missed ones.
    fn next_on_grid(anchor: Instant, now: Instant, period: Duration) -> Instant {
        let elapsed = now.saturating_duration_since(anchor);
        let periods = (elapsed.as_millis() / period.as_millis().max(1)) as u32;
        anchor + period.saturating_mul(periods + 1)
    }
}

// ============================================================================
// Tests
// ============================================================================
