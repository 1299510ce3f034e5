//! In-process event bus between the timer engine and its observers.
//!
//! Commands travel UI-side to engine over an unbounded mpsc channel;
//! Tick/Completed events fan out over a broadcast channel; full state
//! snapshots are mirrored through a watch channel so any number of
//! observers can read the latest state or await changes.

use anyhow::{Context, Result};
use tokio::sync::{broadcast, mpsc, watch};

use crate::types::{Category, TimerState};

/// Broadcast buffer size for Tick/Completed events. Slow subscribers
/// that fall further behind than this observe a lag error and resume
/// from the oldest retained event.
pub const EVENT_CHANNEL_CAPACITY: usize = 100;

// ============================================================================
// Commands and Events
// ============================================================================

/// Commands accepted by the timer engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerCommand {
    /// Start a task, replacing whatever was active.
    Start {
        name: String,
        category: Category,
        duration_millis: u64,
    },
    /// Complete the current task and return to idle.
    CompleteRequested,
    /// Surface the timer UI; republishes the current snapshot.
    ShowTimerRequested,
    /// Enter idle mode and schedule periodic reminders.
    EnterIdle,
}

/// Events published by the timer engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Periodic progress report, also emitted at mode changes.
    Tick {
        remaining_millis: u64,
        is_overtime: bool,
        overtime_millis: u64,
    },
    /// The current task was completed.
    Completed,
}

// ============================================================================
// EventBus
// ============================================================================

/// Engine-side channel ends, consumed by `TimerEngine`.
pub(crate) struct EnginePorts {
    pub commands: mpsc::UnboundedReceiver<TimerCommand>,
    pub events: broadcast::Sender<TimerEvent>,
    pub snapshots: watch::Sender<TimerState>,
}

/// Observer-side handle to the bus. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EventBus {
    commands: mpsc::UnboundedSender<TimerCommand>,
    events: broadcast::Sender<TimerEvent>,
    snapshots: watch::Receiver<TimerState>,
}

/// Creates a wired bus along with the engine-side ports.
pub(crate) fn wire(initial: TimerState) -> (EventBus, EnginePorts) {
    let (commands_tx, commands_rx) = mpsc::unbounded_channel();
    let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
    let (snapshots_tx, snapshots_rx) = watch::channel(initial);

    let bus = EventBus {
        commands: commands_tx,
        events: events_tx.clone(),
        snapshots: snapshots_rx,
    };
    let ports = EnginePorts {
        commands: commands_rx,
        events: events_tx,
        snapshots: snapshots_tx,
    };
    (bus, ports)
}

impl EventBus {
    /// Sends a command to the engine.
    pub fn send(&self, command: TimerCommand) -> Result<()> {
        self.commands
            .send(command)
            .context("Timer engine is not running")
    }

    /// Starts a task.
    pub fn start(
        &self,
        name: impl Into<String>,
        category: Category,
        duration_millis: u64,
    ) -> Result<()> {
        self.send(TimerCommand::Start {
            name: name.into(),
            category,
            duration_millis,
        })
    }

    /// Requests completion of the current task.
    pub fn request_complete(&self) -> Result<()> {
        self.send(TimerCommand::CompleteRequested)
    }

    /// Requests that the timer UI be surfaced.
    pub fn request_show_timer(&self) -> Result<()> {
        self.send(TimerCommand::ShowTimerRequested)
    }

    /// Requests idle mode with periodic reminders.
    pub fn enter_idle(&self) -> Result<()> {
        self.send(TimerCommand::EnterIdle)
    }

    /// Subscribes to Tick/Completed events from this point forward.
    pub fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.events.subscribe()
    }

    /// Returns a receiver over the state snapshot stream.
    pub fn watch_state(&self) -> watch::Receiver<TimerState> {
        self.snapshots.clone()
    }

    /// Returns a copy of the latest published state.
    pub fn state(&self) -> TimerState {
        self.snapshots.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wired() -> (EventBus, EnginePorts) {
        wire(TimerState::new_idle())
    }

    mod command_tests {
        use super::*;

        #[tokio::test]
        async fn test_commands_arrive_in_order() {
            let (bus, mut ports) = wired();

            bus.start("Write report", Category::Challenge, 1_800_000)
                .unwrap();
            bus.request_complete().unwrap();
            bus.enter_idle().unwrap();

            assert_eq!(
                ports.commands.recv().await,
                Some(TimerCommand::Start {
                    name: "Write report".to_string(),
                    category: Category::Challenge,
                    duration_millis: 1_800_000,
                })
            );
            assert_eq!(
                ports.commands.recv().await,
                Some(TimerCommand::CompleteRequested)
            );
            assert_eq!(ports.commands.recv().await, Some(TimerCommand::EnterIdle));
        }

        #[tokio::test]
        async fn test_send_fails_after_engine_side_dropped() {
            let (bus, ports) = wired();
            drop(ports);

            let result = bus.request_show_timer();
            assert!(result.is_err());
            assert!(result
                .unwrap_err()
                .to_string()
                .contains("Timer engine is not running"));
        }
    }

    mod event_tests {
        use super::*;

        #[tokio::test]
        async fn test_events_fan_out_to_every_subscriber_in_order() {
            let (bus, ports) = wired();
            let mut first = bus.subscribe();
            let mut second = bus.subscribe();

            let tick = TimerEvent::Tick {
                remaining_millis: 900_000,
                is_overtime: false,
                overtime_millis: 0,
            };
            ports.events.send(tick).unwrap();
            ports.events.send(TimerEvent::Completed).unwrap();

            for receiver in [&mut first, &mut second] {
                assert_eq!(receiver.recv().await.unwrap(), tick);
                assert_eq!(receiver.recv().await.unwrap(), TimerEvent::Completed);
            }
        }

        #[tokio::test]
        async fn test_late_subscriber_misses_prior_events() {
            let (bus, ports) = wired();

            ports.events.send(TimerEvent::Completed).unwrap();
            let mut late = bus.subscribe();

            assert!(late.try_recv().is_err());
        }
    }

    mod snapshot_tests {
        use super::*;
        use crate::types::Task;

        #[tokio::test]
        async fn test_state_reflects_latest_snapshot() {
            let (bus, ports) = wired();
            assert_eq!(bus.state().mode, crate::types::TimerMode::Idle);

            let mut running = TimerState::new_idle();
            running.begin(Task::new("Nap", Category::Recharge, 0));
            ports.snapshots.send_replace(running.clone());

            assert_eq!(bus.state(), running);
        }

        #[tokio::test]
        async fn test_watchers_are_notified_of_changes() {
            let (bus, ports) = wired();
            let mut watcher = bus.watch_state();

            let mut running = TimerState::new_idle();
            running.begin(Task::new("Write report", Category::Challenge, 60_000));
            ports.snapshots.send_replace(running);

            watcher.changed().await.unwrap();
            assert_eq!(
                watcher.borrow_and_update().task_name(),
                Some("Write report")
            );
        }
    }
}
