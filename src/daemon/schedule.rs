//! Delayed-callback bookkeeping for the timer engine.
//!
//! Each scheduling concern owns at most one pending deadline. Arming a
//! concern replaces its previous deadline, so a transition can never
//! leak a timer from the mode it left behind. The engine awaits
//! [`ReminderSchedule::sleep_until_due`] inside its run loop; the
//! earliest armed deadline wins, with ties resolved in declaration
//! order.

use tokio::time::{sleep_until, Instant};

// ============================================================================
// Concern
// ============================================================================

/// The scheduling concerns the engine juggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Concern {
    /// One-second countdown tick while Running.
    CountdownTick,
    /// One-second overtime tick while in Overtime.
    OvertimeTick,
    /// Periodic overtime push notification.
    OvertimePush,
    /// Periodic idle reminder notification.
    IdlePush,
}

impl Concern {
    /// All concerns, in tie-break order.
    pub const ALL: [Concern; 4] = [
        Concern::CountdownTick,
        Concern::OvertimeTick,
        Concern::OvertimePush,
        Concern::IdlePush,
    ];

    fn index(self) -> usize {
        match self {
            Concern::CountdownTick => 0,
            Concern::OvertimeTick => 1,
            Concern::OvertimePush => 2,
            Concern::IdlePush => 3,
        }
    }

    /// Returns the concern's name for logging.
    pub fn as_str(self) -> &'static str {
        match self {
            Concern::CountdownTick => "countdown_tick",
            Concern::OvertimeTick => "overtime_tick",
            Concern::OvertimePush => "overtime_push",
            Concern::IdlePush => "idle_push",
        }
    }
}

// ============================================================================
// ReminderSchedule
// ============================================================================

/// One pending deadline slot per concern.
#[derive(Debug, Default)]
pub struct ReminderSchedule {
    slots: [Option<Instant>; 4],
}

impl ReminderSchedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a concern, canceling any deadline it already had.
    pub fn arm(&mut self, concern: Concern, at: Instant) {
        self.slots[concern.index()] = Some(at);
    }

    /// Cancels a single concern.
    pub fn cancel(&mut self, concern: Concern) {
        self.slots[concern.index()] = None;
    }

    /// Cancels every concern.
    pub fn clear(&mut self) {
        self.slots = [None; 4];
    }

    /// Returns the pending deadline of a concern, if armed.
    pub fn deadline(&self, concern: Concern) -> Option<Instant> {
        self.slots[concern.index()]
    }

    /// Returns true if the concern has a pending deadline.
    pub fn is_armed(&self, concern: Concern) -> bool {
        self.slots[concern.index()].is_some()
    }

    /// Returns the earliest armed concern and its deadline.
    pub fn next_armed(&self) -> Option<(Concern, Instant)> {
        let mut earliest: Option<(Concern, Instant)> = None;
        for concern in Concern::ALL {
            if let Some(at) = self.slots[concern.index()] {
                match earliest {
                    Some((_, best)) if best <= at => {}
                    _ => earliest = Some((concern, at)),
                }
            }
        }
        earliest
    }

    /// Sleeps until the earliest armed deadline, then disarms and
    /// returns that concern. Returns `None` immediately when nothing is
    /// armed. Cancel-safe: dropping the future leaves the slot armed.
    pub async fn sleep_until_due(&mut self) -> Option<Concern> {
        let (concern, at) = self.next_armed()?;
        sleep_until(at).await;
        self.slots[concern.index()] = None;
        Some(concern)
    }
}
