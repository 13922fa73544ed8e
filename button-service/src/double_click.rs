//! Double-click arbiter

use embassy_time::{Duration, Instant};

use crate::alarm::Alarm;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Classification reported while a lone click waits for a second press.
pub enum PendingClick {
    /// Report `Idle` as soon as the click is released. A pair that becomes a
    /// double click never shows up as a short press.
    #[default]
    Idle,
    /// Keep reporting `ShortPress` until the window expires or a second press
    /// arrives.
    ShortPress,
}

#[derive(Debug, Clone, Copy)]
/// Holds a completed click open for the double-click window.
pub struct Arbiter {
    alarm: Alarm,
    awaiting: bool,
}

impl Arbiter {
    /// Creates an arbiter with no click pending.
    pub const fn new(window: Duration) -> Self {
        Self {
            alarm: Alarm::new(window),
            awaiting: false,
        }
    }

    /// Opens the window after a click released at `now`.
    pub fn open(&mut self, now: Instant) {
        self.awaiting = true;
        self.alarm.start(now);
    }

    /// Withdraws the pending click, either because a second press arrived or a
    /// long press took over.
    pub fn cancel(&mut self) {
        self.awaiting = false;
        self.alarm.stop();
    }

    /// Returns true while a lone click may still become a double click.
    pub fn is_awaiting(&self) -> bool {
        self.awaiting
    }

    /// Instant at which the pending click resolves as a single click.
    pub fn deadline(&self) -> Option<Instant> {
        self.alarm.deadline()
    }

    /// Consumes the expiry if the window has ended.
    pub fn take_if_due(&mut self, now: Instant) -> bool {
        self.alarm.take_if_due(now)
    }

    /// Closes the window after it expired. Returns whether a click was still pending.
    pub fn expire(&mut self) -> bool {
        let was_awaiting = self.awaiting;
        self.awaiting = false;
        was_awaiting
    }
}
