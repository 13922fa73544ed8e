//! Long-press watchdog

use embassy_time::{Duration, Instant};

use crate::alarm::Alarm;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// What to do when the watchdog fires but a fresh sample shows the line released.
///
/// This happens when the release edge is still inside its debounce window at
/// the moment the long-press window ends.
pub enum ReleaseRace {
    /// Clear the pressed flag and report nothing. No RELEASED is ever emitted
    /// for that press and the classification keeps showing it as pressed
    /// until the next press.
    #[default]
    Suppress,
    /// Treat the fresh sample as the release: emit RELEASED and run the usual
    /// click bookkeeping at the watchdog's firing time.
    SynthesizeRelease,
}

#[derive(Debug, Clone, Copy)]
/// Detects presses that are held for the whole long-press window.
pub struct Watchdog {
    alarm: Alarm,
}

impl Watchdog {
    /// Creates a disarmed watchdog.
    pub const fn new(window: Duration) -> Self {
        Self {
            alarm: Alarm::new(window),
        }
    }

    /// Starts (or restarts) the long-press window from a press at `now`.
    pub fn arm(&mut self, now: Instant) {
        self.alarm.start(now);
    }

    /// Stops the window, typically on release.
    pub fn disarm(&mut self) {
        self.alarm.stop();
    }

    /// Returns true while a press is being timed.
    pub fn is_armed(&self) -> bool {
        self.alarm.is_pending()
    }

    /// Instant at which the press becomes a long press.
    pub fn deadline(&self) -> Option<Instant> {
        self.alarm.deadline()
    }

    /// Consumes the expiry if the window has ended.
    pub fn take_if_due(&mut self, now: Instant) -> bool {
        self.alarm.take_if_due(now)
    }
}
