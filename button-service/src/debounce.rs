//! Debounce Module

use embassy_time::{Duration, Instant};
use embedded_hal_1::digital::InputPin;

use crate::alarm::Alarm;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Enum representing if the button is active low or active high.
pub enum ActiveState {
    /// Button is active low.
    #[default]
    ActiveLow,
    /// Button is active high.
    ActiveHigh,
}

/// Samples the line and reports whether it is at its active level.
pub fn sample<I: InputPin>(gpio: &mut I, active_state: ActiveState) -> Result<bool, I::Error> {
    match active_state {
        ActiveState::ActiveLow => gpio.is_low(),
        ActiveState::ActiveHigh => gpio.is_high(),
    }
}

#[derive(Debug, Clone, Copy)]
/// Coalesces a burst of edges into a single trusted sample.
///
/// Every edge restarts the window. The line is only sampled once the window
/// has elapsed without another edge.
pub struct DebounceGate {
    alarm: Alarm,
}

impl DebounceGate {
    /// Creates an idle gate with the given settling window.
    pub const fn new(window: Duration) -> Self {
        Self {
            alarm: Alarm::new(window),
        }
    }

    /// Records a raw edge at `now`.
    pub fn edge(&mut self, now: Instant) {
        self.alarm.start(now);
    }

    /// Instant at which the next trusted sample is due.
    pub fn deadline(&self) -> Option<Instant> {
        self.alarm.deadline()
    }

    /// Returns true once per settled window.
    pub fn take_if_due(&mut self, now: Instant) -> bool {
        self.alarm.take_if_due(now)
    }

    /// Returns true while edges are still settling.
    pub fn is_pending(&self) -> bool {
        self.alarm.is_pending()
    }

    /// Drops any pending sample.
    pub fn stop(&mut self) {
        self.alarm.stop();
    }
}
