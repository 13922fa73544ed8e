//! One-shot alarms
//!
//! An [`Alarm`] is a cancellable deadline. It never runs anything itself: the
//! owner polls it with [`Alarm::take_if_due`] from the single context that
//! executes alarm callbacks, which keeps every expiry serialized.

use embassy_time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// The three alarms owned by a button.
pub enum AlarmKind {
    /// Double-click window expired.
    DoubleClick,
    /// Debounce window elapsed without a further edge.
    Debounce,
    /// Long-press window elapsed.
    LongPress,
}

impl AlarmKind {
    /// Firing order used when several alarms share a deadline.
    pub const PRIORITY: [AlarmKind; 3] = [AlarmKind::DoubleClick, AlarmKind::Debounce, AlarmKind::LongPress];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// A one-shot alarm with a fixed period.
pub struct Alarm {
    period: Duration,
    deadline: Option<Instant>,
}

impl Alarm {
    /// Creates a stopped alarm.
    pub const fn new(period: Duration) -> Self {
        Self { period, deadline: None }
    }

    /// Starts the countdown from `now`.
    ///
    /// Starting a pending alarm restarts its countdown.
    pub fn start(&mut self, now: Instant) {
        self.deadline = Some(now + self.period);
    }

    /// Cancels the countdown. Stopping a stopped alarm does nothing.
    pub fn stop(&mut self) {
        self.deadline = None;
    }

    /// Returns true while the alarm is counting down.
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Instant at which the alarm fires, if pending.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Consumes the expiry if the deadline has been reached.
    pub fn take_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(t: u64) -> Instant {
        Instant::from_millis(t)
    }

    #[test]
    fn test_stopped_by_default() {
        let mut alarm = Alarm::new(Duration::from_millis(20));

        assert!(!alarm.is_pending());
        assert_eq!(alarm.deadline(), None);
        assert!(!alarm.take_if_due(ms(1000)));
    }

    #[test]
    fn test_fires_once() {
        let mut alarm = Alarm::new(Duration::from_millis(20));
        alarm.start(ms(100));

        assert_eq!(alarm.deadline(), Some(ms(120)));
        assert!(!alarm.take_if_due(ms(119)));
        assert!(alarm.take_if_due(ms(120)));
        assert!(!alarm.is_pending());
        assert!(!alarm.take_if_due(ms(121)));
    }

    #[test]
    fn test_restart_moves_deadline() {
        let mut alarm = Alarm::new(Duration::from_millis(20));
        alarm.start(ms(0));
        alarm.start(ms(15));

        assert!(!alarm.take_if_due(ms(20)));
        assert!(alarm.take_if_due(ms(35)));
    }

    #[test]
    fn test_stop_cancels() {
        let mut alarm = Alarm::new(Duration::from_millis(300));
        alarm.start(ms(0));
        alarm.stop();

        assert!(!alarm.is_pending());
        assert!(!alarm.take_if_due(ms(500)));
    }
}
