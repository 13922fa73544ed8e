//! Press/release classifier
//!
//! [`Machine`] is the automaton behind a button. Its real state is the
//! debounced contact flag, the pending-click flag held by the arbiter and the
//! click counter. [`Classification`] is only a projection of that state for
//! callers that poll.
//!
//! Every method is a stimulus applied under the button lock and returns the
//! events it produced, in order. Delivering them is left to the caller.

use embassy_time::{Duration, Instant};

use crate::alarm::AlarmKind;
use crate::config::ButtonConfig;
use crate::debounce::DebounceGate;
use crate::double_click::{Arbiter, PendingClick};
use crate::event::{Classification, Event, Events};
use crate::long_press::{ReleaseRace, Watchdog};
use crate::{debug, error, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Clicks accumulated in the current gesture.
pub enum Clicks {
    /// No gesture in progress.
    #[default]
    Zero,
    /// First press of a gesture, or a released click waiting for a second one.
    One,
    /// Second press of a pending double click.
    Two,
}

#[derive(Debug, Clone)]
/// State of one button instance.
pub struct Machine {
    debounce_window: Duration,
    release_race: ReleaseRace,
    pending_click: PendingClick,
    click_events: bool,
    classification: Classification,
    pressed: bool,
    clicks: Clicks,
    last_event_time: Option<Instant>,
    last_release_time: Option<Instant>,
    gate: DebounceGate,
    watchdog: Watchdog,
    arbiter: Arbiter,
}

impl Machine {
    /// Creates an idle, released machine. No alarm is pending.
    pub fn new(config: &ButtonConfig) -> Self {
        Self {
            debounce_window: config.get_debounce(),
            release_race: config.get_release_race(),
            pending_click: config.get_pending_click(),
            click_events: config.get_click_events(),
            classification: Classification::Idle,
            pressed: false,
            clicks: Clicks::Zero,
            last_event_time: None,
            last_release_time: None,
            gate: DebounceGate::new(config.get_debounce()),
            watchdog: Watchdog::new(config.get_long_press()),
            arbiter: Arbiter::new(config.get_double_click()),
        }
    }

    /// Current externally visible classification.
    pub fn classification(&self) -> Classification {
        self.classification
    }

    /// Debounced contact state.
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Returns true while a completed click waits for a second one.
    pub fn is_awaiting_second_click(&self) -> bool {
        self.arbiter.is_awaiting()
    }

    /// Clicks in the current gesture.
    pub fn clicks(&self) -> Clicks {
        self.clicks
    }

    /// Instant of the last accepted release.
    pub fn last_release_time(&self) -> Option<Instant> {
        self.last_release_time
    }

    /// Raw edge: (re)starts the debounce window.
    pub fn edge(&mut self, now: Instant) {
        self.gate.edge(now);
    }

    /// Returns true while a debounce window is running.
    pub fn is_debouncing(&self) -> bool {
        self.gate.is_pending()
    }

    /// Earliest pending alarm deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        [self.arbiter.deadline(), self.gate.deadline(), self.watchdog.deadline()]
            .into_iter()
            .flatten()
            .min()
    }

    /// Pops the earliest alarm due at `now`.
    ///
    /// Alarms sharing a deadline come out in [`AlarmKind::PRIORITY`] order.
    pub fn next_due(&mut self, now: Instant) -> Option<AlarmKind> {
        let deadline = self.next_deadline().filter(|deadline| *deadline <= now)?;

        for kind in AlarmKind::PRIORITY {
            let due = match kind {
                AlarmKind::DoubleClick => self.arbiter.deadline() == Some(deadline) && self.arbiter.take_if_due(now),
                AlarmKind::Debounce => self.gate.deadline() == Some(deadline) && self.gate.take_if_due(now),
                AlarmKind::LongPress => self.watchdog.deadline() == Some(deadline) && self.watchdog.take_if_due(now),
            };

            if due {
                return Some(kind);
            }
        }

        None
    }

    /// Cancels every pending alarm.
    pub fn stop(&mut self) {
        self.gate.stop();
        self.watchdog.disarm();
        self.arbiter.cancel();
    }

    /// The debounce window elapsed and the line reads `is_active`.
    pub fn debounce_elapsed(&mut self, now: Instant, is_active: bool) -> Events {
        let mut events = Events::new();

        if self.classification == Classification::LongPress && !self.pressed {
            warn!("Long press classification without a press, resetting");
            self.classification = Classification::Idle;
        }

        if is_active != self.pressed && self.is_glitch(now) {
            trace!("Discarding sample at {} ms", now.as_millis());
            return events;
        }

        match (is_active, self.pressed) {
            (true, false) => self.press(now, &mut events),
            (false, true) => self.release(now, &mut events),
            _ => {}
        }

        events
    }

    /// The long-press window elapsed. `still_active` is a fresh sample of the line.
    pub fn long_press_elapsed(&mut self, now: Instant, still_active: bool) -> Events {
        let mut events = Events::new();

        if !self.pressed {
            return events;
        }

        if still_active {
            // A long press overrides any click bookkeeping
            self.arbiter.cancel();
            self.clicks = Clicks::Zero;
            self.classification = Classification::LongPress;
            debug!("Long press at {} ms", now.as_millis());
            emit(&mut events, Event::LongPress);
            return events;
        }

        match self.release_race {
            ReleaseRace::Suppress => {
                warn!("Long press window ended after an unprocessed release");
                self.pressed = false;
                self.clicks = Clicks::Zero;
            }
            ReleaseRace::SynthesizeRelease => {
                debug!("Long press window ended after a release, releasing now");
                self.release(now, &mut events);
            }
        }

        events
    }

    /// The double-click window elapsed.
    pub fn double_click_elapsed(&mut self, now: Instant) -> Events {
        let mut events = Events::new();

        if !self.arbiter.expire() {
            return events;
        }

        self.clicks = Clicks::Zero;
        if !self.pressed {
            self.classification = Classification::Idle;
        }

        debug!("Single click resolved at {} ms", now.as_millis());
        if self.click_events {
            emit(&mut events, Event::Click);
        }

        events
    }

    fn is_glitch(&self, now: Instant) -> bool {
        self.last_event_time
            .is_some_and(|last| now.saturating_duration_since(last) < self.debounce_window / 2)
    }

    fn press(&mut self, now: Instant, events: &mut Events) {
        self.pressed = true;

        if self.arbiter.is_awaiting() {
            // Resolved on release, so holding the second press can still become a long press
            self.arbiter.cancel();
            self.clicks = Clicks::Two;
        } else {
            self.clicks = Clicks::One;
        }

        self.classification = Classification::Pressed;
        self.watchdog.arm(now);
        self.last_event_time = Some(now);

        debug!("Pressed at {} ms", now.as_millis());
        emit(events, Event::Pressed);
    }

    fn release(&mut self, now: Instant, events: &mut Events) {
        self.pressed = false;
        self.watchdog.disarm();
        self.last_release_time = Some(now);
        self.last_event_time = Some(now);

        let long_press = self.classification == Classification::LongPress;
        self.classification = if long_press {
            Classification::Idle
        } else {
            Classification::ShortPress
        };

        debug!("Released at {} ms", now.as_millis());
        emit(events, Event::Released);

        match self.clicks {
            Clicks::Two if !long_press => {
                self.classification = Classification::DoubleClick;
                self.clicks = Clicks::Zero;
                debug!("Double click at {} ms", now.as_millis());
                emit(events, Event::DoubleClick);
            }
            Clicks::One if !long_press => {
                if self.pending_click == PendingClick::Idle {
                    self.classification = Classification::Idle;
                }
                self.arbiter.open(now);
            }
            _ => {}
        }
    }
}

fn emit(events: &mut Events, event: Event) {
    if events.push(event).is_err() {
        error!("Event buffer full, dropping {:?}", event);
    }
}
