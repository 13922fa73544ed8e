//! Simulated input line and clock for driving a button without hardware

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use button_service::machine::Clicks;
use button_service::{ActiveState, Button, ButtonConfig, ButtonState, ChannelId, Classification, Event, EventSink};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_time::{Duration, Instant};
use embedded_hal_1::digital::{ErrorKind, ErrorType, InputPin};
use embedded_hal_async::digital::Wait;

pub fn config(channel: u8) -> ButtonConfig {
    ButtonConfig::new(
        ChannelId(channel),
        ActiveState::ActiveHigh,
        Duration::from_millis(20),
        Duration::from_millis(1000),
        Duration::from_millis(300),
    )
}

#[derive(Default)]
struct LineInner {
    high: Cell<bool>,
    fail: Cell<bool>,
    samples: Cell<usize>,
}

/// A line whose level is set by the test. Edges are reported by the simulator,
/// so the async wait methods never complete.
#[derive(Clone, Default)]
pub struct Line {
    inner: Rc<LineInner>,
}

impl Line {
    pub fn new(high: bool) -> Self {
        let line = Self::default();
        line.inner.high.set(high);
        line
    }

    /// Sets the level, returning true if it changed.
    pub fn set_high(&self, high: bool) -> bool {
        self.inner.high.replace(high) != high
    }

    /// Makes every following read fail.
    pub fn set_failing(&self, fail: bool) {
        self.inner.fail.set(fail);
    }

    /// Number of reads so far.
    pub fn samples(&self) -> usize {
        self.inner.samples.get()
    }

    fn read(&self) -> Result<bool, ErrorKind> {
        self.inner.samples.set(self.inner.samples.get() + 1);
        if self.inner.fail.get() {
            Err(ErrorKind::Other)
        } else {
            Ok(self.inner.high.get())
        }
    }
}

impl ErrorType for Line {
    type Error = ErrorKind;
}

impl InputPin for Line {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.read()
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.read().map(|high| !high)
    }
}

impl Wait for Line {
    async fn wait_for_high(&mut self) -> Result<(), Self::Error> {
        core::future::pending().await
    }

    async fn wait_for_low(&mut self) -> Result<(), Self::Error> {
        core::future::pending().await
    }

    async fn wait_for_rising_edge(&mut self) -> Result<(), Self::Error> {
        core::future::pending().await
    }

    async fn wait_for_falling_edge(&mut self) -> Result<(), Self::Error> {
        core::future::pending().await
    }

    async fn wait_for_any_edge(&mut self) -> Result<(), Self::Error> {
        core::future::pending().await
    }
}

pub type Log = Rc<RefCell<Vec<(u64, Event)>>>;

/// Records every event with the simulated time it was delivered at.
pub struct Recorder {
    clock: Rc<Cell<u64>>,
    log: Log,
}

impl EventSink for Recorder {
    fn on_event(&mut self, event: Event) {
        self.log.borrow_mut().push((self.clock.get(), event));
    }
}

/// Drives a button through a script of level changes on a simulated clock.
pub struct Sim<'a> {
    pub button: Button<'a, NoopRawMutex, Line, Recorder>,
    pub line: Line,
    state: &'a ButtonState<NoopRawMutex>,
    active_high: bool,
    clock: Rc<Cell<u64>>,
    log: Log,
    script: VecDeque<(u64, bool)>,
}

impl<'a> Sim<'a> {
    /// Creates the button at t = 0 with the line released.
    pub fn new(state: &'a ButtonState<NoopRawMutex>, config: ButtonConfig) -> Self {
        let active_high = config.get_active_state() == ActiveState::ActiveHigh;
        let line = Line::new(!active_high);
        let clock = Rc::new(Cell::new(0));
        let log: Log = Rc::default();
        let recorder = Recorder {
            clock: clock.clone(),
            log: log.clone(),
        };
        let button = Button::new_at(state, line.clone(), config, recorder, Instant::from_millis(0)).unwrap();

        Self {
            button,
            line,
            state,
            active_high,
            clock,
            log,
            script: VecDeque::new(),
        }
    }

    /// Queues a press at `t`.
    pub fn press(&mut self, t: u64) -> &mut Self {
        self.level(t, true)
    }

    /// Queues a release at `t`.
    pub fn release(&mut self, t: u64) -> &mut Self {
        self.level(t, false)
    }

    /// Queues an active (`true`) or inactive level at `t`.
    pub fn level(&mut self, t: u64, active: bool) -> &mut Self {
        self.script.push_back((t, active));
        self
    }

    /// Processes every edge and alarm up to and including `t`.
    pub fn advance_to(&mut self, t: u64) {
        loop {
            let edge = self.script.front().map(|(at, _)| *at).filter(|at| *at <= t);
            let alarm = self
                .button
                .next_deadline()
                .map(|deadline| deadline.as_millis())
                .filter(|at| *at <= t);

            match (edge, alarm) {
                (Some(edge), Some(alarm)) if alarm < edge => self.fire(alarm),
                (Some(edge), _) => {
                    let (_, active) = self.script.pop_front().unwrap();
                    self.clock.set(edge);
                    if self.line.set_high(active == self.active_high) {
                        self.button.on_edge(Instant::from_millis(edge));
                    }
                }
                (None, Some(alarm)) => self.fire(alarm),
                (None, None) => break,
            }

            self.check_invariants();
        }

        self.clock.set(t);
    }

    /// Runs until the script is exhausted and no alarm is pending.
    pub fn settle(&mut self) {
        while let Some(t) = self
            .script
            .back()
            .map(|(at, _)| *at)
            .max(self.button.next_deadline().map(|deadline| deadline.as_millis()))
        {
            self.advance_to(t);
        }
    }

    pub fn now(&self) -> u64 {
        self.clock.get()
    }

    pub fn events(&self) -> Vec<(u64, Event)> {
        self.log.borrow().clone()
    }

    pub fn kinds(&self) -> Vec<Event> {
        self.log.borrow().iter().map(|(_, event)| *event).collect()
    }

    pub fn classification(&self) -> Classification {
        self.state.classification()
    }

    pub fn is_pressed(&self) -> bool {
        self.state.is_pressed()
    }

    /// Deletes the button, returning every event it delivered.
    pub fn delete(self) -> Vec<(u64, Event)> {
        let Self { button, log, .. } = self;
        button.delete();
        let events = log.borrow().clone();
        events
    }

    fn fire(&mut self, t: u64) {
        self.clock.set(t);
        self.button.on_alarm(Instant::from_millis(t));
    }

    fn check_invariants(&self) {
        if !self.state.is_pressed() {
            assert_ne!(
                self.state.classification(),
                Classification::LongPress,
                "long press reported while released at {} ms",
                self.clock.get()
            );
        }

        if self.state.is_awaiting_second_click() {
            assert_eq!(
                self.state.clicks(),
                Clicks::One,
                "second click awaited without a single click at {} ms",
                self.clock.get()
            );
        }

        if self.state.clicks() == Clicks::Two {
            assert!(
                self.state.is_pressed(),
                "double click pending while released at {} ms",
                self.clock.get()
            );
        }
    }
}
