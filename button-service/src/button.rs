//! Button Service Definitions

use core::cell::RefCell;

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::{Instant, Timer};
use embedded_hal_1::digital::InputPin;
use embedded_hal_async::digital::Wait;

use crate::alarm::AlarmKind;
use crate::config::{ButtonConfig, ChannelId};
use crate::debounce::{self, ActiveState};
use crate::event::{Classification, EventSink, Events};
use crate::machine::{Clicks, Machine};
use crate::registry::{self, Attachment};
use crate::{debug, error, info};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Button creation error
pub enum Error {
    /// Channel is outside `0..MAX_CHANNELS`
    InvalidChannel(ChannelId),
    /// The input line could not be read
    InputConfig,
    /// Another live button is attached to the channel
    ChannelInUse(ChannelId),
    /// The state record already belongs to a live button
    StateInUse,
}

/// Lock-protected state of one button.
///
/// Usually a `static` so that any task can query the button while its
/// [`Button`] runs elsewhere. A state record that was never given to
/// [`Button::new`], or whose button has been deleted, reports `Idle` and not
/// pressed.
pub struct ButtonState<M: RawMutex> {
    inner: Mutex<M, RefCell<Option<Machine>>>,
}

impl<M: RawMutex> ButtonState<M> {
    /// Create a new, unused state record
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    /// Current classification, `Idle` if the button is not live.
    pub fn classification(&self) -> Classification {
        self.inspect(Machine::classification).unwrap_or_default()
    }

    /// Debounced pressed state, `false` if the button is not live.
    pub fn is_pressed(&self) -> bool {
        self.inspect(Machine::is_pressed).unwrap_or(false)
    }

    /// Returns true while a released click waits for a second press.
    pub fn is_awaiting_second_click(&self) -> bool {
        self.inspect(Machine::is_awaiting_second_click).unwrap_or(false)
    }

    /// Clicks counted in the gesture in progress.
    pub fn clicks(&self) -> Clicks {
        self.inspect(Machine::clicks).unwrap_or_default()
    }

    /// Returns true while a button owns this record.
    pub fn is_live(&self) -> bool {
        self.inspect(|_| ()).is_some()
    }

    fn inspect<R>(&self, f: impl FnOnce(&Machine) -> R) -> Option<R> {
        self.inner.lock(|cell| match cell.try_borrow() {
            Ok(machine) => machine.as_ref().map(f),
            Err(_) => {
                error!("Button state busy, returning default");
                None
            }
        })
    }

    /// Runs `f` on the live machine. Returns `None` without calling `f` if the
    /// record is busy or not live.
    fn update<R>(&self, f: impl FnOnce(&mut Machine) -> R) -> Option<R> {
        self.inner.lock(|cell| match cell.try_borrow_mut() {
            Ok(mut machine) => machine.as_mut().map(f),
            Err(_) => {
                error!("Failed to lock button state");
                None
            }
        })
    }

    fn install(&self, machine: Machine) -> Result<(), Error> {
        self.inner.lock(|cell| {
            let mut slot = cell.try_borrow_mut().map_err(|_| Error::StateInUse)?;
            if slot.is_some() {
                return Err(Error::StateInUse);
            }

            *slot = Some(machine);
            Ok(())
        })
    }

    fn clear(&self) {
        self.inner.lock(|cell| match cell.try_borrow_mut() {
            Ok(mut slot) => {
                if let Some(machine) = slot.as_mut() {
                    machine.stop();
                }
                *slot = None;
            }
            Err(_) => error!("Failed to lock button state for teardown"),
        })
    }
}

impl<M: RawMutex> Default for ButtonState<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// A button on one input line.
///
/// `I` is both the level sampler ([`InputPin`]) and the edge interrupt source
/// ([`Wait`]). Events go to `S`, which is always called with the state lock
/// released.
///
/// Dropping the button (or calling [`Button::delete`]) detaches the channel,
/// cancels every alarm and returns the state record to its unused condition.
pub struct Button<'a, M: RawMutex, I, S> {
    state: &'a ButtonState<M>,
    gpio: I,
    config: ButtonConfig,
    sink: S,
    attachment: Attachment,
}

impl<'a, M: RawMutex, I: InputPin + Wait, S: EventSink> Button<'a, M, I, S> {
    /// Creates a new `Button` on the given GPIO pin.
    ///
    /// The level is first sampled one debounce window after creation, so a
    /// button held at start-up reports a press.
    pub fn new(state: &'a ButtonState<M>, gpio: I, config: ButtonConfig, sink: S) -> Result<Self, Error> {
        Self::new_at(state, gpio, config, sink, Instant::now())
    }

    /// Same as [`Button::new`], with the creation instant given explicitly.
    pub fn new_at(
        state: &'a ButtonState<M>,
        mut gpio: I,
        config: ButtonConfig,
        sink: S,
        now: Instant,
    ) -> Result<Self, Error> {
        let channel = config.get_channel();
        if !channel.is_valid() {
            error!("Invalid channel: {}", channel.0);
            return Err(Error::InvalidChannel(channel));
        }

        if debounce::sample(&mut gpio, config.get_active_state()).is_err() {
            error!("Failed to read channel {}", channel.0);
            return Err(Error::InputConfig);
        }

        let attachment = registry::attach(channel).map_err(|e| {
            error!("Failed to attach channel {}: {:?}", channel.0, e);
            match e {
                registry::Error::InvalidChannel => Error::InvalidChannel(channel),
                registry::Error::InUse => Error::ChannelInUse(channel),
            }
        })?;

        // Start released and let the first debounce window sample the real level
        let mut machine = Machine::new(&config);
        machine.edge(now);
        if let Err(e) = state.install(machine) {
            error!("Button state for channel {} already in use", channel.0);
            // Dropping the attachment detaches the channel again
            return Err(e);
        }

        info!(
            "Button created on channel {}, active {}",
            channel.0,
            match config.get_active_state() {
                ActiveState::ActiveLow => "low",
                ActiveState::ActiveHigh => "high",
            }
        );

        Ok(Self {
            state,
            gpio,
            config,
            sink,
            attachment,
        })
    }

    /// Returns the button configuration.
    pub fn get_config(&self) -> &ButtonConfig {
        &self.config
    }

    /// Current classification.
    pub fn classification(&self) -> Classification {
        self.state.classification()
    }

    /// Debounced pressed state.
    pub fn is_pressed(&self) -> bool {
        self.state.is_pressed()
    }

    /// Earliest pending alarm.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.state.inspect(Machine::next_deadline).flatten()
    }

    /// Raw edge on the line. Only restarts the debounce window.
    pub fn on_edge(&mut self, now: Instant) {
        self.state.update(|machine| machine.edge(now));
    }

    /// Fires every alarm due at `now`, in deadline order.
    ///
    /// Edges that arrive while the sink runs are not seen by [`Button::run`],
    /// so after delivering events the line is sampled again and the debounce
    /// window restarted if it no longer agrees with the pressed state.
    pub fn on_alarm(&mut self, now: Instant) {
        let mut delivered = false;
        while let Some(events) = self.fire_next(now) {
            delivered |= !events.is_empty();
            self.deliver(events);
        }

        if delivered {
            self.resync(now);
        }
    }

    /// Processes edges and alarms forever.
    ///
    /// This is the only context in which alarms fire, so they never overlap.
    /// A slow sink delays every later alarm of this button.
    pub async fn run(&mut self) -> ! {
        loop {
            let deadline = self.next_deadline().unwrap_or(Instant::MAX);

            match select(self.gpio.wait_for_any_edge(), Timer::at(deadline)).await {
                Either::First(Ok(())) => self.on_edge(Instant::now()),
                Either::First(Err(_)) => {
                    error!("Failed to wait for edge on channel {}", self.config.get_channel().0);
                    // Keep the alarms running and retry after one window
                    Timer::after(self.config.get_debounce()).await;
                    self.on_alarm(Instant::now());
                }
                Either::Second(()) => self.on_alarm(Instant::now()),
            }
        }
    }

    /// Tears the button down. Equivalent to dropping it.
    pub fn delete(self) {}

    fn fire_next(&mut self, now: Instant) -> Option<Events> {
        let gpio = &mut self.gpio;
        let active_state = self.config.get_active_state();
        let channel = self.config.get_channel();

        self.state
            .update(|machine| {
                let kind = machine.next_due(now)?;
                let events = match kind {
                    AlarmKind::Debounce => match debounce::sample(gpio, active_state) {
                        Ok(is_active) => machine.debounce_elapsed(now, is_active),
                        Err(_) => {
                            error!("Failed to sample channel {}", channel.0);
                            Events::new()
                        }
                    },
                    AlarmKind::LongPress if machine.is_pressed() => match debounce::sample(gpio, active_state) {
                        Ok(still_active) => machine.long_press_elapsed(now, still_active),
                        Err(_) => {
                            error!("Failed to sample channel {}", channel.0);
                            Events::new()
                        }
                    },
                    AlarmKind::LongPress => Events::new(),
                    AlarmKind::DoubleClick => machine.double_click_elapsed(now),
                };
                Some(events)
            })
            .flatten()
    }

    fn resync(&mut self, now: Instant) {
        let gpio = &mut self.gpio;
        let active_state = self.config.get_active_state();
        let channel = self.config.get_channel();

        self.state.update(|machine| {
            if machine.is_debouncing() {
                return;
            }

            match debounce::sample(gpio, active_state) {
                Ok(is_active) if is_active != machine.is_pressed() => {
                    debug!("Channel {} changed during delivery", channel.0);
                    machine.edge(now);
                }
                Ok(_) => {}
                Err(_) => error!("Failed to sample channel {}", channel.0),
            }
        });
    }

    fn deliver(&mut self, events: Events) {
        for event in events {
            debug!("Channel {}: {:?}", self.config.get_channel().0, event);
            self.sink.on_event(event);
        }
    }
}

impl<M: RawMutex, I, S> Drop for Button<'_, M, I, S> {
    fn drop(&mut self) {
        self.attachment.detach();
        self.state.clear();
        info!("Button on channel {} deleted", self.config.get_channel().0);
    }
}
