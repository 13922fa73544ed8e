//! Button events and where they go

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;

use crate::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// The externally visible state of a button.
///
/// `ShortPress` and `DoubleClick` describe the most recent completed gesture
/// and are replaced on the next press.
pub enum Classification {
    /// Nothing is happening.
    #[default]
    Idle,
    /// The button is held, not long enough for a long press yet.
    Pressed,
    /// The button has been held past the long-press window.
    LongPress,
    /// The last gesture was a single short click.
    ShortPress,
    /// The last gesture was a double click.
    DoubleClick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Events delivered to an [`EventSink`].
pub enum Event {
    /// Debounced press.
    Pressed,
    /// Debounced release.
    Released,
    /// The press lasted for the long-press window. Always precedes the matching `Released`.
    LongPress,
    /// Second click of a double click released.
    DoubleClick,
    /// A lone click whose double-click window expired. Only emitted when enabled
    /// with [`ButtonConfig::with_click_events`](crate::config::ButtonConfig::with_click_events).
    Click,
}

/// Events produced by a single stimulus, in emission order.
pub type Events = heapless::Vec<Event, 4>;

/// Receiver of button events.
///
/// The sink runs in the button's alarm context with the state lock released,
/// so it may query the button. It should return quickly: while it runs no
/// other timing for that button is processed.
pub trait EventSink {
    /// Handles one event.
    fn on_event(&mut self, event: Event);
}

impl<F: FnMut(Event)> EventSink for F {
    fn on_event(&mut self, event: Event) {
        self(event)
    }
}

#[derive(Debug, Clone, Copy, Default)]
/// Sink for buttons that are only ever polled.
pub struct NoSink;

impl EventSink for NoSink {
    fn on_event(&mut self, _event: Event) {}
}

/// Forwards events to an embassy channel without blocking.
///
/// Events that do not fit are dropped with a warning.
pub struct ChannelSink<'a, M: RawMutex, const N: usize> {
    channel: &'a Channel<M, Event, N>,
}

impl<'a, M: RawMutex, const N: usize> ChannelSink<'a, M, N> {
    /// Create a new sink backed by `channel`
    pub fn new(channel: &'a Channel<M, Event, N>) -> Self {
        Self { channel }
    }
}

impl<M: RawMutex, const N: usize> EventSink for ChannelSink<'_, M, N> {
    fn on_event(&mut self, event: Event) {
        if self.channel.try_send(event).is_err() {
            warn!("Event channel full, dropping {:?}", event);
        }
    }
}
