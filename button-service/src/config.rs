//! Button configuration

use embassy_time::Duration;

use crate::debounce::ActiveState;
use crate::double_click::PendingClick;
use crate::long_press::ReleaseRace;

/// Debounce window used when none is configured.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(20);
/// Long-press window used when none is configured.
pub const DEFAULT_LONG_PRESS: Duration = Duration::from_millis(1000);
/// Double-click window used when none is configured.
pub const DEFAULT_DOUBLE_CLICK: Duration = Duration::from_millis(300);

/// Number of input channels a button can be attached to.
pub const MAX_CHANNELS: u8 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Identifier of the input line a button is wired to.
pub struct ChannelId(pub u8);

impl ChannelId {
    /// Returns true if the channel is in `0..MAX_CHANNELS`.
    pub fn is_valid(self) -> bool {
        self.0 < MAX_CHANNELS
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Struct representing the configuration for a button.
///
/// The timing windows are fixed once the button is created.
pub struct ButtonConfig {
    channel: ChannelId,
    active_state: ActiveState,
    debounce: Duration,
    long_press: Duration,
    double_click: Duration,
    release_race: ReleaseRace,
    pending_click: PendingClick,
    click_events: bool,
}

impl ButtonConfig {
    /// Creates a new ButtonConfig. A zero window is replaced by its default.
    pub fn new(
        channel: ChannelId,
        active_state: ActiveState,
        debounce: Duration,
        long_press: Duration,
        double_click: Duration,
    ) -> Self {
        Self {
            channel,
            active_state,
            debounce: or_default(debounce, DEFAULT_DEBOUNCE),
            long_press: or_default(long_press, DEFAULT_LONG_PRESS),
            double_click: or_default(double_click, DEFAULT_DOUBLE_CLICK),
            release_race: ReleaseRace::default(),
            pending_click: PendingClick::default(),
            click_events: false,
        }
    }

    /// Sets how a long-press window ending just after a release is handled.
    pub fn with_release_race(mut self, release_race: ReleaseRace) -> Self {
        self.release_race = release_race;
        self
    }

    /// Sets the classification shown while a lone click waits for a second press.
    pub fn with_pending_click(mut self, pending_click: PendingClick) -> Self {
        self.pending_click = pending_click;
        self
    }

    /// Enables the [`Event::Click`](crate::event::Event::Click) event for lone clicks.
    pub fn with_click_events(mut self, click_events: bool) -> Self {
        self.click_events = click_events;
        self
    }

    /// Gets the input channel.
    pub fn get_channel(&self) -> ChannelId {
        self.channel
    }

    /// Gets the level that counts as pressed.
    pub fn get_active_state(&self) -> ActiveState {
        self.active_state
    }

    /// Gets the debounce window.
    pub fn get_debounce(&self) -> Duration {
        self.debounce
    }

    /// Gets the long-press window.
    pub fn get_long_press(&self) -> Duration {
        self.long_press
    }

    /// Gets the double-click window.
    pub fn get_double_click(&self) -> Duration {
        self.double_click
    }

    /// Gets the long-press release race policy.
    pub fn get_release_race(&self) -> ReleaseRace {
        self.release_race
    }

    /// Gets the classification shown while a lone click is pending.
    pub fn get_pending_click(&self) -> PendingClick {
        self.pending_click
    }

    /// Returns true if lone clicks are reported as events.
    pub fn get_click_events(&self) -> bool {
        self.click_events
    }
}

/// Channel 0, active low, default windows.
impl Default for ButtonConfig {
    fn default() -> Self {
        Self::new(
            ChannelId(0),
            ActiveState::ActiveLow,
            DEFAULT_DEBOUNCE,
            DEFAULT_LONG_PRESS,
            DEFAULT_DOUBLE_CLICK,
        )
    }
}

fn or_default(window: Duration, default: Duration) -> Duration {
    if window.as_ticks() == 0 {
        default
    } else {
        window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_windows_use_defaults() {
        let config = ButtonConfig::new(
            ChannelId(4),
            ActiveState::ActiveHigh,
            Duration::from_millis(0),
            Duration::from_millis(0),
            Duration::from_millis(0),
        );

        assert_eq!(config.get_debounce(), DEFAULT_DEBOUNCE);
        assert_eq!(config.get_long_press(), DEFAULT_LONG_PRESS);
        assert_eq!(config.get_double_click(), DEFAULT_DOUBLE_CLICK);
        assert_eq!(config.get_active_state(), ActiveState::ActiveHigh);
    }

    #[test]
    fn test_explicit_windows_kept() {
        let config = ButtonConfig::new(
            ChannelId(0),
            ActiveState::ActiveLow,
            Duration::from_millis(5),
            Duration::from_millis(2000),
            Duration::from_millis(250),
        );

        assert_eq!(config.get_debounce(), Duration::from_millis(5));
        assert_eq!(config.get_long_press(), Duration::from_millis(2000));
        assert_eq!(config.get_double_click(), Duration::from_millis(250));
    }

    #[test]
    fn test_defaults() {
        let config = ButtonConfig::default();

        assert_eq!(config.get_channel(), ChannelId(0));
        assert_eq!(config.get_active_state(), ActiveState::ActiveLow);
        assert_eq!(config.get_release_race(), ReleaseRace::Suppress);
        assert_eq!(config.get_pending_click(), PendingClick::Idle);
        assert!(!config.get_click_events());
    }

    #[test]
    fn test_channel_range() {
        assert!(ChannelId(0).is_valid());
        assert!(ChannelId(MAX_CHANNELS - 1).is_valid());
        assert!(!ChannelId(MAX_CHANNELS).is_valid());
    }
}
