//! Button Service
//!
//! Turns the raw level changes of a single, bouncing button into press,
//! release, long press and double click events.
//!
//! ```text
//! edge ─▶ debounce gate ─▶ classifier ─┬─▶ long-press watchdog
//!                                      └─▶ double-click arbiter
//! ```
//!
//! All three windows are one-shot alarms owned by the button state and fired
//! from a single context ([`Button::run`](button::Button::run)), so they never
//! run concurrently with each other.

#![no_std]
#![warn(missing_docs)]

pub mod alarm;
pub mod button;
pub mod config;
pub mod debounce;
pub mod double_click;
pub mod event;
pub mod fmt;
pub mod long_press;
pub mod machine;
pub mod registry;

pub use button::{Button, ButtonState, Error};
pub use config::{ButtonConfig, ChannelId};
pub use debounce::ActiveState;
pub use double_click::PendingClick;
pub use event::{ChannelSink, Classification, Event, EventSink, NoSink};
pub use long_press::ReleaseRace;
