//! Input channel attachments
//!
//! At most one live button may listen to a given channel. Attaching claims the
//! channel until the returned [`Attachment`] is detached or dropped.

use core::cell::Cell;

use critical_section::Mutex;

use crate::config::ChannelId;
use crate::{trace, warn};

static ATTACHED: Mutex<Cell<u64>> = Mutex::new(Cell::new(0));

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Registry error
pub enum Error {
    /// Channel is outside `0..MAX_CHANNELS`
    InvalidChannel,
    /// Channel already attached to a live button
    InUse,
}

fn mask(channel: ChannelId) -> u64 {
    1u64 << channel.0
}

/// Claims `channel`.
pub fn attach(channel: ChannelId) -> Result<Attachment, Error> {
    if !channel.is_valid() {
        return Err(Error::InvalidChannel);
    }

    critical_section::with(|cs| {
        let attached = ATTACHED.borrow(cs);
        if attached.get() & mask(channel) != 0 {
            return Err(Error::InUse);
        }

        attached.set(attached.get() | mask(channel));
        trace!("Attached channel {}", channel.0);
        Ok(Attachment {
            channel,
            attached: true,
        })
    })
}

/// Returns true if a live button holds `channel`.
pub fn is_attached(channel: ChannelId) -> bool {
    channel.is_valid() && critical_section::with(|cs| ATTACHED.borrow(cs).get() & mask(channel) != 0)
}

/// Releases `channel`, returning false if it was not attached.
fn release(channel: ChannelId) -> bool {
    critical_section::with(|cs| {
        let attached = ATTACHED.borrow(cs);
        let was_attached = attached.get() & mask(channel) != 0;
        attached.set(attached.get() & !mask(channel));
        was_attached
    })
}

#[derive(Debug)]
/// Claim on a channel. Detaches on drop.
pub struct Attachment {
    channel: ChannelId,
    attached: bool,
}

impl Attachment {
    /// Attached channel.
    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    /// Detaches the channel. Later calls do nothing.
    ///
    /// A registry that no longer lists the channel is logged and otherwise ignored.
    pub fn detach(&mut self) {
        if !self.attached {
            return;
        }

        self.attached = false;
        if release(self.channel) {
            trace!("Detached channel {}", self.channel.0);
        } else {
            warn!("Channel {} was not attached", self.channel.0);
        }
    }
}

impl Drop for Attachment {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::MAX_CHANNELS;

    // The registry is process wide and tests run in parallel: every test uses its own channels.

    #[test]
    fn test_attach_detach() {
        let channel = ChannelId(40);
        let mut attachment = attach(channel).unwrap();
        assert!(is_attached(channel));
        assert_eq!(attachment.channel(), channel);

        attachment.detach();
        assert!(!is_attached(channel));

        // Second detach is a no-op
        attachment.detach();
        assert!(!is_attached(channel));
    }

    #[test]
    fn test_double_attach_fails() {
        let channel = ChannelId(41);
        let _attachment = attach(channel).unwrap();

        assert_eq!(attach(channel).unwrap_err(), Error::InUse);
    }

    #[test]
    fn test_drop_detaches() {
        let channel = ChannelId(42);
        {
            let _attachment = attach(channel).unwrap();
            assert!(is_attached(channel));
        }
        assert!(!is_attached(channel));
        assert!(attach(channel).is_ok());
    }

    #[test]
    fn test_invalid_channel() {
        assert_eq!(attach(ChannelId(MAX_CHANNELS)).unwrap_err(), Error::InvalidChannel);
        assert!(!is_attached(ChannelId(MAX_CHANNELS)));
    }

    #[test]
    fn test_detach_after_external_release() {
        let channel = ChannelId(43);
        let mut attachment = attach(channel).unwrap();
        assert!(release(channel));

        // Best effort: logs and carries on
        attachment.detach();
        assert!(!is_attached(channel));
    }
}
