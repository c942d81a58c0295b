//! Relay error types

use core::fmt;

use pktio_channel::ChannelError;
use pktio_network::PacketError;

pub type Result<T> = core::result::Result<T, RelayError>;

/// Errors that stop a relay's run loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayError {
    /// A frame does not fit a message page.
    FrameTooLarge { capacity: usize },
    /// Driver returned an error the relay cannot recover from.
    Driver(PacketError),
    /// The message channel refused a page it should always have room for.
    ChannelFull,
    /// Configuration rejected at construction.
    InvalidConfig(&'static str),
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FrameTooLarge { capacity } => {
                write!(f, "Frame exceeds page payload capacity of {} bytes", capacity)
            }
            Self::Driver(e) => write!(f, "Driver error: {}", e),
            Self::ChannelFull => write!(f, "Message channel full"),
            Self::InvalidConfig(why) => write!(f, "Invalid relay configuration: {}", why),
        }
    }
}

impl From<PacketError> for RelayError {
    fn from(e: PacketError) -> Self {
        RelayError::Driver(e)
    }
}

impl From<ChannelError> for RelayError {
    fn from(e: ChannelError) -> Self {
        match e {
            ChannelError::MessageTooLong { capacity, .. } => RelayError::FrameTooLarge { capacity },
            ChannelError::ZeroDepth => RelayError::InvalidConfig("channel depth must be non-zero"),
        }
    }
}
