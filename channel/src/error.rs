//! Channel error types

use core::fmt;

pub type Result<T> = core::result::Result<T, ChannelError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelError {
    /// Message length does not fit in a page payload.
    MessageTooLong {
        len: usize,
        capacity: usize,
    },
    /// Depth of zero was requested.
    ZeroDepth,
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MessageTooLong { len, capacity } => {
                write!(f, "Message of {} bytes exceeds page payload of {} bytes", len, capacity)
            }
            Self::ZeroDepth => write!(f, "Channel depth must be at least 1"),
        }
    }
}
