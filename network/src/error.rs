//! Driver error types

use core::fmt;

pub type Result<T> = core::result::Result<T, PacketError>;

/// Outcome of a failed `packet_send` / `packet_receive` call.
///
/// None of these are retried by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketError {
    /// Transmit slot at the tail still belongs to hardware. Retry later.
    BufFull,
    /// No received frame is waiting. Retry later.
    BufEmpty,
    /// Outbound frame too large, or receive destination too small.
    InvalidArgument,
}

impl PacketError {
    /// Whether the same call may succeed later without changing arguments.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::BufFull | Self::BufEmpty)
    }
}

impl fmt::Display for PacketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufFull => write!(f, "Transmit ring full"),
            Self::BufEmpty => write!(f, "Receive ring empty"),
            Self::InvalidArgument => write!(f, "Invalid argument"),
        }
    }
}

/// Device attach failures. All of them are fatal at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachError {
    /// MMIO region is null or too small for the register file.
    MmioUnmapped,
    /// Configuration rejected before touching the device.
    InvalidConfig(&'static str),
    /// Descriptor or buffer memory could not be allocated.
    OutOfMemory,
}

impl fmt::Display for AttachError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MmioUnmapped => write!(f, "MMIO region not mapped"),
            Self::InvalidConfig(why) => write!(f, "Invalid driver configuration: {}", why),
            Self::OutOfMemory => write!(f, "Out of DMA memory"),
        }
    }
}
