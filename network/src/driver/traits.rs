//! Driver boundary seen by the relay processes.

use crate::error::PacketError;

/// Syscall-style packet interface.
///
/// Every call makes exactly one attempt and returns immediately. Retry
/// policy belongs to the caller.
pub trait PacketIo {
    /// Queue one frame for transmission.
    ///
    /// # Returns
    /// - `Ok(len)`: frame queued
    /// - `Err(PacketError::BufFull)`: no free slot, try again later
    /// - `Err(PacketError::InvalidArgument)`: frame too large
    fn packet_send(&self, frame: &[u8]) -> Result<usize, PacketError>;

    /// Copy one received frame into `buffer`.
    ///
    /// # Returns
    /// - `Ok(len)`: frame received, `len` bytes copied
    /// - `Err(PacketError::BufEmpty)`: no frame waiting
    /// - `Err(PacketError::InvalidArgument)`: frame larger than `buffer`
    fn packet_receive(&self, buffer: &mut [u8]) -> Result<usize, PacketError>;

    /// Whether `packet_receive` would find a frame. Consumes nothing.
    fn rx_pending(&self) -> bool;
}

impl<T: PacketIo + ?Sized> PacketIo for &T {
    fn packet_send(&self, frame: &[u8]) -> Result<usize, PacketError> {
        (**self).packet_send(frame)
    }

    fn packet_receive(&self, buffer: &mut [u8]) -> Result<usize, PacketError> {
        (**self).packet_receive(buffer)
    }

    fn rx_pending(&self) -> bool {
        (**self).rx_pending()
    }
}
