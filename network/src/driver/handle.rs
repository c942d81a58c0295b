//! Shared handle to the single driver instance.

use alloc::sync::Arc;

use spin::Mutex;

use crate::error::PacketError;
use crate::hw::RegisterAccess;

use super::intel::E1000;
use super::traits::PacketIo;

/// Cloneable handle to an attached [`E1000`].
///
/// Each call takes the lock for exactly one driver operation, the way a
/// syscall enters and leaves the kernel.
pub struct NicHandle<R: RegisterAccess> {
    inner: Arc<Mutex<E1000<R>>>,
}

impl<R: RegisterAccess> NicHandle<R> {
    pub fn new(driver: E1000<R>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(driver)),
        }
    }

    /// Run `f` with the driver locked.
    pub fn with<T>(&self, f: impl FnOnce(&mut E1000<R>) -> T) -> T {
        f(&mut self.inner.lock())
    }
}

impl<R: RegisterAccess> Clone for NicHandle<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: RegisterAccess> PacketIo for NicHandle<R> {
    fn packet_send(&self, frame: &[u8]) -> Result<usize, PacketError> {
        self.inner.lock().send(frame)
    }

    fn packet_receive(&self, buffer: &mut [u8]) -> Result<usize, PacketError> {
        self.inner.lock().receive(buffer)
    }

    fn rx_pending(&self) -> bool {
        self.inner.lock().can_receive()
    }
}
