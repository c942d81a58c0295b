//! MMIO (Memory-Mapped I/O) register access.
//!
//! # Safety
//! - Address must be valid MMIO address
//! - Address must be properly aligned
//! - Address must be mapped with appropriate (uncached) attributes

use alloc::sync::Arc;
use core::ptr::NonNull;

use crate::error::AttachError;

/// 32-bit register file of a device.
///
/// Offsets are byte offsets from the start of BAR0.
pub trait RegisterAccess {
    fn read(&self, reg: u32) -> u32;
    fn write(&self, reg: u32, value: u32);
}

impl<T: RegisterAccess + ?Sized> RegisterAccess for &T {
    fn read(&self, reg: u32) -> u32 {
        (**self).read(reg)
    }

    fn write(&self, reg: u32, value: u32) {
        (**self).write(reg, value)
    }
}

impl<T: RegisterAccess + ?Sized> RegisterAccess for Arc<T> {
    fn read(&self, reg: u32) -> u32 {
        (**self).read(reg)
    }

    fn write(&self, reg: u32, value: u32) {
        (**self).write(reg, value)
    }
}

/// A mapped MMIO window.
pub struct MmioRegion {
    base: NonNull<u32>,
    len: usize,
}

impl MmioRegion {
    /// Wrap a mapped BAR.
    ///
    /// Fails with [`AttachError::MmioUnmapped`] if `base` is null, not
    /// 4-byte aligned, or `len` is smaller than `min_len`.
    ///
    /// # Safety
    /// - `base` must be the virtual address of the device's register window
    /// - The mapping must stay valid for the lifetime of this value
    pub unsafe fn new(base: *mut u8, len: usize, min_len: usize) -> Result<Self, AttachError> {
        let base = NonNull::new(base as *mut u32).ok_or(AttachError::MmioUnmapped)?;
        if base.as_ptr() as usize % 4 != 0 || len < min_len {
            return Err(AttachError::MmioUnmapped);
        }
        Ok(Self { base, len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    fn reg_ptr(&self, reg: u32) -> *mut u32 {
        debug_assert!((reg as usize) + 4 <= self.len, "register {:#x} outside BAR", reg);
        // SAFETY: offset checked against the mapping length in debug builds;
        // register offsets are compile-time constants below the BAR size.
        unsafe { self.base.as_ptr().add(reg as usize / 4) }
    }
}

impl RegisterAccess for MmioRegion {
    #[inline]
    fn read(&self, reg: u32) -> u32 {
        unsafe { core::ptr::read_volatile(self.reg_ptr(reg)) }
    }

    #[inline]
    fn write(&self, reg: u32, value: u32) {
        unsafe { core::ptr::write_volatile(self.reg_ptr(reg), value) }
    }
}

// Safety: MmioRegion only holds the address of a device window. Access is
// serialized by whoever owns the driver.
unsafe impl Send for MmioRegion {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_base_is_unmapped() {
        let result = unsafe { MmioRegion::new(core::ptr::null_mut(), 0x20000, 0x20000) };
        assert!(matches!(result, Err(AttachError::MmioUnmapped)));
    }

    #[test]
    fn test_short_window_is_unmapped() {
        let mut backing = [0u32; 16];
        let result = unsafe { MmioRegion::new(backing.as_mut_ptr() as *mut u8, 64, 0x20000) };
        assert!(matches!(result, Err(AttachError::MmioUnmapped)));
    }

    #[test]
    fn test_volatile_read_write() {
        let mut backing = [0u32; 16];
        let mmio = unsafe { MmioRegion::new(backing.as_mut_ptr() as *mut u8, 64, 64) }.unwrap();
        mmio.write(0x8, 0xDEAD_BEEF);
        assert_eq!(mmio.read(0x8), 0xDEAD_BEEF);
        mmio.write(0x3C, 0x0EAD_BEEF);
        assert_eq!(mmio.read(0x3C), 0x0EAD_BEEF);
        drop(mmio);
        assert_eq!(backing[2], 0xDEAD_BEEF);
        assert_eq!(backing[15], 0x0EAD_BEEF);
    }
}
