//! DMA region allocation and bus-address translation.
//!
//! # Memory Layout (default sizing)
//! ```text
//! Region          Size        Content
//! tx descriptors  0x0200      32 × 16 bytes, 128-byte aligned
//! rx descriptors  0x0800      128 × 16 bytes, 128-byte aligned
//! tx buffers      0xBDC0      32 × 1518 bytes
//! rx buffers      0x40000     128 × 2048 bytes
//! ```

use alloc::alloc::{alloc_zeroed, dealloc, Layout};
use core::ptr::NonNull;

use crate::error::AttachError;

/// Translates CPU pointers into device-visible bus addresses.
///
/// The kernel's physical-address lookup (`PADDR` for the kernel's direct
/// map) sits behind this trait.
pub trait DmaMapper {
    fn bus_addr(&self, cpu: *const u8) -> u64;
}

/// Bus address equals CPU address.
///
/// Correct for identity-mapped memory and for the software NIC model.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityMapper;

impl DmaMapper for IdentityMapper {
    fn bus_addr(&self, cpu: *const u8) -> u64 {
        cpu as usize as u64
    }
}

/// A zeroed, aligned, physically addressed block of memory.
pub struct DmaRegion {
    cpu_ptr: NonNull<u8>,
    bus_addr: u64,
    layout: Layout,
}

impl DmaRegion {
    /// Allocate `size` zeroed bytes aligned to `align`.
    pub fn alloc(size: usize, align: usize, mapper: &dyn DmaMapper) -> Result<Self, AttachError> {
        if size == 0 {
            return Err(AttachError::InvalidConfig("zero-sized DMA region"));
        }
        let layout = Layout::from_size_align(size, align)
            .map_err(|_| AttachError::InvalidConfig("bad DMA region alignment"))?;
        // SAFETY: layout has non-zero size
        let raw = unsafe { alloc_zeroed(layout) };
        let cpu_ptr = NonNull::new(raw).ok_or(AttachError::OutOfMemory)?;
        let bus_addr = mapper.bus_addr(cpu_ptr.as_ptr());

        Ok(Self {
            cpu_ptr,
            bus_addr,
            layout,
        })
    }

    pub fn cpu_ptr(&self) -> *mut u8 {
        self.cpu_ptr.as_ptr()
    }

    pub fn bus_addr(&self) -> u64 {
        self.bus_addr
    }

    pub fn size(&self) -> usize {
        self.layout.size()
    }
}

impl Drop for DmaRegion {
    fn drop(&mut self) {
        // SAFETY: allocated in `alloc` with exactly this layout
        unsafe { dealloc(self.cpu_ptr.as_ptr(), self.layout) }
    }
}

// Safety: the region is plain memory exclusively owned by this value.
unsafe impl Send for DmaRegion {}

#[cfg(test)]
mod tests {
    use super::*;

    struct OffsetMapper(u64);

    impl DmaMapper for OffsetMapper {
        fn bus_addr(&self, cpu: *const u8) -> u64 {
            cpu as usize as u64 - self.0
        }
    }

    #[test]
    fn test_alloc_is_zeroed_and_aligned() {
        let region = DmaRegion::alloc(512, 128, &IdentityMapper).unwrap();
        assert_eq!(region.cpu_ptr() as usize % 128, 0);
        assert_eq!(region.size(), 512);
        let bytes = unsafe { core::slice::from_raw_parts(region.cpu_ptr(), 512) };
        assert!(bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_bus_addr_from_mapper() {
        let region = DmaRegion::alloc(64, 16, &IdentityMapper).unwrap();
        assert_eq!(region.bus_addr(), region.cpu_ptr() as usize as u64);

        let region = DmaRegion::alloc(64, 16, &OffsetMapper(0x1000)).unwrap();
        assert_eq!(region.bus_addr(), region.cpu_ptr() as usize as u64 - 0x1000);
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(DmaRegion::alloc(0, 16, &IdentityMapper).is_err());
    }
}
