//! Descriptor ring storage shared by the TX and RX paths.

use core::marker::PhantomData;

use crate::dma::{DmaMapper, DmaRegion};
use crate::error::AttachError;

use super::regs::{DESC_SIZE, RING_ALIGN};

/// Fixed-capacity circular array of descriptors in DMA memory.
///
/// All descriptor access is volatile: the device reads and writes the
/// same memory without the compiler's knowledge.
pub struct DescRing<D: Copy> {
    region: DmaRegion,
    capacity: u16,
    _desc: PhantomData<D>,
}

impl<D: Copy> DescRing<D> {
    /// Allocate a zeroed ring of `capacity` descriptors.
    pub fn new(capacity: u16, mapper: &dyn DmaMapper) -> Result<Self, AttachError> {
        debug_assert_eq!(core::mem::size_of::<D>(), DESC_SIZE);
        let region = DmaRegion::alloc(capacity as usize * DESC_SIZE, RING_ALIGN, mapper)?;
        Ok(Self {
            region,
            capacity,
            _desc: PhantomData,
        })
    }

    #[inline]
    pub fn capacity(&self) -> u16 {
        self.capacity
    }

    /// Index following `idx`, modulo capacity.
    #[inline]
    pub fn next(&self, idx: u16) -> u16 {
        ((idx as u32 + 1) % self.capacity as u32) as u16
    }

    /// Bus address of descriptor 0, as programmed into xDBAL/xDBAH.
    pub fn bus_addr(&self) -> u64 {
        self.region.bus_addr()
    }

    /// Ring length in bytes, as programmed into xDLEN.
    pub fn len_bytes(&self) -> u32 {
        (self.capacity as u32) * (DESC_SIZE as u32)
    }

    /// Snapshot descriptor `idx`.
    #[inline]
    pub fn load(&self, idx: u16) -> D {
        // SAFETY: idx < capacity, region holds capacity descriptors
        unsafe { core::ptr::read_volatile(self.desc_ptr(idx)) }
    }

    /// Write back descriptor `idx`.
    #[inline]
    pub fn store(&mut self, idx: u16, desc: D) {
        // SAFETY: idx < capacity, region holds capacity descriptors
        unsafe { core::ptr::write_volatile(self.desc_ptr(idx), desc) }
    }

    #[inline]
    fn desc_ptr(&self, idx: u16) -> *mut D {
        assert!(idx < self.capacity, "descriptor index out of range");
        unsafe { (self.region.cpu_ptr() as *mut D).add(idx as usize) }
    }
}
