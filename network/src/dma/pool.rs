//! Per-slot packet buffer pool.
//!
//! Unlike a free-list allocator, every buffer here is bound to one ring slot
//! for the life of the driver: buffer `i` always backs descriptor `i`.

use super::region::{DmaMapper, DmaRegion};
use crate::error::AttachError;

/// Alignment of the pool base. Individual buffers are only as aligned as
/// `buffer_size` allows.
const POOL_ALIGN: usize = 4096;

/// Fixed-size packet buffers, one per ring slot.
pub struct PacketPool {
    /// Backing memory for all buffers.
    region: DmaRegion,
    /// Size of each buffer.
    buffer_size: usize,
    /// Number of buffers.
    count: usize,
}

impl PacketPool {
    /// Allocate `count` zeroed buffers of `buffer_size` bytes.
    pub fn new(buffer_size: usize, count: usize, mapper: &dyn DmaMapper) -> Result<Self, AttachError> {
        let size = buffer_size
            .checked_mul(count)
            .ok_or(AttachError::InvalidConfig("packet pool size overflow"))?;
        let region = DmaRegion::alloc(size, POOL_ALIGN, mapper)?;

        Ok(Self {
            region,
            buffer_size,
            count,
        })
    }

    /// Bus address of buffer `index`.
    pub fn bus_addr(&self, index: usize) -> u64 {
        assert!(index < self.count, "Invalid buffer index");
        self.region.bus_addr() + (index * self.buffer_size) as u64
    }

    /// Buffer `index` for reading.
    ///
    /// The caller must own the slot (see [`super::ownership`]).
    pub fn buffer(&self, index: usize) -> &[u8] {
        assert!(index < self.count, "Invalid buffer index");
        // SAFETY: index in range, region spans count * buffer_size bytes
        unsafe {
            core::slice::from_raw_parts(
                self.region.cpu_ptr().add(index * self.buffer_size),
                self.buffer_size,
            )
        }
    }

    /// Buffer `index` for writing.
    ///
    /// The caller must own the slot (see [`super::ownership`]).
    pub fn buffer_mut(&mut self, index: usize) -> &mut [u8] {
        assert!(index < self.count, "Invalid buffer index");
        // SAFETY: index in range, region spans count * buffer_size bytes
        unsafe {
            core::slice::from_raw_parts_mut(
                self.region.cpu_ptr().add(index * self.buffer_size),
                self.buffer_size,
            )
        }
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dma::IdentityMapper;

    #[test]
    fn test_buffers_are_contiguous() {
        let pool = PacketPool::new(2048, 4, &IdentityMapper).unwrap();
        assert_eq!(pool.len(), 4);
        assert_eq!(pool.bus_addr(1) - pool.bus_addr(0), 2048);
        assert_eq!(pool.bus_addr(3) - pool.bus_addr(0), 3 * 2048);
        assert_eq!(pool.buffer(2).len(), 2048);
    }

    #[test]
    fn test_buffers_do_not_overlap() {
        let mut pool = PacketPool::new(1518, 3, &IdentityMapper).unwrap();
        pool.buffer_mut(0).fill(0x11);
        pool.buffer_mut(1).fill(0x22);
        pool.buffer_mut(2).fill(0x33);
        assert!(pool.buffer(0).iter().all(|&b| b == 0x11));
        assert!(pool.buffer(1).iter().all(|&b| b == 0x22));
        assert!(pool.buffer(2).iter().all(|&b| b == 0x33));
    }
}
