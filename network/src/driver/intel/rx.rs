//! Intel e1000 RX path.

use log::{debug, warn};

use crate::dma::{DmaMapper, OwnedSlot, PacketPool};
use crate::error::{AttachError, PacketError};
use crate::hw::barriers::{rmb, wmb};
use crate::hw::RegisterAccess;

use super::desc::RxDescriptor;
use super::regs;
use super::ring::DescRing;

// ═══════════════════════════════════════════════════════════════════════════
// OVERSIZE POLICY
// ═══════════════════════════════════════════════════════════════════════════

/// What `receive` does with a frame longer than the caller's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OversizePolicy {
    /// Leave the slot untouched and software-owned. A retry with a large
    /// enough buffer returns the same frame.
    #[default]
    Retain,
    /// Discard the frame: give the slot back to hardware and advance RDT.
    Drop,
}

// ═══════════════════════════════════════════════════════════════════════════
// RX RING
// ═══════════════════════════════════════════════════════════════════════════

/// RX descriptor ring and its packet buffers.
pub struct RxRing {
    /// Descriptor array.
    ring: DescRing<RxDescriptor>,
    /// One buffer per descriptor, bound at init.
    pool: PacketPool,
    /// Last slot handed back to hardware; mirrors RDT.
    tail: u16,
    /// Handling of frames that do not fit the caller's buffer.
    oversize: OversizePolicy,
}

impl RxRing {
    /// Allocate the ring and its buffers.
    pub fn new(
        capacity: u16,
        buffer_size: usize,
        oversize: OversizePolicy,
        mapper: &dyn DmaMapper,
    ) -> Result<Self, AttachError> {
        Ok(Self {
            ring: DescRing::new(capacity, mapper)?,
            pool: PacketPool::new(buffer_size, capacity as usize, mapper)?,
            tail: capacity - 1,
            oversize,
        })
    }

    /// Bind every descriptor to its buffer, owned by hardware.
    pub fn init_descriptors(&mut self) {
        for i in 0..self.ring.capacity() {
            let mut desc = RxDescriptor {
                buffer_addr: self.pool.bus_addr(i as usize),
                ..Default::default()
            };
            desc.hand_to_hardware();
            self.ring.store(i, desc);
        }
        // Tail points to the last slot software has given back
        self.tail = self.ring.capacity() - 1;
    }

    /// Program RDBAL/RDBAH/RDLEN and the initial head and tail.
    pub fn program<R: RegisterAccess>(&self, regs: &R) {
        let base = self.ring.bus_addr();
        regs.write(regs::RDBAL, base as u32);
        regs.write(regs::RDBAH, (base >> 32) as u32);
        regs.write(regs::RDLEN, self.ring.len_bytes());
        regs.write(regs::RDH, 0);
        regs.write(regs::RDT, self.tail as u32);
    }

    /// Slot the next frame will be read from.
    #[inline]
    pub fn next_to_clean(&self) -> u16 {
        self.ring.next(self.tail)
    }

    /// Check if a frame is waiting.
    #[inline]
    pub fn can_receive(&self) -> bool {
        self.ring.load(self.next_to_clean()).ownership().is_software()
    }

    /// Copy one frame out of the ring.
    ///
    /// # Returns
    /// - `Ok(len)`: frame copied, slot returned to hardware, RDT advanced
    /// - `Err(BufEmpty)`: next slot still owned by hardware
    /// - `Err(InvalidArgument)`: frame longer than `out`; see [`OversizePolicy`]
    pub fn receive<R: RegisterAccess>(&mut self, regs: &R, out: &mut [u8]) -> Result<usize, PacketError> {
        let idx = self.next_to_clean();
        let desc = self.ring.load(idx);

        if desc.ownership().is_hardware() {
            return Err(PacketError::BufEmpty);
        }

        // DD observed; buffer contents are valid only after this
        rmb();

        if !desc.errors().is_empty() {
            warn!("rx: slot {} completed with errors {:?}", idx, desc.errors());
        }

        let length = (desc.length as usize).min(self.pool.buffer_size());
        if length > out.len() {
            debug!(
                "rx: frame of {} bytes in slot {} exceeds buffer of {} ({:?})",
                length,
                idx,
                out.len(),
                self.oversize
            );
            if self.oversize == OversizePolicy::Drop {
                self.release(regs, idx, desc);
            }
            return Err(PacketError::InvalidArgument);
        }

        out[..length].copy_from_slice(&self.pool.buffer(idx as usize)[..length]);
        self.release(regs, idx, desc);

        debug!("rx: received {} bytes from slot {}", length, idx);
        Ok(length)
    }

    /// Give slot `idx` back to hardware and move RDT onto it.
    fn release<R: RegisterAccess>(&mut self, regs: &R, idx: u16, mut desc: RxDescriptor) {
        desc.hand_to_hardware();
        self.ring.store(idx, desc);
        wmb();
        self.tail = idx;
        regs.write(regs::RDT, idx as u32);
    }

    pub fn tail(&self) -> u16 {
        self.tail
    }

    pub fn capacity(&self) -> u16 {
        self.ring.capacity()
    }

    pub fn oversize_policy(&self) -> OversizePolicy {
        self.oversize
    }
}
