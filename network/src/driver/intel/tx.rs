//! Intel e1000 TX path.

use log::{debug, trace};

use crate::dma::{DmaMapper, OwnedSlot, PacketPool};
use crate::error::{AttachError, PacketError};
use crate::hw::barriers::wmb;
use crate::hw::RegisterAccess;

use super::desc::TxDescriptor;
use super::regs::{self, TxCmd};
use super::ring::DescRing;

// ═══════════════════════════════════════════════════════════════════════════
// TX RING
// ═══════════════════════════════════════════════════════════════════════════

/// TX descriptor ring and its packet buffers.
pub struct TxRing {
    /// Descriptor array.
    ring: DescRing<TxDescriptor>,
    /// One buffer per descriptor.
    pool: PacketPool,
    /// Next slot to fill; mirrors TDT.
    tail: u16,
    /// Largest frame accepted by `transmit`.
    max_frame: usize,
}

impl TxRing {
    /// Allocate the ring and its buffers.
    pub fn new(
        capacity: u16,
        buffer_size: usize,
        max_frame: usize,
        mapper: &dyn DmaMapper,
    ) -> Result<Self, AttachError> {
        Ok(Self {
            ring: DescRing::new(capacity, mapper)?,
            pool: PacketPool::new(buffer_size, capacity as usize, mapper)?,
            tail: 0,
            max_frame,
        })
    }

    /// Bind every descriptor to its buffer and hand it to software.
    pub fn init_descriptors(&mut self) {
        for i in 0..self.ring.capacity() {
            let mut desc = TxDescriptor {
                buffer_addr: self.pool.bus_addr(i as usize),
                ..Default::default()
            };
            desc.reclaim_for_software();
            self.ring.store(i, desc);
        }
        self.tail = 0;
    }

    /// Program TDBAL/TDBAH/TDLEN and reset head and tail.
    pub fn program<R: RegisterAccess>(&self, regs: &R) {
        let base = self.ring.bus_addr();
        regs.write(regs::TDBAL, base as u32);
        regs.write(regs::TDBAH, (base >> 32) as u32);
        regs.write(regs::TDLEN, self.ring.len_bytes());
        regs.write(regs::TDH, 0);
        regs.write(regs::TDT, 0);
    }

    /// Check if the slot at the tail is free.
    #[inline]
    pub fn can_transmit(&self) -> bool {
        self.ring.load(self.tail).ownership().is_software()
    }

    /// Queue one frame.
    ///
    /// # Returns
    /// - `Ok(len)`: frame queued, TDT advanced
    /// - `Err(InvalidArgument)`: frame larger than the maximum; nothing changed
    /// - `Err(BufFull)`: tail slot still owned by hardware; nothing changed
    pub fn transmit<R: RegisterAccess>(&mut self, regs: &R, frame: &[u8]) -> Result<usize, PacketError> {
        if frame.len() > self.max_frame {
            return Err(PacketError::InvalidArgument);
        }

        let idx = self.tail;
        let mut desc = self.ring.load(idx);
        if desc.ownership().is_hardware() {
            trace!("tx: slot {} still owned by hardware", idx);
            return Err(PacketError::BufFull);
        }

        self.pool.buffer_mut(idx as usize)[..frame.len()].copy_from_slice(frame);

        desc.buffer_addr = self.pool.bus_addr(idx as usize);
        desc.length = frame.len() as u16;
        desc.cmd = (TxCmd::RS | TxCmd::EOP).bits();
        desc.cso = 0;
        desc.css = 0;
        desc.special = 0;
        desc.hand_to_hardware();
        self.ring.store(idx, desc);

        // Descriptor and buffer must be visible before the doorbell
        wmb();

        self.tail = self.ring.next(idx);
        regs.write(regs::TDT, self.tail as u32);

        debug!("tx: queued {} bytes in slot {}", frame.len(), idx);
        Ok(frame.len())
    }

    pub fn tail(&self) -> u16 {
        self.tail
    }

    pub fn capacity(&self) -> u16 {
        self.ring.capacity()
    }

    pub fn max_frame(&self) -> usize {
        self.max_frame
    }

    /// Slots currently owned by hardware.
    pub fn in_flight(&self) -> usize {
        (0..self.ring.capacity())
            .filter(|&i| self.ring.load(i).ownership().is_hardware())
            .count()
    }
}
