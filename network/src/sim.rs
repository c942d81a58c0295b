//! Software model of an 8254x NIC.
//!
//! [`SimNic`] is a register file plus a DMA engine. The engine follows the
//! ring base, length, head and tail registers the driver programmed and
//! reads and writes the real descriptor and buffer memory, so the driver
//! under test runs unmodified. Bus addresses are taken to be CPU addresses
//! ([`crate::dma::IdentityMapper`]).
//!
//! Nothing runs on its own: tests decide when the engine moves by calling
//! [`SimNic::complete_transmits`] and [`SimNic::inject`].

use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use log::trace;
use spin::Mutex;

use crate::driver::intel::regs::{self, Rctl, RxStatus, Status, TxStatus, DESC_SIZE};
use crate::driver::intel::{RxDescriptor, TxDescriptor};
use crate::hw::RegisterAccess;

/// Failures of the simulated DMA engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimError {
    /// Receive ring has not been programmed yet.
    NotProgrammed,
    /// Hardware owns no free receive slot (RDH == RDT). Counted in MPC.
    RingFull,
    /// Frame does not fit one receive buffer.
    FrameTooLong { len: usize, buffer: usize },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotProgrammed => write!(f, "Receive ring not programmed"),
            Self::RingFull => write!(f, "Receive ring full"),
            Self::FrameTooLong { len, buffer } => {
                write!(f, "Frame of {} bytes exceeds {}-byte receive buffer", len, buffer)
            }
        }
    }
}

/// Simulated NIC.
pub struct SimNic {
    /// Register file, keyed by byte offset. Unwritten registers read 0.
    regs: Mutex<BTreeMap<u32, u32>>,
    /// Frames the DMA engine has put on the wire, oldest first.
    wire: Mutex<Vec<Vec<u8>>>,
}

impl SimNic {
    /// A powered-up device with link established at full duplex.
    pub fn new() -> Arc<Self> {
        let mut file = BTreeMap::new();
        file.insert(regs::STATUS, (Status::LU | Status::FD).bits());
        Arc::new(Self {
            regs: Mutex::new(file),
            wire: Mutex::new(Vec::new()),
        })
    }

    /// Read a register without side effects (MPC is not cleared).
    pub fn register(&self, reg: u32) -> u32 {
        self.regs.lock().get(&reg).copied().unwrap_or(0)
    }

    fn set_register(&self, reg: u32, value: u32) {
        self.regs.lock().insert(reg, value);
    }

    fn ring_base(&self, lo: u32, hi: u32) -> usize {
        (((self.register(hi) as u64) << 32) | self.register(lo) as u64) as usize
    }

    fn ring_capacity(&self, len_reg: u32) -> u32 {
        self.register(len_reg) / DESC_SIZE as u32
    }

    // ═══════════════════════════════════════════════════════════════════
    // TRANSMIT
    // ═══════════════════════════════════════════════════════════════════

    /// Process every descriptor handed to hardware, starting at TDH.
    ///
    /// Each frame is copied to the wire, its descriptor gets DD written
    /// back, and TDH advances. Returns the number of frames sent.
    pub fn complete_transmits(&self) -> usize {
        let base = self.ring_base(regs::TDBAL, regs::TDBAH);
        let capacity = self.ring_capacity(regs::TDLEN);
        if base == 0 || capacity == 0 {
            return 0;
        }

        let descs = base as *mut TxDescriptor;
        let mut head = self.register(regs::TDH) % capacity;
        let mut sent = 0;

        // A completely full ring has TDT == TDH, so walk on the DD bit
        // rather than on head != tail.
        while sent < capacity as usize {
            // SAFETY: head < capacity; base and capacity come from the
            // ring the driver programmed and keeps alive.
            let mut desc = unsafe { core::ptr::read_volatile(descs.add(head as usize)) };
            if desc.status().contains(TxStatus::DD) {
                break;
            }

            let len = desc.length as usize;
            // SAFETY: the driver filled `len` bytes of this slot's buffer
            let frame = unsafe { core::slice::from_raw_parts(desc.buffer_addr as usize as *const u8, len) };
            self.wire.lock().push(frame.to_vec());

            desc.status |= TxStatus::DD.bits();
            unsafe { core::ptr::write_volatile(descs.add(head as usize), desc) };

            trace!("sim: transmitted {} bytes from slot {}", len, head);
            head = (head + 1) % capacity;
            sent += 1;
        }

        self.set_register(regs::TDH, head);
        sent
    }

    /// Drain the frames sent so far.
    pub fn take_transmitted(&self) -> Vec<Vec<u8>> {
        core::mem::take(&mut *self.wire.lock())
    }

    // ═══════════════════════════════════════════════════════════════════
    // RECEIVE
    // ═══════════════════════════════════════════════════════════════════

    /// Receive buffer size selected by RCTL.BSIZE.
    fn rx_buffer_size(&self) -> usize {
        match (self.register(regs::RCTL) & Rctl::BSIZE.bits()) >> 16 {
            0b00 => 2048,
            0b01 => 1024,
            0b10 => 512,
            _ => 256,
        }
    }

    /// Deliver `frame` from the wire into the slot at RDH.
    ///
    /// Returns the slot index written.
    pub fn inject(&self, frame: &[u8]) -> Result<u16, SimError> {
        self.inject_with_errors(frame, 0)
    }

    /// Like [`inject`](Self::inject), with receive error bits set in the
    /// written-back descriptor.
    pub fn inject_with_errors(&self, frame: &[u8], errors: u8) -> Result<u16, SimError> {
        let base = self.ring_base(regs::RDBAL, regs::RDBAH);
        let capacity = self.ring_capacity(regs::RDLEN);
        if base == 0 || capacity == 0 {
            return Err(SimError::NotProgrammed);
        }

        let buffer = self.rx_buffer_size();
        if frame.len() > buffer {
            return Err(SimError::FrameTooLong {
                len: frame.len(),
                buffer,
            });
        }

        let head = self.register(regs::RDH) % capacity;
        if head == self.register(regs::RDT) % capacity {
            let missed = self.register(regs::MPC);
            self.set_register(regs::MPC, missed.wrapping_add(1));
            return Err(SimError::RingFull);
        }

        let descs = base as *mut RxDescriptor;
        // SAFETY: head < capacity within the programmed ring
        let mut desc = unsafe { core::ptr::read_volatile(descs.add(head as usize)) };
        // SAFETY: slot buffer holds `buffer` bytes and frame.len() <= buffer
        unsafe {
            core::ptr::copy_nonoverlapping(frame.as_ptr(), desc.buffer_addr as usize as *mut u8, frame.len());
        }
        desc.length = frame.len() as u16;
        desc.errors = errors;
        desc.status = (RxStatus::DD | RxStatus::EOP).bits();
        unsafe { core::ptr::write_volatile(descs.add(head as usize), desc) };

        trace!("sim: received {} bytes into slot {}", frame.len(), head);
        self.set_register(regs::RDH, (head + 1) % capacity);
        Ok(head as u16)
    }
}

impl RegisterAccess for SimNic {
    fn read(&self, reg: u32) -> u32 {
        let mut file = self.regs.lock();
        if reg == regs::MPC {
            // Statistics registers clear on read
            return file.remove(&reg).unwrap_or(0);
        }
        file.get(&reg).copied().unwrap_or(0)
    }

    fn write(&self, reg: u32, value: u32) {
        self.regs.lock().insert(reg, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_device_reports_link() {
        let nic = SimNic::new();
        let status = Status::from_bits_truncate(nic.read(regs::STATUS));
        assert!(status.contains(Status::LU));
        assert_eq!(nic.read(regs::RDT), 0);
    }

    #[test]
    fn test_mpc_clears_on_read() {
        let nic = SimNic::new();
        nic.write(regs::MPC, 3);
        assert_eq!(nic.register(regs::MPC), 3);
        assert_eq!(nic.read(regs::MPC), 3);
        assert_eq!(nic.read(regs::MPC), 0);
    }

    #[test]
    fn test_unprogrammed_engine_is_inert() {
        let nic = SimNic::new();
        assert_eq!(nic.complete_transmits(), 0);
        assert_eq!(nic.inject(&[0u8; 60]), Err(SimError::NotProgrammed));
        assert!(nic.take_transmitted().is_empty());
    }
}
