//! Legacy transmit and receive descriptors.
//!
//! Both are 16 bytes and live in DMA memory shared with the device.

use crate::dma::{OwnedSlot, Ownership};

use super::regs::{RxErrors, RxStatus, TxCmd, TxStatus, DESC_SIZE};

/// Legacy transmit descriptor.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct TxDescriptor {
    /// Bus address of the packet buffer.
    pub buffer_addr: u64,
    /// Bytes to transmit.
    pub length: u16,
    /// Checksum offset.
    pub cso: u8,
    /// Command bits.
    pub cmd: u8,
    /// Status bits, written back by the device.
    pub status: u8,
    /// Checksum start.
    pub css: u8,
    /// VLAN tag.
    pub special: u16,
}

impl TxDescriptor {
    pub fn cmd(&self) -> TxCmd {
        TxCmd::from_bits_truncate(self.cmd)
    }

    pub fn status(&self) -> TxStatus {
        TxStatus::from_bits_truncate(self.status)
    }
}

impl OwnedSlot for TxDescriptor {
    fn ownership(&self) -> Ownership {
        if self.status().contains(TxStatus::DD) {
            Ownership::Software
        } else {
            Ownership::Hardware
        }
    }

    fn hand_to_hardware(&mut self) {
        self.status &= !TxStatus::DD.bits();
    }

    fn reclaim_for_software(&mut self) {
        self.status |= TxStatus::DD.bits();
    }
}

/// Legacy receive descriptor.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct RxDescriptor {
    /// Bus address of the packet buffer. Fixed for the life of the ring.
    pub buffer_addr: u64,
    /// Bytes written by the device.
    pub length: u16,
    /// Packet checksum.
    pub checksum: u16,
    /// Status bits.
    pub status: u8,
    /// Error bits.
    pub errors: u8,
    /// VLAN tag.
    pub special: u16,
}

impl RxDescriptor {
    pub fn status(&self) -> RxStatus {
        RxStatus::from_bits_truncate(self.status)
    }

    pub fn errors(&self) -> RxErrors {
        RxErrors::from_bits_truncate(self.errors)
    }
}

impl OwnedSlot for RxDescriptor {
    fn ownership(&self) -> Ownership {
        if self.status().contains(RxStatus::DD) {
            Ownership::Software
        } else {
            Ownership::Hardware
        }
    }

    /// Clears the whole status byte, not just DD: EOP from the previous
    /// frame must not survive into the next one.
    fn hand_to_hardware(&mut self) {
        self.status = 0;
        self.errors = 0;
    }

    fn reclaim_for_software(&mut self) {
        self.status |= RxStatus::DD.bits();
    }
}

const _: () = assert!(core::mem::size_of::<TxDescriptor>() == DESC_SIZE);
const _: () = assert!(core::mem::size_of::<RxDescriptor>() == DESC_SIZE);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tx_ownership_transitions() {
        let mut desc = TxDescriptor::default();
        assert_eq!(desc.ownership(), Ownership::Hardware);

        desc.reclaim_for_software();
        assert_eq!(desc.ownership(), Ownership::Software);
        assert_eq!(desc.status, 0x01);

        desc.hand_to_hardware();
        assert!(desc.ownership().is_hardware());
    }

    #[test]
    fn test_rx_hand_to_hardware_clears_status() {
        let mut desc = RxDescriptor {
            status: (RxStatus::DD | RxStatus::EOP).bits(),
            errors: RxErrors::CE.bits(),
            ..Default::default()
        };
        assert!(desc.ownership().is_software());
        desc.hand_to_hardware();
        assert_eq!(desc.status, 0);
        assert_eq!(desc.errors, 0);
        assert!(desc.ownership().is_hardware());
    }
}
