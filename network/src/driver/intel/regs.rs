//! Intel 8254x (e1000) register definitions.
//!
//! # Reference
//! Intel PCI/PCI-X Family of Gigabit Ethernet Controllers
//! Software Developer's Manual, Section 13 (Register Descriptions)

use bitflags::bitflags;

// ═══════════════════════════════════════════════════════════════════════════
// REGISTER OFFSETS
// ═══════════════════════════════════════════════════════════════════════════

/// Device Control.
pub const CTRL: u32 = 0x0000;
/// Device Status.
pub const STATUS: u32 = 0x0008;
/// Interrupt Mask Set/Read.
pub const IMS: u32 = 0x00D0;
/// Interrupt Mask Clear.
pub const IMC: u32 = 0x00D8;
/// Receive Control.
pub const RCTL: u32 = 0x0100;
/// Transmit Control.
pub const TCTL: u32 = 0x0400;
/// Transmit Inter Packet Gap.
pub const TIPG: u32 = 0x0410;
/// RX Descriptor Base Low / High / Length / Head / Tail.
pub const RDBAL: u32 = 0x2800;
pub const RDBAH: u32 = 0x2804;
pub const RDLEN: u32 = 0x2808;
pub const RDH: u32 = 0x2810;
pub const RDT: u32 = 0x2818;
/// TX Descriptor Base Low / High / Length / Head / Tail.
pub const TDBAL: u32 = 0x3800;
pub const TDBAH: u32 = 0x3804;
pub const TDLEN: u32 = 0x3808;
pub const TDH: u32 = 0x3810;
pub const TDT: u32 = 0x3818;
/// Missed Packets Count (clear on read).
pub const MPC: u32 = 0x4010;
/// Multicast Table Array, 128 × u32.
pub const MTA: u32 = 0x5200;
pub const MTA_ENTRIES: u32 = 128;
/// Receive Address 0, low and high halves.
pub const RAL0: u32 = 0x5400;
pub const RAH0: u32 = 0x5404;

/// Size of the register window in BAR0.
pub const REGISTER_SPACE: usize = 0x20000;

/// Size of a legacy descriptor (both rings).
pub const DESC_SIZE: usize = 16;

/// Required alignment of descriptor ring length and base.
pub const RING_ALIGN: usize = 128;

// ═══════════════════════════════════════════════════════════════════════════
// CONTROL / STATUS BITS
// ═══════════════════════════════════════════════════════════════════════════

bitflags! {
    /// Device Status register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Status: u32 {
        /// Full duplex.
        const FD = 1 << 0;
        /// Link up.
        const LU = 1 << 1;
        /// Transmission paused.
        const TXOFF = 1 << 4;
    }
}

bitflags! {
    /// Transmit Control register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Tctl: u32 {
        /// Transmit enable.
        const EN = 1 << 1;
        /// Pad short packets.
        const PSP = 1 << 3;
        /// Collision threshold field.
        const CT = 0x0000_0FF0;
        /// Collision distance field.
        const COLD = 0x003F_F000;
    }
}

impl Tctl {
    /// Collision threshold: retransmit attempts before giving up.
    pub const fn collision_threshold(ct: u32) -> u32 {
        (ct << 4) & Self::CT.bits()
    }

    /// Collision distance, in byte times.
    pub const fn collision_distance(cold: u32) -> u32 {
        (cold << 12) & Self::COLD.bits()
    }
}

/// Recommended collision threshold.
pub const TCTL_CT_DEFAULT: u32 = 0x10;
/// Collision distance for full duplex.
pub const TCTL_COLD_FULL_DUPLEX: u32 = 0x40;

/// TIPG for IEEE 802.3: IPGT = 10, IPGR1 = 4, IPGR2 = 6.
pub const TIPG_DEFAULT: u32 = 10 | (4 << 10) | (6 << 20);

bitflags! {
    /// Receive Control register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Rctl: u32 {
        /// Receiver enable.
        const EN = 1 << 1;
        /// Store bad packets.
        const SBP = 1 << 2;
        /// Unicast promiscuous.
        const UPE = 1 << 3;
        /// Multicast promiscuous.
        const MPE = 1 << 4;
        /// Broadcast accept mode.
        const BAM = 1 << 15;
        /// Buffer size field.
        const BSIZE = 0b11 << 16;
        /// Buffer size extension.
        const BSEX = 1 << 25;
        /// Strip Ethernet CRC.
        const SECRC = 1 << 26;
    }
}

impl Rctl {
    /// BSIZE encoding for a receive buffer size (BSEX = 0).
    pub const fn bsize(buffer_size: usize) -> Option<u32> {
        match buffer_size {
            2048 => Some(0b00 << 16),
            1024 => Some(0b01 << 16),
            512 => Some(0b10 << 16),
            256 => Some(0b11 << 16),
            _ => None,
        }
    }
}

/// Receive Address High: address valid.
pub const RAH_AV: u32 = 1 << 31;

// ═══════════════════════════════════════════════════════════════════════════
// DESCRIPTOR BITS
// ═══════════════════════════════════════════════════════════════════════════

bitflags! {
    /// Transmit descriptor command byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TxCmd: u8 {
        /// End of packet.
        const EOP = 1 << 0;
        /// Insert FCS.
        const IFCS = 1 << 1;
        /// Report status (write back DD).
        const RS = 1 << 3;
    }
}

bitflags! {
    /// Transmit descriptor status byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TxStatus: u8 {
        /// Descriptor done.
        const DD = 1 << 0;
    }
}

bitflags! {
    /// Receive descriptor status byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RxStatus: u8 {
        /// Descriptor done.
        const DD = 1 << 0;
        /// End of packet.
        const EOP = 1 << 1;
    }
}

bitflags! {
    /// Receive descriptor errors byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RxErrors: u8 {
        /// CRC or alignment error.
        const CE = 1 << 0;
        /// Symbol error.
        const SE = 1 << 1;
        /// Sequence error.
        const SEQ = 1 << 2;
        /// Carrier extension error.
        const CXE = 1 << 4;
        /// TCP/UDP checksum error.
        const TCPE = 1 << 5;
        /// IP checksum error.
        const IPE = 1 << 6;
        /// RX data error.
        const RXE = 1 << 7;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tctl_fields() {
        let tctl = Tctl::EN.bits()
            | Tctl::PSP.bits()
            | Tctl::collision_threshold(TCTL_CT_DEFAULT)
            | Tctl::collision_distance(TCTL_COLD_FULL_DUPLEX);
        assert_eq!(tctl, 0x0004_010A);
    }

    #[test]
    fn test_tipg_value() {
        assert_eq!(TIPG_DEFAULT, 0x0060_100A);
    }

    #[test]
    fn test_bsize_encoding() {
        assert_eq!(Rctl::bsize(2048), Some(0));
        assert_eq!(Rctl::bsize(256), Some(0x0003_0000));
        assert_eq!(Rctl::bsize(1518), None);
    }

    #[test]
    fn test_descriptor_bits() {
        assert_eq!((TxCmd::RS | TxCmd::EOP).bits(), 0x09);
        assert_eq!(RxStatus::DD.bits(), TxStatus::DD.bits());
    }
}
