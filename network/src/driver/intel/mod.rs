//! Intel 8254x (e1000) driver.
//!
//! Legacy descriptors, one TX queue, one RX queue, no interrupts.

pub mod regs;
pub mod desc;
pub mod ring;
pub mod tx;
pub mod rx;
pub mod init;
pub mod e1000;

pub use desc::{RxDescriptor, TxDescriptor};
pub use e1000::E1000;
pub use init::{E1000Config, DEFAULT_MAC, DEFAULT_RX_RING_SIZE, DEFAULT_TX_RING_SIZE};
pub use rx::{OversizePolicy, RxRing};
pub use tx::TxRing;

/// Intel PCI vendor ID.
pub const INTEL_VENDOR_ID: u16 = 0x8086;

/// 8254x device IDs this driver handles.
pub const E1000_DEVICE_IDS: &[u16] = &[
    0x100E, // 82540EM (QEMU default)
    0x100F, // 82545EM
];

/// Check if a PCI function is one this driver can attach to.
pub fn supports_device(vendor: u16, device: u16) -> bool {
    vendor == INTEL_VENDOR_ID && E1000_DEVICE_IDS.contains(&device)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supports_device() {
        assert!(supports_device(0x8086, 0x100E));
        assert!(!supports_device(0x8086, 0x1234));
        assert!(!supports_device(0x10EC, 0x100E));
    }
}
