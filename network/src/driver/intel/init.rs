//! Intel e1000 initialization sequence.
//!
//! # Initialization Sequence
//! 1. Validate configuration
//! 2. Allocate and seed descriptor rings
//! 3. Mask all interrupts (the driver is polled)
//! 4. Setup TX descriptor ring, TCTL, TIPG
//! 5. Program receive address 0, clear multicast table
//! 6. Setup RX descriptor ring
//! 7. Enable RX
//!
//! # Reference
//! Intel 8254x Software Developer's Manual, Section 14 (General Configuration)

use log::info;

use crate::dma::DmaMapper;
use crate::error::AttachError;
use crate::hw::RegisterAccess;
use crate::types::{MacAddress, MacDisplay, ETH_FRAME_MAX};

use super::regs::{self, Rctl, Tctl};
use super::rx::{OversizePolicy, RxRing};
use super::tx::TxRing;

// ═══════════════════════════════════════════════════════════════════════════
// CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════

/// Default number of TX descriptors.
pub const DEFAULT_TX_RING_SIZE: u16 = 32;
/// Default number of RX descriptors.
pub const DEFAULT_RX_RING_SIZE: u16 = 128;
/// Default TX buffer size: one maximum-size frame.
pub const DEFAULT_TX_BUFFER_SIZE: usize = ETH_FRAME_MAX;
/// Default RX buffer size (RCTL.BSIZE = 00b).
pub const DEFAULT_RX_BUFFER_SIZE: usize = 2048;
/// QEMU's default e1000 MAC, 52:54:00:12:34:56.
pub const DEFAULT_MAC: MacAddress = [0x52, 0x54, 0x00, 0x12, 0x34, 0x56];

/// E1000 driver configuration.
#[derive(Debug, Clone)]
pub struct E1000Config {
    /// Number of TX descriptors.
    pub tx_ring_size: u16,
    /// Number of RX descriptors.
    pub rx_ring_size: u16,
    /// Size of each TX buffer.
    pub tx_buffer_size: usize,
    /// Size of each RX buffer.
    pub rx_buffer_size: usize,
    /// Largest frame `send` accepts.
    pub max_frame_size: usize,
    /// Address programmed into RAL0/RAH0.
    pub mac: MacAddress,
    /// Receive behaviour for frames larger than the caller's buffer.
    pub oversize: OversizePolicy,
}

impl Default for E1000Config {
    fn default() -> Self {
        Self {
            tx_ring_size: DEFAULT_TX_RING_SIZE,
            rx_ring_size: DEFAULT_RX_RING_SIZE,
            tx_buffer_size: DEFAULT_TX_BUFFER_SIZE,
            rx_buffer_size: DEFAULT_RX_BUFFER_SIZE,
            max_frame_size: ETH_FRAME_MAX,
            mac: DEFAULT_MAC,
            oversize: OversizePolicy::Retain,
        }
    }
}

impl E1000Config {
    pub fn with_ring_sizes(mut self, tx: u16, rx: u16) -> Self {
        self.tx_ring_size = tx;
        self.rx_ring_size = rx;
        self
    }

    pub fn with_rx_buffer_size(mut self, size: usize) -> Self {
        self.rx_buffer_size = size;
        self
    }

    pub fn with_mac(mut self, mac: MacAddress) -> Self {
        self.mac = mac;
        self
    }

    pub fn with_oversize_policy(mut self, policy: OversizePolicy) -> Self {
        self.oversize = policy;
        self
    }

    /// Check the configuration against what the device accepts.
    pub fn validate(&self) -> Result<(), AttachError> {
        let ring_ok = |n: u16| n >= 8 && n % 8 == 0;
        if !ring_ok(self.tx_ring_size) || !ring_ok(self.rx_ring_size) {
            // xDLEN must be a multiple of 128 bytes = 8 descriptors
            return Err(AttachError::InvalidConfig("ring size must be a non-zero multiple of 8"));
        }
        if Rctl::bsize(self.rx_buffer_size).is_none() {
            return Err(AttachError::InvalidConfig("rx buffer size must be 256, 512, 1024 or 2048"));
        }
        if self.rx_buffer_size < self.max_frame_size {
            // frames spilling into a second descriptor are not reassembled
            return Err(AttachError::InvalidConfig("rx buffer must hold a maximum-size frame"));
        }
        if self.max_frame_size == 0 || self.max_frame_size > self.tx_buffer_size {
            return Err(AttachError::InvalidConfig("max frame size must fit a tx buffer"));
        }
        if self.max_frame_size > u16::MAX as usize {
            return Err(AttachError::InvalidConfig("max frame size exceeds descriptor length field"));
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// INITIALIZATION RESULT
// ═══════════════════════════════════════════════════════════════════════════

/// Result of successful initialization.
pub struct E1000InitResult {
    /// RX ring.
    pub rx_ring: RxRing,
    /// TX ring.
    pub tx_ring: TxRing,
}

// ═══════════════════════════════════════════════════════════════════════════
// INITIALIZATION
// ═══════════════════════════════════════════════════════════════════════════

/// Allocate the rings and program the device.
///
/// Nothing is written to the device if validation or allocation fails.
pub fn init_e1000<R: RegisterAccess>(
    regs: &R,
    mapper: &dyn DmaMapper,
    config: &E1000Config,
) -> Result<E1000InitResult, AttachError> {
    config.validate()?;

    let mut tx_ring = TxRing::new(
        config.tx_ring_size,
        config.tx_buffer_size,
        config.max_frame_size,
        mapper,
    )?;
    let mut rx_ring = RxRing::new(config.rx_ring_size, config.rx_buffer_size, config.oversize, mapper)?;

    tx_ring.init_descriptors();
    rx_ring.init_descriptors();

    info!(
        "e1000: device control={:#010x} status={:#010x}",
        regs.read(regs::CTRL),
        regs.read(regs::STATUS)
    );

    // ═══════════════════════════════════════════════════════════════════
    // STEP 1: MASK INTERRUPTS
    // ═══════════════════════════════════════════════════════════════════
    regs.write(regs::IMC, u32::MAX);
    regs.write(regs::IMS, 0);

    // ═══════════════════════════════════════════════════════════════════
    // STEP 2: SETUP TX DESCRIPTOR RING
    // ═══════════════════════════════════════════════════════════════════
    tx_ring.program(regs);
    let tctl = Tctl::EN.bits()
        | Tctl::PSP.bits()
        | Tctl::collision_threshold(regs::TCTL_CT_DEFAULT)
        | Tctl::collision_distance(regs::TCTL_COLD_FULL_DUPLEX);
    regs.write(regs::TCTL, tctl);
    regs.write(regs::TIPG, regs::TIPG_DEFAULT);

    // ═══════════════════════════════════════════════════════════════════
    // STEP 3: RECEIVE ADDRESS + MULTICAST TABLE
    // ═══════════════════════════════════════════════════════════════════
    let (ral, rah) = receive_address(&config.mac);
    regs.write(regs::RAL0, ral);
    regs.write(regs::RAH0, rah);
    for i in 0..regs::MTA_ENTRIES {
        regs.write(regs::MTA + i * 4, 0);
    }

    // ═══════════════════════════════════════════════════════════════════
    // STEP 4: SETUP RX DESCRIPTOR RING
    // ═══════════════════════════════════════════════════════════════════
    rx_ring.program(regs);

    // ═══════════════════════════════════════════════════════════════════
    // STEP 5: ENABLE RX
    // ═══════════════════════════════════════════════════════════════════
    let bsize = Rctl::bsize(config.rx_buffer_size).unwrap_or(0);
    regs.write(regs::RCTL, Rctl::EN.bits() | Rctl::SECRC.bits() | bsize);

    info!(
        "e1000: mac {} tx ring {}x{} rx ring {}x{}",
        MacDisplay(&config.mac),
        tx_ring.capacity(),
        config.tx_buffer_size,
        rx_ring.capacity(),
        config.rx_buffer_size
    );

    Ok(E1000InitResult { rx_ring, tx_ring })
}

/// Split a MAC address into RAL/RAH values, address-valid bit set.
pub fn receive_address(mac: &MacAddress) -> (u32, u32) {
    let ral = u32::from_le_bytes([mac[0], mac[1], mac[2], mac[3]]);
    let rah = u32::from_le_bytes([mac[4], mac[5], 0, 0]) | regs::RAH_AV;
    (ral, rah)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receive_address_for_qemu_mac() {
        let (ral, rah) = receive_address(&DEFAULT_MAC);
        assert_eq!(ral, 0x1200_5452);
        assert_eq!(rah, 0x8000_5634);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(E1000Config::default().validate().is_ok());
    }

    #[test]
    fn test_ring_size_must_fill_128_bytes() {
        let config = E1000Config::default().with_ring_sizes(12, 128);
        assert!(matches!(config.validate(), Err(AttachError::InvalidConfig(_))));
        let config = E1000Config::default().with_ring_sizes(0, 128);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rx_buffer_size_must_be_encodable() {
        let config = E1000Config::default().with_rx_buffer_size(1518);
        assert!(config.validate().is_err());
        let config = E1000Config::default().with_rx_buffer_size(2048);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rx_buffer_must_hold_max_frame() {
        for size in [256, 512, 1024] {
            let config = E1000Config::default().with_rx_buffer_size(size);
            assert!(matches!(config.validate(), Err(AttachError::InvalidConfig(_))));
        }

        let mut config = E1000Config::default().with_rx_buffer_size(1024);
        config.max_frame_size = 1024;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_max_frame_must_fit_tx_buffer() {
        let mut config = E1000Config::default();
        config.max_frame_size = config.tx_buffer_size + 1;
        assert!(config.validate().is_err());
    }
}
