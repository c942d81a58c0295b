//! Intel e1000 driver instance.

use crate::dma::DmaMapper;
use crate::error::{AttachError, PacketError};
use crate::hw::RegisterAccess;
use crate::types::MacAddress;

use super::init::{init_e1000, E1000Config};
use super::regs::{self, Status};
use super::rx::RxRing;
use super::tx::TxRing;

/// Intel 8254x descriptor-ring driver.
///
/// Owns the register window, both rings, and both packet pools. One value
/// exists per attached device; every caller reaches it through a handle.
pub struct E1000<R: RegisterAccess> {
    /// Device register window.
    regs: R,
    /// Configured MAC address.
    mac: MacAddress,
    /// RX descriptor ring.
    rx_ring: RxRing,
    /// TX descriptor ring.
    tx_ring: TxRing,
}

impl<R: RegisterAccess> E1000<R> {
    /// Attach to a mapped device and program it for polled operation.
    pub fn attach(regs: R, mapper: &dyn DmaMapper, config: E1000Config) -> Result<Self, AttachError> {
        let result = init_e1000(&regs, mapper, &config)?;
        Ok(Self {
            regs,
            mac: config.mac,
            rx_ring: result.rx_ring,
            tx_ring: result.tx_ring,
        })
    }

    /// Queue one frame for transmission. Never blocks.
    pub fn send(&mut self, frame: &[u8]) -> Result<usize, PacketError> {
        self.tx_ring.transmit(&self.regs, frame)
    }

    /// Copy one received frame into `buffer`. Never blocks.
    pub fn receive(&mut self, buffer: &mut [u8]) -> Result<usize, PacketError> {
        self.rx_ring.receive(&self.regs, buffer)
    }

    /// Check if the next `send` can succeed.
    pub fn can_transmit(&self) -> bool {
        self.tx_ring.can_transmit()
    }

    /// Check if a frame is waiting.
    pub fn can_receive(&self) -> bool {
        self.rx_ring.can_receive()
    }

    pub fn mac_address(&self) -> MacAddress {
        self.mac
    }

    /// Link state from the STATUS register.
    pub fn link_up(&self) -> bool {
        Status::from_bits_truncate(self.regs.read(regs::STATUS)).contains(Status::LU)
    }

    /// Frames dropped by the device for lack of RX descriptors since the
    /// last call (MPC is clear-on-read).
    pub fn missed_packets(&self) -> u32 {
        self.regs.read(regs::MPC)
    }

    pub fn tx_ring(&self) -> &TxRing {
        &self.tx_ring
    }

    pub fn rx_ring(&self) -> &RxRing {
        &self.rx_ring
    }

    pub fn registers(&self) -> &R {
        &self.regs
    }
}
