//! Polled e1000 network driver.
//!
//! Descriptor-ring management for the Intel 8254x family, exposed through
//! a syscall-style, never-blocking packet boundary ([`PacketIo`]).
//!
//! # Layout
//! ```text
//! hw       register access, memory barriers
//! dma      DMA regions, per-slot packet pools, slot ownership
//! driver   e1000 ring manager, shared handle, syscall encoding
//! sim      software NIC model (feature `sim`)
//! ```

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod error;
pub mod types;
pub mod hw;
pub mod dma;
pub mod driver;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use error::{AttachError, PacketError, Result};
pub use types::{MacAddress, ETH_FRAME_MAX};
pub use dma::{DmaMapper, IdentityMapper};
pub use hw::{MmioRegion, RegisterAccess};
pub use driver::{E1000, E1000Config, NicHandle, OversizePolicy, PacketIo};
