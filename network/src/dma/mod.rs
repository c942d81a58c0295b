//! DMA memory management module.
//!
//! Descriptor rings and packet pools live in [`DmaRegion`]s; slot ownership
//! between driver and device follows [`ownership`].

pub mod region;
pub mod ownership;
pub mod pool;

pub use region::{DmaMapper, DmaRegion, IdentityMapper};
pub use ownership::{OwnedSlot, Ownership};
pub use pool::PacketPool;
