//! Driver abstraction module.
//!
//! Provides the `PacketIo` boundary and the e1000 ring manager behind it.

pub mod traits;
pub mod handle;
pub mod syscall;
pub mod intel;

// Re-exports
pub use traits::PacketIo;
pub use handle::NicHandle;
pub use intel::{E1000, E1000Config, OversizePolicy};
