//! Shared data types module.

pub mod ethernet;

// Re-exports
pub use ethernet::{MacAddress, MacDisplay, ETH_ALEN, ETH_FRAME_MAX, ETH_HLEN, ETH_MTU};
