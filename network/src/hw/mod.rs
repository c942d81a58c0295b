//! Hardware access primitives.

pub mod barriers;
pub mod mmio;

pub use mmio::{MmioRegion, RegisterAccess};
