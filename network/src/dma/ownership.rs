//! Descriptor ownership state machine.
//!
//! # State Machine
//! ```text
//!     SOFTWARE ──hand_to_hardware()──> HARDWARE
//!        ▲                                │
//!        └──────reclaim_for_software()────┘
//!                 (DMA engine sets DD)
//! ```
//!
//! The descriptor's DD bit is the only storage for this state; both sides
//! of the hand-off read it. [`Ownership`] names the two values so the ring
//! code never tests the raw bit.
//!
//! INVARIANT: software touches a slot's buffer only while it is SOFTWARE.

/// Who may touch a ring slot's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// DD set: the driver may read (rx) or refill (tx) the slot.
    Software,
    /// DD clear: the DMA engine may read (tx) or write (rx) the slot.
    Hardware,
}

impl Ownership {
    #[inline]
    pub fn is_software(&self) -> bool {
        *self == Ownership::Software
    }

    #[inline]
    pub fn is_hardware(&self) -> bool {
        *self == Ownership::Hardware
    }
}

/// A ring descriptor whose DD bit carries slot ownership.
pub trait OwnedSlot {
    /// Current owner, decoded from the DD bit.
    fn ownership(&self) -> Ownership;

    /// Software → hardware: clear DD so the DMA engine may use the slot.
    fn hand_to_hardware(&mut self);

    /// Hardware → software: set DD. Performed by the DMA engine on
    /// completion; software only does this when seeding a ring.
    fn reclaim_for_software(&mut self);
}
