//! Memory barriers for descriptor hand-off.
//!
//! The device observes descriptor memory and doorbell writes independently,
//! so ordering between them has to be explicit.

use core::sync::atomic::{fence, Ordering};

/// Make descriptor and buffer writes visible before a doorbell write.
#[inline]
pub fn wmb() {
    fence(Ordering::Release);
}

/// Order buffer reads after the DD-bit read that made them valid.
#[inline]
pub fn rmb() {
    fence(Ordering::Acquire);
}
