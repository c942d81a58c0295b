//! Cooperative scheduler seam.
//!
//! The scheduler itself lives outside this workspace. Everything here that
//! may give up the processor does so through this trait.

/// The cooperative scheduler's yield primitive.
pub trait Scheduler {
    /// Give up the processor to any other runnable process.
    fn yield_now(&self);
}

impl<S: Scheduler + ?Sized> Scheduler for &S {
    fn yield_now(&self) {
        (**self).yield_now()
    }
}

/// Scheduler stand-in for contexts with nobody to yield to.
///
/// Yielding degenerates to a CPU spin hint.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpinScheduler;

impl Scheduler for SpinScheduler {
    #[inline]
    fn yield_now(&self) {
        core::hint::spin_loop();
    }
}
