//! Retry policy for transient driver results.
//!
//! The driver never retries on its own. A relay that sees `BufFull` or
//! `BufEmpty` hands the wait to a [`Backoff`] built from its configured
//! [`RetryPolicy`].

use pktio_channel::Scheduler;

/// How to wait before the next attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryPolicy {
    /// Busy spin; never gives up the processor.
    #[default]
    Spin,
    /// Yield to the scheduler on every wait.
    Yield,
    /// Spin 1, 2, 4, ... times; once a wait would exceed `max_spins`,
    /// yield instead.
    Exponential { max_spins: u32 },
}

/// Wait state for one run of consecutive failed attempts.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: RetryPolicy,
    attempts: u32,
}

impl Backoff {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy, attempts: 0 }
    }

    /// Wait once according to the policy.
    pub fn wait<S: Scheduler + ?Sized>(&mut self, sched: &S) {
        self.attempts = self.attempts.saturating_add(1);
        match self.policy {
            RetryPolicy::Spin => core::hint::spin_loop(),
            RetryPolicy::Yield => sched.yield_now(),
            RetryPolicy::Exponential { max_spins } => {
                let spins = 1u32.checked_shl(self.attempts - 1).unwrap_or(u32::MAX);
                if spins > max_spins {
                    sched.yield_now();
                } else {
                    for _ in 0..spins {
                        core::hint::spin_loop();
                    }
                }
            }
        }
    }

    /// Start over after a successful attempt.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Waits since the last reset.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    #[derive(Default)]
    struct CountingScheduler {
        yields: Cell<usize>,
    }

    impl Scheduler for CountingScheduler {
        fn yield_now(&self) {
            self.yields.set(self.yields.get() + 1);
        }
    }

    #[test]
    fn test_spin_never_yields() {
        let sched = CountingScheduler::default();
        let mut backoff = Backoff::new(RetryPolicy::Spin);
        for _ in 0..100 {
            backoff.wait(&sched);
        }
        assert_eq!(sched.yields.get(), 0);
        assert_eq!(backoff.attempts(), 100);
    }

    #[test]
    fn test_yield_every_wait() {
        let sched = CountingScheduler::default();
        let mut backoff = Backoff::new(RetryPolicy::Yield);
        backoff.wait(&sched);
        backoff.wait(&sched);
        assert_eq!(sched.yields.get(), 2);
    }

    #[test]
    fn test_exponential_yields_past_limit() {
        let sched = CountingScheduler::default();
        let mut backoff = Backoff::new(RetryPolicy::Exponential { max_spins: 4 });

        // 1, 2, 4 spins
        for _ in 0..3 {
            backoff.wait(&sched);
        }
        assert_eq!(sched.yields.get(), 0);

        backoff.wait(&sched);
        assert_eq!(sched.yields.get(), 1);

        backoff.reset();
        backoff.wait(&sched);
        assert_eq!(sched.yields.get(), 1);
        assert_eq!(backoff.attempts(), 1);
    }

    #[test]
    fn test_exponential_saturates() {
        let sched = CountingScheduler::default();
        let mut backoff = Backoff::new(RetryPolicy::Exponential { max_spins: 0 });
        for _ in 0..40 {
            backoff.wait(&sched);
        }
        assert_eq!(sched.yields.get(), 40);
    }
}
