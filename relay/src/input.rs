//! Input relay: NIC receive ring → stack.
//!
//! # Page cache
//! ```text
//!   cache (home pages)        channel inbox            stack
//!   [p3 p4 .. p15] ──fill──> [p0 p1 p2] ──recv──> ... ──release──┐
//!        ▲                                                        │
//!        └──────────────────── reclaim ◄──────────────────────────┘
//! ```
//!
//! Every page is owned by exactly one side. When all pages are out and a
//! frame is waiting, [`OverrunPolicy`] decides whether the oldest unread
//! message is pulled back and overwritten or the frame waits in the NIC.

use alloc::collections::VecDeque;
use core::convert::Infallible;

use log::{error, info, trace, warn};
use pktio_channel::{Page, PageId, Scheduler, Sender, PAYLOAD_CAPACITY};
use pktio_network::{PacketError, PacketIo};

use crate::error::{RelayError, Result};
use crate::frame::log_frame;
use crate::retry::{Backoff, RetryPolicy};
use crate::stats::RelayStats;

/// Pages in the rotating cache.
pub const DEFAULT_CACHE_DEPTH: usize = 16;

/// What to do when a frame is waiting and every page is with the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverrunPolicy {
    /// Pull the oldest unread message back and reuse its page.
    #[default]
    Overwrite,
    /// Leave the frame in the NIC ring until the stack releases a page.
    Backpressure,
}

/// Input relay configuration.
#[derive(Debug, Clone)]
pub struct InputRelayConfig {
    /// Number of cache pages.
    pub cache_depth: usize,
    /// Behaviour when the stack falls `cache_depth` messages behind.
    pub overrun: OverrunPolicy,
    /// Wait between polls that found nothing to do.
    pub idle: RetryPolicy,
}

impl Default for InputRelayConfig {
    fn default() -> Self {
        Self {
            cache_depth: DEFAULT_CACHE_DEPTH,
            overrun: OverrunPolicy::Overwrite,
            idle: RetryPolicy::Spin,
        }
    }
}

impl InputRelayConfig {
    pub fn with_cache_depth(mut self, depth: usize) -> Self {
        self.cache_depth = depth;
        self
    }

    pub fn with_overrun_policy(mut self, policy: OverrunPolicy) -> Self {
        self.overrun = policy;
        self
    }

    pub fn with_idle_policy(mut self, policy: RetryPolicy) -> Self {
        self.idle = policy;
        self
    }
}

/// Outcome of one [`InputRelay::poll`] step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputStatus {
    /// A frame of `len` bytes went to the stack in page `page`.
    Delivered { len: usize, page: PageId },
    /// No frame waiting.
    Idle,
    /// A frame is waiting but no page is free (backpressure).
    Stalled,
}

/// Moves received frames from the driver into the stack's channel.
pub struct InputRelay<D: PacketIo> {
    nic: D,
    tx: Sender,
    /// Pages currently owned by the relay, next to fill at the front.
    cache: VecDeque<Page>,
    config: InputRelayConfig,
    backoff: Backoff,
    stats: RelayStats,
}

impl<D: PacketIo> InputRelay<D> {
    /// Allocate the page cache, with page ids starting at 0.
    pub fn new(nic: D, tx: Sender, config: InputRelayConfig) -> Result<Self> {
        if config.cache_depth == 0 {
            return Err(RelayError::InvalidConfig("cache depth must be non-zero"));
        }
        if config.cache_depth > PageId::MAX as usize + 1 {
            return Err(RelayError::InvalidConfig("cache depth exceeds page id range"));
        }
        if config.cache_depth > tx.depth() {
            return Err(RelayError::InvalidConfig("cache depth exceeds channel depth"));
        }

        let cache = (0..config.cache_depth).map(|id| Page::new(id as PageId)).collect();
        info!(
            "input relay: {} cache pages, {:?} on overrun",
            config.cache_depth, config.overrun
        );

        Ok(Self {
            nic,
            tx,
            cache,
            backoff: Backoff::new(config.idle),
            config,
            stats: RelayStats::default(),
        })
    }

    /// Move at most one frame from the NIC to the stack.
    pub fn poll(&mut self) -> Result<InputStatus> {
        while let Some(page) = self.tx.reclaim() {
            self.cache.push_back(page);
        }

        let mut page = match self.cache.pop_front() {
            Some(page) => page,
            None => match self.take_overrun_page() {
                Some(page) => page,
                None if self.nic.rx_pending() => return Ok(InputStatus::Stalled),
                None => return Ok(InputStatus::Idle),
            },
        };

        let len = match self.nic.packet_receive(page.payload_mut()) {
            Ok(len) => len,
            Err(PacketError::BufEmpty) => {
                self.cache.push_front(page);
                return Ok(InputStatus::Idle);
            }
            Err(PacketError::InvalidArgument) => {
                self.cache.push_front(page);
                error!("input relay: received frame exceeds {}-byte page", PAYLOAD_CAPACITY);
                return Err(RelayError::FrameTooLarge {
                    capacity: PAYLOAD_CAPACITY,
                });
            }
            Err(e) => {
                self.cache.push_front(page);
                return Err(RelayError::Driver(e));
            }
        };

        if let Err(e) = page.set_len(len as u32) {
            self.cache.push_front(page);
            return Err(e.into());
        }
        if let Some(message) = page.message() {
            log_frame("input relay", message);
        }

        let id = page.id();
        if let Err(page) = self.tx.send(page) {
            self.cache.push_front(page);
            return Err(RelayError::ChannelFull);
        }

        self.stats.delivered += 1;
        Ok(InputStatus::Delivered { len, page: id })
    }

    /// With every page out, pick the page to fill under the overrun policy.
    fn take_overrun_page(&mut self) -> Option<Page> {
        if !self.nic.rx_pending() {
            return None;
        }
        match self.config.overrun {
            OverrunPolicy::Backpressure => None,
            OverrunPolicy::Overwrite => {
                let page = self.tx.reclaim_unread()?;
                self.stats.overruns += 1;
                warn!("input relay: stack overrun, overwriting page {}", page.id());
                Some(page)
            }
        }
    }

    /// Poll forever, yielding after every delivered message.
    ///
    /// Returns only on a fatal error.
    pub fn run<S: Scheduler>(&mut self, sched: &S) -> Result<Infallible> {
        loop {
            match self.poll()? {
                InputStatus::Delivered { .. } => {
                    self.backoff.reset();
                    sched.yield_now();
                }
                InputStatus::Idle | InputStatus::Stalled => {
                    trace!("input relay: nothing to deliver");
                    self.backoff.wait(sched);
                }
            }
        }
    }

    pub fn stats(&self) -> RelayStats {
        self.stats
    }

    /// Pages currently held by the relay.
    pub fn cached_pages(&self) -> usize {
        self.cache.len()
    }

    pub fn config(&self) -> &InputRelayConfig {
        &self.config
    }
}
