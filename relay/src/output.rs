//! Output relay: stack → NIC transmit ring.

use core::convert::Infallible;

use log::{error, info, trace};
use pktio_channel::{Page, Receiver, Scheduler};
use pktio_network::{PacketError, PacketIo};

use crate::error::{RelayError, Result};
use crate::frame::log_frame;
use crate::retry::{Backoff, RetryPolicy};
use crate::stats::RelayStats;

/// Output relay configuration.
#[derive(Debug, Clone, Default)]
pub struct OutputRelayConfig {
    /// Wait between attempts while the transmit ring is full.
    pub full: RetryPolicy,
}

impl OutputRelayConfig {
    pub fn with_full_policy(mut self, policy: RetryPolicy) -> Self {
        self.full = policy;
        self
    }
}

/// Outcome of one [`OutputRelay::poll`] step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStatus {
    /// Frame queued on the NIC.
    Sent(usize),
    /// Transmit ring full; the relay keeps the page for the next attempt.
    Saturated,
    /// Frame could not be sent and was discarded.
    Dropped { len: usize },
    /// No message waiting.
    Idle,
}

/// Moves outbound messages from the stack onto the NIC.
pub struct OutputRelay<D: PacketIo> {
    nic: D,
    rx: Receiver,
    /// Message whose send hit a full ring.
    pending: Option<Page>,
    config: OutputRelayConfig,
    backoff: Backoff,
    stats: RelayStats,
}

impl<D: PacketIo> OutputRelay<D> {
    pub fn new(nic: D, rx: Receiver, config: OutputRelayConfig) -> Self {
        info!("output relay: {:?} while transmit ring is full", config.full);
        Self {
            nic,
            rx,
            pending: None,
            backoff: Backoff::new(config.full),
            config,
            stats: RelayStats::default(),
        }
    }

    /// Make one send attempt without blocking.
    ///
    /// A message left over from a `Saturated` attempt goes first.
    pub fn poll(&mut self) -> Result<OutputStatus> {
        let page = match self.pending.take() {
            Some(page) => page,
            None => match self.rx.try_recv() {
                Some(page) => page,
                None => return Ok(OutputStatus::Idle),
            },
        };
        self.transmit(page)
    }

    /// Send forever, blocking while the stack has nothing to send.
    ///
    /// Returns only on a fatal error.
    pub fn run<S: Scheduler>(&mut self, sched: &S) -> Result<Infallible> {
        loop {
            let page = match self.pending.take() {
                Some(page) => page,
                None => self.rx.recv(sched),
            };
            match self.transmit(page)? {
                OutputStatus::Saturated => self.backoff.wait(sched),
                _ => self.backoff.reset(),
            }
        }
    }

    fn transmit(&mut self, page: Page) -> Result<OutputStatus> {
        let len = page.len() as usize;
        let result = match page.message() {
            Some(frame) => {
                let result = self.nic.packet_send(frame);
                if result.is_ok() {
                    log_frame("output relay", frame);
                }
                result
            }
            // Header claims more than a page holds
            None => Err(PacketError::InvalidArgument),
        };

        match result {
            Ok(sent) => {
                self.stats.sent += 1;
                self.release(page)?;
                Ok(OutputStatus::Sent(sent))
            }
            Err(PacketError::BufFull) => {
                trace!("output relay: transmit ring full, retrying page {}", page.id());
                self.stats.retries += 1;
                self.pending = Some(page);
                Ok(OutputStatus::Saturated)
            }
            Err(PacketError::InvalidArgument) => {
                error!("output relay: dropping unsendable {}-byte frame", len);
                self.stats.dropped += 1;
                self.release(page)?;
                Ok(OutputStatus::Dropped { len })
            }
            Err(e) => {
                self.pending = Some(page);
                Err(RelayError::Driver(e))
            }
        }
    }

    fn release(&self, page: Page) -> Result<()> {
        self.rx.release(page).map_err(|_| RelayError::ChannelFull)
    }

    pub fn stats(&self) -> RelayStats {
        self.stats
    }

    /// Whether a message is held for retry.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn config(&self) -> &OutputRelayConfig {
        &self.config
    }
}
