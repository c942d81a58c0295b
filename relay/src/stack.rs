//! Stack side of the pipeline.
//!
//! [`StackPort`] is what the network stack process holds: the receiving end
//! of the input relay's channel, the sending end of the output relay's
//! channel, and a small pool of outbound pages. It implements smoltcp's
//! [`Device`] so an `Interface` can be polled directly on top of it.

use alloc::collections::VecDeque;
use alloc::vec;

use log::warn;
use pktio_channel::{Page, PageId, Receiver, Sender, PAYLOAD_CAPACITY};
use pktio_network::types::{ETH_HLEN, ETH_MTU};
use smoltcp::phy::{Device, DeviceCapabilities, Medium, RxToken, TxToken};
use smoltcp::time::Instant;

use crate::error::{RelayError, Result};

/// MTU reported to smoltcp. For `Medium::Ethernet` this counts the
/// Ethernet header; the NIC appends the FCS.
const MTU: usize = ETH_HLEN + ETH_MTU;

/// Outbound half: page pool plus the channel to the output relay.
struct Outbound {
    tx: Sender,
    free: VecDeque<Page>,
    dropped: u64,
}

impl Outbound {
    fn reclaim(&mut self) {
        while let Some(page) = self.tx.reclaim() {
            self.free.push_back(page);
        }
    }

    /// Take a free page for a `len`-byte frame.
    fn take_page(&mut self, len: usize) -> Result<Page> {
        if len > PAYLOAD_CAPACITY {
            return Err(RelayError::FrameTooLarge {
                capacity: PAYLOAD_CAPACITY,
            });
        }
        self.reclaim();
        self.free.pop_front().ok_or(RelayError::ChannelFull)
    }

    /// Stamp the length and hand the page to the output relay.
    fn submit(&mut self, mut page: Page, len: usize) -> Result<()> {
        page.set_len(len as u32)?;
        self.tx.send(page).map_err(|page| {
            self.free.push_front(page);
            RelayError::ChannelFull
        })
    }
}

/// The network stack's end of both relay channels.
pub struct StackPort {
    inbound: Receiver,
    outbound: Outbound,
}

impl StackPort {
    /// Allocate `pages` outbound pages with ids starting at `first_id`.
    pub fn new(inbound: Receiver, outbound: Sender, pages: usize, first_id: PageId) -> Result<Self> {
        if pages == 0 {
            return Err(RelayError::InvalidConfig("stack needs at least one outbound page"));
        }
        if pages > outbound.depth() {
            return Err(RelayError::InvalidConfig("stack pages exceed channel depth"));
        }
        let free = (0..pages)
            .map(|i| Page::new(first_id.wrapping_add(i as PageId)))
            .collect();
        Ok(Self {
            inbound,
            outbound: Outbound {
                tx: outbound,
                free,
                dropped: 0,
            },
        })
    }

    /// Consume the next inbound frame, if any, and release its page.
    pub fn receive_frame<R>(&mut self, f: impl FnOnce(&[u8]) -> R) -> Option<R> {
        let page = self.inbound.try_recv()?;
        let result = f(page.message().unwrap_or(&[]));
        release_inbound(&self.inbound, page);
        Some(result)
    }

    /// Fill a `len`-byte outbound frame in place and queue it.
    pub fn transmit_frame<R>(&mut self, len: usize, f: impl FnOnce(&mut [u8]) -> R) -> Result<R> {
        let mut page = self.outbound.take_page(len)?;
        let result = f(&mut page.payload_mut()[..len]);
        self.outbound.submit(page, len)?;
        Ok(result)
    }

    /// Inbound messages waiting.
    pub fn pending(&self) -> usize {
        self.inbound.pending()
    }

    /// Whether an outbound page is available.
    pub fn can_transmit(&mut self) -> bool {
        self.outbound.reclaim();
        !self.outbound.free.is_empty()
    }

    /// Outbound pages not currently with the output relay.
    pub fn free_pages(&mut self) -> usize {
        self.outbound.reclaim();
        self.outbound.free.len()
    }

    /// smoltcp frames discarded for lack of an outbound page.
    pub fn tx_dropped(&self) -> u64 {
        self.outbound.dropped
    }
}

fn release_inbound(inbound: &Receiver, page: Page) {
    if let Err(page) = inbound.release(page) {
        warn!("stack: return queue full, page {} lost", page.id());
    }
}

impl Device for StackPort {
    type RxToken<'a> = PortRxToken<'a>;
    type TxToken<'a> = PortTxToken<'a>;

    fn capabilities(&self) -> DeviceCapabilities {
        let mut caps = DeviceCapabilities::default();
        caps.max_transmission_unit = MTU;
        caps.medium = Medium::Ethernet;
        caps
    }

    fn receive(&mut self, _timestamp: Instant) -> Option<(Self::RxToken<'_>, Self::TxToken<'_>)> {
        let page = self.inbound.try_recv()?;
        Some((
            PortRxToken {
                page: Some(page),
                inbound: &self.inbound,
            },
            PortTxToken {
                outbound: &mut self.outbound,
            },
        ))
    }

    fn transmit(&mut self, _timestamp: Instant) -> Option<Self::TxToken<'_>> {
        self.outbound.reclaim();
        if self.outbound.free.is_empty() {
            return None;
        }
        Some(PortTxToken {
            outbound: &mut self.outbound,
        })
    }
}

/// A received message, released back to the input relay once consumed
/// or dropped.
pub struct PortRxToken<'a> {
    page: Option<Page>,
    inbound: &'a Receiver,
}

impl RxToken for PortRxToken<'_> {
    fn consume<R, F>(mut self, f: F) -> R
    where
        F: FnOnce(&mut [u8]) -> R,
    {
        let Some(mut page) = self.page.take() else {
            return f(&mut []);
        };
        let len = (page.len() as usize).min(PAYLOAD_CAPACITY);
        let result = f(&mut page.payload_mut()[..len]);
        release_inbound(self.inbound, page);
        result
    }
}

impl Drop for PortRxToken<'_> {
    fn drop(&mut self) {
        // smoltcp discards the rx token when the paired tx token is refused
        if let Some(page) = self.page.take() {
            release_inbound(self.inbound, page);
        }
    }
}

/// Permission to build one outbound frame.
pub struct PortTxToken<'a> {
    outbound: &'a mut Outbound,
}

impl TxToken for PortTxToken<'_> {
    fn consume<R, F>(self, len: usize, f: F) -> R
    where
        F: FnOnce(&mut [u8]) -> R,
    {
        let mut page = match self.outbound.take_page(len) {
            Ok(page) => page,
            Err(e) => {
                // smoltcp still needs the closure's result
                warn!("stack: dropping {}-byte frame: {}", len, e);
                self.outbound.dropped += 1;
                let mut scratch = vec![0u8; len];
                return f(&mut scratch);
            }
        };

        let result = f(&mut page.payload_mut()[..len]);
        if let Err(e) = self.outbound.submit(page, len) {
            warn!("stack: dropping {}-byte frame: {}", len, e);
            self.outbound.dropped += 1;
        }
        result
    }
}
