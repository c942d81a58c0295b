//! Bounded page channel.
//!
//! Two `ArrayQueue`s shared by both ends: the inbox carries filled pages to
//! the receiver, the return queue carries consumed pages back to the sender.

use alloc::sync::Arc;

use crossbeam_queue::ArrayQueue;

use crate::error::{ChannelError, Result};
use crate::page::Page;
use crate::sched::Scheduler;

struct Shared {
    inbox: ArrayQueue<Page>,
    returns: ArrayQueue<Page>,
}

/// Create a channel holding at most `depth` pages in each direction.
pub fn channel(depth: usize) -> Result<(Sender, Receiver)> {
    if depth == 0 {
        return Err(ChannelError::ZeroDepth);
    }
    let shared = Arc::new(Shared {
        inbox: ArrayQueue::new(depth),
        returns: ArrayQueue::new(depth),
    });
    Ok((
        Sender { shared: Arc::clone(&shared) },
        Receiver { shared },
    ))
}

/// Producing end of a page channel.
pub struct Sender {
    shared: Arc<Shared>,
}

impl Sender {
    /// Hand a filled page to the receiver.
    ///
    /// One-shot: the page is queued or handed straight back.
    pub fn send(&self, page: Page) -> core::result::Result<(), Page> {
        self.shared.inbox.push(page)
    }

    /// Take back a page the receiver has finished with.
    pub fn reclaim(&self) -> Option<Page> {
        self.shared.returns.pop()
    }

    /// Pull the oldest message back out before the receiver has read it.
    ///
    /// The message is lost; the caller owns its page again.
    pub fn reclaim_unread(&self) -> Option<Page> {
        let page = self.shared.inbox.pop()?;
        log::trace!("channel: reclaimed unread page {} ({} bytes lost)", page.id(), page.len());
        Some(page)
    }

    /// Messages sent but not yet received.
    pub fn unread(&self) -> usize {
        self.shared.inbox.len()
    }

    pub fn depth(&self) -> usize {
        self.shared.inbox.capacity()
    }
}

/// Consuming end of a page channel.
pub struct Receiver {
    shared: Arc<Shared>,
}

impl Receiver {
    /// Take the next message if one is queued.
    pub fn try_recv(&self) -> Option<Page> {
        self.shared.inbox.pop()
    }

    /// Wait until a message arrives, yielding between checks.
    pub fn recv<S: Scheduler>(&self, sched: &S) -> Page {
        loop {
            if let Some(page) = self.shared.inbox.pop() {
                return page;
            }
            sched.yield_now();
        }
    }

    /// Give a consumed page back to the sender.
    pub fn release(&self, page: Page) -> core::result::Result<(), Page> {
        self.shared.returns.push(page)
    }

    /// Messages waiting to be received.
    pub fn pending(&self) -> usize {
        self.shared.inbox.len()
    }
}
