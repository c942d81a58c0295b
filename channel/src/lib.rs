//! Page Channel
//!
//! Zero-copy, page-granularity message passing between the packet relays
//! and the network stack process.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   send(Page)    ┌──────────────┐
//! │    Sender    │ ──────────────> │   Receiver   │
//! │ (producer)   │                 │ (consumer)   │
//! │              │ <────────────── │              │
//! └──────────────┘  release(Page)  └──────────────┘
//!        both ends share one bounded inbox + one bounded return queue
//! ```
//!
//! A [`Page`] is an owning handle. Moving it into the channel hands the page
//! to the receiver; the receiver hands it back with [`Receiver::release`]
//! once it has finished reading. Nobody can write into a page they do not
//! hold, so reuse of an unread page only happens through
//! [`Sender::reclaim_unread`], which pulls the oldest message back out.
//!
//! # Usage
//!
//! ```ignore
//! use pktio_channel::{channel, Page};
//!
//! let (tx, rx) = channel(16)?;
//! let mut page = Page::new(0);
//! page.write_message(b"frame bytes")?;
//! tx.send(page).map_err(|_| "inbox full")?;
//!
//! let page = rx.try_recv().unwrap();
//! assert_eq!(page.message(), Some(&b"frame bytes"[..]));
//! rx.release(page).ok();
//! ```

#![cfg_attr(not(test), no_std)]

extern crate alloc;

mod error;
mod page;
mod queue;
mod sched;

pub use error::{ChannelError, Result};
pub use page::{Page, PageId, LEN_FIELD_SIZE, PAGE_SIZE, PAYLOAD_CAPACITY};
pub use queue::{channel, Receiver, Sender};
pub use sched::{Scheduler, SpinScheduler};
