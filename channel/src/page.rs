//! Page-backed message envelope.
//!
//! # Layout
//! ```text
//! Offset      Size        Content
//! 0x000       0x004       Message length (u32, native endian)
//! 0x004       0xFFC       Payload
//! ```

use alloc::boxed::Box;

use crate::error::{ChannelError, Result};

/// Page size (4KB).
pub const PAGE_SIZE: usize = 4096;

/// Size of the length header at the start of every page.
pub const LEN_FIELD_SIZE: usize = core::mem::size_of::<u32>();

/// Bytes available for a message payload.
pub const PAYLOAD_CAPACITY: usize = PAGE_SIZE - LEN_FIELD_SIZE;

/// Stable identity of a page within its owner's cache.
pub type PageId = u16;

#[repr(C, align(4096))]
struct PageFrame {
    bytes: [u8; PAGE_SIZE],
}

/// One page of message memory.
///
/// Owning a `Page` is owning the right to write it. Handing it to a
/// [`Sender`](crate::Sender) moves that right to the receiving side.
pub struct Page {
    frame: Box<PageFrame>,
    id: PageId,
}

impl Page {
    /// Allocate a zeroed page.
    pub fn new(id: PageId) -> Self {
        Self {
            frame: Box::new(PageFrame { bytes: [0u8; PAGE_SIZE] }),
            id,
        }
    }

    pub fn id(&self) -> PageId {
        self.id
    }

    /// Length stamped in the header.
    ///
    /// Whoever filled the page wrote this value; it is not checked against
    /// the payload capacity until [`Page::message`] is called.
    pub fn len(&self) -> u32 {
        let mut raw = [0u8; LEN_FIELD_SIZE];
        raw.copy_from_slice(&self.frame.bytes[..LEN_FIELD_SIZE]);
        u32::from_ne_bytes(raw)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stamp the length header.
    pub fn set_len(&mut self, len: u32) -> Result<()> {
        if len as usize > PAYLOAD_CAPACITY {
            return Err(ChannelError::MessageTooLong {
                len: len as usize,
                capacity: PAYLOAD_CAPACITY,
            });
        }
        self.frame.bytes[..LEN_FIELD_SIZE].copy_from_slice(&len.to_ne_bytes());
        Ok(())
    }

    /// Whole payload area, regardless of the stamped length.
    pub fn payload(&self) -> &[u8] {
        &self.frame.bytes[LEN_FIELD_SIZE..]
    }

    /// Whole payload area for filling in place.
    pub fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.frame.bytes[LEN_FIELD_SIZE..]
    }

    /// The message: the first `len()` payload bytes.
    ///
    /// Returns `None` if the header claims more than a page can hold.
    pub fn message(&self) -> Option<&[u8]> {
        self.payload().get(..self.len() as usize)
    }

    /// Copy `data` into the payload and stamp its length.
    pub fn write_message(&mut self, data: &[u8]) -> Result<()> {
        if data.len() > PAYLOAD_CAPACITY {
            return Err(ChannelError::MessageTooLong {
                len: data.len(),
                capacity: PAYLOAD_CAPACITY,
            });
        }
        self.payload_mut()[..data.len()].copy_from_slice(data);
        self.set_len(data.len() as u32)
    }

    /// Raw page bytes, header included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.frame.bytes
    }
}

impl core::fmt::Debug for Page {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Page")
            .field("id", &self.id)
            .field("len", &self.len())
            .finish()
    }
}
