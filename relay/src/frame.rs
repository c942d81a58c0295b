//! Per-frame debug logging.

use log::{debug, log_enabled, Level};
use smoltcp::wire::EthernetFrame;

/// Log an Ethernet frame's addresses and ethertype at debug level.
pub(crate) fn log_frame(direction: &str, bytes: &[u8]) {
    if !log_enabled!(Level::Debug) {
        return;
    }
    match EthernetFrame::new_checked(bytes) {
        Ok(frame) => debug!(
            "{}: {} bytes {} -> {} ({})",
            direction,
            bytes.len(),
            frame.src_addr(),
            frame.dst_addr(),
            frame.ethertype()
        ),
        Err(_) => debug!("{}: {} bytes (runt)", direction, bytes.len()),
    }
}
