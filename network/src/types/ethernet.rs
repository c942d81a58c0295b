//! Ethernet frame constants.
//!
//! # Reference
//! IEEE 802.3

pub const ETH_ALEN: usize = 6;
pub const ETH_HLEN: usize = 14;
pub const ETH_MTU: usize = 1500;

/// Largest frame the driver queues: header + MTU + FCS.
pub const ETH_FRAME_MAX: usize = 1518;

/// MAC address type.
pub type MacAddress = [u8; ETH_ALEN];

/// Render a MAC address as `aa:bb:cc:dd:ee:ff`.
pub struct MacDisplay<'a>(pub &'a MacAddress);

impl core::fmt::Display for MacDisplay<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let m = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            m[0], m[1], m[2], m[3], m[4], m[5]
        )
    }
}
