//! Relay counters.

/// Per-relay event counts since construction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RelayStats {
    /// Frames moved from the NIC into the channel.
    pub delivered: u64,
    /// Frames handed to the NIC for transmission.
    pub sent: u64,
    /// Attempts that hit `BufFull` and were retried.
    pub retries: u64,
    /// Unread messages pulled back and overwritten.
    pub overruns: u64,
    /// Frames discarded as unsendable.
    pub dropped: u64,
}
