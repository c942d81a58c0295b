//! Packet Relays
//!
//! The two processes that sit between the e1000 driver and the network
//! stack, plus the stack's own end of their channels.
//!
//! # Data Flow
//!
//! ```text
//!            packet_receive()                 Page
//!   NIC ─────────────────────> InputRelay ──────────> StackPort
//!    ▲                                                    │
//!    │       packet_send()                    Page        │
//!    └─────────────────────── OutputRelay <───────────────┘
//! ```
//!
//! Both relays expose `poll()` for a single non-blocking step and `run()`
//! for the process body. Waits on transient driver results follow a
//! [`RetryPolicy`].
//!
//! # Usage
//!
//! ```ignore
//! let nic = NicHandle::new(E1000::attach(mmio, &mapper, E1000Config::default())?);
//! let (mut input, mut output, stack) =
//!     Pipeline::new(nic, PipelineConfig::default())?.into_parts();
//!
//! spawn(move || input.run(&sched));
//! spawn(move || output.run(&sched));
//! ```

#![cfg_attr(not(test), no_std)]

extern crate alloc;

mod error;
mod frame;
pub mod input;
pub mod output;
pub mod pipeline;
pub mod retry;
pub mod stack;
pub mod stats;

#[cfg(test)]
mod tests;

pub use error::{RelayError, Result};
pub use input::{InputRelay, InputRelayConfig, InputStatus, OverrunPolicy};
pub use output::{OutputRelay, OutputRelayConfig, OutputStatus};
pub use pipeline::{Pipeline, PipelineConfig};
pub use retry::{Backoff, RetryPolicy};
pub use stack::StackPort;
pub use stats::RelayStats;
