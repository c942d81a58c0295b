//! Wiring for one NIC, two relays and the stack port.

use log::info;
use pktio_channel::{channel, PageId};
use pktio_network::PacketIo;

use crate::error::{RelayError, Result};
use crate::input::{InputRelay, InputRelayConfig};
use crate::output::{OutputRelay, OutputRelayConfig};
use crate::stack::StackPort;

/// Default number of outbound pages held by the stack.
pub const DEFAULT_STACK_PAGES: usize = 16;

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input: InputRelayConfig,
    pub output: OutputRelayConfig,
    /// Outbound pages owned by the stack port.
    pub stack_pages: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: InputRelayConfig::default(),
            output: OutputRelayConfig::default(),
            stack_pages: DEFAULT_STACK_PAGES,
        }
    }
}

/// Everything between the driver handle and the stack.
///
/// Each part is meant to run in its own process; move them out of the
/// struct and hand them to the scheduler.
pub struct Pipeline<D: PacketIo> {
    pub input: InputRelay<D>,
    pub output: OutputRelay<D>,
    pub stack: StackPort,
}

impl<D: PacketIo + Clone> Pipeline<D> {
    /// Build both channels and both relays around one driver handle.
    ///
    /// Input pages are numbered from 0, stack pages follow them.
    pub fn new(nic: D, config: PipelineConfig) -> Result<Self> {
        if config.input.cache_depth > PageId::MAX as usize
            || config.stack_pages > PageId::MAX as usize - config.input.cache_depth
        {
            return Err(RelayError::InvalidConfig("too many pages"));
        }

        let (in_tx, in_rx) = channel(config.input.cache_depth)?;
        let (out_tx, out_rx) = channel(config.stack_pages)?;

        let stack = StackPort::new(in_rx, out_tx, config.stack_pages, config.input.cache_depth as PageId)?;
        let input = InputRelay::new(nic.clone(), in_tx, config.input)?;
        let output = OutputRelay::new(nic, out_rx, config.output);

        info!("pipeline: relays and stack port ready");
        Ok(Self { input, output, stack })
    }

    pub fn into_parts(self) -> (InputRelay<D>, OutputRelay<D>, StackPort) {
        (self.input, self.output, self.stack)
    }
}
