//! End-to-end tests: simulated NIC, both relays, stack port.

use alloc::collections::VecDeque;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use pktio_channel::{channel, Page, Scheduler, SpinScheduler, PAYLOAD_CAPACITY};
use pktio_network::dma::IdentityMapper;
use pktio_network::sim::SimNic;
use pktio_network::{E1000Config, NicHandle, PacketError, PacketIo, E1000};
use smoltcp::phy::{Device, Medium, RxToken, TxToken};
use smoltcp::time::Instant;

use super::*;

type SimHandle = NicHandle<Arc<SimNic>>;

fn sim_nic() -> (Arc<SimNic>, SimHandle) {
    let sim = SimNic::new();
    let driver = E1000::attach(Arc::clone(&sim), &IdentityMapper, E1000Config::default()).unwrap();
    (sim, NicHandle::new(driver))
}

fn pipeline(config: PipelineConfig) -> (Arc<SimNic>, SimHandle, Pipeline<SimHandle>) {
    let (sim, nic) = sim_nic();
    let pipeline = Pipeline::new(nic.clone(), config).unwrap();
    (sim, nic, pipeline)
}

/// Broadcast IPv4 frame whose payload bytes encode `seq`.
fn eth_frame(len: usize, seq: u8) -> Vec<u8> {
    let mut frame = Vec::with_capacity(len);
    frame.extend_from_slice(&[0xFF; 6]);
    frame.extend_from_slice(&[0x52, 0x54, 0x00, 0x12, 0x34, 0x57]);
    frame.extend_from_slice(&[0x08, 0x00]);
    while frame.len() < len {
        frame.push(seq.wrapping_add(frame.len() as u8));
    }
    frame
}

// ═══════════════════════════════════════════════════════════════════════════
// INPUT RELAY
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_input_delivers_in_ring_order() {
    let (sim, _nic, mut p) = pipeline(PipelineConfig::default());
    let frames: Vec<_> = (0..3).map(|i| eth_frame(60 + i * 10, i as u8)).collect();
    for f in &frames {
        sim.inject(f).unwrap();
    }

    for (i, f) in frames.iter().enumerate() {
        assert_eq!(
            p.input.poll(),
            Ok(InputStatus::Delivered { len: f.len(), page: i as u16 })
        );
    }
    assert_eq!(p.input.poll(), Ok(InputStatus::Idle));

    for f in &frames {
        assert_eq!(p.stack.receive_frame(|m| m.to_vec()).as_ref(), Some(f));
    }
    assert!(p.stack.receive_frame(|m| m.len()).is_none());
    assert_eq!(p.input.stats().delivered, 3);
}

#[test]
fn test_input_idle_keeps_cache() {
    let (_sim, _nic, mut p) = pipeline(PipelineConfig::default());
    assert_eq!(p.input.poll(), Ok(InputStatus::Idle));
    assert_eq!(p.input.cached_pages(), 16);
}

#[test]
fn test_released_pages_return_to_cache() {
    let (sim, _nic, mut p) = pipeline(PipelineConfig::default());

    for i in 0..40u8 {
        sim.inject(&eth_frame(64, i)).unwrap();
        assert!(matches!(p.input.poll(), Ok(InputStatus::Delivered { .. })));
        assert_eq!(p.stack.receive_frame(|m| m[14]), Some(i.wrapping_add(14)));
    }
    assert_eq!(p.input.stats().overruns, 0);
    assert_eq!(p.input.cached_pages(), 15);
}

#[test]
fn test_overwrite_reuses_oldest_page() {
    let (sim, _nic, mut p) = pipeline(PipelineConfig::default());
    let frames: Vec<_> = (0..17).map(|i| eth_frame(100, i as u8)).collect();
    for f in &frames {
        sim.inject(f).unwrap();
    }

    for i in 0..16u16 {
        assert_eq!(
            p.input.poll(),
            Ok(InputStatus::Delivered { len: 100, page: i })
        );
    }
    // 17th frame lands in the page that carried the 1st
    assert_eq!(
        p.input.poll(),
        Ok(InputStatus::Delivered { len: 100, page: 0 })
    );
    assert_eq!(p.input.stats().overruns, 1);

    // First frame was lost; the rest arrive in order
    let received: Vec<_> = core::iter::from_fn(|| p.stack.receive_frame(|m| m.to_vec())).collect();
    assert_eq!(received.len(), 16);
    assert_eq!(received[0], frames[1]);
    assert_eq!(received[15], frames[16]);
}

#[test]
fn test_backpressure_leaves_frame_in_ring() {
    let config = PipelineConfig {
        input: InputRelayConfig::default().with_overrun_policy(OverrunPolicy::Backpressure),
        ..Default::default()
    };
    let (sim, nic, mut p) = pipeline(config);
    for i in 0..17u8 {
        sim.inject(&eth_frame(80, i)).unwrap();
    }

    for _ in 0..16 {
        assert!(matches!(p.input.poll(), Ok(InputStatus::Delivered { .. })));
    }
    assert_eq!(p.input.poll(), Ok(InputStatus::Stalled));
    assert!(nic.rx_pending());
    assert_eq!(p.input.stats().overruns, 0);

    assert_eq!(p.stack.receive_frame(|m| m[14]), Some(14));
    assert_eq!(
        p.input.poll(),
        Ok(InputStatus::Delivered { len: 80, page: 0 })
    );
    assert!(!nic.rx_pending());
}

#[test]
fn test_cache_depth_bounded_by_channel() {
    let (_sim, nic) = sim_nic();
    let (tx, _rx) = channel(4).unwrap();
    let config = InputRelayConfig::default().with_cache_depth(8);
    assert!(matches!(
        InputRelay::new(nic.clone(), tx, config),
        Err(RelayError::InvalidConfig(_))
    ));

    let (tx, _rx) = channel(4).unwrap();
    let config = InputRelayConfig::default().with_cache_depth(0);
    assert!(InputRelay::new(nic, tx, config).is_err());
}

#[test]
fn test_cache_depth_bounded_by_page_ids() {
    let (_sim, nic) = sim_nic();
    let (tx, _rx) = channel(70_000).unwrap();
    let config = InputRelayConfig::default().with_cache_depth(65_537);
    assert_eq!(
        InputRelay::new(nic, tx, config).err(),
        Some(RelayError::InvalidConfig("cache depth exceeds page id range"))
    );
}

/// Driver stand-in whose receive buffer contract is always violated.
struct TinyBufferNic;

impl PacketIo for TinyBufferNic {
    fn packet_send(&self, frame: &[u8]) -> core::result::Result<usize, PacketError> {
        Ok(frame.len())
    }

    fn packet_receive(&self, _buffer: &mut [u8]) -> core::result::Result<usize, PacketError> {
        Err(PacketError::InvalidArgument)
    }

    fn rx_pending(&self) -> bool {
        true
    }
}

type IoResult = core::result::Result<usize, PacketError>;

/// Driver stand-in that replays fixed sequences of results.
///
/// Once a script runs out, receive reports `InvalidArgument` and send
/// reports `BufEmpty`; both end a relay's `run`.
struct ScriptedNic {
    receives: RefCell<VecDeque<IoResult>>,
    sends: RefCell<VecDeque<IoResult>>,
}

impl ScriptedNic {
    fn new(receives: &[IoResult], sends: &[IoResult]) -> Self {
        Self {
            receives: RefCell::new(receives.iter().copied().collect()),
            sends: RefCell::new(sends.iter().copied().collect()),
        }
    }
}

impl PacketIo for ScriptedNic {
    fn packet_send(&self, _frame: &[u8]) -> IoResult {
        self.sends.borrow_mut().pop_front().unwrap_or(Err(PacketError::BufEmpty))
    }

    fn packet_receive(&self, buffer: &mut [u8]) -> IoResult {
        let result = self
            .receives
            .borrow_mut()
            .pop_front()
            .unwrap_or(Err(PacketError::InvalidArgument));
        if let Ok(len) = result {
            buffer[..len].fill(0xAB);
        }
        result
    }

    fn rx_pending(&self) -> bool {
        !self.receives.borrow().is_empty()
    }
}

#[derive(Default)]
struct CountingScheduler {
    yields: Cell<usize>,
}

impl Scheduler for CountingScheduler {
    fn yield_now(&self) {
        self.yields.set(self.yields.get() + 1);
    }
}

#[test]
fn test_input_run_yields_once_per_delivery() {
    let script = [
        Ok(60),
        Err(PacketError::BufEmpty),
        Ok(70),
        Err(PacketError::BufEmpty),
        Err(PacketError::BufEmpty),
        Ok(80),
    ];

    for (policy, expected_yields) in [(RetryPolicy::Spin, 3), (RetryPolicy::Yield, 6)] {
        let (tx, rx) = channel(16).unwrap();
        let config = InputRelayConfig::default().with_idle_policy(policy);
        let mut relay = InputRelay::new(ScriptedNic::new(&script, &[]), tx, config).unwrap();
        let sched = CountingScheduler::default();

        let err = relay.run(&sched).unwrap_err();
        assert!(matches!(err, RelayError::FrameTooLarge { .. }));
        assert_eq!(sched.yields.get(), expected_yields, "{:?}", policy);
        assert_eq!(relay.stats().delivered, 3);

        let lens: Vec<_> = core::iter::from_fn(|| rx.try_recv().map(|p| p.len())).collect();
        assert_eq!(lens, [60, 70, 80]);
    }
}

#[test]
fn test_input_run_stops_on_fatal_error() {
    let (tx, _rx) = channel(16).unwrap();
    let mut relay = InputRelay::new(TinyBufferNic, tx, InputRelayConfig::default()).unwrap();
    let err = relay.run(&SpinScheduler).unwrap_err();
    assert_eq!(
        err,
        RelayError::FrameTooLarge {
            capacity: PAYLOAD_CAPACITY
        }
    );
    assert_eq!(relay.cached_pages(), 16);
}

// ═══════════════════════════════════════════════════════════════════════════
// OUTPUT RELAY
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_output_sends_stack_frame() {
    let (sim, _nic, mut p) = pipeline(PipelineConfig::default());
    let frame = eth_frame(120, 3);

    p.stack
        .transmit_frame(frame.len(), |buf| buf.copy_from_slice(&frame))
        .unwrap();
    assert_eq!(p.stack.free_pages(), 15);

    assert_eq!(p.output.poll(), Ok(OutputStatus::Sent(120)));
    assert_eq!(p.output.poll(), Ok(OutputStatus::Idle));
    assert_eq!(p.stack.free_pages(), 16);

    assert_eq!(sim.complete_transmits(), 1);
    assert_eq!(sim.take_transmitted(), vec![frame]);
    assert_eq!(p.output.stats().sent, 1);
}

#[test]
fn test_output_retries_until_ring_drains() {
    let (sim, nic, mut p) = pipeline(PipelineConfig::default());
    for _ in 0..32 {
        nic.packet_send(&eth_frame(60, 0)).unwrap();
    }

    let frame = eth_frame(90, 9);
    p.stack
        .transmit_frame(frame.len(), |buf| buf.copy_from_slice(&frame))
        .unwrap();

    assert_eq!(p.output.poll(), Ok(OutputStatus::Saturated));
    assert_eq!(p.output.poll(), Ok(OutputStatus::Saturated));
    assert!(p.output.has_pending());
    // Page stays with the relay while it retries
    assert_eq!(p.stack.free_pages(), 15);
    assert_eq!(p.output.stats().retries, 2);

    assert_eq!(sim.complete_transmits(), 32);
    assert_eq!(p.output.poll(), Ok(OutputStatus::Sent(90)));
    assert!(!p.output.has_pending());

    sim.complete_transmits();
    let wire = sim.take_transmitted();
    assert_eq!(wire.len(), 33);
    assert_eq!(wire[32], frame);
}

#[test]
fn test_output_drops_oversized_frame() {
    let (sim, _nic, mut p) = pipeline(PipelineConfig::default());

    p.stack.transmit_frame(2000, |buf| buf.fill(0xEE)).unwrap();
    assert_eq!(p.output.poll(), Ok(OutputStatus::Dropped { len: 2000 }));
    assert_eq!(p.output.stats().dropped, 1);
    assert_eq!(p.stack.free_pages(), 16);

    let frame = eth_frame(64, 1);
    p.stack
        .transmit_frame(frame.len(), |buf| buf.copy_from_slice(&frame))
        .unwrap();
    assert_eq!(p.output.poll(), Ok(OutputStatus::Sent(64)));
    sim.complete_transmits();
    assert_eq!(sim.take_transmitted(), vec![frame]);
}

#[test]
fn test_stack_rejects_frame_larger_than_page() {
    let (_sim, _nic, mut p) = pipeline(PipelineConfig::default());
    let result = p.stack.transmit_frame(PAYLOAD_CAPACITY + 1, |_| ());
    assert_eq!(
        result,
        Err(RelayError::FrameTooLarge {
            capacity: PAYLOAD_CAPACITY
        })
    );
    assert_eq!(p.stack.free_pages(), 16);
}

#[test]
fn test_stack_out_of_pages() {
    let config = PipelineConfig {
        stack_pages: 2,
        ..Default::default()
    };
    let (_sim, _nic, mut p) = pipeline(config);
    p.stack.transmit_frame(60, |_| ()).unwrap();
    p.stack.transmit_frame(60, |_| ()).unwrap();
    assert!(!p.stack.can_transmit());
    assert_eq!(p.stack.transmit_frame(60, |_| ()), Err(RelayError::ChannelFull));

    assert!(matches!(p.output.poll(), Ok(OutputStatus::Sent(60))));
    assert!(p.stack.can_transmit());
}

fn stack_page(id: u16, len: u32) -> Page {
    let mut page = Page::new(id);
    page.set_len(len).unwrap();
    page
}

#[test]
fn test_output_run_retries_drops_and_sends() {
    let script = [
        Err(PacketError::BufFull),
        Err(PacketError::BufFull),
        Err(PacketError::BufFull),
        Err(PacketError::InvalidArgument),
        Ok(70),
    ];

    for (policy, expected_yields) in [(RetryPolicy::Spin, 0), (RetryPolicy::Yield, 3)] {
        let (tx, rx) = channel(8).unwrap();
        for (id, len) in [(0, 60), (1, 70), (2, 80)] {
            tx.send(stack_page(id, len)).unwrap();
        }
        let config = OutputRelayConfig::default().with_full_policy(policy);
        let mut relay = OutputRelay::new(ScriptedNic::new(&[], &script), rx, config);
        let sched = CountingScheduler::default();

        let err = relay.run(&sched).unwrap_err();
        assert_eq!(err, RelayError::Driver(PacketError::BufEmpty));
        assert_eq!(sched.yields.get(), expected_yields, "{:?}", policy);

        let stats = relay.stats();
        assert_eq!(stats.retries, 3);
        assert_eq!(stats.dropped, 1);
        assert_eq!(stats.sent, 1);

        // Dropped and sent pages went back; the failed one is held for retry
        assert!(relay.has_pending());
        let returned: Vec<_> = core::iter::from_fn(|| tx.reclaim().map(|p| p.id())).collect();
        assert_eq!(returned, [0, 1]);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// SMOLTCP DEVICE + PIPELINE
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_stack_port_as_smoltcp_device() {
    let (sim, _nic, mut p) = pipeline(PipelineConfig::default());
    let caps = p.stack.capabilities();
    assert_eq!(caps.medium, Medium::Ethernet);
    assert_eq!(caps.max_transmission_unit, 1514);

    assert!(Device::receive(&mut p.stack, Instant::from_millis(0)).is_none());

    let inbound = eth_frame(98, 4);
    sim.inject(&inbound).unwrap();
    p.input.poll().unwrap();

    {
        let (rx, _tx) = Device::receive(&mut p.stack, Instant::from_millis(1)).unwrap();
        assert_eq!(rx.consume(|buf| buf.to_vec()), inbound);
    }

    let tx = Device::transmit(&mut p.stack, Instant::from_millis(2)).unwrap();
    tx.consume(60, |buf| buf.fill(0x5A));
    assert_eq!(p.output.poll(), Ok(OutputStatus::Sent(60)));

    sim.complete_transmits();
    let wire = sim.take_transmitted();
    assert_eq!(wire.len(), 1);
    assert!(wire[0].iter().all(|&b| b == 0x5A));
    assert_eq!(p.stack.tx_dropped(), 0);
}

#[test]
fn test_dropped_rx_token_returns_page() {
    let (sim, _nic, mut p) = pipeline(PipelineConfig::default());

    for i in 0..16u8 {
        sim.inject(&eth_frame(64, i)).unwrap();
        assert!(matches!(p.input.poll(), Ok(InputStatus::Delivered { .. })));
        // Interface drops both tokens without consuming either
        drop(Device::receive(&mut p.stack, Instant::from_millis(i as i64)));
    }

    sim.inject(&eth_frame(64, 16)).unwrap();
    assert!(matches!(p.input.poll(), Ok(InputStatus::Delivered { .. })));
    assert_eq!(p.input.stats().overruns, 0);
    assert_eq!(p.input.cached_pages(), 15);
}

#[test]
fn test_pipeline_echo() {
    let (sim, _nic, mut p) = pipeline(PipelineConfig::default());

    for i in 0..50u8 {
        let frame = eth_frame(60 + i as usize, i);
        sim.inject(&frame).unwrap();
        assert!(matches!(p.input.poll(), Ok(InputStatus::Delivered { .. })));

        let echoed = p.stack.receive_frame(|m| m.to_vec()).unwrap();
        p.stack
            .transmit_frame(echoed.len(), |buf| buf.copy_from_slice(&echoed))
            .unwrap();
        assert_eq!(p.output.poll(), Ok(OutputStatus::Sent(frame.len())));

        assert_eq!(sim.complete_transmits(), 1);
        assert_eq!(sim.take_transmitted(), vec![frame]);
    }
    assert_eq!(p.input.stats().delivered, 50);
    assert_eq!(p.output.stats().sent, 50);
}

#[test]
fn test_pipeline_rejects_zero_stack_pages() {
    let (_sim, nic) = sim_nic();
    let config = PipelineConfig {
        stack_pages: 0,
        ..Default::default()
    };
    assert!(matches!(
        Pipeline::new(nic, config),
        Err(RelayError::InvalidConfig(_))
    ));
}
