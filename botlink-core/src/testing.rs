//! Mock collaborators shared by the unit tests.

extern crate std;

use crate::board::{Cue, Display, EdgeConnector, MotionSensors, Speaker};
use crate::bus::{BusError, SensorBus};
use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::link::{Link, LinkError};
use botlink_proto::command::EDGE_PINS;
use botlink_proto::{MotionReading, PinIo, Symbol, Text, Tone};
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embedded_hal_async::delay::DelayNs;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::vec::Vec;

// Helper to run a future to completion (simple blocking executor)
pub fn block_on<F: Future>(mut f: F) -> F::Output {
    fn noop_raw_waker() -> RawWaker {
        fn noop(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            noop_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, noop, noop, noop);
        RawWaker::new(core::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(noop_raw_waker()) };
    let mut cx = Context::from_waker(&waker);

    // SAFETY: We don't move f after pinning
    let mut f = unsafe { Pin::new_unchecked(&mut f) };

    match f.as_mut().poll(&mut cx) {
        Poll::Ready(result) => result,
        Poll::Pending => panic!("Mock future returned Pending unexpectedly"),
    }
}

/// Delay that records every sleep in milliseconds.
///
/// A yielding delay returns `Pending` once per sleep so that concurrently
/// joined tasks get polled; drive those with `embassy_futures::block_on`.
#[derive(Clone, Default)]
pub struct MockDelay {
    sleeps: Arc<Mutex<Vec<u32>>>,
    yielding: bool,
}

impl MockDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn yielding() -> Self {
        Self {
            yielding: true,
            ..Self::default()
        }
    }

    pub fn sleeps(&self) -> Vec<u32> {
        self.sleeps.lock().unwrap().clone()
    }

    pub fn count(&self, ms: u32) -> usize {
        self.sleeps.lock().unwrap().iter().filter(|&&s| s == ms).count()
    }

    async fn sleep(&mut self, ms: u32) {
        self.sleeps.lock().unwrap().push(ms);
        if self.yielding {
            embassy_futures::yield_now().await;
        }
    }
}

impl DelayNs for MockDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.sleep(ns / 1_000_000).await;
    }

    async fn delay_us(&mut self, us: u32) {
        self.sleep(us / 1_000).await;
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.sleep(ms).await;
    }
}

#[derive(Clone, Default)]
pub struct MockLink {
    pub inbound: Arc<Mutex<VecDeque<u8>>>,
    pub sent: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl MockLink {
    pub fn push(&self, bytes: &[u8]) {
        self.inbound.lock().unwrap().extend(bytes.iter().copied());
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().unwrap().clone()
    }

    pub fn pending(&self) -> usize {
        self.inbound.lock().unwrap().len()
    }
}

impl Link for MockLink {
    fn is_data_available(&self) -> bool {
        !self.inbound.lock().unwrap().is_empty()
    }

    fn bytes_buffered(&self) -> usize {
        self.inbound.lock().unwrap().len()
    }

    async fn read_all(&mut self, buf: &mut [u8]) -> Result<usize, LinkError> {
        let mut inbound = self.inbound.lock().unwrap();
        let n = buf.len().min(inbound.len());
        for (slot, byte) in buf.iter_mut().zip(inbound.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    async fn send(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        self.sent.lock().unwrap().push(bytes.to_vec());
        Ok(())
    }
}

/// Bus replaying queued sensor reads, then `fallback` once the queue is empty.
#[derive(Clone, Default)]
pub struct MockBus {
    pub reads: Arc<Mutex<VecDeque<Result<Vec<u8>, BusError>>>>,
    pub fallback: Arc<Mutex<Vec<u8>>>,
    pub read_count: Arc<Mutex<usize>>,
    pub writes: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl MockBus {
    pub fn queue(&self, read: Result<&[u8], BusError>) {
        self.reads.lock().unwrap().push_back(read.map(<[u8]>::to_vec));
    }

    pub fn set_fallback(&self, block: &[u8]) {
        *self.fallback.lock().unwrap() = block.to_vec();
    }

    pub fn read_count(&self) -> usize {
        *self.read_count.lock().unwrap()
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.writes.lock().unwrap().clone()
    }
}

impl SensorBus for MockBus {
    async fn read_sensor_block(&mut self, buf: &mut [u8]) -> Result<(), BusError> {
        *self.read_count.lock().unwrap() += 1;
        let next = self.reads.lock().unwrap().pop_front();
        let block = match next {
            Some(read) => read?,
            None => self.fallback.lock().unwrap().clone(),
        };
        buf.fill(0);
        let n = buf.len().min(block.len());
        buf[..n].copy_from_slice(&block[..n]);
        Ok(())
    }

    async fn write_actuator_block(&mut self, block: &[u8]) -> Result<(), BusError> {
        self.writes.lock().unwrap().push(block.to_vec());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardEvent {
    Symbol(Symbol),
    Scroll(Vec<u8>),
    Clear,
    Pins(PinIo),
    ReleasePins,
    Tone(Tone),
    StopTone,
    Cue(Cue),
    Microphone(bool),
    Calibrate,
}

#[derive(Clone)]
pub struct MockBoard {
    pub events: Arc<Mutex<Vec<BoardEvent>>>,
    pub motion: MotionReading,
    pub pins: [u8; EDGE_PINS],
    pub temperature: i16,
    pub sound: u8,
    pub calibration_ok: bool,
    /// Times `calibrate_compass` suspends before it finishes.
    pub calibration_yields: usize,
}

impl Default for MockBoard {
    fn default() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            motion: MotionReading::default(),
            pins: [0; EDGE_PINS],
            temperature: 21,
            sound: 0,
            calibration_ok: true,
            calibration_yields: 0,
        }
    }
}

impl MockBoard {
    pub fn events(&self) -> Vec<BoardEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear_events(&self) {
        self.events.lock().unwrap().clear();
    }

    fn record(&self, event: BoardEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl Display for MockBoard {
    fn show_symbol(&mut self, symbol: Symbol) {
        self.record(BoardEvent::Symbol(symbol));
    }

    fn scroll_text(&mut self, text: &Text) {
        self.record(BoardEvent::Scroll(text.as_bytes().to_vec()));
    }

    fn clear(&mut self) {
        self.record(BoardEvent::Clear);
    }
}

impl EdgeConnector for MockBoard {
    fn apply_pins(&mut self, pins: &PinIo) {
        self.record(BoardEvent::Pins(*pins));
    }

    fn read_pins(&mut self) -> [u8; EDGE_PINS] {
        self.pins
    }

    fn release_pins(&mut self) {
        self.record(BoardEvent::ReleasePins);
    }
}

impl Speaker for MockBoard {
    fn play_tone(&mut self, tone: Tone) {
        self.record(BoardEvent::Tone(tone));
    }

    fn stop_tone(&mut self) {
        self.record(BoardEvent::StopTone);
    }

    async fn play_cue(&mut self, cue: Cue) {
        self.record(BoardEvent::Cue(cue));
    }
}

impl MotionSensors for MockBoard {
    fn read_motion(&mut self) -> MotionReading {
        self.motion
    }

    fn temperature(&mut self) -> i16 {
        self.temperature
    }

    fn sound_level(&mut self) -> u8 {
        self.sound
    }

    fn set_microphone(&mut self, enabled: bool) {
        self.record(BoardEvent::Microphone(enabled));
    }

    async fn calibrate_compass(&mut self) -> bool {
        self.record(BoardEvent::Calibrate);
        for _ in 0..self.calibration_yields {
            embassy_futures::yield_now().await;
        }
        self.calibration_ok
    }
}

pub type TestEngine = Engine<NoopRawMutex, MockLink, MockBus, MockBoard>;

/// An engine plus handles onto its mock collaborators.
pub struct Rig {
    pub engine: TestEngine,
    pub link: MockLink,
    pub bus: MockBus,
    pub board: MockBoard,
}

pub fn rig(config: EngineConfig) -> Rig {
    rig_with_board(config, MockBoard::default())
}

pub fn rig_with_board(config: EngineConfig, board: MockBoard) -> Rig {
    let link = MockLink::default();
    let bus = MockBus::default();
    Rig {
        engine: Engine::new(config, link.clone(), bus.clone(), board.clone()),
        link,
        bus,
        board,
    }
}

/// Rig with a connected peer and the board log cleared.
pub fn connected_rig(config: EngineConfig) -> Rig {
    let rig = rig(config);
    block_on(rig.engine.on_connect());
    rig.board.clear_events();
    rig
}
