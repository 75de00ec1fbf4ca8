//! Engine: owns the collaborators and runs the cooperative tasks.

use crate::board::{Board, Cue};
use crate::bus::{BusError, SensorBus};
use crate::config::{EngineConfig, INBOUND_CAPACITY};
use crate::gate::ExclusionGate;
use crate::link::{Link, LinkError};
use crate::session::Session;
use botlink_proto::DeviceProfile;
use embassy_futures::select::{select3, Either3};
use core::cell::RefCell;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::mutex::Mutex;
use embedded_hal_async::delay::DelayNs;
use heapless::Vec;

/// Error type for engine operations.
///
/// Never fatal: the task loops log it and carry on with the next cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EngineError {
    /// Error from the transport link.
    Link(LinkError),
    /// Error from the secondary bus.
    Bus(BusError),
}

impl From<LinkError> for EngineError {
    fn from(err: LinkError) -> Self {
        EngineError::Link(err)
    }
}

impl From<BusError> for EngineError {
    fn from(err: BusError) -> Self {
        EngineError::Bus(err)
    }
}

/// The command/telemetry protocol engine.
///
/// Every method takes `&self`: the three tasks started by [`run`](Self::run)
/// share one engine. Each collaborator sits behind its own async mutex so a
/// single transfer is never interleaved; the [`ExclusionGate`] additionally
/// keeps a whole command batch apart from a whole telemetry packet. Locks
/// are never nested.
pub struct Engine<M: RawMutex, L, B, H> {
    pub(crate) config: EngineConfig,
    pub(crate) session: Session<M>,
    pub(crate) gate: ExclusionGate<M>,
    /// Incomplete trailing frame kept for the next poll cycle.
    pub(crate) carry: BlockingMutex<M, RefCell<Vec<u8, INBOUND_CAPACITY>>>,
    pub(crate) link: Mutex<M, L>,
    pub(crate) bus: Mutex<M, B>,
    pub(crate) board: Mutex<M, H>,
}

impl<M: RawMutex, L: Link, B: SensorBus, H: Board> Engine<M, L, B, H> {
    /// Create an engine for `config.profile`.
    pub fn new(config: EngineConfig, link: L, bus: B, board: H) -> Self {
        Self {
            config,
            session: Session::new(),
            gate: ExclusionGate::new(),
            carry: BlockingMutex::new(RefCell::new(Vec::new())),
            link: Mutex::new(link),
            bus: Mutex::new(bus),
            board: Mutex::new(board),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn profile(&self) -> DeviceProfile {
        self.config.profile
    }

    pub fn session(&self) -> &Session<M> {
        &self.session
    }

    /// The link, for board code that needs it outside the engine's tasks.
    pub fn link(&self) -> &Mutex<M, L> {
        &self.link
    }

    pub fn bus(&self) -> &Mutex<M, B> {
        &self.bus
    }

    pub fn board(&self) -> &Mutex<M, H> {
        &self.board
    }

    /// A peer connected.
    pub async fn on_connect(&self) {
        self.session.connect();
        self.drop_carry();
        info!("peer connected");
        self.board.lock().await.play_cue(Cue::Connected).await;
    }

    /// The peer went away: drop the subscription and halt every output.
    ///
    /// An in-flight telemetry packet still completes; the stream stops at
    /// its next check. The companion is stopped first, so its motors halt
    /// even while a calibration still holds the board.
    pub async fn on_disconnect(&self) {
        let prior = self.session.disconnect();
        self.drop_carry();
        info!("peer disconnected (subscription was {:?})", prior);

        if let Err(e) = self.stop_bus().await {
            warn!("stop on disconnect failed: {:?}", e);
        }
        let mut board = self.board.lock().await;
        board.set_microphone(false);
        self.stop_board(&mut *board);
        board.play_cue(Cue::Disconnected).await;
    }

    fn drop_carry(&self) {
        self.carry.lock(|carry| carry.borrow_mut().clear());
    }

    /// Run the command, telemetry and idle tasks forever.
    ///
    /// Each task gets its own copy of `delay`; on target pass
    /// `embassy_time::Delay`.
    pub async fn run<D: DelayNs + Clone>(&self, delay: D) -> ! {
        let mut command_delay = delay.clone();
        let mut telemetry_delay = delay.clone();
        let mut idle_delay = delay;

        info!("engine running as {:?}", self.config.profile);
        match select3(
            self.command_loop(&mut command_delay),
            self.stream_telemetry(&mut telemetry_delay),
            self.idle_loop(&mut idle_delay),
        )
        .await
        {
            Either3::First(never) | Either3::Second(never) | Either3::Third(never) => never,
        }
    }

    async fn command_loop<D: DelayNs>(&self, delay: &mut D) -> ! {
        loop {
            if let Err(e) = self.poll_commands().await {
                warn!("command cycle failed: {:?}", e);
            }
            delay.delay_ms(self.config.command_poll_ms).await;
        }
    }

    async fn idle_loop<D: DelayNs>(&self, delay: &mut D) -> ! {
        loop {
            delay.delay_ms(self.config.idle_tick_ms).await;
            self.idle_tick().await;
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::testing::{block_on, connected_rig, rig, BoardEvent};
    use botlink_proto::PacketVersion;
    use std::vec;

    #[test]
    fn test_connect_plays_cue() {
        let rig = rig(EngineConfig::default());
        assert!(!rig.engine.session().is_connected());

        block_on(rig.engine.on_connect());
        assert!(rig.engine.session().is_connected());
        assert_eq!(rig.board.events(), vec![BoardEvent::Cue(Cue::Connected)]);
    }

    #[test]
    fn test_disconnect_tears_down_session() {
        let rig = connected_rig(EngineConfig::new(DeviceProfile::ActuatorBoard));
        rig.engine.session().subscribe(PacketVersion::V2);

        block_on(rig.engine.on_disconnect());

        let session = rig.engine.session();
        assert!(!session.is_connected());
        assert!(!session.subscription().active);
        assert_eq!(
            rig.board.events(),
            vec![
                BoardEvent::Microphone(false),
                BoardEvent::Clear,
                BoardEvent::StopTone,
                BoardEvent::Cue(Cue::Disconnected),
            ]
        );
        assert_eq!(rig.bus.writes(), vec![vec![0xCB]]);
    }

    #[test]
    fn test_disconnect_releases_pins_on_basic() {
        let rig = connected_rig(EngineConfig::default());
        block_on(rig.engine.on_disconnect());

        assert!(rig.board.events().contains(&BoardEvent::ReleasePins));
        assert!(rig.bus.writes().is_empty());
    }

    #[test]
    fn test_engine_error_conversions() {
        assert_eq!(EngineError::from(LinkError::Io), EngineError::Link(LinkError::Io));
        assert_eq!(
            EngineError::from(BusError::Timeout),
            EngineError::Bus(BusError::Timeout)
        );
    }
}
