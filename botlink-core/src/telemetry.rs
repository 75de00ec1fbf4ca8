//! Telemetry assembler and the periodic stream.

use crate::acquisition::{read_actuator_sensors, read_mobile_sensors};
use crate::board::Board;
use crate::bus::SensorBus;
use crate::engine::{Engine, EngineError};
use crate::link::Link;
use botlink_proto::{
    DeviceProfile, PacketVersion, SecondaryReading, SensorSnapshot, TelemetryPacket,
};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::delay::DelayNs;

impl<M: RawMutex, L: Link, B: SensorBus, H: Board> Engine<M, L, B, H> {
    /// Assemble and send one telemetry packet for the current subscription.
    ///
    /// Waits a bounded time for the exclusion gate and proceeds without it
    /// if a command batch is still running. Returns the packet that was sent.
    pub async fn send_telemetry<D: DelayNs>(
        &self,
        delay: &mut D,
    ) -> Result<TelemetryPacket, EngineError> {
        let config = &self.config;
        let gate = self
            .gate
            .enter_bounded(delay, config.gate_tick_ms, config.gate_attempts)
            .await;
        if !gate.is_held() {
            debug!("gate still busy, sending telemetry anyway");
        }

        let version = self.session.subscription().version;
        let snapshot = self.snapshot(version, delay).await;
        let packet = TelemetryPacket::build(version, &snapshot);
        self.link.lock().await.send(packet.as_bytes()).await?;
        trace!("telemetry sent: {:?}", packet.as_bytes());
        Ok(packet)
    }

    async fn snapshot<D: DelayNs>(
        &self,
        version: PacketVersion,
        delay: &mut D,
    ) -> SensorSnapshot {
        let config = &self.config;
        let secondary = match config.profile {
            DeviceProfile::Basic => {
                let pins = self.board.lock().await.read_pins();
                SecondaryReading::EdgePins(pins)
            }
            DeviceProfile::ActuatorBoard => {
                let mut bus = self.bus.lock().await;
                let acquired = read_actuator_sensors(
                    &mut *bus,
                    config.sensor_tolerance,
                    config.sensor_attempts,
                )
                .await;
                SecondaryReading::ActuatorBoard(acquired.reading)
            }
            DeviceProfile::MobileRobot => {
                let mut bus = self.bus.lock().await;
                let acquired = read_mobile_sensors(
                    &mut *bus,
                    delay,
                    config.bus_retry_ms,
                    config.bus_error_attempts,
                )
                .await;
                SecondaryReading::MobileRobot(acquired.reading)
            }
        };

        let mut board = self.board.lock().await;
        let (sound_level, temperature_c) = match version {
            PacketVersion::V1 => (0, 0),
            PacketVersion::V2 => (board.sound_level(), board.temperature()),
        };
        SensorSnapshot {
            secondary,
            motion: board.read_motion(),
            sound_level,
            temperature_c,
            calibration: self.session.calibration(),
        }
    }

    /// The telemetry task: sleeps until notifications are enabled, then sends
    /// one packet per period until they are disabled or the peer leaves.
    ///
    /// The stream latch in the session keeps this the only sender however
    /// often notifications are toggled.
    pub async fn stream_telemetry<D: DelayNs>(&self, delay: &mut D) -> ! {
        loop {
            self.session.wait_wake().await;
            if !self.session.claim_stream() {
                continue;
            }
            info!("telemetry stream started");
            while self.session.continue_stream() {
                if let Err(e) = self.send_telemetry(delay).await {
                    warn!("telemetry send failed: {:?}", e);
                }
                delay.delay_ms(self.config.telemetry_period_ms).await;
            }
            info!("telemetry stream stopped");
        }
    }
}
