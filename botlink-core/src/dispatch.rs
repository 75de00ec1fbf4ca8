//! Command poll cycle and dispatcher.

use crate::board::Board;
use crate::bus::SensorBus;
use crate::config::INBOUND_CAPACITY;
use crate::engine::{Engine, EngineError};
use crate::link::Link;
use botlink_proto::bus::{
    actuator_set_all_block, mobile_leds_block, motors_block, reset_encoders_block, stop_block,
    ActuatorBlock,
};
use botlink_proto::{
    CalibrationOutcome, Command, Decoded, DeviceProfile, DisplayCommand, FrameDecoder,
    NotifyRequest, PacketVersion, SkipReason,
};
use embassy_sync::blocking_mutex::raw::RawMutex;

/// What one command poll cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollOutcome {
    /// No peer; nothing was read.
    Disconnected,
    /// Telemetry holds the gate; the cycle was skipped.
    Busy,
    /// The link had nothing buffered.
    NoData,
    /// A buffer was drained and decoded.
    ///
    /// `bytes` includes anything carried over from the previous cycle;
    /// `deferred` is the length of the incomplete frame kept for the next.
    Processed {
        bytes: usize,
        executed: usize,
        skipped: usize,
        deferred: usize,
    },
}

impl<M: RawMutex, L: Link, B: SensorBus, H: Board> Engine<M, L, B, H> {
    /// Drain the link once and execute every frame in the buffer.
    ///
    /// Skipped if telemetry currently holds the exclusion gate. A handler
    /// failure is logged and does not stop the remaining frames. A frame cut
    /// off at the end of the buffer is kept and completed by the next cycle.
    pub async fn poll_commands(&self) -> Result<PollOutcome, EngineError> {
        if !self.session.is_connected() {
            return Ok(PollOutcome::Disconnected);
        }
        let Some(_gate) = self.gate.try_enter() else {
            trace!("gate busy, skipping command cycle");
            return Ok(PollOutcome::Busy);
        };

        let mut buf = self.carry.lock(|carry| core::mem::take(&mut *carry.borrow_mut()));
        let carried = buf.len();
        {
            let mut link = self.link.lock().await;
            if !link.is_data_available() {
                self.keep_carry(&buf);
                return Ok(PollOutcome::NoData);
            }
            let wanted = link.bytes_buffered().min(INBOUND_CAPACITY - carried);
            // Cannot fail: `carried + wanted` never exceeds the capacity.
            let _ = buf.resize_default(carried + wanted);
            let read = match link.read_all(&mut buf[carried..]).await {
                Ok(read) => read,
                Err(e) => {
                    buf.truncate(carried);
                    self.keep_carry(&buf);
                    return Err(e.into());
                }
            };
            buf.truncate(carried + read);
        }

        let mut executed = 0;
        let mut skipped = 0;
        let mut deferred = 0;
        for item in FrameDecoder::new(&buf, self.config.profile) {
            match item {
                Decoded::Command { offset, command, .. } => {
                    debug!("frame at {}: {:?}", offset, command);
                    self.session.note_command();
                    if let Err(e) = self.dispatch(command).await {
                        warn!("command {:?} failed: {:?}", command, e);
                    }
                    executed += 1;
                }
                Decoded::Skipped {
                    offset,
                    reason: SkipReason::Incomplete { needed, .. },
                } if needed <= INBOUND_CAPACITY => {
                    trace!("deferring {} bytes at {}", buf.len() - offset, offset);
                    deferred = buf.len() - offset;
                    self.keep_carry(&buf[offset..]);
                }
                Decoded::Skipped { offset, reason } => {
                    debug!("skipped byte at {}: {:?}", offset, reason);
                    skipped += 1;
                }
            }
        }

        Ok(PollOutcome::Processed {
            bytes: buf.len(),
            executed,
            skipped,
            deferred,
        })
    }

    fn keep_carry(&self, tail: &[u8]) {
        self.carry.lock(|carry| {
            let mut carry = carry.borrow_mut();
            carry.clear();
            // Cannot fail: `tail` is a slice of a buffer of the same capacity.
            let _ = carry.extend_from_slice(tail);
        });
    }

    /// Execute one decoded command.
    pub async fn dispatch(&self, command: Command) -> Result<(), EngineError> {
        match command {
            Command::Display(display) => self.show(display).await,
            Command::FirmwareInfo => {
                let reply = self.config.profile.firmware_info().to_bytes();
                self.link.lock().await.send(&reply).await?;
            }
            Command::Notifications(request) => self.notifications(request).await,
            Command::PinIo(pins) => self.board.lock().await.apply_pins(&pins),
            Command::StopAll => self.stop_all().await?,
            Command::Calibrate => self.calibrate().await,
            Command::ActuatorSetAll(set_all) => {
                self.write_block(&actuator_set_all_block(&set_all)).await?;
            }
            Command::BasicBuzzer(tone) => {
                let mut board = self.board.lock().await;
                if tone.is_silent() {
                    board.stop_tone();
                } else {
                    board.play_tone(tone);
                }
            }
            Command::MobileSetAllLeds(leds) => self.write_block(&mobile_leds_block(&leds)).await?,
            Command::MobileMotorsDisplay(request) => {
                if let Some(motors) = request.motors() {
                    self.write_block(&motors_block(&motors)).await?;
                }
                if let Some(display) = request.display() {
                    self.show(display).await;
                }
            }
            Command::MobileStopAll => {
                if let Some(block) = stop_block(DeviceProfile::MobileRobot) {
                    self.write_block(&block).await?;
                }
            }
            Command::MobileResetEncoders => self.write_block(&reset_encoders_block()).await?,
        }
        Ok(())
    }

    /// Halt every output the profile has.
    pub(crate) async fn stop_all(&self) -> Result<(), EngineError> {
        self.stop_board(&mut *self.board.lock().await);
        self.stop_bus().await
    }

    pub(crate) fn stop_board(&self, board: &mut H) {
        board.clear();
        board.stop_tone();
        if self.config.profile == DeviceProfile::Basic {
            board.release_pins();
        }
    }

    pub(crate) async fn stop_bus(&self) -> Result<(), EngineError> {
        match stop_block(self.config.profile) {
            Some(block) => self.write_block(&block).await,
            None => Ok(()),
        }
    }

    async fn write_block(&self, block: &ActuatorBlock) -> Result<(), EngineError> {
        self.bus.lock().await.write_actuator_block(block).await?;
        Ok(())
    }

    async fn show(&self, display: DisplayCommand) {
        let mut board = self.board.lock().await;
        match display {
            DisplayCommand::Clear => board.clear(),
            DisplayCommand::Symbol(symbol) => board.show_symbol(symbol),
            DisplayCommand::Scroll(text) => board.scroll_text(&text),
        }
    }

    async fn notifications(&self, request: NotifyRequest) {
        match request {
            NotifyRequest::Start(version) => {
                if version == PacketVersion::V2 {
                    self.board.lock().await.set_microphone(true);
                }
                let prior = self.session.subscribe(version);
                if prior.uses_microphone() && version == PacketVersion::V1 {
                    self.board.lock().await.set_microphone(false);
                }
                info!("telemetry on ({:?})", version);
            }
            NotifyRequest::Stop => {
                let prior = self.session.unsubscribe();
                if prior.uses_microphone() {
                    self.board.lock().await.set_microphone(false);
                }
                info!("telemetry off");
            }
            NotifyRequest::Unknown(arg) => debug!("ignoring notifications argument {}", arg),
        }
    }

    /// Suspend telemetry, calibrate the compass, record the outcome and put
    /// the subscription back, unless the peer left in the meantime.
    async fn calibrate(&self) {
        let suspended = self.session.suspend();
        info!("calibrating compass");
        let succeeded = self.board.lock().await.calibrate_compass().await;
        self.session.record_calibration(CalibrationOutcome::finished(succeeded));
        if !self.session.resume(suspended) {
            debug!("peer left during calibration, telemetry stays off");
        }
        info!("calibration {}", if succeeded { "succeeded" } else { "failed" });
    }
}
