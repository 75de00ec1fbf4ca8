//! Inactivity power-down (Mobile-Robot only).

use crate::board::{Board, Cue};
use crate::bus::SensorBus;
use crate::engine::Engine;
use crate::link::Link;
use crate::session::IdleAction;
use embassy_sync::blocking_mutex::raw::RawMutex;

impl<M: RawMutex, L: Link, B: SensorBus, H: Board> Engine<M, L, B, H> {
    /// One idle-monitor interval.
    ///
    /// Past the threshold, every tick stops the actuators; only the first
    /// also plays the shutdown cue. Any dispatched command starts the count
    /// over.
    pub async fn idle_tick(&self) -> IdleAction {
        if !self.config.profile.has_idle_shutdown() {
            return IdleAction::None;
        }
        let action = self.session.idle_tick(self.config.idle_threshold);
        if let IdleAction::PowerDown { cue } = action {
            if cue {
                info!("idle for {} ticks, powering down", self.session.idle_ticks());
                self.board.lock().await.play_cue(Cue::IdleShutdown).await;
            }
            if let Err(e) = self.stop_all().await {
                warn!("idle stop failed: {:?}", e);
            }
        }
        action
    }
}
