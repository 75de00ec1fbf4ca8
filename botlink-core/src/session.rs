//! Per-connection session state shared by the cooperative tasks.
//!
//! All fields live behind one blocking mutex, so every multi-field update
//! (subscription active + version, disconnect teardown, the stream latch)
//! happens inside a single critical section and can never straddle a yield.
//!
//! | Field | Writer |
//! |-------|--------|
//! | `connected`, `epoch` | connection events |
//! | `subscription` | notifications command, calibration, disconnect |
//! | `calibration` | calibration command |
//! | `idle_ticks`, `idle_cue_played` | idle monitor (reset by command dispatch) |
//! | `streaming` | telemetry task |

use botlink_proto::{CalibrationOutcome, PacketVersion};
use core::cell::RefCell;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;

/// Telemetry subscription negotiated by the peer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Subscription {
    pub active: bool,
    pub version: PacketVersion,
}

impl Subscription {
    pub const INACTIVE: Self = Self {
        active: false,
        version: PacketVersion::V1,
    };

    #[must_use]
    pub const fn active(version: PacketVersion) -> Self {
        Self {
            active: true,
            version,
        }
    }

    /// Whether this subscription samples the microphone.
    #[must_use]
    pub const fn uses_microphone(self) -> bool {
        self.active && matches!(self.version, PacketVersion::V2)
    }
}

/// Subscription set aside while the peer is not served telemetry.
///
/// Only [`Session::resume`] can put it back, and only for the connection it
/// was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[must_use]
pub struct Suspended {
    pub subscription: Subscription,
    epoch: u32,
}

/// What the idle monitor should do after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IdleAction {
    /// Still under the threshold (or the profile has no idle policy).
    None,
    /// Power the actuators down; `cue` is set only on the first tick past the
    /// threshold.
    PowerDown { cue: bool },
}

#[derive(Debug, Default)]
struct SessionState {
    connected: bool,
    /// Bumped by every connect and disconnect.
    epoch: u32,
    subscription: Subscription,
    calibration: CalibrationOutcome,
    idle_ticks: u32,
    idle_cue_played: bool,
    streaming: bool,
}

/// Shared session state plus the wake-up signal of the telemetry task.
pub struct Session<M: RawMutex> {
    state: Mutex<M, RefCell<SessionState>>,
    wake: Signal<M, ()>,
}

impl<M: RawMutex> Default for Session<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> Session<M> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(SessionState::default())),
            wake: Signal::new(),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        self.state.lock(|cell| f(&mut *cell.borrow_mut()))
    }

    pub fn is_connected(&self) -> bool {
        self.with(|s| s.connected)
    }

    pub fn connect(&self) {
        self.with(|s| {
            s.connected = true;
            s.epoch = s.epoch.wrapping_add(1);
        });
    }

    /// Mark the peer gone and drop its subscription.
    ///
    /// Returns the subscription that was active.
    pub fn disconnect(&self) -> Subscription {
        self.with(|s| {
            s.connected = false;
            s.epoch = s.epoch.wrapping_add(1);
            core::mem::replace(&mut s.subscription, Subscription::INACTIVE)
        })
    }

    pub fn subscription(&self) -> Subscription {
        self.with(|s| s.subscription)
    }

    /// Activate telemetry with `version` and wake the telemetry task.
    ///
    /// Returns the previous subscription.
    pub fn subscribe(&self, version: PacketVersion) -> Subscription {
        let prior = self.with(|s| {
            core::mem::replace(&mut s.subscription, Subscription::active(version))
        });
        self.wake.signal(());
        prior
    }

    /// Deactivate telemetry. Returns the previous subscription.
    pub fn unsubscribe(&self) -> Subscription {
        self.with(|s| core::mem::replace(&mut s.subscription, Subscription::INACTIVE))
    }

    /// Deactivate telemetry until [`resume`](Self::resume).
    pub fn suspend(&self) -> Suspended {
        self.with(|s| Suspended {
            subscription: core::mem::replace(&mut s.subscription, Subscription::INACTIVE),
            epoch: s.epoch,
        })
    }

    /// Put back a suspended subscription, waking the telemetry task if it is
    /// active.
    ///
    /// Discarded (returning `false`) if the peer disconnected in between,
    /// even if another one has connected since.
    pub fn resume(&self, suspended: Suspended) -> bool {
        let resumed = self.with(|s| {
            if !s.connected || s.epoch != suspended.epoch {
                return false;
            }
            s.subscription = suspended.subscription;
            true
        });
        if resumed && suspended.subscription.active {
            self.wake.signal(());
        }
        resumed
    }

    pub fn calibration(&self) -> CalibrationOutcome {
        self.with(|s| s.calibration)
    }

    pub fn record_calibration(&self, outcome: CalibrationOutcome) {
        self.with(|s| s.calibration = outcome);
    }

    /// A command was dispatched: reset the idle counter and re-arm the cue.
    pub fn note_command(&self) {
        self.with(|s| {
            s.idle_ticks = 0;
            s.idle_cue_played = false;
        });
    }

    pub fn idle_ticks(&self) -> u32 {
        self.with(|s| s.idle_ticks)
    }

    /// Count one idle interval against `threshold`.
    pub fn idle_tick(&self, threshold: u32) -> IdleAction {
        self.with(|s| {
            s.idle_ticks = s.idle_ticks.saturating_add(1);
            if s.idle_ticks <= threshold {
                return IdleAction::None;
            }
            let cue = !s.idle_cue_played;
            s.idle_cue_played = true;
            IdleAction::PowerDown { cue }
        })
    }

    /// Wait until telemetry may have been enabled.
    pub async fn wait_wake(&self) {
        self.wake.wait().await;
    }

    /// Take the stream latch if telemetry should run and no stream holds it.
    pub fn claim_stream(&self) -> bool {
        self.with(|s| {
            if s.streaming || !(s.connected && s.subscription.active) {
                return false;
            }
            s.streaming = true;
            true
        })
    }

    /// Whether the stream holding the latch should send another packet.
    ///
    /// Once telemetry is off the latch is released in the same critical
    /// section, and the stream must exit.
    pub fn continue_stream(&self) -> bool {
        self.with(|s| {
            let keep = s.connected && s.subscription.active;
            if !keep {
                s.streaming = false;
            }
            keep
        })
    }

    pub fn is_streaming(&self) -> bool {
        self.with(|s| s.streaming)
    }
}
