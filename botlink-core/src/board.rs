//! On-board peripherals of the controller: display, edge connector, speaker
//! and the primary sensor package.
//!
//! These are thin wrappers owned by the board crate. Everything here is
//! synchronous except the operations that take human-scale time.

use botlink_proto::command::EDGE_PINS;
use botlink_proto::{MotionReading, PinIo, Symbol, Text, Tone};
use core::future::Future;

/// 5x5 LED matrix.
pub trait Display {
    fn show_symbol(&mut self, symbol: Symbol);

    /// Start scrolling `text`; returns immediately.
    fn scroll_text(&mut self, text: &Text);

    fn clear(&mut self);
}

/// The three general-purpose edge-connector pins.
pub trait EdgeConnector {
    /// Apply a raw pin configuration. Pins marked unchanged are left alone.
    fn apply_pins(&mut self, pins: &PinIo);

    /// Current analog level of each pin, scaled to a byte.
    fn read_pins(&mut self) -> [u8; EDGE_PINS];

    /// Return every pin to a high-impedance input.
    fn release_pins(&mut self);
}

/// Audible feedback for connection changes and the idle power-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Cue {
    Connected,
    Disconnected,
    IdleShutdown,
}

/// Buzzer on the controller board.
pub trait Speaker {
    /// Start a tone; a zero duration plays until [`stop_tone`](Self::stop_tone).
    fn play_tone(&mut self, tone: Tone);

    fn stop_tone(&mut self);

    /// Play a short melody to completion.
    fn play_cue(&mut self, cue: Cue) -> impl Future<Output = ()>;
}

/// Accelerometer, magnetometer, buttons, microphone and die temperature.
pub trait MotionSensors {
    fn read_motion(&mut self) -> MotionReading;

    /// Die temperature in °C.
    fn temperature(&mut self) -> i16;

    fn sound_level(&mut self) -> u8;

    fn set_microphone(&mut self, enabled: bool);

    /// Run the interactive compass calibration and report whether it
    /// succeeded. Takes as long as the user needs.
    fn calibrate_compass(&mut self) -> impl Future<Output = bool>;
}

/// Every on-board peripheral the engine drives.
pub trait Board: Display + EdgeConnector + Speaker + MotionSensors {}

impl<T: Display + EdgeConnector + Speaker + MotionSensors> Board for T {}
