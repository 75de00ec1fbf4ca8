//! Typed commands produced by the frame decoder.

use crate::display::{Symbol, Text};

/// A fully decoded command, ready for the dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[must_use]
pub enum Command {
    Display(DisplayCommand),
    FirmwareInfo,
    Notifications(NotifyRequest),
    PinIo(PinIo),
    StopAll,
    Calibrate,
    ActuatorSetAll(ActuatorSetAll),
    /// Buzzer bytes of an actuator set-all received by a Basic controller.
    BasicBuzzer(Tone),
    MobileSetAllLeds(MobileLeds),
    MobileMotorsDisplay(MotorsDisplay),
    MobileStopAll,
    MobileResetEncoders,
}

/// What the display-write command asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayCommand {
    Clear,
    Symbol(Symbol),
    Scroll(Text),
}

/// Argument of the notifications command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NotifyRequest {
    Start(PacketVersion),
    Stop,
    /// Unrecognised argument byte; the frame is consumed but does nothing.
    Unknown(u8),
}

/// Telemetry packet layout negotiated by the notifications command.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PacketVersion {
    #[default]
    V1,
    /// Adds microphone level and temperature (and remaps mobile fields).
    V2,
}

/// Buzzer tone: period of the square wave and how long to play it.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tone {
    pub period_us: u16,
    pub duration_ms: u16,
}

impl Tone {
    pub const SILENT: Self = Self {
        period_us: 0,
        duration_ms: 0,
    };

    /// Decode `[period_hi, period_lo, duration_hi, duration_lo]`.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self {
            period_us: u16::from_be_bytes([bytes[0], bytes[1]]),
            duration_ms: u16::from_be_bytes([bytes[2], bytes[3]]),
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_silent(self) -> bool {
        self.period_us == 0 || self.duration_ms == 0
    }
}

/// Edge-connector pin mode requested by the raw pin command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinMode {
    Unchanged,
    DigitalOut,
    PwmOut,
    DigitalIn,
    AnalogIn,
    Servo,
}

impl PinMode {
    /// Decode a mode byte; unknown modes leave the pin unchanged.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            1 => PinMode::DigitalOut,
            2 => PinMode::PwmOut,
            3 => PinMode::DigitalIn,
            4 => PinMode::AnalogIn,
            5 => PinMode::Servo,
            _ => PinMode::Unchanged,
        }
    }
}

/// Number of edge-connector pins addressable by the raw pin command.
pub const EDGE_PINS: usize = 3;

/// One pin's requested mode and output value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinSetting {
    pub mode: PinMode,
    pub value: u8,
}

/// Raw edge-connector configuration (Basic profile).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinIo {
    pub pins: [PinSetting; EDGE_PINS],
}

impl PinIo {
    /// Decode the seven payload bytes: three `(mode, value)` pairs and a
    /// reserved byte.
    #[must_use]
    pub fn from_payload(payload: &[u8; 7]) -> Self {
        let pin = |i: usize| PinSetting {
            mode: PinMode::from_byte(payload[2 * i]),
            value: payload[2 * i + 1],
        };
        Self {
            pins: [pin(0), pin(1), pin(2)],
        }
    }
}

/// Red/green/blue intensities of a tri-colour LED.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    #[must_use]
    pub const fn from_slice(bytes: &[u8]) -> Self {
        Self {
            r: bytes[0],
            g: bytes[1],
            b: bytes[2],
        }
    }
}

/// Length of the actuator-board set-all frame (opcode included).
pub const ACTUATOR_SET_ALL_LEN: usize = 19;

/// LEDs, servos and buzzer of the actuator board.
///
/// The raw frame is kept because the coprocessor on the actuator board
/// accepts it unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActuatorSetAll {
    frame: [u8; ACTUATOR_SET_ALL_LEN],
}

impl ActuatorSetAll {
    #[must_use]
    pub const fn from_frame(frame: [u8; ACTUATOR_SET_ALL_LEN]) -> Self {
        Self { frame }
    }

    #[inline]
    #[must_use]
    pub const fn frame(&self) -> &[u8; ACTUATOR_SET_ALL_LEN] {
        &self.frame
    }

    #[must_use]
    pub const fn leds(&self) -> [u8; 3] {
        [self.frame[1], self.frame[2], self.frame[3]]
    }

    #[must_use]
    pub fn tri_leds(&self) -> [Rgb; 2] {
        [Rgb::from_slice(&self.frame[4..7]), Rgb::from_slice(&self.frame[7..10])]
    }

    #[must_use]
    pub const fn servos(&self) -> [u8; 4] {
        [self.frame[10], self.frame[11], self.frame[12], self.frame[13]]
    }

    /// Buzzer tone carried in the trailing four bytes.
    #[must_use]
    pub const fn tone(&self) -> Tone {
        trailing_tone(&self.frame)
    }
}

/// Length of the mobile-robot set-all-LEDs frame (opcode included).
pub const MOBILE_SET_ALL_LEDS_LEN: usize = 20;

/// Beak/tail LEDs and buzzer of the mobile robot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MobileLeds {
    frame: [u8; MOBILE_SET_ALL_LEDS_LEN],
}

impl MobileLeds {
    #[must_use]
    pub const fn from_frame(frame: [u8; MOBILE_SET_ALL_LEDS_LEN]) -> Self {
        Self { frame }
    }

    #[inline]
    #[must_use]
    pub const fn frame(&self) -> &[u8; MOBILE_SET_ALL_LEDS_LEN] {
        &self.frame
    }

    #[must_use]
    pub fn beak(&self) -> Rgb {
        Rgb::from_slice(&self.frame[1..4])
    }

    #[must_use]
    pub fn tail(&self) -> [Rgb; 4] {
        let at = |i: usize| Rgb::from_slice(&self.frame[4 + 3 * i..7 + 3 * i]);
        [at(0), at(1), at(2), at(3)]
    }

    #[must_use]
    pub const fn tone(&self) -> Tone {
        trailing_tone(&self.frame)
    }
}

const fn trailing_tone<const N: usize>(frame: &[u8; N]) -> Tone {
    Tone::from_bytes([frame[N - 4], frame[N - 3], frame[N - 2], frame[N - 1]])
}

/// Bytes carrying both wheel commands.
pub const MOTORS_LEN: usize = 8;

/// Direction bit of a wheel speed byte (set = forward).
pub const WHEEL_FORWARD: u8 = 0x80;

/// Speed and travel distance for one wheel.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WheelCommand {
    /// Bit 7 is direction, bits 6..0 the magnitude.
    pub speed: u8,
    /// 24-bit encoder distance; 0 runs until told otherwise.
    pub ticks: u32,
}

impl WheelCommand {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self {
            speed: bytes[0],
            ticks: u32::from_be_bytes([0, bytes[1], bytes[2], bytes[3]]),
        }
    }

    #[must_use]
    pub const fn to_bytes(self) -> [u8; 4] {
        let t = self.ticks.to_be_bytes();
        [self.speed, t[1], t[2], t[3]]
    }

    #[inline]
    #[must_use]
    pub const fn is_forward(self) -> bool {
        self.speed & WHEEL_FORWARD != 0
    }

    #[inline]
    #[must_use]
    pub const fn magnitude(self) -> u8 {
        self.speed & !WHEEL_FORWARD
    }
}

/// Both wheels of the mobile robot.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Motors {
    pub left: WheelCommand,
    pub right: WheelCommand,
}

impl Motors {
    #[must_use]
    pub const fn from_payload(bytes: &[u8; MOTORS_LEN]) -> Self {
        Self {
            left: WheelCommand::from_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            right: WheelCommand::from_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }

    #[must_use]
    pub const fn to_payload(self) -> [u8; MOTORS_LEN] {
        let l = self.left.to_bytes();
        let r = self.right.to_bytes();
        [l[0], l[1], l[2], l[3], r[0], r[1], r[2], r[3]]
    }
}

/// Mode-selected payload of the mobile motors/display command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorsDisplay {
    Print(Text),
    Symbol(Symbol),
    Motors(Motors),
    MotorsSymbol(Motors, Symbol),
    MotorsPrint(Motors, Text),
}

impl MotorsDisplay {
    /// Motor part of the command, if any.
    #[must_use]
    pub const fn motors(&self) -> Option<Motors> {
        match self {
            MotorsDisplay::Motors(m)
            | MotorsDisplay::MotorsSymbol(m, _)
            | MotorsDisplay::MotorsPrint(m, _) => Some(*m),
            MotorsDisplay::Print(_) | MotorsDisplay::Symbol(_) => None,
        }
    }

    /// Display part of the command, if any.
    #[must_use]
    pub const fn display(&self) -> Option<DisplayCommand> {
        match self {
            MotorsDisplay::Print(t) | MotorsDisplay::MotorsPrint(_, t) => {
                Some(DisplayCommand::Scroll(*t))
            }
            MotorsDisplay::Symbol(s) | MotorsDisplay::MotorsSymbol(_, s) => {
                Some(DisplayCommand::Symbol(*s))
            }
            MotorsDisplay::Motors(_) => None,
        }
    }
}
