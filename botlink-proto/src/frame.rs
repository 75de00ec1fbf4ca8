//! Frame decoder: recovers command boundaries from an undelimited byte buffer.
//!
//! Frames are concatenated with no separator, so each boundary is found by
//! interpreting the opcode's static or payload-derived length. The decoder
//! never reads past the end of the buffer and always advances by at least
//! one byte per step:
//!
//! - unknown or profile-inapplicable opcode: skip one byte, continue
//! - malformed frame (bad length field or mode): skip one byte, continue
//! - frame longer than the remaining bytes: skip one byte, stop
//!
//! # Example
//!
//! ```
//! use botlink_proto::{Command, Decoded, DeviceProfile, FrameDecoder};
//!
//! // firmware-info, then stop-all with three padding bytes
//! let buf = [0xCF, 0xCB, 0x00, 0x00, 0x00];
//! let mut decoder = FrameDecoder::new(&buf, DeviceProfile::Basic);
//!
//! assert!(matches!(
//!     decoder.next(),
//!     Some(Decoded::Command { command: Command::FirmwareInfo, .. })
//! ));
//! assert!(matches!(
//!     decoder.next(),
//!     Some(Decoded::Command { command: Command::StopAll, len: 4, .. })
//! ));
//! assert!(decoder.next().is_none());
//! assert_eq!(decoder.consumed(), buf.len());
//! ```

use crate::command::{
    ActuatorSetAll, Command, DisplayCommand, MobileLeds, Motors, MotorsDisplay, NotifyRequest,
    PacketVersion, PinIo, ACTUATOR_SET_ALL_LEN, MOBILE_SET_ALL_LEDS_LEN, MOTORS_LEN,
};
use crate::display::{Symbol, Text, MAX_SCROLL_LEN, SYMBOL_LEN};
use crate::opcode::*;
use crate::profile::DeviceProfile;
use crate::route::{route, Route};

/// Longest frame the protocol can produce (motors + 15 bytes of text).
pub const MAX_FRAME_LEN: usize = 2 + MOTORS_LEN + MODE_LENGTH_MASK as usize;

/// Length of the raw pin command frame.
pub const PIN_IO_LEN: usize = 8;

/// Length of the notifications command frame.
pub const NOTIFICATIONS_LEN: usize = 2;

/// Why a frame could not be taken from the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// The frame needs more bytes than remain in the buffer.
    Incomplete { needed: usize, available: usize },
    /// A length or mode field holds an impossible value.
    Malformed,
}

/// Why the decoder stepped over a byte without producing a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SkipReason {
    UnknownOpcode(u8),
    /// Valid opcode for another device profile.
    NotApplicable(Opcode),
    Malformed(Opcode),
    /// Truncated frame at the buffer tail; decoding stops here and the bytes
    /// from `offset` on belong to the next buffer.
    Incomplete {
        opcode: Opcode,
        needed: usize,
        available: usize,
    },
}

/// One decoder step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Decoded {
    /// A complete frame of `len` bytes starting at `offset`.
    Command {
        offset: usize,
        len: usize,
        command: Command,
    },
    /// The byte at `offset` was skipped.
    Skipped { offset: usize, reason: SkipReason },
}

/// Iterator over the frames of one inbound buffer.
pub struct FrameDecoder<'a> {
    buf: &'a [u8],
    cursor: usize,
    profile: DeviceProfile,
    stopped: bool,
}

impl<'a> FrameDecoder<'a> {
    #[must_use]
    pub fn new(buf: &'a [u8], profile: DeviceProfile) -> Self {
        Self {
            buf,
            cursor: 0,
            profile,
            stopped: false,
        }
    }

    /// Bytes consumed so far, including skipped ones.
    #[inline]
    #[must_use]
    pub fn consumed(&self) -> usize {
        self.cursor
    }

    /// Bytes neither consumed nor skipped.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        &self.buf[self.cursor..]
    }

    fn skip(&mut self, offset: usize, reason: SkipReason) -> Decoded {
        self.cursor = offset + 1;
        Decoded::Skipped { offset, reason }
    }
}

impl Iterator for FrameDecoder<'_> {
    type Item = Decoded;

    fn next(&mut self) -> Option<Decoded> {
        if self.stopped || self.cursor >= self.buf.len() {
            return None;
        }

        let offset = self.cursor;
        let rest = &self.buf[offset..];

        let opcode = match Opcode::try_from(rest[0]) {
            Ok(opcode) => opcode,
            Err(byte) => return Some(self.skip(offset, SkipReason::UnknownOpcode(byte))),
        };
        let Some(route) = route(opcode, self.profile) else {
            return Some(self.skip(offset, SkipReason::NotApplicable(opcode)));
        };

        let len = match frame_len(route, rest) {
            Ok(len) if len <= rest.len() => len,
            Ok(needed) | Err(FrameError::Incomplete { needed, .. }) => {
                self.stopped = true;
                let available = rest.len();
                return Some(self.skip(
                    offset,
                    SkipReason::Incomplete {
                        opcode,
                        needed,
                        available,
                    },
                ));
            }
            Err(FrameError::Malformed) => {
                return Some(self.skip(offset, SkipReason::Malformed(opcode)));
            }
        };

        match parse_frame(route, &rest[..len]) {
            Ok(command) => {
                self.cursor = offset + len;
                Some(Decoded::Command {
                    offset,
                    len,
                    command,
                })
            }
            Err(_) => Some(self.skip(offset, SkipReason::Malformed(opcode))),
        }
    }
}

/// Second byte of the frame, needed by the payload-dependent lengths.
#[inline]
fn header(bytes: &[u8]) -> Result<u8, FrameError> {
    bytes.get(1).copied().ok_or(FrameError::Incomplete {
        needed: 2,
        available: bytes.len(),
    })
}

/// Length of the frame starting at `bytes[0]` for the given route.
///
/// Payload-dependent lengths read the second byte; if it is missing the
/// result is [`FrameError::Incomplete`]. The returned length may exceed
/// `bytes.len()`.
pub fn frame_len(route: Route, bytes: &[u8]) -> Result<usize, FrameError> {
    Ok(match route {
        Route::Display => display_frame_len(header(bytes)?)?,
        Route::FirmwareInfo | Route::MobileStopAll | Route::MobileResetEncoders => 1,
        Route::Notifications => NOTIFICATIONS_LEN,
        Route::PinIo => PIN_IO_LEN,
        Route::StopAll | Route::Calibrate => 1 + padding_len(bytes.get(1..).unwrap_or(&[])),
        Route::ActuatorSetAll | Route::BasicBuzzer => ACTUATOR_SET_ALL_LEN,
        Route::MobileSetAllLeds => MOBILE_SET_ALL_LEDS_LEN,
        Route::MobileMotorsDisplay => motors_display_frame_len(header(bytes)?)?,
    })
}

fn display_frame_len(sub_mode: u8) -> Result<usize, FrameError> {
    if sub_mode & DISPLAY_SYMBOL != 0 {
        Ok(2 + SYMBOL_LEN)
    } else if sub_mode & DISPLAY_SCROLL != 0 {
        let n = (sub_mode & DISPLAY_LENGTH_MASK) as usize;
        if n > MAX_SCROLL_LEN {
            return Err(FrameError::Malformed);
        }
        Ok(2 + n)
    } else {
        Ok(2)
    }
}

fn motors_display_frame_len(mode_byte: u8) -> Result<usize, FrameError> {
    let n = (mode_byte & MODE_LENGTH_MASK) as usize;
    Ok(match mode_byte >> MODE_SHIFT {
        MODE_PRINT => 2 + n,
        MODE_SYMBOL => 2 + SYMBOL_LEN,
        MODE_MOTORS => 2 + MOTORS_LEN,
        MODE_MOTORS_SYMBOL => 2 + MOTORS_LEN + SYMBOL_LEN,
        MODE_MOTORS_PRINT => 2 + MOTORS_LEN + n,
        _ => return Err(FrameError::Malformed),
    })
}

/// Zero bytes trailing a single-byte command, up to [`MAX_PADDING`].
fn padding_len(after: &[u8]) -> usize {
    after
        .iter()
        .take(MAX_PADDING)
        .take_while(|&&b| b == 0)
        .count()
}

fn array<const N: usize>(bytes: &[u8]) -> Result<[u8; N], FrameError> {
    bytes.try_into().map_err(|_| FrameError::Malformed)
}

fn text(bytes: &[u8]) -> Result<Text, FrameError> {
    Text::new(bytes).ok_or(FrameError::Malformed)
}

/// Decode a frame of exactly [`frame_len`] bytes into a [`Command`].
pub fn parse_frame(route: Route, frame: &[u8]) -> Result<Command, FrameError> {
    Ok(match route {
        Route::Display => Command::Display(parse_display(frame)?),
        Route::FirmwareInfo => Command::FirmwareInfo,
        Route::Notifications => Command::Notifications(match header(frame)? {
            START_NOTIFY => NotifyRequest::Start(PacketVersion::V1),
            START_NOTIFY_V2 => NotifyRequest::Start(PacketVersion::V2),
            STOP_NOTIFY => NotifyRequest::Stop,
            other => NotifyRequest::Unknown(other),
        }),
        Route::PinIo => {
            let payload = frame.get(1..PIN_IO_LEN).ok_or(FrameError::Malformed)?;
            Command::PinIo(PinIo::from_payload(&array(payload)?))
        }
        Route::StopAll => Command::StopAll,
        Route::Calibrate => Command::Calibrate,
        Route::ActuatorSetAll => Command::ActuatorSetAll(ActuatorSetAll::from_frame(array(frame)?)),
        Route::BasicBuzzer => {
            Command::BasicBuzzer(ActuatorSetAll::from_frame(array(frame)?).tone())
        }
        Route::MobileSetAllLeds => Command::MobileSetAllLeds(MobileLeds::from_frame(array(frame)?)),
        Route::MobileMotorsDisplay => Command::MobileMotorsDisplay(parse_motors_display(frame)?),
        Route::MobileStopAll => Command::MobileStopAll,
        Route::MobileResetEncoders => Command::MobileResetEncoders,
    })
}

fn parse_display(frame: &[u8]) -> Result<DisplayCommand, FrameError> {
    let sub_mode = header(frame)?;
    let payload = &frame[2..];
    if sub_mode & DISPLAY_SYMBOL != 0 {
        Ok(DisplayCommand::Symbol(Symbol::from_payload(array(payload)?)))
    } else if sub_mode & DISPLAY_SCROLL != 0 {
        Ok(DisplayCommand::Scroll(text(payload)?))
    } else {
        Ok(DisplayCommand::Clear)
    }
}

fn parse_motors_display(frame: &[u8]) -> Result<MotorsDisplay, FrameError> {
    let mode_byte = header(frame)?;
    let payload = &frame[2..];
    let motors = || -> Result<Motors, FrameError> {
        let bytes = payload.get(..MOTORS_LEN).ok_or(FrameError::Malformed)?;
        Ok(Motors::from_payload(&array(bytes)?))
    };
    let after_motors = payload.get(MOTORS_LEN..).unwrap_or(&[]);

    Ok(match mode_byte >> MODE_SHIFT {
        MODE_PRINT => MotorsDisplay::Print(text(payload)?),
        MODE_SYMBOL => MotorsDisplay::Symbol(Symbol::from_payload(array(payload)?)),
        MODE_MOTORS => MotorsDisplay::Motors(motors()?),
        MODE_MOTORS_SYMBOL => {
            MotorsDisplay::MotorsSymbol(motors()?, Symbol::from_payload(array(after_motors)?))
        }
        MODE_MOTORS_PRINT => MotorsDisplay::MotorsPrint(motors()?, text(after_motors)?),
        _ => return Err(FrameError::Malformed),
    })
}
