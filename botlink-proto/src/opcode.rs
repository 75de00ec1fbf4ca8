//! Command opcodes and the argument constants that travel with them.

/// Leading byte of every command frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Opcode {
    /// Set or clear the 5x5 display (symbol, scroll text or clear).
    DisplayWrite = 0xCC,
    /// Request the static version/hardware-id reply.
    FirmwareInfo = 0xCF,
    /// Start (v1/v2) or stop telemetry notifications.
    Notifications = 0x62,
    /// Configure edge-connector pins directly (Basic only).
    RawPinIo = 0x90,
    /// Halt every output.
    StopAll = 0xCB,
    /// Run the compass calibration routine.
    Calibrate = 0xCE,
    /// LEDs, servos and buzzer of the actuator board in one frame.
    ActuatorSetAll = 0xCA,
    /// Beak and tail LEDs plus buzzer of the mobile robot.
    MobileSetAllLeds = 0xD0,
    /// Motors and/or display of the mobile robot, selected by a mode field.
    MobileSetMotorsDisplay = 0xD2,
    /// Halt motors, LEDs and buzzer of the mobile robot.
    MobileStopAll = 0xDF,
    /// Zero the wheel encoders of the mobile robot.
    MobileResetEncoders = 0xD5,
}

impl Opcode {
    /// Every opcode, in routing-table row order.
    pub const ALL: [Opcode; 11] = [
        Opcode::DisplayWrite,
        Opcode::FirmwareInfo,
        Opcode::Notifications,
        Opcode::RawPinIo,
        Opcode::StopAll,
        Opcode::Calibrate,
        Opcode::ActuatorSetAll,
        Opcode::MobileSetAllLeds,
        Opcode::MobileSetMotorsDisplay,
        Opcode::MobileStopAll,
        Opcode::MobileResetEncoders,
    ];

    /// Raw wire value.
    #[inline]
    #[must_use]
    pub const fn byte(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Ok(match byte {
            0xCC => Opcode::DisplayWrite,
            0xCF => Opcode::FirmwareInfo,
            0x62 => Opcode::Notifications,
            0x90 => Opcode::RawPinIo,
            0xCB => Opcode::StopAll,
            0xCE => Opcode::Calibrate,
            0xCA => Opcode::ActuatorSetAll,
            0xD0 => Opcode::MobileSetAllLeds,
            0xD2 => Opcode::MobileSetMotorsDisplay,
            0xDF => Opcode::MobileStopAll,
            0xD5 => Opcode::MobileResetEncoders,
            other => return Err(other),
        })
    }
}

// Notifications argument byte.

/// Start notifications with the v1 packet layout.
pub const START_NOTIFY: u8 = 0x67;
/// Start notifications with the v2 packet layout (microphone powered).
pub const START_NOTIFY_V2: u8 = 0x70;
/// Stop notifications.
pub const STOP_NOTIFY: u8 = 0x73;

// DisplayWrite sub-mode byte.

/// Sub-mode bit: the frame carries a 4-byte symbol bitmap.
pub const DISPLAY_SYMBOL: u8 = 0x80;
/// Sub-mode bit: the frame carries scroll text, length in the low bits.
pub const DISPLAY_SCROLL: u8 = 0x40;
/// Mask of the scroll-text length field.
pub const DISPLAY_LENGTH_MASK: u8 = 0x1F;

// MobileSetMotorsDisplay mode byte (bits 7..5), text length in bits 3..0.

pub const MODE_PRINT: u8 = 0b001;
pub const MODE_SYMBOL: u8 = 0b010;
pub const MODE_MOTORS: u8 = 0b011;
pub const MODE_MOTORS_SYMBOL: u8 = 0b100;
pub const MODE_MOTORS_PRINT: u8 = 0b101;
/// Shift of the mode field inside the mode byte.
pub const MODE_SHIFT: u8 = 5;
/// Mask of the text-length nibble inside the mode byte.
pub const MODE_LENGTH_MASK: u8 = 0x0F;

/// Maximum number of padding bytes accepted after the single-byte
/// stop-all and calibrate commands.
pub const MAX_PADDING: usize = 3;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_byte_roundtrip() {
        for opcode in Opcode::ALL {
            assert_eq!(Opcode::try_from(opcode.byte()), Ok(opcode));
        }
    }

    #[test]
    fn test_unknown_opcode() {
        assert_eq!(Opcode::try_from(0x00), Err(0x00));
        assert_eq!(Opcode::try_from(0x67), Err(0x67));
    }
}
