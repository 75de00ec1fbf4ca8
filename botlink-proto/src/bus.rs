//! Block formats exchanged with the companion processor over the secondary bus.
//!
//! Actuator blocks reuse the wire opcodes: the companion processor accepts
//! set-all frames verbatim, so the controller mostly relays them.

use crate::command::{ActuatorSetAll, MobileLeds, Motors, MOTORS_LEN};
use crate::opcode::Opcode;
use crate::profile::DeviceProfile;
use heapless::Vec;

/// Largest actuator block written to the bus.
pub const MAX_ACTUATOR_BLOCK_LEN: usize = 20;

/// Bytes written with a single `write_actuator_block` call.
pub type ActuatorBlock = Vec<u8, MAX_ACTUATOR_BLOCK_LEN>;

fn block(bytes: &[u8]) -> ActuatorBlock {
    // Every block built here is at most MAX_ACTUATOR_BLOCK_LEN bytes.
    Vec::from_slice(bytes).unwrap_or_default()
}

/// Block halting every actuator behind the bus, if the profile has one.
#[must_use]
pub fn stop_block(profile: DeviceProfile) -> Option<ActuatorBlock> {
    match profile {
        DeviceProfile::Basic => None,
        DeviceProfile::ActuatorBoard => Some(block(&[Opcode::StopAll.byte()])),
        DeviceProfile::MobileRobot => Some(block(&[Opcode::MobileStopAll.byte()])),
    }
}

#[must_use]
pub fn actuator_set_all_block(set_all: &ActuatorSetAll) -> ActuatorBlock {
    block(set_all.frame())
}

#[must_use]
pub fn mobile_leds_block(leds: &MobileLeds) -> ActuatorBlock {
    block(leds.frame())
}

#[must_use]
pub fn motors_block(motors: &Motors) -> ActuatorBlock {
    let mut bytes = [0u8; 1 + MOTORS_LEN];
    bytes[0] = Opcode::MobileSetMotorsDisplay.byte();
    bytes[1..].copy_from_slice(&motors.to_payload());
    block(&bytes)
}

#[must_use]
pub fn reset_encoders_block() -> ActuatorBlock {
    block(&[Opcode::MobileResetEncoders.byte()])
}

/// Sensor block length read from the actuator board.
pub const ACTUATOR_SENSOR_BLOCK_LEN: usize = 4;

/// Sensor block length read from the mobile robot.
pub const MOBILE_SENSOR_BLOCK_LEN: usize = 16;

/// Index of the transfer status byte in the mobile sensor block.
pub const MOBILE_STATUS_INDEX: usize = 15;

/// Status values left behind by a transfer that was interrupted midway.
pub const TRANSFER_SENTINELS: [u8; 2] = [0xFF, 0x2C];

/// Three analog sensor ports and the battery monitor of the actuator board.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActuatorSensors {
    pub sensors: [u8; 3],
    pub battery: u8,
}

impl ActuatorSensors {
    #[must_use]
    pub const fn from_block(block: [u8; ACTUATOR_SENSOR_BLOCK_LEN]) -> Self {
        Self {
            sensors: [block[0], block[1], block[2]],
            battery: block[3],
        }
    }

    #[must_use]
    pub const fn fields(&self) -> [u8; 4] {
        [self.sensors[0], self.sensors[1], self.sensors[2], self.battery]
    }

    /// Largest absolute difference between corresponding fields.
    #[must_use]
    pub fn max_delta(&self, other: &Self) -> u8 {
        self.fields()
            .iter()
            .zip(other.fields().iter())
            .map(|(a, b)| a.abs_diff(*b))
            .max()
            .unwrap_or(0)
    }
}

/// Sensor block of the mobile robot.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MobileSensors {
    pub distance_raw: u16,
    pub light: [u8; 2],
    pub line: [u8; 2],
    /// 12-bit battery monitor reading.
    pub battery_raw: u16,
    /// 24-bit encoder counts.
    pub left_encoder: u32,
    pub right_encoder: u32,
    pub status: u8,
}

impl MobileSensors {
    #[must_use]
    pub const fn from_block(b: &[u8; MOBILE_SENSOR_BLOCK_LEN]) -> Self {
        Self {
            distance_raw: u16::from_be_bytes([b[0], b[1]]),
            light: [b[2], b[3]],
            line: [b[4], b[5]],
            battery_raw: u16::from_be_bytes([b[6], b[7]]),
            left_encoder: u32::from_be_bytes([0, b[8], b[9], b[10]]),
            right_encoder: u32::from_be_bytes([0, b[11], b[12], b[13]]),
            status: b[MOBILE_STATUS_INDEX],
        }
    }

    /// Whether the status byte marks an interrupted transfer.
    #[inline]
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        TRANSFER_SENTINELS.contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{WheelCommand, ACTUATOR_SET_ALL_LEN, MOBILE_SET_ALL_LEDS_LEN};

    #[test]
    fn test_stop_blocks() {
        assert!(stop_block(DeviceProfile::Basic).is_none());
        assert_eq!(stop_block(DeviceProfile::ActuatorBoard).unwrap().as_slice(), &[0xCB]);
        assert_eq!(stop_block(DeviceProfile::MobileRobot).unwrap().as_slice(), &[0xDF]);
    }

    #[test]
    fn test_set_all_frames_are_relayed_whole() {
        let mut frame = [7u8; ACTUATOR_SET_ALL_LEN];
        frame[0] = 0xCA;
        let set_all = ActuatorSetAll::from_frame(frame);
        assert_eq!(actuator_set_all_block(&set_all).as_slice(), &frame);

        let mut frame = [9u8; MOBILE_SET_ALL_LEDS_LEN];
        frame[0] = 0xD0;
        let leds = MobileLeds::from_frame(frame);
        assert_eq!(mobile_leds_block(&leds).as_slice(), &frame);
    }

    #[test]
    fn test_motors_block() {
        let motors = Motors {
            left: WheelCommand {
                speed: 0x80 | 20,
                ticks: 0x000102,
            },
            right: WheelCommand {
                speed: 20,
                ticks: 0,
            },
        };
        assert_eq!(
            motors_block(&motors).as_slice(),
            &[0xD2, 0x94, 0x00, 0x01, 0x02, 0x14, 0x00, 0x00, 0x00]
        );
        assert_eq!(reset_encoders_block().as_slice(), &[0xD5]);
    }

    #[test]
    fn test_actuator_sensors_delta() {
        let a = ActuatorSensors::from_block([10, 20, 30, 40]);
        let b = ActuatorSensors::from_block([10, 26, 30, 38]);
        assert_eq!(a.max_delta(&b), 6);
        assert_eq!(a.max_delta(&a), 0);
    }

    #[test]
    fn test_mobile_sensors_decode() {
        let block = [
            0x01, 0x2C, // distance 300
            11, 12, // light
            13, 14, // line
            0x0E, 0x10, // battery 3600
            0x00, 0x00, 0x05, // left encoder
            0x01, 0x00, 0x00, // right encoder
            0x00, // reserved
            0x00, // status
        ];
        let s = MobileSensors::from_block(&block);
        assert_eq!(s.distance_raw, 300);
        assert_eq!(s.light, [11, 12]);
        assert_eq!(s.line, [13, 14]);
        assert_eq!(s.battery_raw, 3600);
        assert_eq!(s.left_encoder, 5);
        assert_eq!(s.right_encoder, 0x010000);
        assert!(!s.is_interrupted());
    }

    #[test]
    fn test_transfer_sentinels() {
        for sentinel in TRANSFER_SENTINELS {
            let mut block = [0u8; MOBILE_SENSOR_BLOCK_LEN];
            block[MOBILE_STATUS_INDEX] = sentinel;
            assert!(MobileSensors::from_block(&block).is_interrupted());
        }
    }
}
