//! Telemetry packet layouts.
//!
//! Layout and length depend on the device profile and the packet version
//! negotiated by the notifications command.
//!
//! | Profile | v1 | v2 |
//! |---------|----|----|
//! | Basic / Actuator-Board | 14 bytes | 16 bytes (+ sound, temperature) |
//! | Mobile-Robot | 20 bytes | 20 bytes (fields remapped) |

use crate::bus::{ActuatorSensors, MobileSensors};
use crate::command::{PacketVersion, EDGE_PINS};
use crate::profile::DeviceProfile;

pub const PACKET_LEN_V1: usize = 14;
pub const PACKET_LEN_V2: usize = 16;
pub const MOBILE_PACKET_LEN: usize = 20;
pub const MAX_PACKET_LEN: usize = MOBILE_PACKET_LEN;

/// Index of the status byte in Basic / Actuator-Board packets.
pub const STATUS_INDEX: usize = 7;
/// Index of the status byte in Mobile-Robot packets.
pub const MOBILE_PACKET_STATUS_INDEX: usize = 16;

// Status byte bits.
pub const STATUS_SHAKE: u8 = 0x01;
pub const STATUS_CALIBRATION_OK: u8 = 0x04;
pub const STATUS_CALIBRATION_FAILED: u8 = 0x08;
pub const STATUS_BUTTON_A: u8 = 0x10;
pub const STATUS_BUTTON_B: u8 = 0x20;

/// Battery byte reported by a Basic controller, which has no monitor.
pub const NO_BATTERY: u8 = 0xFF;

/// Highest temperature representable in the packed fields.
pub const MAX_REPORTED_TEMPERATURE: i16 = 63;

/// Battery thresholds in millivolts, lowest first.
pub const BATTERY_THRESHOLDS_MV: [u32; 3] = [3373, 3514, 3800];

/// Packet length for a profile and version.
#[must_use]
pub const fn packet_len(profile: DeviceProfile, version: PacketVersion) -> usize {
    match (profile, version) {
        (DeviceProfile::MobileRobot, _) => MOBILE_PACKET_LEN,
        (_, PacketVersion::V1) => PACKET_LEN_V1,
        (_, PacketVersion::V2) => PACKET_LEN_V2,
    }
}

/// Result of the last compass calibration attempt.
///
/// Sticky: every packet reports it until the next attempt replaces it.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationOutcome {
    pub attempted: bool,
    pub succeeded: bool,
}

impl CalibrationOutcome {
    #[must_use]
    pub const fn finished(succeeded: bool) -> Self {
        Self {
            attempted: true,
            succeeded,
        }
    }

    /// Status bits for this outcome; none before the first attempt.
    #[must_use]
    pub const fn status_bits(self) -> u8 {
        if !self.attempted {
            0
        } else if self.succeeded {
            STATUS_CALIBRATION_OK
        } else {
            STATUS_CALIBRATION_FAILED
        }
    }
}

/// Readings from the primary sensor package, always available.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionReading {
    pub accel: [i8; 3],
    pub mag: [i16; 3],
    pub button_a: bool,
    pub button_b: bool,
    pub shaken: bool,
}

impl MotionReading {
    /// Button and gesture bits of the status byte.
    #[must_use]
    pub const fn status_bits(&self) -> u8 {
        let mut bits = 0;
        if self.shaken {
            bits |= STATUS_SHAKE;
        }
        if self.button_a {
            bits |= STATUS_BUTTON_A;
        }
        if self.button_b {
            bits |= STATUS_BUTTON_B;
        }
        bits
    }
}

/// Profile-specific sensor readings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SecondaryReading {
    /// Analog levels of the edge-connector pins (Basic).
    EdgePins([u8; EDGE_PINS]),
    ActuatorBoard(ActuatorSensors),
    MobileRobot(MobileSensors),
}

impl SecondaryReading {
    #[must_use]
    pub const fn profile(&self) -> DeviceProfile {
        match self {
            SecondaryReading::EdgePins(_) => DeviceProfile::Basic,
            SecondaryReading::ActuatorBoard(_) => DeviceProfile::ActuatorBoard,
            SecondaryReading::MobileRobot(_) => DeviceProfile::MobileRobot,
        }
    }
}

/// Everything a telemetry packet is built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorSnapshot {
    pub secondary: SecondaryReading,
    pub motion: MotionReading,
    /// Microphone level; only reported in v2 packets.
    pub sound_level: u8,
    /// Die temperature in °C; only reported in v2 packets.
    pub temperature_c: i16,
    pub calibration: CalibrationOutcome,
}

/// Temperature clamped into the 6-bit packed range.
#[inline]
#[must_use]
pub fn clamp_temperature(celsius: i16) -> u8 {
    celsius.clamp(0, MAX_REPORTED_TEMPERATURE) as u8
}

/// Raw distance reading converted to centimetres, saturating at 255.
#[inline]
#[must_use]
pub fn distance_cm(raw: u16) -> u8 {
    (u32::from(raw) * 919 / 10_000).min(255) as u8
}

/// Battery voltage in millivolts from the 12-bit monitor reading.
#[inline]
#[must_use]
pub fn battery_millivolts(raw: u16) -> u32 {
    (u32::from(raw) + 320) * 937 / 1000
}

/// Battery state 0..=3: how many thresholds the voltage reaches.
#[must_use]
pub fn battery_level(raw: u16) -> u8 {
    let mv = battery_millivolts(raw);
    BATTERY_THRESHOLDS_MV.iter().filter(|&&t| mv >= t).count() as u8
}

/// An assembled telemetry packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TelemetryPacket {
    bytes: [u8; MAX_PACKET_LEN],
    len: usize,
}

impl TelemetryPacket {
    /// Lay out `snapshot` for the given packet version.
    ///
    /// The profile is implied by the kind of secondary reading.
    #[must_use]
    pub fn build(version: PacketVersion, snapshot: &SensorSnapshot) -> Self {
        let profile = snapshot.secondary.profile();
        let mut packet = Self {
            bytes: [0; MAX_PACKET_LEN],
            len: packet_len(profile, version),
        };
        match snapshot.secondary {
            SecondaryReading::EdgePins(pins) => {
                packet.fill_standard(version, snapshot, pins, NO_BATTERY)
            }
            SecondaryReading::ActuatorBoard(s) => {
                packet.fill_standard(version, snapshot, s.sensors, s.battery)
            }
            SecondaryReading::MobileRobot(s) => packet.fill_mobile(version, snapshot, &s),
        }
        packet
    }

    fn status(snapshot: &SensorSnapshot) -> u8 {
        snapshot.motion.status_bits() | snapshot.calibration.status_bits()
    }

    fn fill_standard(
        &mut self,
        version: PacketVersion,
        snapshot: &SensorSnapshot,
        sensors: [u8; 3],
        battery: u8,
    ) {
        let b = &mut self.bytes;
        let motion = &snapshot.motion;
        b[0..3].copy_from_slice(&sensors);
        b[3] = battery;
        for (i, a) in motion.accel.iter().enumerate() {
            b[4 + i] = *a as u8;
        }
        b[STATUS_INDEX] = Self::status(snapshot);
        for (i, m) in motion.mag.iter().enumerate() {
            b[8 + 2 * i..10 + 2 * i].copy_from_slice(&m.to_be_bytes());
        }
        if version == PacketVersion::V2 {
            b[14] = snapshot.sound_level;
            b[15] = clamp_temperature(snapshot.temperature_c);
        }
    }

    fn fill_mobile(
        &mut self,
        version: PacketVersion,
        snapshot: &SensorSnapshot,
        s: &MobileSensors,
    ) {
        let b = &mut self.bytes;
        let motion = &snapshot.motion;
        b[2..4].copy_from_slice(&s.light);
        b[4..6].copy_from_slice(&s.line);
        b[7..10].copy_from_slice(&s.left_encoder.to_be_bytes()[1..]);
        b[10..13].copy_from_slice(&s.right_encoder.to_be_bytes()[1..]);
        for (i, a) in motion.accel.iter().enumerate() {
            b[13 + i] = *a as u8;
        }
        b[MOBILE_PACKET_STATUS_INDEX] = Self::status(snapshot);
        for (i, m) in motion.mag.iter().enumerate() {
            b[17 + i] = (*m >> 8) as u8;
        }

        match version {
            PacketVersion::V1 => {
                b[0..2].copy_from_slice(&s.distance_raw.to_be_bytes());
                b[6] = (s.battery_raw >> 4).min(0xFF) as u8;
            }
            PacketVersion::V2 => {
                b[0] = distance_cm(s.distance_raw);
                b[1] = snapshot.sound_level;
                b[6] = (battery_level(s.battery_raw) << 6)
                    | clamp_temperature(snapshot.temperature_c);
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn motion() -> MotionReading {
        MotionReading {
            accel: [-1, 2, -64],
            mag: [0x0102, -2, 300],
            button_a: true,
            button_b: false,
            shaken: true,
        }
    }

    fn snapshot(secondary: SecondaryReading) -> SensorSnapshot {
        SensorSnapshot {
            secondary,
            motion: motion(),
            sound_level: 77,
            temperature_c: 25,
            calibration: CalibrationOutcome::default(),
        }
    }

    fn mobile_sensors() -> MobileSensors {
        MobileSensors {
            distance_raw: 1000,
            light: [5, 6],
            line: [7, 8],
            battery_raw: 3600,
            left_encoder: 0x0A0B0C,
            right_encoder: 0x0D0E0F,
            status: 0,
        }
    }

    #[test]
    fn test_packet_lengths() {
        assert_eq!(packet_len(DeviceProfile::Basic, PacketVersion::V1), 14);
        assert_eq!(packet_len(DeviceProfile::Basic, PacketVersion::V2), 16);
        assert_eq!(packet_len(DeviceProfile::ActuatorBoard, PacketVersion::V2), 16);
        assert_eq!(packet_len(DeviceProfile::MobileRobot, PacketVersion::V1), 20);
        assert_eq!(packet_len(DeviceProfile::MobileRobot, PacketVersion::V2), 20);
    }

    #[test]
    fn test_basic_v1_layout() {
        let snap = snapshot(SecondaryReading::EdgePins([1, 2, 3]));
        let packet = TelemetryPacket::build(PacketVersion::V1, &snap);
        assert_eq!(
            packet.as_bytes(),
            &[
                1, 2, 3, NO_BATTERY, // pins, battery
                0xFF, 0x02, 0xC0, // accel
                STATUS_SHAKE | STATUS_BUTTON_A,
                0x01, 0x02, 0xFF, 0xFE, 0x01, 0x2C, // magnetometer
            ]
        );
    }

    #[test]
    fn test_actuator_v2_appends_sound_and_temperature() {
        let sensors = ActuatorSensors::from_block([9, 8, 7, 200]);
        let mut snap = snapshot(SecondaryReading::ActuatorBoard(sensors));
        snap.temperature_c = 90;
        let packet = TelemetryPacket::build(PacketVersion::V2, &snap);
        let bytes = packet.as_bytes();
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[0..4], &[9, 8, 7, 200]);
        assert_eq!(bytes[14], 77);
        assert_eq!(bytes[15], 63);
    }

    #[test]
    fn test_calibration_bits() {
        let mut snap = snapshot(SecondaryReading::EdgePins([0; 3]));
        snap.motion = MotionReading::default();

        let packet = TelemetryPacket::build(PacketVersion::V1, &snap);
        assert_eq!(packet.as_bytes()[STATUS_INDEX], 0);

        snap.calibration = CalibrationOutcome::finished(true);
        let packet = TelemetryPacket::build(PacketVersion::V1, &snap);
        assert_eq!(packet.as_bytes()[STATUS_INDEX], STATUS_CALIBRATION_OK);

        snap.calibration = CalibrationOutcome::finished(false);
        let packet = TelemetryPacket::build(PacketVersion::V1, &snap);
        assert_eq!(packet.as_bytes()[STATUS_INDEX], STATUS_CALIBRATION_FAILED);

        // Nothing is reported until an attempt has been made.
        let odd = CalibrationOutcome {
            attempted: false,
            succeeded: true,
        };
        assert_eq!(odd.status_bits(), 0);
    }

    #[test]
    fn test_mobile_v1_layout() {
        let snap = snapshot(SecondaryReading::MobileRobot(mobile_sensors()));
        let packet = TelemetryPacket::build(PacketVersion::V1, &snap);
        let b = packet.as_bytes();
        assert_eq!(b.len(), 20);
        assert_eq!(&b[0..2], &1000u16.to_be_bytes());
        assert_eq!(&b[2..6], &[5, 6, 7, 8]);
        assert_eq!(b[6], (3600 >> 4) as u8);
        assert_eq!(&b[7..13], &[0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F]);
        assert_eq!(&b[13..16], &[0xFF, 0x02, 0xC0]);
        assert_eq!(b[MOBILE_PACKET_STATUS_INDEX], STATUS_SHAKE | STATUS_BUTTON_A);
        assert_eq!(&b[17..20], &[0x01, 0xFF, 0x01]);
    }

    #[test]
    fn test_mobile_v2_remaps_fields() {
        let snap = snapshot(SecondaryReading::MobileRobot(mobile_sensors()));
        let packet = TelemetryPacket::build(PacketVersion::V2, &snap);
        let b = packet.as_bytes();
        assert_eq!(b.len(), 20);
        assert_eq!(b[0], 91); // 1000 * 919 / 10000
        assert_eq!(b[1], 77);
        // (3600 + 320) * 937 / 1000 = 3673 mV -> level 2
        assert_eq!(b[6], (2 << 6) | 25);
    }

    #[test]
    fn test_distance_conversion_saturates() {
        assert_eq!(distance_cm(0), 0);
        assert_eq!(distance_cm(2774), 254);
        assert_eq!(distance_cm(u16::MAX), 255);
    }

    #[test]
    fn test_battery_levels() {
        // Find raw values around each threshold.
        assert_eq!(battery_level(0), 0);
        assert_eq!(battery_millivolts(3280), 3373);
        assert_eq!(battery_level(3279), 0);
        assert_eq!(battery_level(3280), 1);
        assert_eq!(battery_level(3431), 2); // (3431 + 320) * 937 / 1000 = 3514
        assert_eq!(battery_level(3736), 3); // 3800
        assert_eq!(battery_level(4095), 3);
    }

    #[test]
    fn test_temperature_clamp() {
        assert_eq!(clamp_temperature(-12), 0);
        assert_eq!(clamp_temperature(40), 40);
        assert_eq!(clamp_temperature(200), 63);
    }
}
