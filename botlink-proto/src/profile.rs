//! Device profiles: the hardware variant the firmware was built for.

/// Hardware variant selected once at start-up.
///
/// The profile decides which opcodes are legal, which telemetry layout is
/// produced and whether a secondary sensor bus is present.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceProfile {
    /// Bare controller board: edge connector, display, on-board sensors.
    Basic,
    /// Controller plugged into the LED/servo/buzzer actuator board.
    ActuatorBoard,
    /// Controller driving the wheeled robot (motors, encoders, distance).
    MobileRobot,
}

impl DeviceProfile {
    /// All profiles, in routing-table column order.
    pub const ALL: [DeviceProfile; 3] = [
        DeviceProfile::Basic,
        DeviceProfile::ActuatorBoard,
        DeviceProfile::MobileRobot,
    ];

    /// Column of this profile in [`crate::route::ROUTES`].
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            DeviceProfile::Basic => 0,
            DeviceProfile::ActuatorBoard => 1,
            DeviceProfile::MobileRobot => 2,
        }
    }

    /// Whether sensors beyond the on-board package are read over the
    /// secondary bus.
    #[inline]
    #[must_use]
    pub const fn has_secondary_bus(self) -> bool {
        !matches!(self, DeviceProfile::Basic)
    }

    /// Whether the inactivity power-down policy applies.
    #[inline]
    #[must_use]
    pub const fn has_idle_shutdown(self) -> bool {
        matches!(self, DeviceProfile::MobileRobot)
    }

    /// Static reply to the firmware-info request.
    #[must_use]
    pub const fn firmware_info(self) -> FirmwareInfo {
        let companion_firmware = match self {
            DeviceProfile::Basic => 0xFF,
            DeviceProfile::ActuatorBoard => 3,
            DeviceProfile::MobileRobot => 44,
        };
        FirmwareInfo {
            hardware_version: HARDWARE_VERSION,
            micro_firmware: MICRO_FIRMWARE_VERSION,
            companion_firmware,
            board_generation: BOARD_GENERATION,
        }
    }
}

/// Hardware revision reported in the firmware-info reply.
pub const HARDWARE_VERSION: u8 = 2;

/// Controller firmware version reported in the firmware-info reply.
pub const MICRO_FIRMWARE_VERSION: u8 = 2;

/// Controller board generation reported in the firmware-info reply.
pub const BOARD_GENERATION: u8 = 2;

/// Length of the firmware-info reply.
pub const FIRMWARE_INFO_LEN: usize = 4;

/// Version/hardware-id reply sent in answer to the firmware-info opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FirmwareInfo {
    pub hardware_version: u8,
    pub micro_firmware: u8,
    /// Firmware of the companion processor (`0xFF` when there is none).
    pub companion_firmware: u8,
    pub board_generation: u8,
}

impl FirmwareInfo {
    /// Wire representation of the reply.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; FIRMWARE_INFO_LEN] {
        [
            self.hardware_version,
            self.micro_firmware,
            self.companion_firmware,
            self.board_generation,
        ]
    }
}
