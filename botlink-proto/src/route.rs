//! The (opcode × profile) legality matrix.
//!
//! Every opcode maps to at most one handler per [`DeviceProfile`]. A `None`
//! cell means the opcode is not applicable to that profile: the decoder
//! treats it like an unknown byte and skips it.

use crate::opcode::Opcode;
use crate::profile::DeviceProfile;

/// Handler selected for a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Route {
    Display,
    FirmwareInfo,
    Notifications,
    PinIo,
    StopAll,
    Calibrate,
    ActuatorSetAll,
    /// Actuator-board set-all received on a Basic controller: only the
    /// trailing buzzer bytes are honoured.
    BasicBuzzer,
    MobileSetAllLeds,
    MobileMotorsDisplay,
    MobileStopAll,
    MobileResetEncoders,
}

use Route::*;

/// One row per opcode; columns follow [`DeviceProfile::ALL`]
/// (Basic, ActuatorBoard, MobileRobot).
pub const ROUTES: [(Opcode, [Option<Route>; 3]); 11] = [
    (Opcode::DisplayWrite, [Some(Display), Some(Display), Some(Display)]),
    (Opcode::FirmwareInfo, [Some(FirmwareInfo), Some(FirmwareInfo), Some(FirmwareInfo)]),
    (Opcode::Notifications, [Some(Notifications), Some(Notifications), Some(Notifications)]),
    (Opcode::RawPinIo, [Some(PinIo), None, None]),
    (Opcode::StopAll, [Some(StopAll), Some(StopAll), Some(StopAll)]),
    (Opcode::Calibrate, [Some(Calibrate), Some(Calibrate), Some(Calibrate)]),
    (Opcode::ActuatorSetAll, [Some(BasicBuzzer), Some(ActuatorSetAll), None]),
    (Opcode::MobileSetAllLeds, [None, None, Some(MobileSetAllLeds)]),
    (Opcode::MobileSetMotorsDisplay, [None, None, Some(MobileMotorsDisplay)]),
    (Opcode::MobileStopAll, [None, None, Some(MobileStopAll)]),
    (Opcode::MobileResetEncoders, [None, None, Some(MobileResetEncoders)]),
];

/// Look up the handler for `opcode` on `profile`.
///
/// Returns `None` when the opcode is not applicable to the profile.
#[must_use]
pub fn route(opcode: Opcode, profile: DeviceProfile) -> Option<Route> {
    ROUTES
        .iter()
        .find(|(op, _)| *op == opcode)
        .and_then(|(_, cells)| cells[profile.index()])
}
