//! Wire protocol for the robotics controller link.
//!
//! This crate holds everything that can be described without touching
//! hardware:
//!
//! - **Profiles**: [`DeviceProfile`] and the static [`FirmwareInfo`] reply
//! - **Commands**: [`Opcode`], the routing matrix ([`route()`]) and the typed
//!   [`Command`] values they decode to
//! - **Framing**: [`FrameDecoder`] splits an undelimited inbound buffer into
//!   frames, skipping anything it cannot interpret
//! - **Telemetry**: [`TelemetryPacket`] lays out a [`SensorSnapshot`] for the
//!   negotiated [`PacketVersion`]
//! - **Secondary bus**: block formats exchanged with the companion processor
//!   ([`bus`])
//!
//! # Wire Format
//!
//! Inbound frames are concatenated with no delimiter or checksum. The first
//! byte is the opcode; the frame length is either fixed per opcode or derived
//! from a length/mode field in the second byte:
//!
//! ```text
//! 0xCC <mode|N> [4 symbol bytes | N text bytes]   display write
//! 0x62 <0x67|0x70|0x73>                           notifications v1/v2/stop
//! 0xCF                                            firmware info
//! 0xCB [0x00 x 0..=3]                             stop all
//! ```
//!
//! # Example
//!
//! ```
//! use botlink_proto::{
//!     Command, Decoded, DeviceProfile, FrameDecoder, NotifyRequest, PacketVersion,
//! };
//!
//! let buf = [0x62, 0x70];
//! let mut decoder = FrameDecoder::new(&buf, DeviceProfile::Basic);
//! match decoder.next() {
//!     Some(Decoded::Command { command, .. }) => {
//!         assert_eq!(command, Command::Notifications(NotifyRequest::Start(PacketVersion::V2)));
//!     }
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod bus;
pub mod command;
pub mod display;
pub mod frame;
pub mod opcode;
pub mod packet;
pub mod profile;
pub mod route;

// Re-export main types at crate root
pub use bus::{ActuatorBlock, ActuatorSensors, MobileSensors};
pub use command::{
    ActuatorSetAll, Command, DisplayCommand, MobileLeds, Motors, MotorsDisplay, NotifyRequest,
    PacketVersion, PinIo, PinMode, PinSetting, Rgb, Tone, WheelCommand,
};
pub use display::{Symbol, Text};
pub use frame::{parse_frame, Decoded, FrameDecoder, FrameError, SkipReason, MAX_FRAME_LEN};
pub use opcode::Opcode;
pub use packet::{
    CalibrationOutcome, MotionReading, SecondaryReading, SensorSnapshot, TelemetryPacket,
    MAX_PACKET_LEN,
};
pub use profile::{DeviceProfile, FirmwareInfo};
pub use route::{route, Route};
