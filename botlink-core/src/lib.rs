//! Chip-agnostic command/telemetry engine for the robot controller link.
//!
//! This crate drives the protocol defined in [`botlink_proto`] against
//! abstract collaborators, so it runs unchanged on target and on host.
//!
//! # Overview
//!
//! - [`link`]: transport trait ([`Link`])
//! - [`bus`]: secondary sensor bus trait ([`SensorBus`])
//! - [`board`]: on-board peripherals ([`Board`])
//! - [`session`]: shared per-connection state ([`Session`])
//! - [`gate`]: command/telemetry exclusion ([`ExclusionGate`])
//! - [`acquisition`]: bus retry and validation
//! - [`engine`]: the [`Engine`] and its cooperative tasks
//!
//! # Tasks
//!
//! [`Engine::run`] joins three loops on one executor:
//!
//! ```text
//! commands   poll link -> decode -> dispatch     every command_poll_ms
//! telemetry  wait for subscribe -> send packet   every telemetry_period_ms
//! idle       count ticks -> power down           every idle_tick_ms
//! ```
//!
//! The loops only yield at sleeps and collaborator calls. Session updates
//! happen inside a blocking critical section and never span a yield.
//!
//! # Example
//!
//! ```ignore
//! use botlink_core::{Engine, EngineConfig, NullBus};
//! use botlink_proto::DeviceProfile;
//! use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
//!
//! let engine: Engine<CriticalSectionRawMutex, _, _, _> = Engine::new(
//!     EngineConfig::new(DeviceProfile::Basic),
//!     ble_link,
//!     NullBus,
//!     board,
//! );
//! engine.run(embassy_time::Delay).await;
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Log through defmt (for embedded logging)
//! - **`log`**: Log through the `log` facade (for hosted builds)
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

// Must come first so the logging macros are visible to every module.
#[macro_use]
mod fmt;

pub mod acquisition;
pub mod board;
pub mod bus;
pub mod config;
mod dispatch;
pub mod engine;
pub mod gate;
mod idle;
pub mod link;
pub mod session;
mod telemetry;

#[cfg(test)]
mod testing;

// Re-export main types at crate root
pub use acquisition::Acquisition;
pub use board::{Board, Cue, Display, EdgeConnector, MotionSensors, Speaker};
pub use bus::{BusError, NullBus, SensorBus};
pub use config::{EngineConfig, DEFAULT_CONFIG, INBOUND_CAPACITY};
pub use dispatch::PollOutcome;
pub use engine::{Engine, EngineError};
pub use gate::{ExclusionGate, GateEntry};
pub use link::{Link, LinkError};
pub use session::{IdleAction, Session, Subscription, Suspended};
