//! Engine configuration: device profile and timing.

use botlink_proto::DeviceProfile;

/// Capacity of the inbound buffer drained once per poll cycle.
pub const INBOUND_CAPACITY: usize = 64;

/// Runtime configuration of an [`Engine`](crate::Engine).
///
/// Customize this at compile-time by creating your own const, or start from
/// [`DEFAULT_CONFIG`] and chain the `with_*` methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EngineConfig {
    /// Hardware variant; fixed for the lifetime of the engine.
    pub profile: DeviceProfile,
    /// Sleep between two command poll cycles.
    pub command_poll_ms: u32,
    /// Sleep between two telemetry packets.
    pub telemetry_period_ms: u32,
    /// Sleep between two checks of a busy exclusion gate.
    pub gate_tick_ms: u32,
    /// Checks telemetry makes before proceeding without the gate.
    pub gate_attempts: u8,
    /// Largest per-field difference accepted between two actuator-board reads.
    pub sensor_tolerance: u8,
    /// Read pairs attempted before settling for the last one.
    pub sensor_attempts: u8,
    /// Sleep before re-reading an interrupted mobile-robot transfer.
    pub bus_retry_ms: u32,
    /// Failed bus reads tolerated before degrading to a zero reading.
    pub bus_error_attempts: u8,
    /// Interval of the idle monitor.
    pub idle_tick_ms: u32,
    /// Idle ticks after which the robot powers down.
    pub idle_threshold: u32,
}

/// Timing used by the shipped firmware, for the Basic profile.
pub const DEFAULT_CONFIG: EngineConfig = EngineConfig {
    profile: DeviceProfile::Basic,
    command_poll_ms: 10,
    telemetry_period_ms: 30,
    gate_tick_ms: 2,
    gate_attempts: 5,
    sensor_tolerance: 5,
    sensor_attempts: 5,
    bus_retry_ms: 1,
    bus_error_attempts: 5,
    idle_tick_ms: 10_000, // 10 s
    idle_threshold: 60,   // 10 minutes
};

impl Default for EngineConfig {
    fn default() -> Self {
        DEFAULT_CONFIG
    }
}

impl EngineConfig {
    /// Default timing for the given profile.
    #[must_use]
    pub const fn new(profile: DeviceProfile) -> Self {
        DEFAULT_CONFIG.with_profile(profile)
    }

    #[must_use]
    pub const fn with_profile(mut self, profile: DeviceProfile) -> Self {
        self.profile = profile;
        self
    }

    #[must_use]
    pub const fn with_command_poll_ms(mut self, ms: u32) -> Self {
        self.command_poll_ms = ms;
        self
    }

    #[must_use]
    pub const fn with_telemetry_period_ms(mut self, ms: u32) -> Self {
        self.telemetry_period_ms = ms;
        self
    }

    #[must_use]
    pub const fn with_gate(mut self, tick_ms: u32, attempts: u8) -> Self {
        self.gate_tick_ms = tick_ms;
        self.gate_attempts = attempts;
        self
    }

    #[must_use]
    pub const fn with_sensor_validation(mut self, tolerance: u8, attempts: u8) -> Self {
        self.sensor_tolerance = tolerance;
        self.sensor_attempts = attempts;
        self
    }

    #[must_use]
    pub const fn with_bus_retry(mut self, retry_ms: u32, error_attempts: u8) -> Self {
        self.bus_retry_ms = retry_ms;
        self.bus_error_attempts = error_attempts;
        self
    }

    #[must_use]
    pub const fn with_idle(mut self, tick_ms: u32, threshold: u32) -> Self {
        self.idle_tick_ms = tick_ms;
        self.idle_threshold = threshold;
        self
    }
}
