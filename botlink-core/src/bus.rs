//! Secondary sensor bus trait.

use core::future::Future;

/// Error type for secondary bus transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// Transfer failed on the wire.
    Io,
    /// Companion processor did not answer in time.
    Timeout,
    /// This profile has no secondary bus.
    NotPresent,
}

/// Async trait for the bus to the companion processor.
///
/// Transfers are whole blocks; the block formats live in
/// [`botlink_proto::bus`].
pub trait SensorBus {
    /// Read one sensor block into `buf`, filling it completely.
    fn read_sensor_block(&mut self, buf: &mut [u8]) -> impl Future<Output = Result<(), BusError>>;

    /// Write one actuator block.
    fn write_actuator_block(&mut self, block: &[u8]) -> impl Future<Output = Result<(), BusError>>;
}

/// Bus for profiles without a companion processor.
///
/// Reads and writes fail with [`BusError::NotPresent`]; the engine never
/// issues them for the Basic profile.
pub struct NullBus;

impl SensorBus for NullBus {
    async fn read_sensor_block(&mut self, _buf: &mut [u8]) -> Result<(), BusError> {
        Err(BusError::NotPresent)
    }

    async fn write_actuator_block(&mut self, _block: &[u8]) -> Result<(), BusError> {
        Err(BusError::NotPresent)
    }
}
