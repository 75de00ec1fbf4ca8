//! Secondary-bus sensor acquisition with glitch detection.
//!
//! The companion processor's bus occasionally corrupts a transfer. Two
//! strategies compensate, one per profile:
//!
//! - **Actuator-Board**: every block is read twice. If any field differs
//!   between the two reads by more than the tolerance, the pair is repeated,
//!   up to a fixed number of pairs; the first read of the last pair wins.
//! - **Mobile-Robot**: a status byte marks interrupted transfers. Such reads
//!   are retried after a short sleep until a clean block arrives. Hard bus
//!   errors are retried a bounded number of times, then the reading degrades
//!   to zeros.

use crate::bus::{BusError, SensorBus};
use botlink_proto::bus::{ACTUATOR_SENSOR_BLOCK_LEN, MOBILE_SENSOR_BLOCK_LEN};
use botlink_proto::{ActuatorSensors, MobileSensors};
use embedded_hal_async::delay::DelayNs;

/// A reading plus how many times the bus had to be asked again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Acquisition<T> {
    pub reading: T,
    pub retries: u32,
}

async fn read_actuator_block<B: SensorBus>(bus: &mut B) -> Result<ActuatorSensors, BusError> {
    let mut block = [0u8; ACTUATOR_SENSOR_BLOCK_LEN];
    bus.read_sensor_block(&mut block).await?;
    Ok(ActuatorSensors::from_block(block))
}

/// Read the actuator-board sensors, repeating read pairs that disagree by
/// more than `tolerance`.
///
/// `retries` counts repeated pairs. A pair with a failed read counts as
/// disagreeing; if no read ever succeeds the reading is all zeros.
pub async fn read_actuator_sensors<B: SensorBus>(
    bus: &mut B,
    tolerance: u8,
    attempts: u8,
) -> Acquisition<ActuatorSensors> {
    let mut accepted = None;
    let mut retries = 0;

    for pair in 0..attempts.max(1) {
        if pair > 0 {
            retries += 1;
        }
        let first = read_actuator_block(bus).await;
        let second = read_actuator_block(bus).await;
        match (first, second) {
            (Ok(first), Ok(second)) => {
                accepted = Some(first);
                let delta = first.max_delta(&second);
                if delta <= tolerance {
                    break;
                }
                debug!("sensor reads disagree by {}", delta);
            }
            (Ok(first), Err(e)) => {
                accepted = Some(first);
                warn!("sensor read failed: {:?}", e);
            }
            (Err(e), _) => warn!("sensor read failed: {:?}", e),
        }
    }

    Acquisition {
        reading: accepted.unwrap_or_default(),
        retries,
    }
}

/// Read the mobile-robot sensors, retrying interrupted transfers every
/// `retry_ms` for as long as it takes.
///
/// Bus errors are retried too, but only `error_attempts` in total.
pub async fn read_mobile_sensors<B: SensorBus, D: DelayNs>(
    bus: &mut B,
    delay: &mut D,
    retry_ms: u32,
    error_attempts: u8,
) -> Acquisition<MobileSensors> {
    let mut block = [0u8; MOBILE_SENSOR_BLOCK_LEN];
    let mut retries = 0;
    let mut errors = 0;

    loop {
        match bus.read_sensor_block(&mut block).await {
            Ok(()) => {
                let reading = MobileSensors::from_block(&block);
                if !reading.is_interrupted() {
                    return Acquisition { reading, retries };
                }
                trace!("interrupted transfer (status {:#x})", reading.status);
            }
            Err(e) => {
                errors += 1;
                if errors >= error_attempts {
                    warn!("sensor bus failing ({:?}), reporting zeros", e);
                    return Acquisition {
                        reading: MobileSensors::default(),
                        retries,
                    };
                }
            }
        }
        retries += 1;
        delay.delay_ms(retry_ms).await;
    }
}
