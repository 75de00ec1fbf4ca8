//! Exclusion gate between command processing and telemetry assembly.
//!
//! The gate is a real mutex, but neither side ever waits on it unbounded:
//! command processing skips its cycle when the gate is taken, and telemetry
//! polls a few ticks and then proceeds without it so a stuck command can
//! never starve a subscriber.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embedded_hal_async::delay::DelayNs;

/// Result of [`ExclusionGate::enter_bounded`].
pub enum GateEntry<'a, M: RawMutex> {
    /// The gate is held until this value is dropped.
    Held(MutexGuard<'a, M, ()>),
    /// The retry budget ran out; the caller proceeds unprotected.
    Bypassed,
}

impl<M: RawMutex> GateEntry<'_, M> {
    pub fn is_held(&self) -> bool {
        matches!(self, GateEntry::Held(_))
    }
}

pub struct ExclusionGate<M: RawMutex> {
    busy: Mutex<M, ()>,
}

impl<M: RawMutex> Default for ExclusionGate<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> ExclusionGate<M> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            busy: Mutex::new(()),
        }
    }

    /// Take the gate if it is free.
    pub fn try_enter(&self) -> Option<MutexGuard<'_, M, ()>> {
        self.busy.try_lock().ok()
    }

    /// Take the gate, checking up to `attempts` more times `tick_ms` apart
    /// before giving up and returning [`GateEntry::Bypassed`].
    pub async fn enter_bounded<D: DelayNs>(
        &self,
        delay: &mut D,
        tick_ms: u32,
        attempts: u8,
    ) -> GateEntry<'_, M> {
        for _ in 0..attempts {
            if let Some(guard) = self.try_enter() {
                return GateEntry::Held(guard);
            }
            delay.delay_ms(tick_ms).await;
        }
        match self.try_enter() {
            Some(guard) => GateEntry::Held(guard),
            None => GateEntry::Bypassed,
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::testing::{block_on, MockDelay};
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    #[test]
    fn test_free_gate_is_taken_immediately() {
        let gate: ExclusionGate<NoopRawMutex> = ExclusionGate::new();
        let mut delay = MockDelay::new();
        let entry = block_on(gate.enter_bounded(&mut delay, 2, 5));
        assert!(entry.is_held());
        assert!(gate.try_enter().is_none());
        assert!(delay.sleeps().is_empty());

        drop(entry);
        assert!(gate.try_enter().is_some());
    }

    #[test]
    fn test_busy_gate_is_bypassed_after_budget() {
        let gate: ExclusionGate<NoopRawMutex> = ExclusionGate::new();
        let _held = gate.try_enter();
        let mut delay = MockDelay::new();

        let entry = block_on(gate.enter_bounded(&mut delay, 2, 5));
        assert!(!entry.is_held());
        assert_eq!(delay.sleeps(), std::vec![2, 2, 2, 2, 2]);
    }
}
