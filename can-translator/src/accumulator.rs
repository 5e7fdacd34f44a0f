//! Rolling accumulator
//!
//! Hardware counters on the bus (odometer, fuel flow, wheel rotations) roll
//! over after reaching their maximum representable value. The accumulator
//! turns consecutive readings into non-negative deltas and keeps running
//! totals since the translator was started.

use crate::signals::database::SignalDescriptor;

/// Cumulative counters since restart
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AccumulatorState {
    /// Wheel rotations, in raw signal units
    pub rotations_since_restart: f64,
    /// Odometer distance, in raw signal units
    pub distance_since_restart: f64,
    /// Fuel consumed, already converted to litres
    pub fuel_consumed_since_restart_liters: f64,
}

impl AccumulatorState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Delta between the signal's last value and a new reading.
///
/// A reading below the last value means the counter wrapped past
/// `max_value` exactly once. Multiple wraps between two samples are not
/// detectable.
pub fn rolling_delta(signal: &SignalDescriptor, new_value: f64) -> f64 {
    let delta = if new_value < signal.last_value {
        signal.max_value - signal.last_value + new_value
    } else {
        new_value - signal.last_value
    };
    // A last value above the configured maximum would otherwise go negative
    delta.max(0.0)
}

/// Add the rolling delta of `new_value` to `current_total`.
///
/// The descriptor is not modified; its `last_value` is committed by the
/// emission policy once the frame has been handled.
pub fn accumulate(signal: &SignalDescriptor, current_total: f64, new_value: f64) -> f64 {
    current_total + rolling_delta(signal, new_value)
}
