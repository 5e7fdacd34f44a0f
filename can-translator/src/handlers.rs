//! Signal value transformers
//!
//! Each transformer maps a decoded physical value (plus, for some, sibling
//! signals or accumulator state) to an output value, or vetoes emission.
//! Transformers never touch a descriptor's `received`/`last_value`; that is
//! the emission policy's job.

use crate::accumulator::{accumulate, AccumulatorState};
use crate::emission::MessageValue;
use crate::signals::database::{SignalDescriptor, SignalTable};
use crate::units::{DistanceUnit, VolumeUnit};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Generic name of the sign companion of the unsigned steering angle
pub const STEERING_ANGLE_SIGN_SIGNAL: &str = "steering_wheel_angle_sign";

/// Outcome of a transformer: a value to publish, or a veto
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict<T> {
    Emit(T),
    Suppress,
}

impl<T> Verdict<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Verdict<U> {
        match self {
            Verdict::Emit(value) => Verdict::Emit(f(value)),
            Verdict::Suppress => Verdict::Suppress,
        }
    }
}

/// Transformer bound to a signal in the configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalHandler {
    /// Publish the decoded value as is
    Passthrough,
    /// Non-zero is true
    Boolean,
    /// Negated value
    Inverted,
    /// Headlamp switch position, on in positions 2 and 3
    ExteriorLightSwitch,
    /// Magnitude signed by the `steering_wheel_angle_sign` sibling
    UnsignedSteeringAngle,
    /// Enumerated code mapped to its state name
    State,
    /// Cumulative distance in kilometres from a rolling odometer
    RollingOdometer {
        #[serde(default)]
        unit: DistanceUnit,
    },
    /// Cumulative fuel consumption in litres from a rolling flow counter
    FuelFlow {
        #[serde(default)]
        unit: VolumeUnit,
    },
    /// Cumulative distance from a rolling wheel rotation counter
    WheelRotation { radius: f64 },
    /// Ajar status published as an evented `door_status` message
    DoorStatus { door: String },
}

impl SignalHandler {
    /// True if the handler's output is a boolean
    pub fn is_boolean(&self) -> bool {
        matches!(
            self,
            SignalHandler::Boolean | SignalHandler::ExteriorLightSwitch | SignalHandler::DoorStatus { .. }
        )
    }
}

pub fn handle_passthrough(value: f64) -> Verdict<f64> {
    Verdict::Emit(value)
}

pub fn handle_strict_boolean(value: f64) -> Verdict<bool> {
    Verdict::Emit(value != 0.0)
}

pub fn handle_inverted(value: f64) -> Verdict<f64> {
    Verdict::Emit(-value)
}

pub fn handle_exterior_light_switch(value: f64) -> Verdict<bool> {
    Verdict::Emit(value == 2.0 || value == 3.0)
}

/// Apply the steering direction carried by the sign sibling.
///
/// A sign value of zero means a left turn and negates the angle. Without
/// the sibling nothing can be said about direction, so emission is vetoed.
pub fn handle_unsigned_steering_angle(signals: &SignalTable, value: f64) -> Verdict<f64> {
    match signals.find(STEERING_ANGLE_SIGN_SIGNAL) {
        None => {
            log::debug!("Unable to find steering wheel angle sign signal");
            Verdict::Suppress
        }
        Some(sign) if sign.last_value == 0.0 => Verdict::Emit(-value),
        Some(_) => Verdict::Emit(value),
    }
}

/// Map an enumerated code to its state name, vetoing unmapped codes
pub fn handle_state(signal: &SignalDescriptor, value: f64) -> Verdict<String> {
    match signal.state_name(value) {
        Some(name) => Verdict::Emit(name.to_string()),
        None => {
            log::warn!("No state found for value {} of signal '{}'", value, signal.generic_name);
            Verdict::Suppress
        }
    }
}

/// Total distance since restart, converted to kilometres
pub fn handle_rolling_odometer(
    signal: &SignalDescriptor,
    accumulators: &mut AccumulatorState,
    value: f64,
    unit: DistanceUnit,
) -> Verdict<f64> {
    accumulators.distance_since_restart = accumulate(signal, accumulators.distance_since_restart, value);
    Verdict::Emit(unit.multiplier() * accumulators.distance_since_restart)
}

/// Total fuel consumed since restart, in litres
pub fn handle_fuel_flow(
    signal: &SignalDescriptor,
    accumulators: &mut AccumulatorState,
    value: f64,
    unit: VolumeUnit,
) -> Verdict<f64> {
    let consumed = accumulate(signal, 0.0, value);
    accumulators.fuel_consumed_since_restart_liters += unit.multiplier() * consumed;
    Verdict::Emit(accumulators.fuel_consumed_since_restart_liters)
}

/// Linear distance covered by a wheel of `radius` since restart
pub fn handle_wheel_rotation(
    signal: &SignalDescriptor,
    accumulators: &mut AccumulatorState,
    value: f64,
    radius: f64,
) -> Verdict<f64> {
    accumulators.rotations_since_restart = accumulate(signal, accumulators.rotations_since_restart, value);
    Verdict::Emit(2.0 * PI * radius * accumulators.rotations_since_restart)
}

/// Run the transformer bound to `signal` on a freshly decoded value
pub fn transform(
    handler: &SignalHandler,
    signal: &SignalDescriptor,
    signals: &SignalTable,
    accumulators: &mut AccumulatorState,
    value: f64,
) -> Verdict<MessageValue> {
    match handler {
        SignalHandler::Passthrough => handle_passthrough(value).map(MessageValue::Number),
        SignalHandler::Boolean | SignalHandler::DoorStatus { .. } => {
            handle_strict_boolean(value).map(MessageValue::Boolean)
        }
        SignalHandler::Inverted => handle_inverted(value).map(MessageValue::Number),
        SignalHandler::ExteriorLightSwitch => handle_exterior_light_switch(value).map(MessageValue::Boolean),
        SignalHandler::UnsignedSteeringAngle => {
            handle_unsigned_steering_angle(signals, value).map(MessageValue::Number)
        }
        SignalHandler::State => handle_state(signal, value).map(MessageValue::Text),
        SignalHandler::RollingOdometer { unit } => {
            handle_rolling_odometer(signal, accumulators, value, *unit).map(MessageValue::Number)
        }
        SignalHandler::FuelFlow { unit } => {
            handle_fuel_flow(signal, accumulators, value, *unit).map(MessageValue::Number)
        }
        SignalHandler::WheelRotation { radius } => {
            handle_wheel_rotation(signal, accumulators, value, *radius).map(MessageValue::Number)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SignalConfig;
    use crate::units::{KM_PER_METER, KM_PER_MILE, LITERS_PER_GALLON, LITERS_PER_MICROLITER};

    fn descriptor(config: SignalConfig) -> SignalDescriptor {
        SignalDescriptor::from_config(&config).unwrap()
    }

    fn counter(last_value: f64) -> SignalDescriptor {
        let mut signal = descriptor(SignalConfig::new("counter", 0x10, 0, 8).with_range(0.0, 255.0));
        signal.received = true;
        signal.last_value = last_value;
        signal
    }

    #[test]
    fn test_simple_transformers() {
        assert_eq!(handle_strict_boolean(0.0), Verdict::Emit(false));
        assert_eq!(handle_strict_boolean(0.5), Verdict::Emit(true));
        assert_eq!(handle_inverted(12.5), Verdict::Emit(-12.5));
        assert_eq!(handle_exterior_light_switch(1.0), Verdict::Emit(false));
        assert_eq!(handle_exterior_light_switch(2.0), Verdict::Emit(true));
        assert_eq!(handle_exterior_light_switch(3.0), Verdict::Emit(true));
        assert_eq!(handle_exterior_light_switch(4.0), Verdict::Emit(false));
    }

    #[test]
    fn test_steering_angle_sign() {
        let mut table = SignalTable::new();
        assert_eq!(handle_unsigned_steering_angle(&table, 30.0), Verdict::Suppress);

        let sign = table
            .add(descriptor(SignalConfig::new(STEERING_ANGLE_SIGN_SIGNAL, 0x80, 15, 1)))
            .unwrap();
        assert_eq!(handle_unsigned_steering_angle(&table, 30.0), Verdict::Emit(-30.0));

        table.get_mut(sign).last_value = 1.0;
        assert_eq!(handle_unsigned_steering_angle(&table, 30.0), Verdict::Emit(30.0));
    }

    #[test]
    fn test_state_handler() {
        let signal = descriptor(
            SignalConfig::new("button_type", 0x300, 0, 4)
                .add_state(1, "left")
                .add_state(2, "ok"),
        );
        assert_eq!(handle_state(&signal, 2.0), Verdict::Emit("ok".to_string()));
        assert_eq!(handle_state(&signal, 9.0), Verdict::Suppress);
    }

    #[test]
    fn test_odometer_units_share_accumulator() {
        let mut km_state = AccumulatorState::new();
        let mut mile_state = AccumulatorState::new();
        let signal = counter(100.0);

        let km = handle_rolling_odometer(&signal, &mut km_state, 120.0, DistanceUnit::Kilometers);
        let miles = handle_rolling_odometer(&signal, &mut mile_state, 120.0, DistanceUnit::Miles);
        assert_eq!(km, Verdict::Emit(20.0));
        assert_eq!(miles, Verdict::Emit(KM_PER_MILE * 20.0));
        assert_eq!(km_state, mile_state);
    }

    #[test]
    fn test_odometer_in_meters() {
        let mut state = AccumulatorState::new();
        let verdict = handle_rolling_odometer(&counter(100.0), &mut state, 120.0, DistanceUnit::Meters);
        assert_eq!(verdict, Verdict::Emit(KM_PER_METER * 20.0));
        // The total stays in raw units
        assert_eq!(state.distance_since_restart, 20.0);
    }

    #[test]
    fn test_odometer_wraps() {
        let mut state = AccumulatorState::new();
        state.distance_since_restart = 500.0;
        let verdict = handle_rolling_odometer(&counter(250.0), &mut state, 10.0, DistanceUnit::Kilometers);
        assert_eq!(verdict, Verdict::Emit(515.0));
    }

    #[test]
    fn test_fuel_flow_uses_plain_delta() {
        let mut state = AccumulatorState::new();
        let verdict = handle_fuel_flow(&counter(10.0), &mut state, 14.0, VolumeUnit::Liters);
        assert_eq!(verdict, Verdict::Emit(4.0));

        let verdict = handle_fuel_flow(&counter(254.0), &mut state, 1.0, VolumeUnit::Gallons);
        assert_eq!(verdict, Verdict::Emit(4.0 + 2.0 * LITERS_PER_GALLON));
    }

    #[test]
    fn test_fuel_flow_in_microliters() {
        let mut state = AccumulatorState::new();
        let verdict = handle_fuel_flow(&counter(200.0), &mut state, 250.0, VolumeUnit::Microliters);
        assert_eq!(verdict, Verdict::Emit(LITERS_PER_MICROLITER * 50.0));

        // 255 - 250 + 5 across the wrap
        let verdict = handle_fuel_flow(&counter(250.0), &mut state, 5.0, VolumeUnit::Microliters);
        assert_eq!(
            verdict,
            Verdict::Emit(LITERS_PER_MICROLITER * 50.0 + LITERS_PER_MICROLITER * 10.0)
        );
    }

    #[test]
    fn test_wheel_rotation_wraps() {
        let mut state = AccumulatorState::new();
        state.rotations_since_restart = 100.0;
        let verdict = handle_wheel_rotation(&counter(250.0), &mut state, 10.0, 0.3);
        assert_eq!(state.rotations_since_restart, 115.0);
        assert_eq!(verdict, Verdict::Emit(2.0 * PI * 0.3 * 115.0));
    }

    #[test]
    fn test_wheel_rotation_distance() {
        let mut state = AccumulatorState::new();
        let verdict = handle_wheel_rotation(&counter(0.0), &mut state, 10.0, 0.3);
        assert_eq!(verdict, Verdict::Emit(2.0 * PI * 0.3 * 10.0));
        assert_eq!(state.rotations_since_restart, 10.0);
    }

    #[test]
    fn test_transform_dispatch() {
        let table = SignalTable::new();
        let mut state = AccumulatorState::new();
        let signal = counter(0.0);

        let verdict = transform(&SignalHandler::Inverted, &signal, &table, &mut state, 4.0);
        assert_eq!(verdict, Verdict::Emit(MessageValue::Number(-4.0)));

        let verdict = transform(&SignalHandler::ExteriorLightSwitch, &signal, &table, &mut state, 2.0);
        assert_eq!(verdict, Verdict::Emit(MessageValue::Boolean(true)));

        let verdict = transform(&SignalHandler::State, &signal, &table, &mut state, 2.0);
        assert_eq!(verdict, Verdict::Suppress);
    }

    #[test]
    fn test_handler_deserialization() {
        let handler: SignalHandler = serde_json::from_str(r#"{"type":"wheel_rotation","radius":0.33}"#).unwrap();
        assert_eq!(handler, SignalHandler::WheelRotation { radius: 0.33 });

        let handler: SignalHandler = serde_json::from_str(r#"{"type":"rolling_odometer"}"#).unwrap();
        assert_eq!(handler, SignalHandler::RollingOdometer { unit: DistanceUnit::Kilometers });
        assert!(!handler.is_boolean());
    }
}
