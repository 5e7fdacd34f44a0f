//! Event emission
//!
//! Outbound vehicle messages, the listener boundary they are delivered to,
//! and the change-detection policy that decides whether a decoded value is
//! novel enough to publish.

use crate::handlers::Verdict;
use crate::signals::database::SignalDescriptor;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payload of a vehicle message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageValue {
    Number(f64),
    Boolean(bool),
    Text(String),
}

impl fmt::Display for MessageValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageValue::Number(v) => write!(f, "{}", v),
            MessageValue::Boolean(v) => write!(f, "{}", v),
            MessageValue::Text(v) => write!(f, "{}", v),
        }
    }
}

/// A normalized vehicle event as handed to the outbound channel
///
/// Serializes to the flat JSON shape consumers expect:
/// `{"name": "vehicle_speed", "value": 42.0}` for continuous values and
/// `{"name": "door_status", "value": "driver", "event": true}` for evented ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VehicleMessage {
    /// Notification keyed by `value`, carrying `event` as payload
    Evented {
        name: String,
        value: MessageValue,
        event: MessageValue,
    },
    /// Plain named value
    Simple { name: String, value: MessageValue },
}

impl VehicleMessage {
    pub fn name(&self) -> &str {
        match self {
            VehicleMessage::Evented { name, .. } => name,
            VehicleMessage::Simple { name, .. } => name,
        }
    }
}

/// Receiver of translated vehicle messages
pub trait Listener {
    fn publish(&mut self, message: VehicleMessage);
}

impl Listener for Vec<VehicleMessage> {
    fn publish(&mut self, message: VehicleMessage) {
        self.push(message);
    }
}

pub fn send_numerical_message(name: &str, value: f64, listener: &mut dyn Listener) {
    send_message(name, MessageValue::Number(value), listener);
}

/// Send a plain `{name, value}` message
pub fn send_message(name: &str, value: MessageValue, listener: &mut dyn Listener) {
    listener.publish(VehicleMessage::Simple {
        name: name.to_string(),
        value,
    });
}

/// Send an evented message keyed by `key` with a boolean payload
pub fn send_evented_boolean_message(name: &str, key: &str, event: bool, listener: &mut dyn Listener) {
    listener.publish(VehicleMessage::Evented {
        name: name.to_string(),
        value: MessageValue::Text(key.to_string()),
        event: MessageValue::Boolean(event),
    });
}

/// Send an evented message keyed by `key` with a textual payload
pub fn send_evented_string_message(name: &str, key: &str, event: &str, listener: &mut dyn Listener) {
    listener.publish(VehicleMessage::Evented {
        name: name.to_string(),
        value: MessageValue::Text(key.to_string()),
        event: MessageValue::Text(event.to_string()),
    });
}

/// Change-detection debounce applied once per decoded signal per frame
pub struct EmissionPolicy;

impl EmissionPolicy {
    /// True if `raw_value` is worth publishing for `signal`: the signal
    /// resends unconditionally, has never been seen, or changed.
    pub fn should_emit(signal: &SignalDescriptor, raw_value: f64) -> bool {
        signal.send_same || !signal.received || raw_value != signal.last_value
    }

    /// Record `raw_value` as the signal's latest observation
    pub fn commit(signal: &mut SignalDescriptor, raw_value: f64) {
        signal.received = true;
        signal.last_value = raw_value;
    }

    /// Decide emission for a transformer verdict, then commit the raw value.
    ///
    /// The commit happens whether or not anything is emitted.
    pub fn apply<T>(signal: &mut SignalDescriptor, raw_value: f64, verdict: Verdict<T>) -> Option<T> {
        let emitted = match verdict {
            Verdict::Emit(value) if Self::should_emit(signal, raw_value) => Some(value),
            _ => None,
        };
        Self::commit(signal, raw_value);
        emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SignalConfig;

    fn signal(send_same: bool) -> SignalDescriptor {
        SignalDescriptor::from_config(&SignalConfig::new("brake_pedal_status", 0x10, 0, 8).with_send_same(send_same))
            .unwrap()
    }

    #[test]
    fn test_first_reading_always_emits() {
        let mut sig = signal(false);
        assert_eq!(EmissionPolicy::apply(&mut sig, 0.0, Verdict::Emit(false)), Some(false));
        assert!(sig.received);
        assert_eq!(sig.last_value, 0.0);
    }

    #[test]
    fn test_identical_reading_suppressed() {
        let mut sig = signal(false);
        sig.received = true;
        sig.last_value = 3.0;

        assert_eq!(EmissionPolicy::apply(&mut sig, 3.0, Verdict::Emit(3.0)), None);
        assert_eq!(EmissionPolicy::apply(&mut sig, 4.0, Verdict::Emit(4.0)), Some(4.0));
        assert_eq!(sig.last_value, 4.0);
    }

    #[test]
    fn test_send_same_resends() {
        let mut sig = signal(true);
        sig.received = true;
        sig.last_value = 3.0;
        assert_eq!(EmissionPolicy::apply(&mut sig, 3.0, Verdict::Emit(3.0)), Some(3.0));
    }

    #[test]
    fn test_veto_still_commits() {
        let mut sig = signal(true);
        assert_eq!(EmissionPolicy::apply::<f64>(&mut sig, 9.0, Verdict::Suppress), None);
        assert!(sig.received);
        assert_eq!(sig.last_value, 9.0);
    }

    #[test]
    fn test_message_json_shape() {
        let mut listener: Vec<VehicleMessage> = Vec::new();
        send_numerical_message("latitude", 47.5, &mut listener);
        send_evented_boolean_message("door_status", "driver", true, &mut listener);
        send_evented_string_message("button_event", "ok", "pressed", &mut listener);

        let json: Vec<String> = listener
            .iter()
            .map(|m| serde_json::to_string(m).unwrap())
            .collect();
        assert_eq!(json[0], r#"{"name":"latitude","value":47.5}"#);
        assert_eq!(json[1], r#"{"name":"door_status","value":"driver","event":true}"#);
        assert_eq!(json[2], r#"{"name":"button_event","value":"ok","event":"pressed"}"#);
    }
}
