//! Composite message handlers
//!
//! Handlers that assemble one outbound event from several signals of the
//! same frame (GPS position, steering-wheel buttons), the evented door
//! status, and the inbound turn-signal command.

use crate::codec::decode_can_signal;
use crate::emission::{
    send_evented_boolean_message, send_evented_string_message, send_numerical_message, EmissionPolicy, Listener,
};
use crate::handlers::{handle_state, handle_strict_boolean, Verdict};
use crate::signals::database::{SignalHandle, SignalTable};
use crate::transmit::{boolean_writer, send_can_signal, CanWriter};
use crate::units::to_decimal_degrees;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DOOR_STATUS_GENERIC_NAME: &str = "door_status";
pub const BUTTON_EVENT_GENERIC_NAME: &str = "button_event";
pub const TURN_SIGNAL_COMMAND_NAME: &str = "turn_signal_status";

/// Handler applied to a whole CAN message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageHandler {
    /// Degree/minute latitude and longitude
    Gps,
    /// Button type plus button state
    ButtonEvent,
}

impl MessageHandler {
    pub fn handle(self, message_id: u32, data: &[u8], signals: &SignalTable, listener: &mut dyn Listener) {
        match self {
            MessageHandler::Gps => handle_gps_message(message_id, data, signals, listener),
            MessageHandler::ButtonEvent => handle_button_event_message(message_id, data, signals, listener),
        }
    }
}

/// Publish the ajar status of one door as an evented `door_status` message.
///
/// Subject to the emission policy; the signal's last value is committed
/// whether or not anything was published.
pub fn send_door_status(
    door_id: &str,
    data: &[u8],
    handle: SignalHandle,
    signals: &mut SignalTable,
    listener: &mut dyn Listener,
) {
    let signal = signals.get_mut(handle);
    let Some(raw_ajar_status) = decode_can_signal(signal, data) else {
        log::debug!("Unable to decode ajar status of door '{}'", door_id);
        return;
    };

    let verdict = handle_strict_boolean(raw_ajar_status);
    if let Some(ajar) = EmissionPolicy::apply(signal, raw_ajar_status, verdict) {
        send_evented_boolean_message(DOOR_STATUS_GENERIC_NAME, door_id, ajar, listener);
    }
}

fn decode_named(name: &str, data: &[u8], signals: &SignalTable) -> Option<f64> {
    let Some(signal) = signals.find(name) else {
        log::debug!("Unable to find signal '{}'", name);
        return None;
    };
    decode_can_signal(signal, data)
}

fn decode_coordinate(axis: &str, data: &[u8], signals: &SignalTable) -> Option<f64> {
    let degrees = decode_named(&format!("{}_degrees", axis), data, signals)?;
    let minutes = decode_named(&format!("{}_minutes", axis), data, signals)?;
    let minute_fraction = decode_named(&format!("{}_minute_fraction", axis), data, signals)?;
    Some(to_decimal_degrees(degrees, minutes, minute_fraction))
}

/// Publish `latitude` and `longitude` in decimal degrees.
///
/// Both axes are sent on every frame; an axis whose signals are missing is
/// skipped without affecting the other.
pub fn handle_gps_message(message_id: u32, data: &[u8], signals: &SignalTable, listener: &mut dyn Listener) {
    for axis in ["latitude", "longitude"] {
        match decode_coordinate(axis, data, signals) {
            Some(value) => send_numerical_message(axis, value, listener),
            None => log::debug!("Incomplete {} in GPS message 0x{:X}", axis, message_id),
        }
    }
}

/// Publish a `button_event` keyed by button type with the button state as
/// payload. Nothing is sent unless both codes map to known states.
pub fn handle_button_event_message(
    message_id: u32,
    data: &[u8],
    signals: &SignalTable,
    listener: &mut dyn Listener,
) {
    let (Some(type_signal), Some(state_signal)) = (signals.find("button_type"), signals.find("button_state")) else {
        log::debug!("Unable to find button type and state signals for message 0x{:X}", message_id);
        return;
    };

    let (Some(raw_type), Some(raw_state)) = (
        decode_can_signal(type_signal, data),
        decode_can_signal(state_signal, data),
    ) else {
        log::debug!("Unable to decode button event in message 0x{:X}", message_id);
        return;
    };

    if let (Verdict::Emit(button_type), Verdict::Emit(button_state)) =
        (handle_state(type_signal, raw_type), handle_state(state_signal, raw_state))
    {
        send_evented_string_message(BUTTON_EVENT_GENERIC_NAME, &button_type, &button_state, listener);
    }
}

/// Switch on the requested turn signal.
///
/// `value` must be the string `"left"` or `"right"`. Returns `false` if the
/// direction is unknown, its signal is not configured, or sending fails.
pub fn handle_turn_signal_command(
    name: &str,
    value: &Value,
    signals: &SignalTable,
    bus: &mut dyn CanWriter,
) -> bool {
    let direction = value.as_str().unwrap_or_default();
    let handle = match direction {
        "left" => signals.lookup("turn_signal_left"),
        "right" => signals.lookup("turn_signal_right"),
        _ => None,
    };

    match handle {
        Some(handle) => send_can_signal(handle, &Value::Bool(true), boolean_writer, signals, bus),
        None => {
            log::debug!("Unable to find signal for {} turn signal ({})", value, name);
            false
        }
    }
}
