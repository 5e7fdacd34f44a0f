//! Outbound signal transmission
//!
//! Converts inbound command values into physical signal values, packs them
//! into a frame alongside the last known values of the message's other
//! signals, and hands the frame to the bus.

use crate::codec::encode_can_signal;
use crate::signals::database::{SignalDescriptor, SignalHandle, SignalTable};
use crate::types::{CanFrame, Result, TranslatorError};
use serde_json::Value;

/// Minimum payload length of a transmitted frame
const CLASSIC_CAN_PAYLOAD: usize = 8;

/// Sink for frames leaving the translator
pub trait CanWriter {
    fn write(&mut self, frame: &CanFrame) -> Result<()>;
}

impl CanWriter for Vec<CanFrame> {
    fn write(&mut self, frame: &CanFrame) -> Result<()> {
        self.push(frame.clone());
        Ok(())
    }
}

/// Converts an inbound command value into the signal's physical value
pub type ValueWriter = fn(&SignalDescriptor, &Value) -> Option<f64>;

/// `true`/`false` to 1/0
pub fn boolean_writer(_signal: &SignalDescriptor, value: &Value) -> Option<f64> {
    value.as_bool().map(|v| if v { 1.0 } else { 0.0 })
}

pub fn number_writer(_signal: &SignalDescriptor, value: &Value) -> Option<f64> {
    value.as_f64()
}

/// State name to its configured code
pub fn state_writer(signal: &SignalDescriptor, value: &Value) -> Option<f64> {
    value
        .as_str()
        .and_then(|name| signal.state_value(name))
        .map(|code| code as f64)
}

/// Build the frame carrying `value` for the signal behind `handle`.
///
/// Other signals of the same message that have been received are packed
/// with their last values.
pub fn build_command_frame(
    handle: SignalHandle,
    value: &Value,
    writer: ValueWriter,
    signals: &SignalTable,
) -> Result<CanFrame> {
    let signal = signals.get(handle);

    let physical = writer(signal, value).ok_or_else(|| {
        TranslatorError::InvalidCommand(format!("Unable to convert {} for signal '{}'", value, signal.generic_name))
    })?;

    let siblings = signals.signals_for_message(signal.message_id, signal.extended);
    let payload_len = siblings
        .iter()
        .map(|h| {
            let s = signals.get(*h);
            (s.bit_position as usize + s.bit_size as usize).div_ceil(8)
        })
        .fold(CLASSIC_CAN_PAYLOAD, usize::max);
    let mut data = vec![0u8; payload_len];

    for sibling in siblings.iter().filter(|h| **h != handle) {
        let sibling = signals.get(*sibling);
        if sibling.received {
            if let Err(e) = encode_can_signal(sibling, sibling.last_value, &mut data) {
                log::warn!("Skipping sibling '{}': {}", sibling.generic_name, e);
            }
        }
    }

    encode_can_signal(signal, physical, &mut data).map_err(|e| {
        TranslatorError::InvalidCommand(format!("Unable to encode signal '{}': {}", signal.generic_name, e))
    })?;

    log::trace!("Encoded {} = {} for CAN ID 0x{:X}", signal.generic_name, physical, signal.message_id);
    Ok(CanFrame {
        is_extended: signal.extended,
        ..CanFrame::new(signal.message_id, data)
    })
}

/// Encode `value` for the signal behind `handle` and transmit its message.
///
/// Failures are logged and reported as `false`.
pub fn send_can_signal(
    handle: SignalHandle,
    value: &Value,
    writer: ValueWriter,
    signals: &SignalTable,
    bus: &mut dyn CanWriter,
) -> bool {
    let name = &signals.get(handle).generic_name;

    let frame = match build_command_frame(handle, value, writer, signals) {
        Ok(frame) => frame,
        Err(e) => {
            log::warn!("{}", e);
            return false;
        }
    };

    match bus.write(&frame) {
        Ok(()) => {
            log::debug!("Sent {} = {} on CAN ID 0x{:X}", name, value, frame.can_id);
            true
        }
        Err(e) => {
            log::warn!("Failed to send signal '{}': {}", name, e);
            false
        }
    }
}
