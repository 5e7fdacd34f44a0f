//! Main translator API
//!
//! The `Translator` owns the signal table and the cumulative counters for one
//! vehicle. The transport layer feeds it raw frames; it decodes the signals
//! each frame carries, runs their transformers and hands surviving events
//! to a listener. Inbound commands go the other way, out to a `CanWriter`.

use crate::accumulator::AccumulatorState;
use crate::codec::decode_can_signal;
use crate::composite::{handle_turn_signal_command, send_door_status, MessageHandler, TURN_SIGNAL_COMMAND_NAME};
use crate::config::TranslatorConfig;
use crate::emission::{send_message, EmissionPolicy, Listener};
use crate::handlers::{transform, SignalHandler};
use crate::signals::database::{SignalDescriptor, SignalHandle, SignalTable, TableStats};
use crate::transmit::{boolean_writer, number_writer, send_can_signal, state_writer, CanWriter, ValueWriter};
use crate::types::{CanFrame, Result, TranslatorError};
use serde_json::Value;
use std::collections::HashMap;

/// Translation context for one vehicle
pub struct Translator {
    /// Signal descriptors and their last observed values
    signals: SignalTable,

    /// Counters accumulated since the translator was created
    accumulators: AccumulatorState,

    /// Message-level handlers by CAN ID and ID format
    message_handlers: HashMap<(u32, bool), Vec<MessageHandler>>,
}

impl Translator {
    /// Create a translator over an already populated signal table
    pub fn new(signals: SignalTable) -> Self {
        Self {
            signals,
            accumulators: AccumulatorState::new(),
            message_handlers: HashMap::new(),
        }
    }

    /// Build the signal table described by `config`.
    ///
    /// DBC files are parsed first; only the DBC signals named by a binding
    /// are added, after inline signals, in binding order.
    pub fn from_config(config: &TranslatorConfig) -> Result<Self> {
        let mut signals = SignalTable::new();

        for signal in &config.signals {
            signals.add(SignalDescriptor::from_config(signal)?)?;
        }

        let mut imported = Vec::new();
        for path in &config.dbc_files {
            imported.extend(crate::signals::dbc::parse_dbc_file(path)?);
        }

        for binding in &config.bindings {
            let mut signal = imported
                .iter()
                .find(|s| s.generic_name == binding.signal)
                .cloned()
                .ok_or_else(|| TranslatorError::SignalNotFound(binding.signal.clone()))?;
            signal.apply_binding(binding);
            signals.add(SignalDescriptor::from_config(&signal)?)?;
        }

        let mut translator = Self::new(signals);
        for message in &config.messages {
            translator.add_message_handler(message.id, message.is_extended(), message.handler);
        }

        log::info!(
            "Translator ready: {} signals across {} messages",
            translator.signals.len(),
            translator.signals.message_ids().len()
        );
        Ok(translator)
    }

    /// Register a message-level handler for a standard or extended CAN ID
    pub fn add_message_handler(&mut self, message_id: u32, extended: bool, handler: MessageHandler) {
        self.message_handlers
            .entry((message_id, extended))
            .or_default()
            .push(handler);
    }

    /// Translate one received frame.
    ///
    /// Message-level handlers run first. Then every signal of the message is
    /// decoded in table order; signals with a transformer go through it and
    /// the emission policy, the rest are only recorded so sibling lookups
    /// see their latest value.
    pub fn process_frame(&mut self, frame: &CanFrame, listener: &mut dyn Listener) {
        let can_id = frame.can_id;
        let key = (can_id, frame.is_extended);

        if let Some(handlers) = self.message_handlers.get(&key) {
            for handler in handlers {
                log::trace!("Running {:?} handler for CAN ID 0x{:X}", handler, can_id);
                handler.handle(can_id, &frame.data, &self.signals, listener);
            }
        }

        let handles = self.signals.signals_for_message(can_id, frame.is_extended).to_vec();
        if handles.is_empty() && !self.message_handlers.contains_key(&key) {
            log::trace!("Unknown CAN ID: 0x{:X}", can_id);
            return;
        }

        for handle in handles {
            self.translate_signal(handle, &frame.data, listener);
        }
    }

    fn translate_signal(&mut self, handle: SignalHandle, data: &[u8], listener: &mut dyn Listener) {
        let signal = self.signals.get(handle);
        let Some(raw_value) = decode_can_signal(signal, data) else {
            return;
        };

        let verdict = match &signal.handler {
            None => {
                EmissionPolicy::commit(self.signals.get_mut(handle), raw_value);
                return;
            }
            Some(SignalHandler::DoorStatus { door }) => {
                let door = door.clone();
                send_door_status(&door, data, handle, &mut self.signals, listener);
                return;
            }
            Some(handler) => transform(handler, signal, &self.signals, &mut self.accumulators, raw_value),
        };

        let signal = self.signals.get_mut(handle);
        if let Some(value) = EmissionPolicy::apply(signal, raw_value, verdict) {
            send_message(&signal.generic_name, value, listener);
        }
    }

    /// Handle an inbound command.
    ///
    /// `turn_signal_status` switches on a turn signal; any other name must be
    /// a writable signal, written with the converter matching its handler.
    /// Failures are logged and reported as `false`.
    pub fn handle_command(&mut self, name: &str, value: &Value, bus: &mut dyn CanWriter) -> bool {
        if name == TURN_SIGNAL_COMMAND_NAME {
            return handle_turn_signal_command(name, value, &self.signals, bus);
        }

        let Some(handle) = self.signals.lookup(name) else {
            log::debug!("No command or signal named '{}'", name);
            return false;
        };

        let signal = self.signals.get(handle);
        if !signal.writable {
            log::warn!("Signal '{}' is not writable", name);
            return false;
        }

        send_can_signal(handle, value, Self::writer_for(signal), &self.signals, bus)
    }

    fn writer_for(signal: &SignalDescriptor) -> ValueWriter {
        match signal.handler {
            Some(SignalHandler::State) => state_writer,
            Some(ref handler) if handler.is_boolean() => boolean_writer,
            _ => number_writer,
        }
    }

    /// Counters accumulated since start or the last reset
    pub fn accumulators(&self) -> &AccumulatorState {
        &self.accumulators
    }

    /// Zero the cumulative counters
    pub fn reset_accumulators(&mut self) {
        self.accumulators = AccumulatorState::new();
    }

    pub fn signals(&self) -> &SignalTable {
        &self.signals
    }

    /// Get statistics about the loaded signal table
    pub fn table_stats(&self) -> TableStats {
        self.signals.stats()
    }
}
