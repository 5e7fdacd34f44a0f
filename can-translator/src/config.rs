//! Translator configuration types
//!
//! Describes the vehicle's signal table: inline signal definitions, DBC files
//! to import, handler bindings for imported signals and message-level
//! handlers. The CLI deserializes this from TOML.

use crate::composite::MessageHandler;
use crate::handlers::SignalHandler;
use crate::signals::database::{ByteOrder, SignalState, ValueType};
use crate::types::is_extended_id;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the translator library
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslatorConfig {
    /// DBC files to import signal layouts from
    #[serde(default)]
    pub dbc_files: Vec<PathBuf>,

    /// Signals defined inline
    #[serde(default)]
    pub signals: Vec<SignalConfig>,

    /// Selects DBC signals and attaches handlers to them
    #[serde(default)]
    pub bindings: Vec<SignalBinding>,

    /// Message-level handlers keyed by CAN ID
    #[serde(default)]
    pub messages: Vec<MessageConfig>,
}

/// Definition of one CAN signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalConfig {
    /// Vehicle-agnostic name used for output events
    pub generic_name: String,
    /// Enclosing CAN message ID
    pub message_id: u32,
    /// Start bit in the CAN frame
    pub bit_position: u16,
    /// Length in bits
    pub bit_size: u16,
    /// Extended (29-bit) message; inferred from the ID when absent
    #[serde(default)]
    pub extended: Option<bool>,
    #[serde(default)]
    pub byte_order: ByteOrder,
    #[serde(default)]
    pub value_type: ValueType,
    #[serde(default = "default_factor")]
    pub factor: f64,
    #[serde(default)]
    pub offset: f64,
    /// Derived from the bit size and value type when absent
    #[serde(default)]
    pub min_value: Option<f64>,
    /// Derived from the bit size and value type when absent
    #[serde(default)]
    pub max_value: Option<f64>,
    #[serde(default)]
    pub send_same: bool,
    #[serde(default)]
    pub writable: bool,
    #[serde(default)]
    pub states: Vec<SignalState>,
    #[serde(default)]
    pub handler: Option<SignalHandler>,
}

fn default_factor() -> f64 {
    1.0
}

impl SignalConfig {
    /// Create an unscaled, unsigned little-endian signal
    pub fn new(generic_name: impl Into<String>, message_id: u32, bit_position: u16, bit_size: u16) -> Self {
        Self {
            generic_name: generic_name.into(),
            message_id,
            bit_position,
            bit_size,
            extended: None,
            byte_order: ByteOrder::default(),
            value_type: ValueType::default(),
            factor: default_factor(),
            offset: 0.0,
            min_value: None,
            max_value: None,
            send_same: false,
            writable: false,
            states: Vec::new(),
            handler: None,
        }
    }

    /// Builder method: set scaling
    pub fn with_scaling(mut self, factor: f64, offset: f64) -> Self {
        self.factor = factor;
        self.offset = offset;
        self
    }

    /// Builder method: set the physical range
    pub fn with_range(mut self, min_value: f64, max_value: f64) -> Self {
        self.min_value = Some(min_value);
        self.max_value = Some(max_value);
        self
    }

    /// Builder method: attach a value transformer
    pub fn with_handler(mut self, handler: SignalHandler) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Builder method: emit on every update
    pub fn with_send_same(mut self, send_same: bool) -> Self {
        self.send_same = send_same;
        self
    }

    /// Builder method: accept inbound writes
    pub fn with_writable(mut self, writable: bool) -> Self {
        self.writable = writable;
        self
    }

    /// Builder method: add an enumerated state
    pub fn add_state(mut self, value: i64, name: impl Into<String>) -> Self {
        self.states.push(SignalState {
            value,
            name: name.into(),
        });
        self
    }

    /// Apply a binding on top of an imported definition
    pub fn apply_binding(&mut self, binding: &SignalBinding) {
        if let Some(ref name) = binding.generic_name {
            self.generic_name = name.clone();
        }
        if binding.handler.is_some() {
            self.handler = binding.handler.clone();
        }
        if !binding.states.is_empty() {
            self.states = binding.states.clone();
        }
        if let Some(max_value) = binding.max_value {
            self.max_value = Some(max_value);
        }
        self.send_same = binding.send_same;
        self.writable = binding.writable;
    }
}

/// Attaches translation behaviour to a signal imported from a DBC file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalBinding {
    /// Signal name as it appears in the DBC
    pub signal: String,
    /// Generic name to publish under (defaults to the DBC name)
    #[serde(default)]
    pub generic_name: Option<String>,
    #[serde(default)]
    pub handler: Option<SignalHandler>,
    #[serde(default)]
    pub send_same: bool,
    #[serde(default)]
    pub writable: bool,
    #[serde(default)]
    pub states: Vec<SignalState>,
    /// Overrides the DBC maximum (wrap point of rolling counters)
    #[serde(default)]
    pub max_value: Option<f64>,
}

impl SignalBinding {
    pub fn new(signal: impl Into<String>) -> Self {
        Self {
            signal: signal.into(),
            generic_name: None,
            handler: None,
            send_same: false,
            writable: false,
            states: Vec::new(),
            max_value: None,
        }
    }
}

/// Message-level handler registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageConfig {
    /// CAN message ID
    pub id: u32,
    /// Extended (29-bit) message; inferred from the ID when absent
    #[serde(default)]
    pub extended: Option<bool>,
    pub handler: MessageHandler,
}

impl MessageConfig {
    pub fn is_extended(&self) -> bool {
        self.extended.unwrap_or_else(|| is_extended_id(self.id))
    }
}

impl TranslatorConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: add an inline signal
    pub fn with_signal(mut self, signal: SignalConfig) -> Self {
        self.signals.push(signal);
        self
    }

    /// Builder method: import a DBC file
    pub fn with_dbc_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.dbc_files.push(path.into());
        self
    }

    /// Builder method: bind a DBC signal
    pub fn with_binding(mut self, binding: SignalBinding) -> Self {
        self.bindings.push(binding);
        self
    }

    /// Builder method: register a message-level handler
    pub fn with_message_handler(mut self, id: u32, handler: MessageHandler) -> Self {
        self.messages.push(MessageConfig { id, extended: None, handler });
        self
    }
}
