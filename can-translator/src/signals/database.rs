//! Signal table
//!
//! Owns every signal descriptor for the vehicle together with the mutable
//! "last observed" state. Generic names are resolved to stable integer
//! handles once, when the descriptor is added.

use crate::codec::signed_bounds;
use crate::config::SignalConfig;
use crate::handlers::SignalHandler;
use crate::types::{is_extended_id, Result, TranslatorError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Byte order for signal extraction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrder {
    /// Little-endian (Intel format)
    #[default]
    LittleEndian,
    /// Big-endian (Motorola format)
    BigEndian,
}

/// Value type for signal interpretation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Signed integer
    Signed,
    /// Unsigned integer
    #[default]
    Unsigned,
}

/// One entry of an enumerated signal: raw code and its name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalState {
    pub value: i64,
    pub name: String,
}

/// Stable index of a descriptor inside a [`SignalTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignalHandle(usize);

/// Configuration and last-observed state of one CAN signal
#[derive(Debug, Clone, PartialEq)]
pub struct SignalDescriptor {
    /// Vehicle-agnostic name used for output events
    pub generic_name: String,
    /// Enclosing CAN message ID
    pub message_id: u32,
    /// Enclosing message uses an extended (29-bit) ID
    pub extended: bool,
    /// Start bit in the CAN frame
    pub bit_position: u16,
    /// Length in bits
    pub bit_size: u16,
    pub byte_order: ByteOrder,
    pub value_type: ValueType,
    /// Scale factor to convert raw value to physical value
    pub factor: f64,
    /// Offset to add after scaling
    pub offset: f64,
    /// Minimum physical value
    pub min_value: f64,
    /// Maximum physical value; rolling counters wrap past it
    pub max_value: f64,
    /// Emit on every update, not only on change
    pub send_same: bool,
    /// May be written by inbound commands
    pub writable: bool,
    /// Enumeration used by state handlers and writers
    pub states: Vec<SignalState>,
    /// Transformer applied when the enclosing message is received
    pub handler: Option<SignalHandler>,
    /// True once a value has been decoded for this signal
    pub received: bool,
    /// Most recent decoded physical value
    pub last_value: f64,
}

impl SignalDescriptor {
    /// Build a descriptor from its configuration.
    ///
    /// A missing bound is derived from the bit size and value type, so
    /// rolling counters wrap at the largest representable physical value
    /// and signed signals keep their negative half.
    pub fn from_config(config: &SignalConfig) -> Result<Self> {
        if config.bit_size == 0 || config.bit_size > 64 {
            return Err(TranslatorError::InvalidSignalDefinition(format!(
                "Signal '{}' has invalid bit size {}",
                config.generic_name, config.bit_size
            )));
        }
        if config.factor == 0.0 {
            return Err(TranslatorError::InvalidSignalDefinition(format!(
                "Signal '{}' has a zero factor",
                config.generic_name
            )));
        }

        let (derived_min, derived_max) =
            Self::derived_range(config.bit_size, config.value_type, config.factor, config.offset);
        let min_value = config.min_value.unwrap_or(derived_min);
        let max_value = config.max_value.unwrap_or(derived_max);

        Ok(Self {
            generic_name: config.generic_name.clone(),
            message_id: config.message_id,
            extended: config.extended.unwrap_or_else(|| is_extended_id(config.message_id)),
            bit_position: config.bit_position,
            bit_size: config.bit_size,
            byte_order: config.byte_order,
            value_type: config.value_type,
            factor: config.factor,
            offset: config.offset,
            min_value,
            max_value,
            send_same: config.send_same,
            writable: config.writable,
            states: config.states.clone(),
            handler: config.handler.clone(),
            received: false,
            last_value: 0.0,
        })
    }

    fn derived_range(bit_size: u16, value_type: ValueType, factor: f64, offset: f64) -> (f64, f64) {
        let (raw_min, raw_max) = match value_type {
            ValueType::Unsigned if bit_size >= 64 => (0.0, u64::MAX as f64),
            ValueType::Unsigned => (0.0, ((1u64 << bit_size) - 1) as f64),
            ValueType::Signed => {
                let (min, max) = signed_bounds(bit_size as usize);
                (min as f64, max as f64)
            }
        };
        let low = offset + factor * raw_min;
        let high = offset + factor * raw_max;
        // A negative factor flips the range
        (low.min(high), low.max(high))
    }

    /// Name of the state whose code matches `value`
    pub fn state_name(&self, value: f64) -> Option<&str> {
        self.states
            .iter()
            .find(|state| state.value as f64 == value)
            .map(|state| state.name.as_str())
    }

    /// Code of the state called `name`
    pub fn state_value(&self, name: &str) -> Option<i64> {
        self.states
            .iter()
            .find(|state| state.name == name)
            .map(|state| state.value)
    }
}

/// All signal descriptors known to the translator
#[derive(Debug, Clone, Default)]
pub struct SignalTable {
    /// Descriptors in configuration order
    signals: Vec<SignalDescriptor>,

    /// Generic name lookup
    by_name: HashMap<String, SignalHandle>,

    /// Descriptors grouped by enclosing CAN ID and ID format, in table order
    by_message: HashMap<(u32, bool), Vec<SignalHandle>>,
}

impl SignalTable {
    /// Create a new empty signal table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a descriptor; generic names must be unique
    pub fn add(&mut self, descriptor: SignalDescriptor) -> Result<SignalHandle> {
        if self.by_name.contains_key(&descriptor.generic_name) {
            return Err(TranslatorError::DuplicateSignal(descriptor.generic_name));
        }

        let handle = SignalHandle(self.signals.len());
        self.by_name.insert(descriptor.generic_name.clone(), handle);
        self.by_message
            .entry((descriptor.message_id, descriptor.extended))
            .or_default()
            .push(handle);
        self.signals.push(descriptor);
        Ok(handle)
    }

    /// Resolve a generic name to its handle
    pub fn lookup(&self, generic_name: &str) -> Option<SignalHandle> {
        self.by_name.get(generic_name).copied()
    }

    /// Find a descriptor by generic name
    pub fn find(&self, generic_name: &str) -> Option<&SignalDescriptor> {
        self.lookup(generic_name).map(|handle| self.get(handle))
    }

    pub fn get(&self, handle: SignalHandle) -> &SignalDescriptor {
        &self.signals[handle.0]
    }

    pub fn get_mut(&mut self, handle: SignalHandle) -> &mut SignalDescriptor {
        &mut self.signals[handle.0]
    }

    /// Handles of every descriptor carried by a CAN message, in table order.
    ///
    /// Standard and extended frames sharing a numeric ID are different
    /// messages.
    pub fn signals_for_message(&self, message_id: u32, extended: bool) -> &[SignalHandle] {
        self.by_message
            .get(&(message_id, extended))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Get all unique CAN IDs referenced by the table
    pub fn message_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.by_message.keys().map(|(id, _)| *id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Get table statistics
    pub fn stats(&self) -> TableStats {
        TableStats {
            num_messages: self.by_message.len(),
            num_signals: self.signals.len(),
            num_writable: self.signals.iter().filter(|s| s.writable).count(),
        }
    }
}

/// Signal table statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableStats {
    /// Number of distinct CAN messages
    pub num_messages: usize,
    /// Total number of signal descriptors
    pub num_signals: usize,
    /// Descriptors accepting inbound writes
    pub num_writable: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(name: &str, message_id: u32) -> SignalConfig {
        SignalConfig::new(name, message_id, 0, 8)
    }

    #[test]
    fn test_empty_table() {
        let table = SignalTable::new();
        let stats = table.stats();
        assert_eq!(stats.num_messages, 0);
        assert_eq!(stats.num_signals, 0);
        assert!(table.is_empty());
    }

    #[test]
    fn test_add_and_lookup() {
        let mut table = SignalTable::new();
        let speed = SignalDescriptor::from_config(&config("vehicle_speed", 0x123)).unwrap();
        let rpm = SignalDescriptor::from_config(&config("engine_speed", 0x123)).unwrap();
        let fuel = SignalDescriptor::from_config(&config("fuel_level", 0x200)).unwrap();

        let speed_handle = table.add(speed).unwrap();
        let rpm_handle = table.add(rpm).unwrap();
        table.add(fuel).unwrap();

        assert_eq!(table.lookup("vehicle_speed"), Some(speed_handle));
        assert_eq!(table.find("engine_speed").unwrap().message_id, 0x123);
        assert!(table.lookup("odometer").is_none());
        assert_eq!(table.signals_for_message(0x123, false), &[speed_handle, rpm_handle]);
        assert!(table.signals_for_message(0x123, true).is_empty());
        assert!(table.signals_for_message(0x999, false).is_empty());
        assert_eq!(table.message_ids(), vec![0x123, 0x200]);
        assert_eq!(table.stats().num_messages, 2);
    }

    #[test]
    fn test_standard_and_extended_ids_are_distinct() {
        let mut table = SignalTable::new();
        let standard = table
            .add(SignalDescriptor::from_config(&config("gear_position", 0x100)).unwrap())
            .unwrap();
        let mut extended = config("trailer_brake", 0x100);
        extended.extended = Some(true);
        let extended = table.add(SignalDescriptor::from_config(&extended).unwrap()).unwrap();
        let inferred = table
            .add(SignalDescriptor::from_config(&config("engine_hours", 0x18FEE500)).unwrap())
            .unwrap();

        assert_eq!(table.signals_for_message(0x100, false), &[standard]);
        assert_eq!(table.signals_for_message(0x100, true), &[extended]);
        assert_eq!(table.signals_for_message(0x18FEE500, true), &[inferred]);
        assert_eq!(table.message_ids(), vec![0x100, 0x18FEE500]);
        assert_eq!(table.stats().num_messages, 3);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut table = SignalTable::new();
        table
            .add(SignalDescriptor::from_config(&config("odometer", 0x10)).unwrap())
            .unwrap();
        let result = table.add(SignalDescriptor::from_config(&config("odometer", 0x20)).unwrap());
        assert!(matches!(result, Err(TranslatorError::DuplicateSignal(_))));
    }

    #[test]
    fn test_derived_max_value() {
        let descriptor = SignalDescriptor::from_config(&config("counter", 0x10)).unwrap();
        assert_eq!(descriptor.max_value, 255.0);

        let mut scaled = SignalConfig::new("odometer", 0x10, 0, 10);
        scaled.factor = 0.5;
        let descriptor = SignalDescriptor::from_config(&scaled).unwrap();
        assert_eq!(descriptor.max_value, 511.5);
    }

    #[test]
    fn test_derived_signed_range() {
        let mut trim = config("trim_offset", 0x10);
        trim.value_type = ValueType::Signed;
        let descriptor = SignalDescriptor::from_config(&trim).unwrap();
        assert_eq!((descriptor.min_value, descriptor.max_value), (-128.0, 127.0));

        let inverted = SignalConfig::new("brake_torque", 0x10, 0, 8).with_scaling(-2.0, 10.0);
        let descriptor = SignalDescriptor::from_config(&inverted).unwrap();
        assert_eq!((descriptor.min_value, descriptor.max_value), (-500.0, 10.0));
    }

    #[test]
    fn test_configured_bounds_win() {
        let mut cfg = config("fan_speed", 0x10);
        cfg.min_value = Some(10.0);
        let descriptor = SignalDescriptor::from_config(&cfg).unwrap();
        assert_eq!((descriptor.min_value, descriptor.max_value), (10.0, 255.0));
    }

    #[test]
    fn test_invalid_bit_size() {
        let result = SignalDescriptor::from_config(&SignalConfig::new("bad", 0x10, 0, 0));
        assert!(matches!(result, Err(TranslatorError::InvalidSignalDefinition(_))));
    }

    #[test]
    fn test_state_lookup() {
        let mut cfg = config("button_state", 0x300);
        cfg.states = vec![
            SignalState { value: 0, name: "idle".to_string() },
            SignalState { value: 1, name: "pressed".to_string() },
        ];
        let descriptor = SignalDescriptor::from_config(&cfg).unwrap();
        assert_eq!(descriptor.state_name(1.0), Some("pressed"));
        assert_eq!(descriptor.state_name(7.0), None);
        assert_eq!(descriptor.state_value("idle"), Some(0));
    }
}
