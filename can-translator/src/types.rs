//! Core types for the CAN translator library
//!
//! This module defines the raw frame type handed to the translator by the
//! transport layer and the error type used by the loading and transmit seams.
//! Frame handling itself never fails: missing or unmapped signals only veto
//! the affected event.

use chrono::{DateTime, Utc};

/// Timestamp type used throughout the translator
pub type Timestamp = DateTime<Utc>;

/// Result type for translator operations
pub type Result<T> = std::result::Result<T, TranslatorError>;

/// Largest identifier of a standard (11-bit) frame
pub const MAX_STANDARD_ID: u32 = 0x7FF;

/// Whether `can_id` needs an extended (29-bit) frame
pub fn is_extended_id(can_id: u32) -> bool {
    can_id > MAX_STANDARD_ID
}

/// Raw CAN frame as delivered by the transport layer
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CanFrame {
    /// Reception time in nanoseconds since epoch (0 if unknown)
    pub timestamp_ns: u64,
    /// CAN channel / bus number
    pub channel: u8,
    /// CAN message ID (11-bit or 29-bit)
    pub can_id: u32,
    /// Frame payload (0-8 bytes for classic CAN, up to 64 for CAN-FD)
    pub data: Vec<u8>,
    /// True if this is an extended (29-bit) CAN ID
    pub is_extended: bool,
}

impl CanFrame {
    /// Build a frame for the given ID and payload on channel 0
    pub fn new(can_id: u32, data: impl Into<Vec<u8>>) -> Self {
        Self {
            can_id,
            data: data.into(),
            is_extended: is_extended_id(can_id),
            ..Self::default()
        }
    }

    /// Convert timestamp from nanoseconds to DateTime<Utc>
    pub fn timestamp(&self) -> Timestamp {
        let secs = (self.timestamp_ns / 1_000_000_000) as i64;
        let nsecs = (self.timestamp_ns % 1_000_000_000) as u32;
        DateTime::from_timestamp(secs, nsecs).unwrap_or_else(Utc::now)
    }

    /// Get the data length code (DLC) - number of data bytes
    pub fn dlc(&self) -> usize {
        self.data.len()
    }
}

/// Errors raised while loading configuration or talking to the bus
#[derive(Debug, thiserror::Error)]
pub enum TranslatorError {
    #[error("Failed to parse DBC file: {0}")]
    DbcParse(String),

    #[error("Signal not found: {0}")]
    SignalNotFound(String),

    #[error("Duplicate signal name: {0}")]
    DuplicateSignal(String),

    #[error("Invalid signal definition: {0}")]
    InvalidSignalDefinition(String),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Failed to transmit CAN ID 0x{0:X}: {1}")]
    Transmit(u32, String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
