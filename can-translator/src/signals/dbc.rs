//! DBC file importer
//!
//! Parses Vector DBC files into signal configurations. Imported signals are
//! named after their DBC names; bindings in the translator configuration
//! select the ones to translate and attach handlers.

use crate::config::SignalConfig;
use crate::signals::database::{ByteOrder, ValueType};
use crate::types::{Result, TranslatorError};
use std::path::Path;

/// Flag set by DBC files on 29-bit message IDs
const EXTENDED_ID_FLAG: u32 = 0x8000_0000;

/// Parse a DBC file and return its signal definitions
pub fn parse_dbc_file(path: &Path) -> Result<Vec<SignalConfig>> {
    log::info!("Parsing DBC file: {:?}", path);

    let bytes = std::fs::read(path)
        .map_err(|e| TranslatorError::DbcParse(format!("Failed to read file {:?}: {}", path, e)))?;

    // Not every tool writes UTF-8; fall back to Latin-1
    let dbc_content = match String::from_utf8(bytes) {
        Ok(content) => content,
        Err(e) => {
            log::warn!("DBC file is not UTF-8, trying Latin-1 encoding");
            e.into_bytes().iter().map(|&b| b as char).collect()
        }
    };

    let dbc = can_dbc::DBC::from_slice(dbc_content.as_bytes())
        .map_err(|e| TranslatorError::DbcParse(format!("Failed to parse DBC file {:?}: {:?}", path, e)))?;

    let mut signals = Vec::new();
    for dbc_msg in dbc.messages() {
        let raw_id = dbc_msg.message_id().0;
        let message_id = raw_id & !EXTENDED_ID_FLAG;
        let extended = raw_id & EXTENDED_ID_FLAG != 0;

        for dbc_sig in dbc_msg.signals() {
            if let can_dbc::MultiplexIndicator::MultiplexedSignal(_) = *dbc_sig.multiplexer_indicator() {
                log::debug!(
                    "Skipping multiplexed signal '{}' in {}",
                    dbc_sig.name(),
                    dbc_msg.message_name()
                );
                continue;
            }
            signals.push(convert_signal(dbc_sig, message_id, extended));
        }
    }

    log::info!("Parsed {} signals from {:?}", signals.len(), path);
    Ok(signals)
}

/// Convert a can-dbc signal to our SignalConfig
fn convert_signal(dbc_sig: &can_dbc::Signal, message_id: u32, extended: bool) -> SignalConfig {
    let start_bit = *dbc_sig.start_bit() as u16;

    // Motorola start bits name the MSB in sawtooth numbering; we count
    // forward from the MSB of byte 0
    let (byte_order, bit_position) = match *dbc_sig.byte_order() {
        can_dbc::ByteOrder::LittleEndian => (ByteOrder::LittleEndian, start_bit),
        can_dbc::ByteOrder::BigEndian => (ByteOrder::BigEndian, (start_bit / 8) * 8 + (7 - start_bit % 8)),
    };

    let value_type = match *dbc_sig.value_type() {
        can_dbc::ValueType::Signed => ValueType::Signed,
        can_dbc::ValueType::Unsigned => ValueType::Unsigned,
    };

    let (min, max) = (*dbc_sig.min(), *dbc_sig.max());

    let mut signal = SignalConfig::new(dbc_sig.name().to_string(), message_id, bit_position, *dbc_sig.signal_size() as u16)
        .with_scaling(*dbc_sig.factor(), *dbc_sig.offset());
    signal.extended = Some(extended);
    signal.byte_order = byte_order;
    signal.value_type = value_type;
    // An empty [0|0] range means "unspecified" in DBC
    if max > min {
        signal.min_value = Some(min);
        signal.max_value = Some(max);
    }
    signal
}
