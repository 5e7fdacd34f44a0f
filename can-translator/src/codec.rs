//! Signal codec
//!
//! Extracts physical signal values from raw CAN payloads and writes them
//! back for transmission. Handles bit placement, endianness, sign extension
//! and the factor/offset conversion.

use crate::signals::database::{ByteOrder, SignalDescriptor, ValueType};
use crate::types::{Result, TranslatorError};

/// Decode the physical value of `signal` from a frame payload.
///
/// Returns `None` when the signal does not fit in the payload.
pub fn decode_can_signal(signal: &SignalDescriptor, data: &[u8]) -> Option<f64> {
    let start_bit = signal.bit_position as usize;
    let length = signal.bit_size as usize;

    if !fits(data, start_bit, length) {
        log::warn!(
            "Signal '{}' requires {} bytes but frame only has {} bytes",
            signal.generic_name,
            required_bytes(start_bit, length),
            data.len()
        );
        return None;
    }

    let raw_value = match signal.byte_order {
        ByteOrder::LittleEndian => extract_little_endian(data, start_bit, length),
        ByteOrder::BigEndian => extract_big_endian(data, start_bit, length),
    };

    let raw = match signal.value_type {
        ValueType::Unsigned => raw_value as f64,
        ValueType::Signed => sign_extend(raw_value, length) as f64,
    };

    Some(signal.offset + signal.factor * raw)
}

/// Encode a physical value for `signal` into a frame payload.
///
/// The value is clamped to the signal's physical range (when one is
/// configured) and to what the bit field can represent. Bits outside the
/// signal are left untouched.
pub fn encode_can_signal(signal: &SignalDescriptor, value: f64, data: &mut [u8]) -> Result<()> {
    let start_bit = signal.bit_position as usize;
    let length = signal.bit_size as usize;

    if !fits(data, start_bit, length) {
        return Err(TranslatorError::InvalidSignalDefinition(format!(
            "Signal '{}' requires {} bytes but frame only has {} bytes",
            signal.generic_name,
            required_bytes(start_bit, length),
            data.len()
        )));
    }

    let value = if signal.min_value < signal.max_value {
        value.clamp(signal.min_value, signal.max_value)
    } else {
        value
    };

    let raw = ((value - signal.offset) / signal.factor).round();
    let bits = match signal.value_type {
        ValueType::Unsigned => {
            let max = if length >= 64 { u64::MAX as f64 } else { ((1u64 << length) - 1) as f64 };
            raw.clamp(0.0, max) as u64
        }
        ValueType::Signed => {
            let (min, max) = signed_bounds(length);
            (raw.clamp(min as f64, max as f64) as i64) as u64
        }
    };
    let bits = if length >= 64 { bits } else { bits & ((1u64 << length) - 1) };

    match signal.byte_order {
        ByteOrder::LittleEndian => insert_little_endian(data, start_bit, length, bits),
        ByteOrder::BigEndian => insert_big_endian(data, start_bit, length, bits),
    }
    Ok(())
}

fn required_bytes(start_bit: usize, length: usize) -> usize {
    (start_bit + length).div_ceil(8)
}

fn fits(data: &[u8], start_bit: usize, length: usize) -> bool {
    length > 0 && length <= 64 && required_bytes(start_bit, length) <= data.len()
}

pub(crate) fn signed_bounds(length: usize) -> (i64, i64) {
    if length >= 64 {
        (i64::MIN, i64::MAX)
    } else {
        let half = 1i64 << (length - 1);
        (-half, half - 1)
    }
}

/// Extract signal with little-endian (Intel) byte order
///
/// Little-endian format:
/// - Start bit points to the LSB (least significant bit)
/// - Bits are numbered from LSB to MSB within each byte
/// - Byte 0 is the first byte in the CAN frame
fn extract_little_endian(data: &[u8], start_bit: usize, length: usize) -> u64 {
    let mut result: u64 = 0;

    for i in 0..length {
        let bit_pos = start_bit + i;
        let byte_idx = bit_pos / 8;
        let bit_in_byte = bit_pos % 8;

        if byte_idx < data.len() {
            let bit_value = (data[byte_idx] >> bit_in_byte) & 0x01;
            result |= (bit_value as u64) << i;
        }
    }

    result
}

/// Extract signal with big-endian (Motorola) byte order
///
/// - Start bit points to the MSB of the signal
/// - Bit numbering: bit 0 = MSB of byte 0, bit 7 = LSB of byte 0
/// - Signal grows towards higher bit numbers
fn extract_big_endian(data: &[u8], start_bit: usize, length: usize) -> u64 {
    let mut result: u64 = 0;

    for i in 0..length {
        let bit_pos = start_bit + i;
        let byte_idx = bit_pos / 8;
        let bit_in_byte = 7 - (bit_pos % 8);

        if byte_idx < data.len() {
            let bit_value = (data[byte_idx] >> bit_in_byte) & 0x01;
            result |= (bit_value as u64) << (length - 1 - i);
        }
    }

    result
}

fn insert_little_endian(data: &mut [u8], start_bit: usize, length: usize, value: u64) {
    for i in 0..length {
        let bit_pos = start_bit + i;
        let byte_idx = bit_pos / 8;
        let bit_in_byte = bit_pos % 8;
        let bit_value = ((value >> i) & 0x01) as u8;

        data[byte_idx] = (data[byte_idx] & !(1 << bit_in_byte)) | (bit_value << bit_in_byte);
    }
}

fn insert_big_endian(data: &mut [u8], start_bit: usize, length: usize, value: u64) {
    for i in 0..length {
        let bit_pos = start_bit + i;
        let byte_idx = bit_pos / 8;
        let bit_in_byte = 7 - (bit_pos % 8);
        let bit_value = ((value >> (length - 1 - i)) & 0x01) as u8;

        data[byte_idx] = (data[byte_idx] & !(1 << bit_in_byte)) | (bit_value << bit_in_byte);
    }
}

/// Sign-extend a value from N bits to 64 bits
fn sign_extend(value: u64, bit_length: usize) -> i64 {
    if bit_length >= 64 {
        return value as i64;
    }

    let sign_bit = 1u64 << (bit_length - 1);
    if (value & sign_bit) != 0 {
        let mask = !0u64 << bit_length;
        (value | mask) as i64
    } else {
        value as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SignalConfig;

    fn descriptor(config: SignalConfig) -> SignalDescriptor {
        SignalDescriptor::from_config(&config).unwrap()
    }

    #[test]
    fn test_extract_little_endian_cross_byte() {
        let data = vec![0xAB, 0xCD, 0xEF, 0x12];
        assert_eq!(extract_little_endian(&data, 0, 8), 0xAB);
        assert_eq!(extract_little_endian(&data, 0, 16), 0xCDAB);
    }

    #[test]
    fn test_extract_big_endian_simple() {
        let data = vec![0xAB, 0xCD, 0xEF, 0x12];
        assert_eq!(extract_big_endian(&data, 0, 8), 0xAB);
        assert_eq!(extract_big_endian(&data, 0, 16), 0xABCD);
    }

    #[test]
    fn test_sign_extend() {
        assert_eq!(sign_extend(0x7F, 8), 127);
        assert_eq!(sign_extend(0xFF, 8), -1);
        assert_eq!(sign_extend(0x8000, 16), -32768);
    }

    #[test]
    fn test_decode_scaled_signal() {
        let signal = descriptor(SignalConfig::new("engine_speed", 0x100, 8, 16).with_scaling(0.25, 0.0));
        // Raw 0x0FA0 = 4000 -> 1000 rpm
        let data = [0x00, 0xA0, 0x0F, 0x00];
        assert_eq!(decode_can_signal(&signal, &data), Some(1000.0));
    }

    #[test]
    fn test_decode_signed_with_offset() {
        let mut config = SignalConfig::new("engine_temp", 0x100, 0, 8).with_scaling(1.0, -40.0);
        config.value_type = ValueType::Signed;
        let signal = descriptor(config);
        assert_eq!(decode_can_signal(&signal, &[0xFF]), Some(-41.0));
    }

    #[test]
    fn test_decode_short_payload() {
        let signal = descriptor(SignalConfig::new("odometer", 0x100, 16, 16));
        assert_eq!(decode_can_signal(&signal, &[0x01, 0x02]), None);
    }

    #[test]
    fn test_encode_preserves_neighbours() {
        let signal = descriptor(SignalConfig::new("turn_signal_left", 0x83, 3, 1));
        let mut data = [0xF7, 0x00];
        encode_can_signal(&signal, 1.0, &mut data).unwrap();
        assert_eq!(data, [0xFF, 0x00]);
        assert_eq!(decode_can_signal(&signal, &data), Some(1.0));
    }

    #[test]
    fn test_encode_big_endian_scaled() {
        let mut config = SignalConfig::new("cabin_temperature_setpoint", 0x83, 4, 12).with_scaling(0.1, 0.0);
        config.byte_order = ByteOrder::BigEndian;
        let signal = descriptor(config);
        let mut data = [0u8; 4];
        encode_can_signal(&signal, 21.5, &mut data).unwrap();
        assert_eq!(decode_can_signal(&signal, &data), Some(21.5));
        assert_eq!(data[0] & 0xF0, 0);
    }

    #[test]
    fn test_encode_clamps_to_range() {
        let signal = descriptor(SignalConfig::new("fan_speed", 0x83, 0, 8).with_range(0.0, 100.0));
        let mut data = [0u8; 1];
        encode_can_signal(&signal, 250.0, &mut data).unwrap();
        assert_eq!(data[0], 100);
    }

    #[test]
    fn test_encode_negative_signed_value() {
        let mut config = SignalConfig::new("trim_offset", 0x83, 0, 8);
        config.value_type = ValueType::Signed;
        let signal = descriptor(config);
        let mut data = [0u8; 1];
        encode_can_signal(&signal, -5.0, &mut data).unwrap();
        assert_eq!(data[0], 0xFB);
        assert_eq!(decode_can_signal(&signal, &data), Some(-5.0));

        encode_can_signal(&signal, -300.0, &mut data).unwrap();
        assert_eq!(decode_can_signal(&signal, &data), Some(-128.0));
    }

    #[test]
    fn test_encode_out_of_payload() {
        let signal = descriptor(SignalConfig::new("fan_speed", 0x83, 60, 8));
        let mut data = [0u8; 8];
        assert!(encode_can_signal(&signal, 1.0, &mut data).is_err());
    }
}
