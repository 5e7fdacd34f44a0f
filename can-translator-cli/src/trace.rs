//! candump trace reading
//!
//! Accepts the `candump -l` log format and bare frames:
//!
//! ```text
//! (1436509052.249713) can0 3E0#1F2A00
//! 120#01
//! ```

use anyhow::{anyhow, bail, Context, Result};
use can_translator::CanFrame;
use std::io::BufRead;

/// Parse one trace line; `Ok(None)` for blank lines, comments and remote frames
pub fn parse_line(line: &str) -> Result<Option<CanFrame>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut timestamp_ns = 0;
    let mut channel = 0;
    let mut frame_text = line;

    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() == 3 {
        timestamp_ns = parse_timestamp(fields[0])?;
        channel = parse_channel(fields[1]);
        frame_text = fields[2];
    } else if fields.len() != 1 {
        bail!("Unrecognised trace line: {}", line);
    }

    let (id_text, data_text) = frame_text
        .split_once('#')
        .ok_or_else(|| anyhow!("Missing '#' separator in frame: {}", frame_text))?;

    if data_text.starts_with('R') {
        log::trace!("Skipping remote frame {}", frame_text);
        return Ok(None);
    }

    let can_id = u32::from_str_radix(id_text, 16)
        .with_context(|| format!("Invalid CAN ID: {}", id_text))?;
    let data = parse_hex_bytes(data_text)?;

    Ok(Some(CanFrame {
        timestamp_ns,
        channel,
        can_id,
        data,
        is_extended: id_text.len() > 3,
    }))
}

fn parse_timestamp(field: &str) -> Result<u64> {
    let inner = field
        .strip_prefix('(')
        .and_then(|f| f.strip_suffix(')'))
        .ok_or_else(|| anyhow!("Invalid timestamp: {}", field))?;
    let (secs, fraction) = inner.split_once('.').unwrap_or((inner, ""));
    if fraction.len() > 9 || !fraction.chars().all(|c| c.is_ascii_digit()) {
        bail!("Invalid timestamp: {}", field);
    }
    let secs: u64 = secs
        .parse()
        .with_context(|| format!("Invalid timestamp: {}", field))?;
    let nanos: u64 = format!("{:0<9}", fraction).parse()?;
    secs.checked_mul(1_000_000_000)
        .and_then(|ns| ns.checked_add(nanos))
        .ok_or_else(|| anyhow!("Timestamp out of range: {}", field))
}

fn parse_channel(field: &str) -> u8 {
    field
        .trim_start_matches(|c: char| !c.is_ascii_digit())
        .parse()
        .unwrap_or(0)
}

fn parse_hex_bytes(text: &str) -> Result<Vec<u8>> {
    if !text.bytes().all(|b| b.is_ascii_hexdigit()) {
        bail!("Invalid hex payload: {}", text);
    }
    if text.len() % 2 != 0 {
        bail!("Odd number of hex digits in payload: {}", text);
    }
    text.as_bytes()
        .chunks(2)
        .map(|pair| {
            let pair = std::str::from_utf8(pair)?;
            u8::from_str_radix(pair, 16).with_context(|| format!("Invalid payload byte: {}", pair))
        })
        .collect()
}

/// Read every frame of a trace, reporting the first malformed line
pub fn read_frames(reader: impl BufRead) -> impl Iterator<Item = Result<CanFrame>> {
    reader.lines().enumerate().filter_map(|(idx, line)| {
        let parsed = line
            .context("Failed to read trace")
            .and_then(|line| parse_line(&line))
            .with_context(|| format!("Trace line {}", idx + 1));
        parsed.transpose()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_line() {
        let frame = parse_line("(1436509052.250000) can1 3E0#1F2A00").unwrap().unwrap();
        assert_eq!(frame.can_id, 0x3E0);
        assert_eq!(frame.channel, 1);
        assert_eq!(frame.data, vec![0x1F, 0x2A, 0x00]);
        assert_eq!(frame.timestamp_ns, 1_436_509_052_250_000_000);
        assert!(!frame.is_extended);
    }

    #[test]
    fn test_parse_bare_extended_frame() {
        let frame = parse_line("18FEF100#0102").unwrap().unwrap();
        assert_eq!(frame.can_id, 0x18FEF100);
        assert!(frame.is_extended);
    }

    #[test]
    fn test_skipped_lines() {
        assert!(parse_line("").unwrap().is_none());
        assert!(parse_line("# comment").unwrap().is_none());
        assert!(parse_line("123#R").unwrap().is_none());
    }

    #[test]
    fn test_malformed_lines() {
        assert!(parse_line("123").is_err());
        assert!(parse_line("XYZ#00").is_err());
        assert!(parse_line("123#0").is_err());
        assert!(parse_line("a b").is_err());
    }

    #[test]
    fn test_non_ascii_payload() {
        let err = parse_line("123#a\u{e9}1").unwrap_err();
        assert!(err.to_string().contains("Invalid hex payload"));
    }

    #[test]
    fn test_timestamp_overflow() {
        let err = parse_line("(99999999999.000000) can0 123#00").unwrap_err();
        assert!(err.to_string().contains("Timestamp out of range"));
    }

    #[test]
    fn test_read_frames_reports_bad_bytes() {
        let trace = "120#01\n120#\u{e9}\u{e9}\n";
        let results: Vec<_> = read_frames(trace.as_bytes()).collect();
        let err = results[1].as_ref().unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }

    #[test]
    fn test_read_frames() {
        let trace = "120#01\n\n120#00\nbad\n";
        let results: Vec<_> = read_frames(trace.as_bytes()).collect();
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[2].as_ref().unwrap_err().to_string().contains("line 4"));
    }
}
