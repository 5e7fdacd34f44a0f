//! Output sinks
//!
//! Writes translated vehicle messages and transmitted frames to any
//! `io::Write` destination.

use crate::config::OutputFormat;
use can_translator::{CanFrame, CanWriter, Listener, Timestamp, VehicleMessage};
use std::io::Write;

/// Listener writing one line per vehicle message
pub struct LineListener<W: Write> {
    writer: W,
    format: OutputFormat,
    /// Timestamp of the frame being translated, if it should be printed
    pub timestamp: Option<Timestamp>,
    pub published: usize,
    pub failed: usize,
}

impl<W: Write> LineListener<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self {
            writer,
            format,
            timestamp: None,
            published: 0,
            failed: 0,
        }
    }

    fn render(&self, message: &VehicleMessage) -> serde_json::Result<String> {
        let body = match self.format {
            OutputFormat::Json => serde_json::to_string(message)?,
            OutputFormat::Txt => match message {
                VehicleMessage::Simple { name, value } => format!("{} {}", name, value),
                VehicleMessage::Evented { name, value, event } => format!("{} {} {}", name, value, event),
            },
        };
        Ok(match self.timestamp {
            Some(ts) => format!("{} {}", ts.to_rfc3339(), body),
            None => body,
        })
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

impl<W: Write> Listener for LineListener<W> {
    fn publish(&mut self, message: VehicleMessage) {
        let result = self
            .render(&message)
            .map_err(std::io::Error::from)
            .and_then(|line| writeln!(self.writer, "{}", line));

        match result {
            Ok(()) => self.published += 1,
            Err(e) => {
                self.failed += 1;
                log::error!("Failed to write {} message: {}", message.name(), e);
            }
        }
    }
}

/// Bus stand-in logging transmitted frames in candump format
pub struct CandumpWriter<W: Write> {
    writer: W,
}

impl<W: Write> CandumpWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> CanWriter for CandumpWriter<W> {
    fn write(&mut self, frame: &CanFrame) -> can_translator::Result<()> {
        let id = if frame.is_extended {
            format!("{:08X}", frame.can_id)
        } else {
            format!("{:03X}", frame.can_id)
        };
        let data: String = frame.data.iter().map(|b| format!("{:02X}", b)).collect();
        writeln!(self.writer, "can{} {}#{}", frame.channel, id, data)?;
        Ok(())
    }
}
