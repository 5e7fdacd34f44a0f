//! CAN Translator Library
//!
//! Turns raw, periodically received CAN signal values into normalized,
//! vehicle-agnostic events (door status, odometer and fuel totals, GPS
//! position, steering angle, button presses) and turns inbound commands
//! back into CAN frames.
//!
//! # Architecture
//!
//! - `signals`: descriptor table, optionally imported from DBC files
//! - `codec`: bit-level decode/encode of physical signal values
//! - `handlers`: per-signal value transformers
//! - `accumulator`: wraparound-aware totals across frames
//! - `composite`: handlers that combine several signals of one frame
//! - `emission`: change-detection policy and the listener boundary
//! - `translator`: the per-vehicle context tying it all together
//!
//! Processing is synchronous: each frame is decoded, transformed and
//! emitted before the next one is accepted.
//!
//! # Example Usage
//!
//! ```
//! use can_translator::{
//!     CanFrame, SignalConfig, SignalHandler, Translator, TranslatorConfig, VehicleMessage,
//! };
//!
//! let config = TranslatorConfig::new().with_signal(
//!     SignalConfig::new("brake_pedal_status", 0x100, 0, 1).with_handler(SignalHandler::Boolean),
//! );
//! let mut translator = Translator::from_config(&config).unwrap();
//!
//! let mut events: Vec<VehicleMessage> = Vec::new();
//! translator.process_frame(&CanFrame::new(0x100, vec![0x01]), &mut events);
//! assert_eq!(events.len(), 1);
//! ```

// Public modules
pub mod accumulator;
pub mod codec;
pub mod composite;
pub mod config;
pub mod emission;
pub mod handlers;
pub mod signals;
pub mod transmit;
pub mod translator;
pub mod types;
pub mod units;

// Re-export main types for convenience
pub use accumulator::AccumulatorState;
pub use composite::MessageHandler;
pub use config::{MessageConfig, SignalBinding, SignalConfig, TranslatorConfig};
pub use emission::{EmissionPolicy, Listener, MessageValue, VehicleMessage};
pub use handlers::{SignalHandler, Verdict};
pub use signals::{SignalDescriptor, SignalHandle, SignalTable};
pub use transmit::CanWriter;
pub use translator::Translator;
pub use types::{CanFrame, Result, Timestamp, TranslatorError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
