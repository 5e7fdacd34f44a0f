//! Feed a handful of hand-made frames through a translator
//!
//! Usage:
//!   cargo run --example translate_frames

use can_translator::{
    CanFrame, MessageHandler, SignalConfig, SignalHandler, Translator, TranslatorConfig, VehicleMessage,
};
use can_translator::units::DistanceUnit;

fn main() -> can_translator::Result<()> {
    env_logger::init();

    let config = TranslatorConfig::new()
        .with_signal(
            SignalConfig::new("odometer", 0x3E0, 0, 16)
                .with_scaling(0.1, 0.0)
                .with_handler(SignalHandler::RollingOdometer { unit: DistanceUnit::Kilometers }),
        )
        .with_signal(SignalConfig::new("latitude_degrees", 0x400, 0, 8))
        .with_signal(SignalConfig::new("latitude_minutes", 0x400, 8, 8))
        .with_signal(SignalConfig::new("latitude_minute_fraction", 0x400, 16, 8).with_scaling(0.01, 0.0))
        .with_signal(SignalConfig::new("longitude_degrees", 0x400, 24, 8))
        .with_signal(SignalConfig::new("longitude_minutes", 0x400, 32, 8))
        .with_signal(SignalConfig::new("longitude_minute_fraction", 0x400, 40, 8).with_scaling(0.01, 0.0))
        .with_message_handler(0x400, MessageHandler::Gps);

    let mut translator = Translator::from_config(&config)?;
    let mut events: Vec<VehicleMessage> = Vec::new();

    let frames = [
        CanFrame::new(0x3E0, vec![0x10, 0x27]),
        CanFrame::new(0x3E0, vec![0x1A, 0x27]),
        CanFrame::new(0x400, vec![42, 21, 50, 71, 3, 25]),
    ];
    for frame in &frames {
        translator.process_frame(frame, &mut events);
    }

    for event in &events {
        match serde_json::to_string(event) {
            Ok(line) => println!("{}", line),
            Err(e) => eprintln!("Error: {}", e),
        }
    }
    Ok(())
}
