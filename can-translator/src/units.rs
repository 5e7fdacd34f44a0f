//! Unit conversion constants and helpers

use serde::{Deserialize, Serialize};

/// Kilometres in one statute mile
pub const KM_PER_MILE: f64 = 1.609344;
/// Kilometres in one metre
pub const KM_PER_METER: f64 = 0.001;
/// Litres in one US gallon
pub const LITERS_PER_GALLON: f64 = 3.78541178;
/// Litres in one microlitre
pub const LITERS_PER_MICROLITER: f64 = 0.000001;

/// Unit a distance signal is reported in on the bus
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceUnit {
    #[default]
    Kilometers,
    Miles,
    Meters,
}

impl DistanceUnit {
    /// Factor converting one raw unit into kilometres
    pub fn multiplier(self) -> f64 {
        match self {
            DistanceUnit::Kilometers => 1.0,
            DistanceUnit::Miles => KM_PER_MILE,
            DistanceUnit::Meters => KM_PER_METER,
        }
    }
}

/// Unit a fuel flow signal is reported in on the bus
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeUnit {
    #[default]
    Liters,
    Gallons,
    Microliters,
}

impl VolumeUnit {
    /// Factor converting one raw unit into litres
    pub fn multiplier(self) -> f64 {
        match self {
            VolumeUnit::Liters => 1.0,
            VolumeUnit::Gallons => LITERS_PER_GALLON,
            VolumeUnit::Microliters => LITERS_PER_MICROLITER,
        }
    }
}

/// Convert whole plus fractional minutes of arc into degrees
pub fn minutes_to_degrees(minutes: f64, minute_fraction: f64) -> f64 {
    (minutes + minute_fraction) / 60.0
}

/// Combine a degree/minute reading into decimal degrees.
///
/// The sign of `degrees` applies to the minutes as well, so a southern or
/// western reading of -47° 30' yields -47.5.
pub fn to_decimal_degrees(degrees: f64, minutes: f64, minute_fraction: f64) -> f64 {
    let mut fraction = minutes_to_degrees(minutes, minute_fraction);
    if degrees < 0.0 {
        fraction = -fraction;
    }
    degrees + fraction
}
