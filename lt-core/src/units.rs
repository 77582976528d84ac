//! Type-safe wrappers for physical units
//!
//! Newtype wrappers around f32 so distances, speeds and durations
//! cannot be mixed up when they travel through the chart pipeline.
//!
//! All unit types serialize with 4 decimal places to reduce JSON payload size.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Round f32 to 4 decimal places for compact JSON serialization
fn round4<S: serde::Serializer>(val: &f32, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f32((*val * 10000.0).round() / 10000.0)
}

/// Meters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Meters(#[serde(serialize_with = "round4")] pub f32);

/// Kilometers per hour, the unit timing providers report car speed in
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct KilometersPerHour(#[serde(serialize_with = "round4")] pub f32);

impl KilometersPerHour {
    pub fn as_meters_per_second(&self) -> f32 {
        self.0 / 3.6
    }
}

/// Seconds (elapsed times, lap and sector durations)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Seconds(#[serde(serialize_with = "round4")] pub f32);

impl Seconds {
    /// Format as a lap time, e.g. `1:22.595` or `59.871`
    pub fn as_lap_time(&self) -> String {
        let total_ms = (self.0.max(0.0) as f64 * 1000.0).round() as u64;
        let minutes = total_ms / 60_000;
        let seconds = (total_ms % 60_000) / 1000;
        let millis = total_ms % 1000;
        if minutes > 0 {
            format!("{}:{:02}.{:03}", minutes, seconds, millis)
        } else {
            format!("{}.{:03}", seconds, millis)
        }
    }
}

impl std::ops::Add for Seconds {
    type Output = Seconds;

    fn add(self, rhs: Seconds) -> Seconds {
        Seconds(self.0 + rhs.0)
    }
}

impl fmt::Display for Seconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}s", self.0)
    }
}
