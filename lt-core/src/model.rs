//! Session, lap and telemetry data model
//!
//! Every provider converts its own wire format into these types. Fields a
//! provider cannot always supply (lap times on out-laps, sector times on the
//! opening lap) are `Option<T>`.

use crate::error::ParamsError;
use crate::units::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Earliest selectable season
pub const MIN_YEAR: u16 = 1950;

/// Latest selectable season
pub const MAX_YEAR: u16 = 2024;

/// Session type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionType {
    FP1,
    FP2,
    FP3,
    Q,
    R,
}

impl SessionType {
    pub const ALL: [SessionType; 5] = [
        SessionType::FP1,
        SessionType::FP2,
        SessionType::FP3,
        SessionType::Q,
        SessionType::R,
    ];

    /// Short code used in forms and titles
    pub fn code(&self) -> &'static str {
        match self {
            SessionType::FP1 => "FP1",
            SessionType::FP2 => "FP2",
            SessionType::FP3 => "FP3",
            SessionType::Q => "Q",
            SessionType::R => "R",
        }
    }

    /// Name timing providers publish the session under
    pub fn long_name(&self) -> &'static str {
        match self {
            SessionType::FP1 => "Practice 1",
            SessionType::FP2 => "Practice 2",
            SessionType::FP3 => "Practice 3",
            SessionType::Q => "Qualifying",
            SessionType::R => "Race",
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for SessionType {
    type Err = ParamsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        SessionType::ALL
            .into_iter()
            .find(|t| t.code().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParamsError::UnknownSessionType(trimmed.to_string()))
    }
}

/// Three-letter driver abbreviation, always upper-case (e.g. `VER`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DriverCode(String);

impl DriverCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for DriverCode {
    type Err = ParamsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.len() == 3 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(DriverCode(trimmed.to_ascii_uppercase()))
        } else {
            Err(ParamsError::InvalidDriverCode(trimmed.to_string()))
        }
    }
}

impl TryFrom<String> for DriverCode {
    type Error = ParamsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DriverCode> for String {
    fn from(code: DriverCode) -> Self {
        code.0
    }
}

impl fmt::Display for DriverCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything one form submission asks for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionParams {
    pub year: u16,
    pub event: String,
    pub session_type: SessionType,
    /// Submission order, no duplicates
    pub drivers: Vec<DriverCode>,
}

impl SessionParams {
    pub fn new(
        year: i64,
        event: &str,
        session_type: SessionType,
        drivers: Vec<DriverCode>,
    ) -> Result<Self, ParamsError> {
        if year < MIN_YEAR as i64 || year > MAX_YEAR as i64 {
            return Err(ParamsError::YearOutOfRange(year));
        }

        let event = event.trim();
        if event.is_empty() {
            return Err(ParamsError::EmptyEvent);
        }

        let mut unique = Vec::with_capacity(drivers.len());
        for driver in drivers {
            if !unique.contains(&driver) {
                unique.push(driver);
            }
        }

        Ok(Self {
            year: year as u16,
            event: event.to_string(),
            session_type,
            drivers: unique,
        })
    }

    /// `"Abu Dhabi GP 2024 Q"`
    pub fn describe(&self) -> String {
        format!("{} GP {} {}", self.event, self.year, self.session_type)
    }
}

/// A single lap by one driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lap {
    pub driver: DriverCode,
    pub driver_number: u32,
    pub lap_number: u32,
    pub lap_time: Option<Seconds>,
    pub sector_times: [Option<Seconds>; 3],
    /// Wall-clock start of the lap, needed to slice car data
    pub start: Option<DateTime<Utc>>,
    pub pit_out: bool,
}

/// Ordered collection of laps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Laps(Vec<Lap>);

impl Laps {
    pub fn new(mut laps: Vec<Lap>) -> Self {
        laps.sort_by(|a, b| {
            a.driver
                .cmp(&b.driver)
                .then(a.lap_number.cmp(&b.lap_number))
        });
        Self(laps)
    }

    /// All laps driven by `driver`
    pub fn pick_driver(&self, driver: &DriverCode) -> Laps {
        Laps(
            self.0
                .iter()
                .filter(|lap| &lap.driver == driver)
                .cloned()
                .collect(),
        )
    }

    /// The lap with the smallest recorded time; ties go to the earlier lap
    pub fn pick_fastest(&self) -> Option<&Lap> {
        self.0
            .iter()
            .filter_map(|lap| lap.lap_time.map(|t| (t, lap)))
            .fold(None, |best: Option<(Seconds, &Lap)>, (t, lap)| match best {
                Some((best_t, _)) if best_t.0 <= t.0 => best,
                _ => Some((t, lap)),
            })
            .map(|(_, lap)| lap)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Lap> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a Laps {
    type Item = &'a Lap;
    type IntoIter = std::slice::Iter<'a, Lap>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A driver entered in the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverEntry {
    pub code: DriverCode,
    pub number: u32,
    pub full_name: Option<String>,
    pub team_name: Option<String>,
}

/// Identification of a loaded session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub year: u16,
    /// Event as the user typed it
    pub event: String,
    /// Event name as the provider knows it (e.g. "Abu Dhabi Grand Prix")
    pub event_name: String,
    pub session_type: SessionType,
    pub circuit: Option<String>,
    /// Provider-specific session identifier
    pub session_key: Option<u64>,
}

/// Loaded session handle: entry list and laps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub info: SessionInfo,
    pub drivers: Vec<DriverEntry>,
    pub laps: Laps,
}

impl Session {
    pub fn driver(&self, code: &DriverCode) -> Option<&DriverEntry> {
        self.drivers.iter().find(|d| &d.code == code)
    }
}

/// Raw car data sample as delivered by a provider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarSample {
    /// Elapsed time since lap start
    pub time: Seconds,
    pub speed: KilometersPerHour,
}

/// Car data sample with integrated distance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    pub distance: Meters,
    pub speed: KilometersPerHour,
    pub time: Seconds,
}

/// Telemetry for one lap, ordered by time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LapTelemetry {
    pub samples: Vec<TelemetrySample>,
}

impl LapTelemetry {
    /// Build telemetry from raw car data, integrating speed over time into distance.
    ///
    /// The first sample sits at distance zero; each following sample adds
    /// `speed * dt` using its own speed. Samples are sorted by time first.
    pub fn from_car_data(mut car_data: Vec<CarSample>) -> Self {
        car_data.sort_by(|a, b| a.time.0.total_cmp(&b.time.0));

        let mut distance = 0.0_f32;
        let mut prev_time: Option<f32> = None;
        let samples = car_data
            .into_iter()
            .map(|sample| {
                if let Some(prev) = prev_time {
                    distance += sample.speed.as_meters_per_second() * (sample.time.0 - prev);
                }
                prev_time = Some(sample.time.0);
                TelemetrySample {
                    distance: Meters(distance),
                    speed: sample.speed,
                    time: sample.time,
                }
            })
            .collect();

        Self { samples }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn max_speed(&self) -> Option<KilometersPerHour> {
        self.samples
            .iter()
            .map(|s| s.speed)
            .fold(None, |max, s| match max {
                Some(m) if m.0 >= s.0 => Some(m),
                _ => Some(s),
            })
    }
}
