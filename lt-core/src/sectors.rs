//! Sector boundary location
//!
//! Maps a lap's cumulative sector times onto its telemetry to find the
//! distance at which each sector ends.

use crate::model::{Lap, LapTelemetry};
use crate::units::{Meters, Seconds};
use serde::Serialize;

/// End of one sector on a specific lap
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SectorBoundary {
    /// 1-based sector number
    pub index: u8,
    pub distance: Meters,
    /// Cumulative lap time at the end of this sector
    pub elapsed: Seconds,
    /// Duration of this sector alone
    pub sector_time: Seconds,
}

/// Locate the end of each sector of `lap` in `telemetry`.
///
/// A sector whose time is missing ends the scan: its cumulative time, and
/// every later one, is undefined. A sector whose cumulative time precedes
/// every sample is skipped. Returned boundaries are ordered by index.
pub fn locate_sectors(lap: &Lap, telemetry: &LapTelemetry) -> Vec<SectorBoundary> {
    let mut boundaries = Vec::with_capacity(3);
    let mut cumulative = Seconds(0.0);

    for (i, sector_time) in lap.sector_times.iter().enumerate() {
        let Some(sector_time) = *sector_time else {
            break;
        };
        cumulative = cumulative + sector_time;

        if let Some(distance) = distance_at(telemetry, cumulative) {
            boundaries.push(SectorBoundary {
                index: i as u8 + 1,
                distance,
                elapsed: cumulative,
                sector_time,
            });
        }
    }

    boundaries
}

/// Largest distance reached no later than `elapsed`
pub fn distance_at(telemetry: &LapTelemetry, elapsed: Seconds) -> Option<Meters> {
    telemetry
        .samples
        .iter()
        .filter(|s| s.time.0 <= elapsed.0)
        .map(|s| s.distance)
        .fold(None, |max: Option<Meters>, d| match max {
            Some(m) if m.0 >= d.0 => Some(m),
            _ => Some(d),
        })
}
