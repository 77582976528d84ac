//! Demo provider that generates synthetic sessions for testing
//!
//! Simulates laps around a circuit with straights, braking zones, corners,
//! and acceleration phases. Sector times and 4 Hz car data are derived from
//! the same circuit model so they agree with each other, and everything is
//! deterministic so tests can rely on exact values.

use crate::event::match_event;
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use lt_core::{
    error::LoadError,
    model::*,
    provider::TimingProvider,
    units::*,
};

/// The only season the demo provider serves
pub const DEMO_YEAR: u16 = 2024;

/// (short name, event name, circuit)
pub const DEMO_EVENTS: [(&str, &str, &str); 10] = [
    ("Bahrain", "Bahrain Grand Prix", "Sakhir"),
    ("Saudi Arabia", "Saudi Arabian Grand Prix", "Jeddah"),
    ("Monaco", "Monaco Grand Prix", "Monte Carlo"),
    ("Spain", "Spanish Grand Prix", "Catalunya"),
    ("Emilia Romagna", "Emilia Romagna Grand Prix", "Imola"),
    ("Qatar", "Qatar Grand Prix", "Lusail"),
    ("Las Vegas", "Las Vegas Grand Prix", "Las Vegas"),
    ("Monza", "Italian Grand Prix", "Monza"),
    ("United States", "United States Grand Prix", "Austin"),
    ("Abu Dhabi", "Abu Dhabi Grand Prix", "Yas Marina Circuit"),
];

struct GridEntry {
    code: &'static str,
    number: u32,
    name: &'static str,
    team: &'static str,
    /// Lap time multiplier, lower is faster
    pace: f32,
}

const GRID: [GridEntry; 5] = [
    GridEntry { code: "VER", number: 1, name: "Max Verstappen", team: "Red Bull Racing", pace: 0.9985 },
    GridEntry { code: "NOR", number: 4, name: "Lando Norris", team: "McLaren", pace: 0.9990 },
    GridEntry { code: "LEC", number: 16, name: "Charles Leclerc", team: "Ferrari", pace: 1.0000 },
    GridEntry { code: "SAI", number: 55, name: "Carlos Sainz", team: "Ferrari", pace: 1.0018 },
    GridEntry { code: "PIA", number: 81, name: "Oscar Piastri", team: "McLaren", pace: 1.0024 },
];

/// 2024-03-02 15:00:00 UTC, start of the first demo session
const SEASON_START_MS: i64 = 1_709_391_600_000;

const PIT_STOP_LAP: u32 = 10;
const PIT_STOP_LOSS: f32 = 22.0;
const STANDING_START_LOSS: f32 = 3.0;

// =============================================================================
// Track definition: a sequence of segments that form a lap
// =============================================================================

#[derive(Clone, Copy)]
struct TrackSegment {
    duration: f32,     // seconds to traverse at representative pace
    target_speed: f32, // m/s at end of segment
}

const fn seg(duration: f32, target_speed: f32) -> TrackSegment {
    TrackSegment { duration, target_speed }
}

/// A simple circuit: 84s lap, mix of corners and straights
const TRACK: [TrackSegment; 21] = [
    // Start/finish straight
    seg(8.0, 75.0),
    // T1: heavy braking into slow right-hander
    seg(3.0, 28.0),
    seg(4.0, 25.0),
    seg(3.5, 55.0),
    // Short straight
    seg(4.0, 62.0),
    // T2: medium braking into fast left-hander
    seg(2.0, 45.0),
    seg(3.5, 42.0),
    // -- sector 2 --
    seg(3.0, 58.0),
    // Back straight
    seg(10.0, 80.0),
    // T3: chicane, quick right-left
    seg(2.5, 35.0),
    seg(2.0, 32.0),
    seg(2.0, 30.0),
    seg(3.0, 50.0),
    // Medium straight
    seg(6.0, 68.0),
    // -- sector 3 --
    // T4: long sweeping right
    seg(1.5, 52.0),
    seg(5.0, 50.0),
    seg(3.0, 60.0),
    // T5: tight hairpin left
    seg(3.5, 22.0),
    seg(4.5, 20.0),
    seg(4.0, 55.0),
    // Run to start/finish
    seg(6.0, 72.0),
];

/// Index of the first segment of sectors 2 and 3
const SECTOR_STARTS: [usize; 2] = [7, 14];

fn track_duration() -> f32 {
    TRACK.iter().map(|s| s.duration).sum()
}

/// Reference sector durations at scale 1.0
fn base_sector_times() -> [f32; 3] {
    let sum = |range: std::ops::Range<usize>| TRACK[range].iter().map(|s| s.duration).sum::<f32>();
    [
        sum(0..SECTOR_STARTS[0]),
        sum(SECTOR_STARTS[0]..SECTOR_STARTS[1]),
        sum(SECTOR_STARTS[1]..TRACK.len()),
    ]
}

/// Speed in m/s at `t` seconds into a lap driven at reference pace
fn speed_at(t: f32) -> f32 {
    let lap_duration = track_duration();
    let t = t.clamp(0.0, lap_duration);

    let mut elapsed = 0.0_f32;
    let mut seg_idx = TRACK.len() - 1;
    for (i, seg) in TRACK.iter().enumerate() {
        if elapsed + seg.duration > t {
            seg_idx = i;
            break;
        }
        elapsed += seg.duration;
    }
    if seg_idx == TRACK.len() - 1 && t >= lap_duration {
        elapsed = lap_duration - TRACK[seg_idx].duration;
    }

    let seg = TRACK[seg_idx];
    let seg_t = ((t - elapsed) / seg.duration).clamp(0.0, 1.0);

    // Previous segment's target speed (for interpolation start)
    let prev_target_speed = if seg_idx > 0 {
        TRACK[seg_idx - 1].target_speed
    } else {
        TRACK[TRACK.len() - 1].target_speed
    };

    lerp(prev_target_speed, seg.target_speed, smoothstep(seg_t))
}

fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Simple deterministic noise from a seed
fn noise(seed: f32) -> f32 {
    let x = (seed * 12.9898 + 78.233).sin() * 43_758.547;
    x - x.floor()
}

/// Small jitter centered around 0
fn jitter(seed: f32, amplitude: f32) -> f32 {
    (noise(seed) - 0.5) * 2.0 * amplitude
}

// =============================================================================
// Session generation
// =============================================================================

fn session_index(session_type: SessionType) -> usize {
    SessionType::ALL
        .iter()
        .position(|t| *t == session_type)
        .unwrap_or(0)
}

fn lap_count(session_type: SessionType) -> u32 {
    match session_type {
        SessionType::FP1 | SessionType::FP2 | SessionType::FP3 => 15,
        SessionType::Q => 12,
        SessionType::R => 20,
    }
}

fn session_scale(session_type: SessionType) -> f32 {
    match session_type {
        SessionType::FP1 => 1.012,
        SessionType::FP2 => 1.008,
        SessionType::FP3 => 1.005,
        SessionType::Q => 0.985,
        SessionType::R => 1.02,
    }
}

/// Pace multiplier for one lap, before any standing-start or pit losses
fn lap_scale(event_idx: usize, session_type: SessionType, grid_idx: usize, lap_number: u32) -> f32 {
    let event_scale = 1.0 + 0.005 * event_idx as f32;
    let seed = (event_idx * 1000 + session_index(session_type) * 100 + grid_idx * 10) as f32
        + lap_number as f32 * 0.37;
    let mut scale = event_scale * session_scale(session_type) * GRID[grid_idx].pace
        * (1.0 + jitter(seed, 0.004));

    match session_type {
        // Tyre degradation
        SessionType::R => scale *= 1.0 + 0.0006 * lap_number as f32,
        // Out-laps every third lap
        SessionType::Q if lap_number % 3 == 1 => scale *= 1.35,
        _ => {}
    }
    scale
}

fn generate_laps(event_idx: usize, session_type: SessionType) -> Vec<Lap> {
    let base = base_sector_times();
    let session_start = DateTime::<Utc>::UNIX_EPOCH
        + TimeDelta::milliseconds(SEASON_START_MS)
        + TimeDelta::days(14 * event_idx as i64)
        + TimeDelta::hours(3 * session_index(session_type) as i64);

    let mut laps = Vec::new();
    for (grid_idx, entry) in GRID.iter().enumerate() {
        let Ok(driver) = entry.code.parse::<DriverCode>() else {
            continue;
        };
        let mut lap_start = session_start + TimeDelta::milliseconds(grid_idx as i64 * 350);

        for lap_number in 1..=lap_count(session_type) {
            let scale = lap_scale(event_idx, session_type, grid_idx, lap_number);
            let mut sectors = base.map(|s| Some(Seconds(s * scale)));
            let mut lap_time = track_duration() * scale;

            if session_type == SessionType::R && lap_number == 1 {
                lap_time += STANDING_START_LOSS;
                sectors[0] = None;
            }
            if session_type == SessionType::R && lap_number == PIT_STOP_LAP {
                lap_time += PIT_STOP_LOSS;
                sectors[2] = sectors[2].map(|s| Seconds(s.0 + PIT_STOP_LOSS));
            }

            laps.push(Lap {
                driver: driver.clone(),
                driver_number: entry.number,
                lap_number,
                lap_time: Some(Seconds(lap_time)),
                sector_times: sectors,
                start: Some(lap_start),
                pit_out: (session_type == SessionType::Q && lap_number % 3 == 1)
                    || (session_type == SessionType::R && lap_number == PIT_STOP_LAP + 1),
            });

            lap_start += TimeDelta::milliseconds((lap_time * 1000.0) as i64);
        }
    }
    laps
}

// =============================================================================
// DemoProvider
// =============================================================================

pub struct DemoProvider {
    /// Seconds between car data samples
    sample_interval: f32,
}

impl DemoProvider {
    pub fn new() -> Self {
        Self { sample_interval: 0.25 }
    }

    fn find_event(&self, event: &str) -> Option<usize> {
        DEMO_EVENTS
            .iter()
            .enumerate()
            .filter_map(|(i, (short, name, circuit))| {
                match_event(event, [*short, *name, *circuit]).map(|q| (q, i))
            })
            .max_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)))
            .map(|(_, i)| i)
    }
}

impl Default for DemoProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TimingProvider for DemoProvider {
    fn key(&self) -> &str {
        "demo"
    }

    async fn load_session(&self, params: &SessionParams) -> Result<Session, LoadError> {
        if params.year != DEMO_YEAR {
            return Err(LoadError::not_found(params));
        }
        let event_idx = self
            .find_event(&params.event)
            .ok_or_else(|| LoadError::not_found(params))?;
        let (_, event_name, circuit) = DEMO_EVENTS[event_idx];

        let drivers = GRID
            .iter()
            .filter_map(|entry| {
                Some(DriverEntry {
                    code: entry.code.parse().ok()?,
                    number: entry.number,
                    full_name: Some(entry.name.to_string()),
                    team_name: Some(entry.team.to_string()),
                })
            })
            .collect();

        Ok(Session {
            info: SessionInfo {
                year: params.year,
                event: params.event.clone(),
                event_name: event_name.to_string(),
                session_type: params.session_type,
                circuit: Some(circuit.to_string()),
                session_key: Some((event_idx * 10 + session_index(params.session_type)) as u64),
            },
            drivers,
            laps: Laps::new(generate_laps(event_idx, params.session_type)),
        })
    }

    async fn lap_telemetry(&self, session: &Session, lap: &Lap) -> Result<LapTelemetry, LoadError> {
        let missing = || LoadError::MissingTelemetry {
            driver: lap.driver.to_string(),
            lap_number: lap.lap_number,
        };
        let grid_idx = GRID
            .iter()
            .position(|e| e.code == lap.driver.as_str())
            .ok_or_else(missing)?;
        let lap_time = lap.lap_time.ok_or_else(missing)?;
        let event_idx = session
            .info
            .session_key
            .map(|k| (k / 10) as usize)
            .filter(|i| *i < DEMO_EVENTS.len())
            .ok_or_else(missing)?;

        // Speed follows the driven time; the car sits still for the standing
        // start at the beginning of lap 1 and for the stop at the end of the pit lap
        let is_race = session.info.session_type == SessionType::R;
        let mut driving_time = lap_time.0;
        let mut stop = None;
        if is_race && lap.lap_number == 1 {
            driving_time -= STANDING_START_LOSS;
            stop = Some((0.0, STANDING_START_LOSS));
        }
        if is_race && lap.lap_number == PIT_STOP_LAP {
            driving_time -= PIT_STOP_LOSS;
            stop = Some((driving_time, PIT_STOP_LOSS));
        }
        let scale = driving_time / track_duration();
        let driven_at = |t: f32| match stop {
            Some((at, length)) if t >= at && t < at + length => None,
            Some((at, length)) if t >= at => Some(t - length),
            _ => Some(t),
        };

        let steps = (lap_time.0 / self.sample_interval).floor() as usize;
        let seed_base = (event_idx * 7919 + grid_idx * 131 + lap.lap_number as usize * 17) as f32;
        let mut car_data: Vec<CarSample> = (0..=steps)
            .map(|i| {
                let t = i as f32 * self.sample_interval;
                let kph = driven_at(t)
                    .map(|d| (speed_at(d / scale) / scale * 3.6 + jitter(seed_base + i as f32, 0.8)).max(0.0))
                    .unwrap_or(0.0);
                CarSample {
                    time: Seconds(t),
                    speed: KilometersPerHour(kph),
                }
            })
            .collect();

        if car_data.last().map(|s| s.time.0 < lap_time.0).unwrap_or(false) {
            let t = lap_time.0;
            let kph = driven_at(t).map(|d| speed_at(d / scale) / scale * 3.6).unwrap_or(0.0);
            car_data.push(CarSample {
                time: Seconds(t),
                speed: KilometersPerHour(kph),
            });
        }

        Ok(LapTelemetry::from_car_data(car_data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sector_times_sum_to_lap() {
        let sectors = base_sector_times();
        let total: f32 = sectors.iter().sum();
        assert!((total - track_duration()).abs() < 1e-3);
        assert!((track_duration() - 84.0).abs() < 1e-3);
    }

    #[test]
    fn test_speed_continuous_across_segments() {
        let mut prev = speed_at(0.0);
        let mut t = 0.1;
        while t < track_duration() {
            let v = speed_at(t);
            assert!((v - prev).abs() < 5.0, "speed jump at t={}: {} -> {}", t, prev, v);
            prev = v;
            t += 0.1;
        }
    }

    #[test]
    fn test_speed_at_lap_end_matches_final_target() {
        let v = speed_at(track_duration());
        assert!((v - 72.0).abs() < 1e-3);
    }

    #[test]
    fn test_find_event_by_any_name() {
        let provider = DemoProvider::new();
        assert_eq!(provider.find_event("Abu Dhabi"), Some(9));
        assert_eq!(provider.find_event("qatar"), Some(5));
        assert_eq!(provider.find_event("Italian Grand Prix"), Some(7));
        assert_eq!(provider.find_event("Imola"), Some(4));
        assert_eq!(provider.find_event("Silverstone"), None);
    }

    #[test]
    fn test_race_lap_one_has_no_first_sector() {
        let laps = generate_laps(5, SessionType::R);
        let first = laps.iter().find(|l| l.lap_number == 1).unwrap();
        assert!(first.sector_times[0].is_none());
        assert!(first.lap_time.is_some());
    }
}
