//! OpenF1 timing provider
//!
//! Resolves sessions and fetches laps and car data from the OpenF1 REST API
//! (https://openf1.org). All endpoints return JSON arrays; an empty array or a
//! 404 means "no results".

use crate::event::{match_event, MatchQuality};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use lt_core::{
    error::LoadError,
    model::*,
    provider::TimingProvider,
    units::*,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.openf1.org/v1";

// === Wire types ===

#[derive(Debug, Clone, Deserialize)]
pub struct MeetingRecord {
    pub meeting_key: u64,
    pub meeting_name: String,
    pub meeting_official_name: Option<String>,
    pub country_name: Option<String>,
    pub location: Option<String>,
    pub circuit_short_name: Option<String>,
    pub year: Option<u16>,
}

/// Which meeting field a query matched, weakest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum MatchedField {
    Country,
    Place,
    OfficialName,
    MeetingName,
}

impl MeetingRecord {
    fn fields(&self) -> impl Iterator<Item = (MatchedField, &str)> {
        [
            (MatchedField::MeetingName, Some(self.meeting_name.as_str())),
            (MatchedField::OfficialName, self.meeting_official_name.as_deref()),
            (MatchedField::Place, self.location.as_deref()),
            (MatchedField::Place, self.circuit_short_name.as_deref()),
            (MatchedField::Country, self.country_name.as_deref()),
        ]
        .into_iter()
        .filter_map(|(field, name)| name.map(|n| (field, n)))
    }

    /// Strongest field match for `event`; the field outranks match quality
    /// so a country shared by several meetings loses to a meeting name
    fn best_match(&self, event: &str) -> Option<(MatchedField, MatchQuality)> {
        self.fields()
            .filter_map(|(field, name)| match_event(event, [name]).map(|q| (field, q)))
            .max()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionRecord {
    pub session_key: u64,
    pub session_name: String,
    pub circuit_short_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DriverRecord {
    pub driver_number: u32,
    pub name_acronym: Option<String>,
    pub full_name: Option<String>,
    pub team_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LapRecord {
    pub driver_number: u32,
    pub lap_number: u32,
    pub lap_duration: Option<f64>,
    pub duration_sector_1: Option<f64>,
    pub duration_sector_2: Option<f64>,
    pub duration_sector_3: Option<f64>,
    pub date_start: Option<DateTime<Utc>>,
    pub is_pit_out_lap: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CarDataRecord {
    pub date: DateTime<Utc>,
    pub speed: Option<f64>,
}

// === Conversion ===

/// Meetings matching `event`, best first; ties keep the listed order
pub fn rank_meetings<'a>(meetings: &'a [MeetingRecord], event: &str) -> Vec<&'a MeetingRecord> {
    let mut ranked: Vec<_> = meetings
        .iter()
        .filter_map(|m| m.best_match(event).map(|rank| (rank, m)))
        .collect();
    // Stable sort keeps earlier meetings first among equals
    ranked.sort_by(|a, b| b.0.cmp(&a.0));
    ranked.into_iter().map(|(_, m)| m).collect()
}

pub fn pick_meeting<'a>(meetings: &'a [MeetingRecord], event: &str) -> Option<&'a MeetingRecord> {
    rank_meetings(meetings, event).into_iter().next()
}

pub fn pick_session(sessions: &[SessionRecord], session_type: SessionType) -> Option<&SessionRecord> {
    sessions
        .iter()
        .find(|s| s.session_name.eq_ignore_ascii_case(session_type.long_name()))
}

fn driver_entries(records: Vec<DriverRecord>) -> Vec<DriverEntry> {
    let mut entries: Vec<DriverEntry> = Vec::new();
    for record in records {
        let Some(code) = record.name_acronym.as_deref().and_then(|a| a.parse().ok()) else {
            warn!("Driver #{} has no usable acronym, skipping", record.driver_number);
            continue;
        };
        // The drivers endpoint can list a driver more than once per session
        if entries.iter().any(|e| e.number == record.driver_number) {
            continue;
        }
        entries.push(DriverEntry {
            code,
            number: record.driver_number,
            full_name: record.full_name,
            team_name: record.team_name,
        });
    }
    entries
}

fn seconds(value: Option<f64>) -> Option<Seconds> {
    value.filter(|v| v.is_finite()).map(|v| Seconds(v as f32))
}

pub fn convert_laps(records: Vec<LapRecord>, drivers: &[DriverEntry]) -> Laps {
    let by_number: HashMap<u32, &DriverEntry> = drivers.iter().map(|d| (d.number, d)).collect();

    let laps = records
        .into_iter()
        .filter_map(|record| {
            let Some(driver) = by_number.get(&record.driver_number) else {
                debug!("Lap {} for unknown driver #{}", record.lap_number, record.driver_number);
                return None;
            };
            Some(Lap {
                driver: driver.code.clone(),
                driver_number: record.driver_number,
                lap_number: record.lap_number,
                lap_time: seconds(record.lap_duration),
                sector_times: [
                    seconds(record.duration_sector_1),
                    seconds(record.duration_sector_2),
                    seconds(record.duration_sector_3),
                ],
                start: record.date_start,
                pit_out: record.is_pit_out_lap.unwrap_or(false),
            })
        })
        .collect();

    Laps::new(laps)
}

/// Car data relative to `start`, keeping only samples inside the lap
pub fn convert_car_data(records: Vec<CarDataRecord>, start: DateTime<Utc>, lap_time: Seconds) -> Vec<CarSample> {
    records
        .into_iter()
        .filter_map(|record| {
            let speed = record.speed?;
            let time = (record.date - start).num_milliseconds() as f32 / 1000.0;
            (0.0..=lap_time.0).contains(&time).then_some(CarSample {
                time: Seconds(time),
                speed: KilometersPerHour(speed as f32),
            })
        })
        .collect()
}

fn api_timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// === Provider ===

pub struct OpenF1Provider {
    client: reqwest::Client,
    base_url: String,
}

impl OpenF1Provider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, LoadError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LoadError::Unreachable(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// GET `{base}/{path_and_query}` and decode a JSON array
    async fn get_list<T: DeserializeOwned>(&self, path_and_query: &str) -> Result<Vec<T>, LoadError> {
        let url = format!("{}/{}", self.base_url, path_and_query);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LoadError::Unreachable(format!("{}: {}", url, e)))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(LoadError::BadResponse(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }

        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| LoadError::BadResponse(format!("{}: {}", url, e)))
    }
}

#[async_trait]
impl TimingProvider for OpenF1Provider {
    fn key(&self) -> &str {
        "openf1"
    }

    async fn load_session(&self, params: &SessionParams) -> Result<Session, LoadError> {
        let started = Instant::now();

        let meetings: Vec<MeetingRecord> = self.get_list(&format!("meetings?year={}", params.year)).await?;
        // Testing meetings share names with Grands Prix but lack their
        // sessions, so keep going down the ranking until one has it
        let mut found = None;
        for meeting in rank_meetings(&meetings, &params.event) {
            let sessions: Vec<SessionRecord> = self
                .get_list(&format!("sessions?meeting_key={}", meeting.meeting_key))
                .await?;
            match pick_session(&sessions, params.session_type) {
                Some(session) => {
                    found = Some((meeting, session.clone()));
                    break;
                }
                None => debug!(
                    "{} has no {} session, trying next match",
                    meeting.meeting_name,
                    params.session_type.long_name()
                ),
            }
        }
        let (meeting, session) = found.ok_or_else(|| LoadError::not_found(params))?;

        let drivers = driver_entries(
            self.get_list(&format!("drivers?session_key={}", session.session_key))
                .await?,
        );
        let laps = convert_laps(
            self.get_list(&format!("laps?session_key={}", session.session_key))
                .await?,
            &drivers,
        );

        info!(
            "Loaded {} {} (session {}): {} drivers, {} laps in {:?}",
            meeting.meeting_name,
            params.session_type,
            session.session_key,
            drivers.len(),
            laps.len(),
            started.elapsed()
        );

        Ok(Session {
            info: SessionInfo {
                year: params.year,
                event: params.event.clone(),
                event_name: meeting.meeting_name.clone(),
                session_type: params.session_type,
                circuit: session
                    .circuit_short_name
                    .clone()
                    .or_else(|| meeting.circuit_short_name.clone()),
                session_key: Some(session.session_key),
            },
            drivers,
            laps,
        })
    }

    async fn lap_telemetry(&self, session: &Session, lap: &Lap) -> Result<LapTelemetry, LoadError> {
        let missing = || LoadError::MissingTelemetry {
            driver: lap.driver.to_string(),
            lap_number: lap.lap_number,
        };
        let session_key = session.info.session_key.ok_or_else(missing)?;
        let start = lap.start.ok_or_else(missing)?;
        let lap_time = lap.lap_time.ok_or_else(missing)?;
        let end = start + TimeDelta::milliseconds((lap_time.0 as f64 * 1000.0).ceil() as i64);

        let records: Vec<CarDataRecord> = self
            .get_list(&format!(
                "car_data?session_key={}&driver_number={}&date>={}&date<={}",
                session_key,
                lap.driver_number,
                api_timestamp(start),
                api_timestamp(end)
            ))
            .await?;

        let car_data = convert_car_data(records, start, lap_time);
        if car_data.is_empty() {
            return Err(missing());
        }
        Ok(LapTelemetry::from_car_data(car_data))
    }
}
