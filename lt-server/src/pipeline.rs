//! Load, compute and chart one form submission
//!
//! Each function loads the session through the provider, walks the selected
//! drivers in submission order and builds the figure. A driver that cannot be
//! plotted is skipped with a notice; only a failure to load the session itself
//! is an error.

use crate::chart::Figure;
use crate::form::loading_message;
use lt_core::{
    error::LoadError,
    locate_sectors,
    model::{DriverCode, Lap, LapTelemetry, Session, SessionInfo, SessionParams},
    provider::TimingProvider,
};
use serde::Serialize;
use std::time::Instant;
use tracing::{error, info, warn};

/// A rendered-ready chart plus what went wrong along the way
#[derive(Debug, Clone, Serialize)]
pub struct ChartReport {
    pub session: SessionInfo,
    pub figure: Figure,
    /// Human readable notes about skipped drivers or missing markers
    pub notices: Vec<String>,
}

fn no_laps_notice(driver: &DriverCode) -> String {
    format!("No laps for {} in this session", driver)
}

async fn load(provider: &dyn TimingProvider, params: &SessionParams) -> Result<Session, LoadError> {
    info!("{}", loading_message(params));
    let started = Instant::now();

    match provider.load_session(params).await {
        Ok(session) => {
            info!(
                "Loaded {} ({} laps) from {} in {:?}",
                session.info.event_name,
                session.laps.len(),
                provider.key(),
                started.elapsed()
            );
            Ok(session)
        }
        Err(e) => {
            error!("Failed to load {}: {}", params.describe(), e);
            Err(e)
        }
    }
}

/// One driver's fastest lap with its telemetry
struct FastestLap {
    driver: DriverCode,
    lap: Lap,
    telemetry: LapTelemetry,
}

/// Speed vs distance of each selected driver's fastest lap, with sector
/// markers from the reference driver
pub async fn speed_distance(
    provider: &dyn TimingProvider,
    params: &SessionParams,
) -> Result<ChartReport, LoadError> {
    let session = load(provider, params).await?;
    let mut notices = Vec::new();
    let mut fastest_laps = Vec::with_capacity(params.drivers.len());

    for driver in &params.drivers {
        let laps = session.laps.pick_driver(driver);
        let Some(lap) = laps.pick_fastest() else {
            warn!("{} has no timed lap in {}", driver, params.describe());
            notices.push(no_laps_notice(driver));
            continue;
        };

        match provider.lap_telemetry(&session, lap).await {
            Ok(telemetry) if !telemetry.is_empty() => fastest_laps.push(FastestLap {
                driver: driver.clone(),
                lap: lap.clone(),
                telemetry,
            }),
            Ok(_) => {
                warn!("Empty telemetry for {} lap {}", driver, lap.lap_number);
                notices.push(format!("No telemetry for {} lap {}", driver, lap.lap_number));
            }
            Err(e) => {
                warn!("Skipping {}: {}", driver, e);
                notices.push(format!("Skipped {}: {}", driver, e));
            }
        }
    }

    let mut figure = Figure::speed_distance(params);

    // The first plotted driver, in submission order, supplies the markers
    if let Some(reference) = fastest_laps.first() {
        let boundaries = locate_sectors(&reference.lap, &reference.telemetry);
        for index in 1..=3u8 {
            if !boundaries.iter().any(|b| b.index == index) {
                warn!(
                    "No sector {} boundary for {} lap {}",
                    index, reference.driver, reference.lap.lap_number
                );
                notices.push(format!("Sector {} marker unavailable for {}", index, reference.driver));
            }
        }
        let max_speed = reference.telemetry.max_speed().map(|s| s.0).unwrap_or_default();
        figure.add_sector_markers(&reference.driver, &boundaries, max_speed);
    }

    for fastest in &fastest_laps {
        let lap_time = fastest.lap.lap_time.unwrap_or_default();
        figure.add_speed_trace(&fastest.driver, lap_time, &fastest.telemetry);
    }

    Ok(ChartReport {
        session: session.info,
        figure,
        notices,
    })
}

/// Lap time against lap number for every timed lap of each selected driver
pub async fn long_run(provider: &dyn TimingProvider, params: &SessionParams) -> Result<ChartReport, LoadError> {
    let session = load(provider, params).await?;
    let mut notices = Vec::new();
    let mut figure = Figure::lap_times(params);

    for driver in &params.drivers {
        let laps = session.laps.pick_driver(driver);
        if !figure.add_lap_times(driver, &laps) {
            warn!("{} has no timed laps in {}", driver, params.describe());
            notices.push(no_laps_notice(driver));
        }
    }

    Ok(ChartReport {
        session: session.info,
        figure,
        notices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::SeriesKind;
    use async_trait::async_trait;
    use lt_core::model::SessionType;
    use lt_providers::DemoProvider;

    fn params(event: &str, session_type: SessionType, drivers: &[&str]) -> SessionParams {
        SessionParams::new(
            2024,
            event,
            session_type,
            drivers.iter().map(|d| d.parse().unwrap()).collect(),
        )
        .unwrap()
    }

    /// Demo sessions, but telemetry is never available
    struct NoTelemetry(DemoProvider);

    #[async_trait]
    impl TimingProvider for NoTelemetry {
        fn key(&self) -> &str {
            "no-telemetry"
        }

        async fn load_session(&self, params: &SessionParams) -> Result<Session, LoadError> {
            self.0.load_session(params).await
        }

        async fn lap_telemetry(&self, _session: &Session, lap: &Lap) -> Result<LapTelemetry, LoadError> {
            Err(LoadError::MissingTelemetry {
                driver: lap.driver.to_string(),
                lap_number: lap.lap_number,
            })
        }
    }

    #[tokio::test]
    async fn test_long_run_scatter_per_driver() {
        let provider = DemoProvider::new();
        let report = long_run(&provider, &params("Qatar", SessionType::R, &["LEC", "NOR"]))
            .await
            .unwrap();

        let figure = &report.figure;
        assert_eq!(figure.series.len(), 2);
        assert_eq!(figure.series[0].label, "LEC");
        assert_eq!(figure.series[1].label, "NOR");

        // One point per timed lap, (lap number, lap time), in lap order
        let session = provider
            .load_session(&params("Qatar", SessionType::R, &[]))
            .await
            .unwrap();
        for (series, code) in figure.series.iter().zip(["LEC", "NOR"]) {
            assert_eq!(series.kind, SeriesKind::Scatter);
            let expected: Vec<(f32, f32)> = session
                .laps
                .pick_driver(&code.parse().unwrap())
                .iter()
                .filter_map(|lap| lap.lap_time.map(|t| (lap.lap_number as f32, t.0)))
                .collect();
            let actual: Vec<(f32, f32)> = series.points.iter().map(|p| (p.x, p.y)).collect();
            assert!(!expected.is_empty());
            assert_eq!(actual, expected, "points for {}", code);
        }
        assert!(report.notices.is_empty());
        assert_eq!(report.session.event_name, "Qatar Grand Prix");
    }

    #[tokio::test]
    async fn test_speed_distance_single_driver_with_markers() {
        let provider = DemoProvider::new();
        let params = params("Abu Dhabi", SessionType::Q, &["VER"]);
        let report = speed_distance(&provider, &params).await.unwrap();

        let figure = &report.figure;
        assert_eq!(figure.series.len(), 1);
        assert_eq!(figure.series[0].kind, SeriesKind::Line);
        assert!(figure.series[0].label.starts_with("VER "));
        assert!(!figure.markers.is_empty() && figure.markers.len() <= 3);

        // Every marker sits on a distance from VER's fastest-lap telemetry
        let session = provider.load_session(&params).await.unwrap();
        let laps = session.laps.pick_driver(&"VER".parse().unwrap());
        let telemetry = provider
            .lap_telemetry(&session, laps.pick_fastest().unwrap())
            .await
            .unwrap();
        for marker in &figure.markers {
            assert!(telemetry.samples.iter().any(|s| s.distance.0 == marker.x));
            assert!(marker.text.contains("VER: "));
        }
    }

    #[tokio::test]
    async fn test_zero_drivers_give_zero_series() {
        let provider = DemoProvider::new();
        let speed = speed_distance(&provider, &params("Monaco", SessionType::Q, &[]))
            .await
            .unwrap();
        assert!(speed.figure.is_empty());

        let laps = long_run(&provider, &params("Monaco", SessionType::R, &[]))
            .await
            .unwrap();
        assert!(laps.figure.series.is_empty());
        assert!(laps.notices.is_empty());
    }

    #[tokio::test]
    async fn test_missing_driver_is_skipped_with_notice() {
        let provider = DemoProvider::new();
        let report = long_run(&provider, &params("Qatar", SessionType::R, &["HAM", "NOR"]))
            .await
            .unwrap();
        assert_eq!(report.figure.series.len(), 1);
        assert_eq!(report.figure.series[0].label, "NOR");
        assert_eq!(report.notices, vec!["No laps for HAM in this session"]);
    }

    #[tokio::test]
    async fn test_reference_driver_is_first_plotted_driver() {
        let provider = DemoProvider::new();
        let report = speed_distance(&provider, &params("Abu Dhabi", SessionType::Q, &["HAM", "NOR", "VER"]))
            .await
            .unwrap();

        assert_eq!(report.figure.series.len(), 2);
        assert!(!report.figure.markers.is_empty());
        for marker in &report.figure.markers {
            assert!(marker.text.contains("NOR: "), "marker text {:?}", marker.text);
        }
        assert_eq!(report.notices, vec!["No laps for HAM in this session"]);
    }

    #[tokio::test]
    async fn test_telemetry_failure_skips_driver() {
        let provider = NoTelemetry(DemoProvider::new());
        let report = speed_distance(&provider, &params("Abu Dhabi", SessionType::Q, &["VER"]))
            .await
            .unwrap();
        assert!(report.figure.is_empty());
        assert_eq!(report.notices.len(), 1);
        assert!(report.notices[0].contains("VER"));
    }

    #[tokio::test]
    async fn test_unknown_session_is_an_error() {
        let provider = DemoProvider::new();
        let err = long_run(&provider, &params("Silverstone", SessionType::R, &["LEC"]))
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::SessionNotFound { .. }));
    }
}
