//! Chart model
//!
//! A `Figure` is a plain, serialisable description of a 2D chart: titled axes,
//! a set of line or scatter series, and vertical annotated markers. Builders in
//! this module produce the two figures served by Laptrace; `crate::svg` turns
//! any figure into an image.

use lt_core::{
    model::{DriverCode, Lap, LapTelemetry, SessionParams},
    units::Seconds,
    SectorBoundary,
};
use serde::Serialize;

/// Colours used for drivers without a fixed colour, in order of appearance
const FALLBACK_PALETTE: [&str; 6] = ["green", "purple", "brown", "teal", "magenta", "olive"];

/// Colour for a driver; `position` is the series index used for fallbacks
pub fn driver_color(driver: &DriverCode, position: usize) -> &'static str {
    match driver.as_str() {
        "LEC" => "red",
        "NOR" => "orange",
        "VER" => "blue",
        _ => FALLBACK_PALETTE[position % FALLBACK_PALETTE.len()],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    Line,
    Scatter,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub label: String,
    pub color: String,
    pub kind: SeriesKind,
    pub points: Vec<Point>,
}

/// Dashed vertical line at `x` with multi-line annotation text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub x: f32,
    pub text: String,
    /// Anchor of the annotation's first line, in data coordinates
    pub text_at: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub grid: bool,
    pub legend: bool,
    pub series: Vec<Series>,
    pub markers: Vec<Marker>,
}

impl Figure {
    pub fn new(title: impl Into<String>, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            grid: true,
            legend: false,
            series: Vec::new(),
            markers: Vec::new(),
        }
    }

    /// Empty speed-vs-distance figure for a session
    pub fn speed_distance(params: &SessionParams) -> Self {
        Self::new(
            format!(
                "Speed vs Distance - {} GP {} {}",
                params.event, params.year, params.session_type
            ),
            "Distance (m)",
            "Speed (km/h)",
        )
    }

    /// Empty lap-time-vs-lap-number figure for a session
    pub fn lap_times(params: &SessionParams) -> Self {
        Self {
            legend: true,
            ..Self::new(
                format!(
                    "Lap Time vs Lap Number - {} GP {} {} Session",
                    params.event, params.year, params.session_type
                ),
                "Lap Number",
                "Lap Time (seconds)",
            )
        }
    }

    /// Add one driver's fastest-lap speed trace
    pub fn add_speed_trace(&mut self, driver: &DriverCode, lap_time: Seconds, telemetry: &LapTelemetry) {
        let points = telemetry
            .samples
            .iter()
            .map(|s| Point {
                x: s.distance.0,
                y: s.speed.0,
            })
            .collect();

        let color = driver_color(driver, self.series.len());
        self.series.push(Series {
            label: format!("{} {}", driver, lap_time.as_lap_time()),
            color: color.to_string(),
            kind: SeriesKind::Line,
            points,
        });
    }

    /// Add sector markers from the reference driver's fastest lap.
    /// The annotation sits 5 m right of the line at 90% of `max_speed`.
    pub fn add_sector_markers(&mut self, driver: &DriverCode, boundaries: &[SectorBoundary], max_speed: f32) {
        for boundary in boundaries {
            let x = boundary.distance.0;
            self.markers.push(Marker {
                x,
                text: format!("S{}\n{}: {:.2}s", boundary.index, driver, boundary.sector_time.0),
                text_at: Point {
                    x: x + 5.0,
                    y: max_speed * 0.9,
                },
            });
        }
    }

    /// Add one driver's timed laps as a scatter series.
    /// Returns false (adding nothing) when no lap has a time.
    pub fn add_lap_times<'a>(&mut self, driver: &DriverCode, laps: impl IntoIterator<Item = &'a Lap>) -> bool {
        let points: Vec<Point> = laps
            .into_iter()
            .filter_map(|lap| {
                lap.lap_time.map(|t| Point {
                    x: lap.lap_number as f32,
                    y: t.0,
                })
            })
            .collect();

        if points.is_empty() {
            return false;
        }

        let color = driver_color(driver, self.series.len());
        self.series.push(Series {
            label: driver.to_string(),
            color: color.to_string(),
            kind: SeriesKind::Scatter,
            points,
        });
        true
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty() && self.markers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lt_core::{
        model::{CarSample, SessionType},
        units::{KilometersPerHour, Meters},
    };

    fn code(s: &str) -> DriverCode {
        s.parse().unwrap()
    }

    fn params() -> SessionParams {
        SessionParams::new(2024, "Abu Dhabi", SessionType::Q, vec![code("VER")]).unwrap()
    }

    fn lap(number: u32, time: Option<f32>) -> Lap {
        Lap {
            driver: code("LEC"),
            driver_number: 16,
            lap_number: number,
            lap_time: time.map(Seconds),
            sector_times: [None; 3],
            start: None,
            pit_out: false,
        }
    }

    #[test]
    fn test_titles_and_axes() {
        let speed = Figure::speed_distance(&params());
        assert_eq!(speed.title, "Speed vs Distance - Abu Dhabi GP 2024 Q");
        assert_eq!(speed.x_label, "Distance (m)");
        assert_eq!(speed.y_label, "Speed (km/h)");
        assert!(speed.grid);
        assert!(!speed.legend);

        let laps = Figure::lap_times(&params());
        assert_eq!(laps.title, "Lap Time vs Lap Number - Abu Dhabi GP 2024 Q Session");
        assert_eq!(laps.y_label, "Lap Time (seconds)");
        assert!(laps.legend);
    }

    #[test]
    fn test_driver_colors() {
        assert_eq!(driver_color(&code("LEC"), 5), "red");
        assert_eq!(driver_color(&code("NOR"), 0), "orange");
        assert_eq!(driver_color(&code("VER"), 1), "blue");
        assert_eq!(driver_color(&code("HAM"), 0), "green");
        assert_eq!(driver_color(&code("HAM"), 7), "purple");
    }

    #[test]
    fn test_speed_trace_label_has_code_and_lap_time() {
        let telemetry = LapTelemetry::from_car_data(vec![
            CarSample { time: Seconds(0.0), speed: KilometersPerHour(100.0) },
            CarSample { time: Seconds(1.0), speed: KilometersPerHour(108.0) },
        ]);
        let mut figure = Figure::speed_distance(&params());
        figure.add_speed_trace(&code("VER"), Seconds(82.595), &telemetry);

        let series = &figure.series[0];
        assert_eq!(series.label, "VER 1:22.595");
        assert_eq!(series.color, "blue");
        assert_eq!(series.kind, SeriesKind::Line);
        assert_eq!(series.points.len(), 2);
        assert_eq!(series.points[1].x, 30.0);
    }

    #[test]
    fn test_sector_marker_text_and_position() {
        let mut figure = Figure::speed_distance(&params());
        let boundaries = [SectorBoundary {
            index: 1,
            distance: Meters(1200.0),
            elapsed: Seconds(17.0),
            sector_time: Seconds(17.0),
        }];
        figure.add_sector_markers(&code("VER"), &boundaries, 320.0);

        let marker = &figure.markers[0];
        assert_eq!(marker.x, 1200.0);
        assert_eq!(marker.text, "S1\nVER: 17.00s");
        assert_eq!(marker.text_at.x, 1205.0);
        assert!((marker.text_at.y - 288.0).abs() < 1e-3);
    }

    #[test]
    fn test_lap_times_skip_untimed_laps() {
        let mut figure = Figure::lap_times(&params());
        let laps = [lap(1, None), lap(2, Some(90.5)), lap(3, Some(89.9))];

        assert!(figure.add_lap_times(&code("LEC"), &laps));
        let series = &figure.series[0];
        assert_eq!(series.label, "LEC");
        assert_eq!(series.kind, SeriesKind::Scatter);
        assert_eq!(series.points, vec![Point { x: 2.0, y: 90.5 }, Point { x: 3.0, y: 89.9 }]);
    }

    #[test]
    fn test_lap_times_without_any_time_add_nothing() {
        let mut figure = Figure::lap_times(&params());
        assert!(!figure.add_lap_times(&code("LEC"), &[lap(1, None)]));
        assert!(figure.is_empty());
    }
}
