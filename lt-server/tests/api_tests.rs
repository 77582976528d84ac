//! Integration tests for the lt-server HTTP API
//!
//! Uses tower::ServiceExt::oneshot to test routes directly without binding a port.
//! All tests run against the offline demo provider.

use axum::body::Body;
use http_body_util::BodyExt;
use hyper::Request;
use lt_core::{
    model::{SessionParams, SessionType},
    provider::TimingProvider,
};
use lt_providers::DemoProvider;
use lt_server::{api::create_router, state::AppState};
use serde_json::Value;
use tower::ServiceExt;

/// Helper: build a router backed by the demo provider
fn app() -> axum::Router {
    create_router(AppState::demo())
}

/// Helper: collect response body into bytes
async fn body_bytes(body: Body) -> Vec<u8> {
    let collected = body.collect().await.unwrap();
    collected.to_bytes().to_vec()
}

/// Helper: collect response body into string
async fn body_string(body: Body) -> String {
    String::from_utf8(body_bytes(body).await).unwrap()
}

/// Helper: GET `uri`, returning status, content-type and body
async fn get(uri: &str) -> (u16, String, String) {
    let response = app()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get("content-type")
        .map(|v| v.to_str().unwrap().to_string())
        .unwrap_or_default();
    let body = body_string(response.into_body()).await;
    (status, content_type, body)
}

async fn get_json(uri: &str) -> (u16, Value) {
    let (status, content_type, body) = get(uri).await;
    assert!(
        content_type.contains("application/json"),
        "Expected application/json content-type, got: {}",
        content_type
    );
    (status, serde_json::from_str(&body).unwrap())
}

// ==================== Pages ====================

#[tokio::test]
async fn test_get_root_returns_200_with_html() {
    let (status, content_type, body) = get("/").await;

    assert_eq!(status, 200);
    assert!(
        content_type.contains("text/html"),
        "Expected text/html content-type, got: {}",
        content_type
    );
    assert!(body.contains("<!DOCTYPE html>"));
    assert!(body.contains("/speed-distance"));
    assert!(body.contains("/long-run"));
}

#[tokio::test]
async fn test_blank_long_run_page_shows_form_only() {
    let (status, _, body) = get("/long-run").await;

    assert_eq!(status, 200);
    assert!(body.contains("Load and Plot"));
    assert!(body.contains("value=\"Qatar\""));
    assert!(!body.contains("Session Loaded Successfully!"));
    assert!(!body.contains("<svg"));
}

#[tokio::test]
async fn test_submitted_speed_page_shows_chart() {
    let (status, _, body) =
        get("/speed-distance?year=2024&event=Abu+Dhabi&session=Q&drivers=VER").await;

    assert_eq!(status, 200);
    assert!(body.contains("Session Loaded Successfully!"));
    assert!(body.contains("Telemetry Visualization - Abu Dhabi GP 2024 Q Session"));
    assert!(body.contains("Speed vs Distance - Abu Dhabi GP 2024 Q"));
    assert!(body.contains("<polyline"));
    assert!(body.contains("<option value=\"VER\" selected>VER</option>"));
}

#[tokio::test]
async fn test_submitted_page_with_unknown_event_shows_error_banner() {
    let (status, _, body) = get("/long-run?year=2024&event=Atlantis&session=R&drivers=LEC").await;

    assert_eq!(status, 200);
    assert!(body.contains("banner error"));
    assert!(body.contains("Atlantis"));
    assert!(!body.contains("Session Loaded Successfully!"));
}

#[tokio::test]
async fn test_submitted_page_with_bad_year_shows_error_banner() {
    let (status, _, body) = get("/long-run?year=1800&event=Qatar&session=R").await;

    assert_eq!(status, 200);
    assert!(body.contains("banner error"));
    assert!(body.contains("1800"));
}

#[tokio::test]
async fn test_missing_driver_notice_on_page() {
    let (_, _, body) = get("/long-run?year=2024&event=Qatar&session=R&drivers=HAM&drivers=LEC").await;

    assert!(body.contains("Session Loaded Successfully!"));
    assert!(body.contains("No laps for HAM in this session"));
}

// ==================== GET /api/options ====================

#[tokio::test]
async fn test_options_lists_form_choices() {
    let (status, json) = get_json("/api/options").await;

    assert_eq!(status, 200);
    assert_eq!(json["min_year"], 1950);
    assert_eq!(json["max_year"], 2024);
    assert_eq!(json["roster"], serde_json::json!(["LEC", "NOR", "VER"]));
    assert_eq!(json["speed_distance"]["default_session"], "Q");
    assert_eq!(json["long_run"]["default_event"], "Qatar");
    assert_eq!(json["long_run"]["default_drivers"], serde_json::json!(["LEC", "NOR"]));
}

// ==================== Chart API ====================

#[tokio::test]
async fn test_long_run_chart_has_one_scatter_per_driver() {
    let (status, json) =
        get_json("/api/charts/long-run?year=2024&event=Qatar&session=R&drivers=LEC&drivers=NOR").await;

    assert_eq!(status, 200);

    // Same demo data the app serves, loaded directly
    let session = DemoProvider::new()
        .load_session(&SessionParams::new(2024, "Qatar", SessionType::R, vec![]).unwrap())
        .await
        .unwrap();

    let series = json["figure"]["series"].as_array().unwrap();
    assert_eq!(series.len(), 2);
    for (entry, code) in series.iter().zip(["LEC", "NOR"]) {
        assert_eq!(entry["kind"], "scatter");
        assert!(entry["label"].as_str().unwrap().contains(code));

        let expected: Vec<(f64, f64)> = session
            .laps
            .pick_driver(&code.parse().unwrap())
            .iter()
            .filter_map(|lap| lap.lap_time.map(|t| (lap.lap_number as f64, t.0 as f64)))
            .collect();
        let points = entry["points"].as_array().unwrap();
        assert!(!expected.is_empty());
        assert_eq!(points.len(), expected.len(), "one point per timed {} lap", code);
        for (point, (lap_number, lap_time)) in points.iter().zip(expected) {
            assert_eq!(point["x"].as_f64().unwrap(), lap_number);
            let y = point["y"].as_f64().unwrap();
            assert!((y - lap_time).abs() < 1e-3, "{} lap {}: {} vs {}", code, lap_number, y, lap_time);
        }
    }
    assert_eq!(
        json["figure"]["title"],
        "Lap Time vs Lap Number - Qatar GP 2024 R Session"
    );
    assert_eq!(json["session"]["event_name"], "Qatar Grand Prix");
}

#[tokio::test]
async fn test_speed_chart_has_line_and_sector_markers() {
    let (status, json) =
        get_json("/api/charts/speed-distance?year=2024&event=Abu+Dhabi&session=Q&drivers=VER").await;

    assert_eq!(status, 200);
    let series = json["figure"]["series"].as_array().unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0]["kind"], "line");
    assert!(series[0]["label"].as_str().unwrap().starts_with("VER "));

    let markers = json["figure"]["markers"].as_array().unwrap();
    assert!(!markers.is_empty() && markers.len() <= 3);
    assert!(markers[0]["text"].as_str().unwrap().starts_with("S1\nVER: "));
}

#[tokio::test]
async fn test_zero_drivers_gives_empty_chart() {
    let (status, json) = get_json("/api/charts/speed-distance?year=2024&event=Monaco&session=Q").await;

    assert_eq!(status, 200);
    assert_eq!(json["figure"]["series"].as_array().unwrap().len(), 0);
    assert_eq!(json["figure"]["markers"].as_array().unwrap().len(), 0);
    assert_eq!(json["notices"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_driver_not_in_session_is_skipped() {
    let (status, json) =
        get_json("/api/charts/long-run?year=2024&event=Qatar&session=R&drivers=HAM&drivers=NOR").await;

    assert_eq!(status, 200);
    assert_eq!(json["figure"]["series"].as_array().unwrap().len(), 1);
    assert_eq!(json["notices"][0], "No laps for HAM in this session");
}

#[tokio::test]
async fn test_invalid_params_return_400() {
    for uri in [
        "/api/charts/long-run?event=Qatar&session=R",
        "/api/charts/long-run?year=2030&event=Qatar&session=R",
        "/api/charts/long-run?year=2024&event=Qatar&session=FP9",
        "/api/charts/speed-distance?year=2024&event=Qatar&session=Q&drivers=TOOLONG",
        "/api/charts/speed-distance",
    ] {
        let (status, _, body) = get(uri).await;
        assert_eq!(status, 400, "{} should be rejected", uri);
        assert!(body.starts_with("Invalid input"), "unexpected body {:?}", body);
    }
}

#[tokio::test]
async fn test_unknown_session_returns_404() {
    let (status, _, body) = get("/api/charts/long-run?year=2024&event=Atlantis&session=R").await;
    assert_eq!(status, 404);
    assert!(body.contains("Atlantis"));

    let (status, _, _) = get("/api/charts/speed-distance.svg?year=2019&event=Monaco&session=Q").await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_svg_endpoint_returns_svg() {
    let (status, content_type, body) =
        get("/api/charts/long-run.svg?year=2024&event=Qatar&session=R&drivers=LEC").await;

    assert_eq!(status, 200);
    assert_eq!(content_type, "image/svg+xml");
    assert!(body.starts_with("<svg"));
    assert!(body.ends_with("</svg>"));
    assert!(body.contains("<circle"));
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let (status, _, _) = get("/api/nonexistent").await;
    assert_eq!(status, 404);
}
