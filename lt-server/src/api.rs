//! HTML page and JSON/SVG chart routes

use crate::form::{FormInput, FormOptions, Page};
use crate::pages::{self, PageResult};
use crate::pipeline::{self, ChartReport};
use crate::state::AppState;
use crate::svg;
use axum::{
    extract::{RawQuery, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use lt_core::{
    error::{LoadError, ParamsError},
    model::SessionParams,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer};
use tracing::warn;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(landing))
        .route("/speed-distance", get(speed_distance_page))
        .route("/long-run", get(long_run_page))
        .route("/api/options", get(options))
        .route("/api/charts/speed-distance", get(speed_distance_json))
        .route("/api/charts/speed-distance.svg", get(speed_distance_svg))
        .route("/api/charts/long-run", get(long_run_json))
        .route("/api/charts/long-run.svg", get(long_run_svg))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Why a chart could not be produced
#[derive(Debug)]
enum ChartError {
    Params(ParamsError),
    Load(LoadError),
}

impl ChartError {
    fn status(&self) -> StatusCode {
        match self {
            ChartError::Params(_) => StatusCode::BAD_REQUEST,
            ChartError::Load(LoadError::SessionNotFound { .. }) => StatusCode::NOT_FOUND,
            ChartError::Load(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn message(&self) -> String {
        match self {
            ChartError::Params(e) => format!("Invalid input: {}", e),
            ChartError::Load(e) => format!("Failed to load session: {}", e),
        }
    }
}

impl From<ChartError> for (StatusCode, String) {
    fn from(err: ChartError) -> Self {
        (err.status(), err.message())
    }
}

async fn build_report(state: &AppState, page: Page, params: &SessionParams) -> Result<ChartReport, ChartError> {
    let provider = state.provider.as_ref();
    let report = match page {
        Page::SpeedDistance => pipeline::speed_distance(provider, params).await,
        Page::LongRun => pipeline::long_run(provider, params).await,
    };
    report.map_err(ChartError::Load)
}

async fn chart_for_query(state: &AppState, page: Page, query: Option<String>) -> Result<ChartReport, ChartError> {
    let input = FormInput::from_query(query.as_deref().unwrap_or_default());
    let params = input.to_params().map_err(ChartError::Params)?;
    build_report(state, page, &params).await
}

// === Pages ===

async fn landing() -> Html<String> {
    Html(pages::render_landing())
}

async fn render_page(state: &AppState, page: Page, query: Option<String>) -> Html<String> {
    let query = query.filter(|q| !q.is_empty());
    let Some(query) = query else {
        return Html(pages::render_page(page, &FormInput::defaults(page), None));
    };

    let input = FormInput::from_query(&query);
    let result = match input.to_params() {
        Ok(params) => match build_report(state, page, &params).await {
            Ok(report) => {
                let svg = svg::render(&report.figure);
                PageResult::Loaded { report, svg }
            }
            Err(e) => PageResult::Failed(e.message()),
        },
        Err(e) => {
            warn!("Rejected form input {:?}: {}", query, e);
            PageResult::Failed(ChartError::Params(e).message())
        }
    };

    Html(pages::render_page(page, &input, Some(&result)))
}

async fn speed_distance_page(State(state): State<AppState>, RawQuery(query): RawQuery) -> Html<String> {
    render_page(&state, Page::SpeedDistance, query).await
}

async fn long_run_page(State(state): State<AppState>, RawQuery(query): RawQuery) -> Html<String> {
    render_page(&state, Page::LongRun, query).await
}

// === API ===

async fn options() -> Json<FormOptions> {
    Json(FormOptions::current())
}

async fn chart_json(state: &AppState, page: Page, query: Option<String>) -> Result<Json<ChartReport>, (StatusCode, String)> {
    Ok(Json(chart_for_query(state, page, query).await?))
}

async fn chart_svg(state: &AppState, page: Page, query: Option<String>) -> Result<Response, (StatusCode, String)> {
    let report = chart_for_query(state, page, query).await?;
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg::render(&report.figure)).into_response())
}

async fn speed_distance_json(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<ChartReport>, (StatusCode, String)> {
    chart_json(&state, Page::SpeedDistance, query).await
}

async fn long_run_json(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<ChartReport>, (StatusCode, String)> {
    chart_json(&state, Page::LongRun, query).await
}

async fn speed_distance_svg(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Response, (StatusCode, String)> {
    chart_svg(&state, Page::SpeedDistance, query).await
}

async fn long_run_svg(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Response, (StatusCode, String)> {
    chart_svg(&state, Page::LongRun, query).await
}
