//! Error types shared by providers and the server

use crate::model::SessionType;
use thiserror::Error;

/// Rejected form input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamsError {
    #[error("year {0} is outside the supported range {min}-{max}", min = crate::model::MIN_YEAR, max = crate::model::MAX_YEAR)]
    YearOutOfRange(i64),

    #[error("year '{0}' is not a number")]
    InvalidYear(String),

    #[error("event must not be empty")]
    EmptyEvent,

    #[error("unknown session type '{0}' (expected FP1, FP2, FP3, Q or R)")]
    UnknownSessionType(String),

    #[error("'{0}' is not a three-letter driver code")]
    InvalidDriverCode(String),

    #[error("missing form field '{0}'")]
    MissingField(&'static str),
}

/// Failure to load session data from a timing provider
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no {session_type} session found for {event} {year}")]
    SessionNotFound {
        year: u16,
        event: String,
        session_type: SessionType,
    },

    #[error("timing provider unreachable: {0}")]
    Unreachable(String),

    #[error("unexpected response from timing provider: {0}")]
    BadResponse(String),

    #[error("no telemetry available for {driver} lap {lap_number}")]
    MissingTelemetry { driver: String, lap_number: u32 },
}

impl LoadError {
    pub fn not_found(params: &crate::model::SessionParams) -> Self {
        LoadError::SessionNotFound {
            year: params.year,
            event: params.event.clone(),
            session_type: params.session_type,
        }
    }
}
