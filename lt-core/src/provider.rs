//! Timing provider trait definition

use crate::error::LoadError;
use crate::model::{Lap, LapTelemetry, Session, SessionParams};
use async_trait::async_trait;

/// Source of session timing and telemetry data
///
/// Each provider is responsible for:
/// - Resolving a year/event/session-type triple to a concrete session
/// - Loading the entry list and every lap of that session
/// - Converting provider-specific data to the unified model
#[async_trait]
pub trait TimingProvider: Send + Sync {
    /// Short identifier of this provider (e.g. "openf1", "demo")
    fn key(&self) -> &str;

    /// Load the session described by `params`
    ///
    /// `params.drivers` does not restrict what is loaded: the returned
    /// session holds laps for every driver so it can be reused across
    /// submissions with different driver selections.
    async fn load_session(&self, params: &SessionParams) -> Result<Session, LoadError>;

    /// Load car telemetry for one lap of a previously loaded session
    async fn lap_telemetry(&self, session: &Session, lap: &Lap) -> Result<LapTelemetry, LoadError>;
}
