//! Laptrace Core Library
//!
//! This crate provides the session/lap/telemetry data model, the sector
//! locator, and the provider trait shared by all timing data sources.

pub mod error;
pub mod model;
pub mod provider;
pub mod sectors;
pub mod units;

pub use error::{LoadError, ParamsError};
pub use model::{DriverCode, Lap, LapTelemetry, Laps, Session, SessionParams, SessionType};
pub use provider::TimingProvider;
pub use sectors::{locate_sectors, SectorBoundary};
