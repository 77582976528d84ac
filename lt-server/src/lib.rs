//! Laptrace Server Library
//!
//! Exposes server components for integration testing.

pub mod api;
pub mod chart;
pub mod config;
pub mod form;
pub mod pages;
pub mod pipeline;
pub mod state;
pub mod svg;
