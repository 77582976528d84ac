//! Timing data providers for Laptrace

pub mod cache;
pub mod demo;
pub mod event;
pub mod openf1;

pub use cache::CachedProvider;
pub use demo::DemoProvider;
pub use openf1::OpenF1Provider;
