//! Application state management

use crate::config::{ProviderKind, Settings};
use anyhow::Result;
use lt_core::provider::TimingProvider;
use lt_providers::{CachedProvider, DemoProvider, OpenF1Provider};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Timing provider, normally wrapped in a `CachedProvider` so every
    /// request shares one session cache
    pub provider: Arc<dyn TimingProvider>,
}

impl AppState {
    pub fn new(provider: impl TimingProvider + 'static) -> Self {
        Self {
            provider: Arc::new(provider),
        }
    }

    /// Offline state backed by the demo provider
    pub fn demo() -> Self {
        Self::new(CachedProvider::new(Box::new(DemoProvider::new())))
    }

    /// Build the provider stack described by `settings`
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let inner: Box<dyn TimingProvider> = match settings.provider {
            ProviderKind::OpenF1 => {
                info!("Using OpenF1 at {}", settings.openf1_url);
                Box::new(OpenF1Provider::new(
                    settings.openf1_url.clone(),
                    Duration::from_secs(settings.timeout_secs),
                )?)
            }
            ProviderKind::Demo => {
                info!("Using the offline demo provider");
                Box::new(DemoProvider::new())
            }
        };

        let cached = match settings.resolved_cache_dir() {
            Some(dir) => CachedProvider::with_disk_cache(inner, dir),
            None => CachedProvider::new(inner),
        };

        Ok(Self::new(cached))
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::demo()
    }
}
