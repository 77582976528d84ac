//! Server settings
//!
//! Read from an optional `laptrace.toml`, then overridden by `LAPTRACE_*`
//! environment variables. Invalid overrides are logged and ignored.

use anyhow::{Context, Result};
use lt_providers::openf1::DEFAULT_BASE_URL;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

pub const CONFIG_FILE: &str = "laptrace.toml";

/// Which timing provider backs the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenF1,
    Demo,
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openf1" => Ok(ProviderKind::OpenF1),
            "demo" => Ok(ProviderKind::Demo),
            other => Err(format!("unknown provider '{}' (expected openf1 or demo)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub bind: SocketAddr,
    pub provider: ProviderKind,
    pub openf1_url: String,
    pub timeout_secs: u64,
    /// Defaults to `<platform cache dir>/laptrace`
    pub cache_dir: Option<PathBuf>,
    pub disk_cache: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 9100)),
            provider: ProviderKind::OpenF1,
            openf1_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            cache_dir: None,
            disk_cache: true,
        }
    }
}

fn parse_override<T: FromStr>(name: &str, value: &str, target: &mut T)
where
    T::Err: std::fmt::Display,
{
    match value.parse() {
        Ok(parsed) => *target = parsed,
        Err(e) => warn!("Ignoring {}={:?}: {}", name, value, e),
    }
}

impl Settings {
    /// Load `path` if it exists, then apply the process environment
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with(path, |name| std::env::var(name).ok())
    }

    /// Load `path` if it exists, then apply overrides looked up through `var`
    pub fn load_with(path: &Path, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut settings = if path.exists() {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let settings = Self::from_toml(&text)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            info!("Loaded settings from {}", path.display());
            settings
        } else {
            Self::default()
        };

        settings.apply_env(var);
        Ok(settings)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Apply `LAPTRACE_*` overrides looked up through `var`
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(value) = var("LAPTRACE_BIND") {
            parse_override("LAPTRACE_BIND", &value, &mut self.bind);
        }
        if let Some(value) = var("LAPTRACE_PROVIDER") {
            parse_override("LAPTRACE_PROVIDER", &value, &mut self.provider);
        }
        if let Some(value) = var("LAPTRACE_OPENF1_URL") {
            if value.trim().is_empty() {
                warn!("Ignoring empty LAPTRACE_OPENF1_URL");
            } else {
                self.openf1_url = value.trim().to_string();
            }
        }
        if let Some(value) = var("LAPTRACE_TIMEOUT_SECS") {
            parse_override("LAPTRACE_TIMEOUT_SECS", &value, &mut self.timeout_secs);
        }
        if let Some(value) = var("LAPTRACE_CACHE_DIR") {
            if !value.trim().is_empty() {
                self.cache_dir = Some(PathBuf::from(value.trim()));
            }
        }
        if let Some(value) = var("LAPTRACE_DISK_CACHE") {
            parse_override("LAPTRACE_DISK_CACHE", &value, &mut self.disk_cache);
        }
    }

    /// Directory for the on-disk cache, or `None` when disabled
    pub fn resolved_cache_dir(&self) -> Option<PathBuf> {
        if !self.disk_cache {
            return None;
        }
        self.cache_dir
            .clone()
            .or_else(|| dirs::cache_dir().map(|dir| dir.join("laptrace")))
    }
}
