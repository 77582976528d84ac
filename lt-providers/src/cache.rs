//! Session and telemetry cache
//!
//! `CachedProvider` wraps any provider and remembers loaded sessions and lap
//! telemetry for the lifetime of the process. When a cache directory is
//! configured, entries are also persisted as zstd-compressed JSON so a
//! restart does not have to hit the network again.
//!
//! The in-memory maps are bounded. Inserting a new key into a full map
//! clears it first; entries that were persisted come back from disk.

use crate::event::normalise;
use async_trait::async_trait;
use lt_core::{
    error::LoadError,
    model::{DriverCode, Lap, LapTelemetry, Session, SessionParams, SessionType},
    provider::TimingProvider,
};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

const ZSTD_LEVEL: i32 = 3;

/// Sessions held in memory before the map is cleared
pub const MAX_CACHED_SESSIONS: usize = 32;

/// Laps of telemetry held in memory before the map is cleared
pub const MAX_CACHED_LAPS: usize = 512;

/// Cache key of a session: the same session requested with different
/// driver selections shares one entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    year: u16,
    event: String,
    session_type: SessionType,
}

impl SessionKey {
    pub fn new(year: u16, event: &str, session_type: SessionType) -> Self {
        Self {
            year,
            event: normalise(event),
            session_type,
        }
    }

    pub fn from_params(params: &SessionParams) -> Self {
        Self::new(params.year, &params.event, params.session_type)
    }

    pub fn from_session(session: &Session) -> Self {
        Self::new(session.info.year, &session.info.event, session.info.session_type)
    }

    /// File-system safe name, e.g. `2024_abu-dhabi_Q`
    fn file_stem(&self) -> String {
        format!("{}_{}_{}", self.year, self.event.replace(' ', "-"), self.session_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TelemetryKey {
    session: SessionKey,
    driver: DriverCode,
    lap_number: u32,
}

/// On-disk store of compressed JSON blobs
struct DiskCache {
    root: PathBuf,
}

impl DiskCache {
    fn session_path(&self, key: &SessionKey) -> PathBuf {
        self.root
            .join("sessions")
            .join(format!("{}.json.zst", key.file_stem()))
    }

    fn telemetry_path(&self, key: &TelemetryKey) -> PathBuf {
        self.root
            .join("telemetry")
            .join(key.session.file_stem())
            .join(format!("{}_{}.json.zst", key.driver, key.lap_number))
    }

    fn read<T: DeserializeOwned>(&self, path: &Path) -> Option<T> {
        if !path.exists() {
            return None;
        }
        let result = std::fs::read(path)
            .map_err(anyhow::Error::from)
            .and_then(|compressed| Ok(zstd::decode_all(&compressed[..])?))
            .and_then(|json| Ok(serde_json::from_slice(&json)?));

        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring unreadable cache entry {}: {}", path.display(), e);
                None
            }
        }
    }

    fn write<T: Serialize>(&self, path: &Path, value: &T) {
        let result = (|| -> anyhow::Result<()> {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let json = serde_json::to_vec(value)?;
            let compressed = zstd::encode_all(&json[..], ZSTD_LEVEL)?;
            std::fs::write(path, compressed)?;
            Ok(())
        })();

        if let Err(e) = result {
            warn!("Failed to write cache entry {}: {}", path.display(), e);
        }
    }
}

/// Insert `value`, dropping every entry first when a new key would exceed `limit`
fn insert_bounded<K: Eq + Hash, V>(map: &mut HashMap<K, V>, key: K, value: V, limit: usize, what: &str) {
    if map.len() >= limit && !map.contains_key(&key) {
        debug!("{} cache reached {} entries, clearing", what, map.len());
        map.clear();
    }
    map.insert(key, value);
}

/// Provider decorator that caches sessions and lap telemetry
pub struct CachedProvider {
    inner: Box<dyn TimingProvider>,
    sessions: RwLock<HashMap<SessionKey, Session>>,
    telemetry: RwLock<HashMap<TelemetryKey, LapTelemetry>>,
    disk: Option<DiskCache>,
    max_sessions: usize,
    max_laps: usize,
}

impl CachedProvider {
    /// Memory-only cache
    pub fn new(inner: Box<dyn TimingProvider>) -> Self {
        Self {
            inner,
            sessions: RwLock::new(HashMap::new()),
            telemetry: RwLock::new(HashMap::new()),
            disk: None,
            max_sessions: MAX_CACHED_SESSIONS,
            max_laps: MAX_CACHED_LAPS,
        }
    }

    /// Memory cache backed by `dir` on disk
    pub fn with_disk_cache(inner: Box<dyn TimingProvider>, dir: impl Into<PathBuf>) -> Self {
        let root = dir.into();
        info!("Persisting {} cache to {}", inner.key(), root.display());
        Self {
            disk: Some(DiskCache { root }),
            ..Self::new(inner)
        }
    }

    /// Override how many sessions and laps are kept in memory (at least one each)
    pub fn with_memory_limits(mut self, sessions: usize, laps: usize) -> Self {
        self.max_sessions = sessions.max(1);
        self.max_laps = laps.max(1);
        self
    }

    /// Number of sessions held in memory
    pub async fn cached_sessions(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Number of laps whose telemetry is held in memory
    pub async fn cached_laps(&self) -> usize {
        self.telemetry.read().await.len()
    }
}

#[async_trait]
impl TimingProvider for CachedProvider {
    fn key(&self) -> &str {
        self.inner.key()
    }

    async fn load_session(&self, params: &SessionParams) -> Result<Session, LoadError> {
        let key = SessionKey::from_params(params);

        if let Some(session) = self.sessions.read().await.get(&key) {
            debug!("Session cache hit for {:?}", key);
            return Ok(session.clone());
        }

        let from_disk = self
            .disk
            .as_ref()
            .and_then(|disk| disk.read::<Session>(&disk.session_path(&key)));

        let session = match from_disk {
            Some(session) => {
                info!("Loaded {} from disk cache", params.describe());
                session
            }
            None => {
                let session = self.inner.load_session(params).await?;
                if let Some(disk) = &self.disk {
                    disk.write(&disk.session_path(&key), &session);
                }
                session
            }
        };

        insert_bounded(
            &mut *self.sessions.write().await,
            key,
            session.clone(),
            self.max_sessions,
            "Session",
        );
        Ok(session)
    }

    async fn lap_telemetry(&self, session: &Session, lap: &Lap) -> Result<LapTelemetry, LoadError> {
        let key = TelemetryKey {
            session: SessionKey::from_session(session),
            driver: lap.driver.clone(),
            lap_number: lap.lap_number,
        };

        if let Some(telemetry) = self.telemetry.read().await.get(&key) {
            return Ok(telemetry.clone());
        }

        let from_disk = self
            .disk
            .as_ref()
            .and_then(|disk| disk.read::<LapTelemetry>(&disk.telemetry_path(&key)));

        let telemetry = match from_disk {
            Some(telemetry) => telemetry,
            None => {
                let telemetry = self.inner.lap_telemetry(session, lap).await?;
                if let Some(disk) = &self.disk {
                    disk.write(&disk.telemetry_path(&key), &telemetry);
                }
                telemetry
            }
        };

        insert_bounded(
            &mut *self.telemetry.write().await,
            key,
            telemetry.clone(),
            self.max_laps,
            "Telemetry",
        );
        Ok(telemetry)
    }
}
