use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_models::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheKey {
    DoctorsList,
    Appointments(String),
}

impl CacheKey {
    pub fn as_key(&self) -> String {
        match self {
            CacheKey::DoctorsList => "doctors:list".to_string(),
            CacheKey::Appointments(doctor_id) => format!("appointments:{}", doctor_id),
        }
    }

    /// Percent-encoded so distinct keys never share a file and no key
    /// escapes the cache directory.
    fn file_name(&self) -> String {
        format!("{}.json", urlencoding::encode(&self.as_key()))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEnvelope {
    key: String,
    saved_at: DateTime<Utc>,
    items: Vec<Value>,
}

/// Last-known list read back from disk.
#[derive(Debug, Clone)]
pub struct CachedList<T> {
    pub items: Vec<T>,
    pub saved_at: DateTime<Utc>,
}

/// Where a list shown to the user came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Network,
    OfflineCache { saved_at: DateTime<Utc> },
}

#[derive(Debug, Clone)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub source: DataSource,
}

impl<T> Listing<T> {
    pub fn from_network(items: Vec<T>) -> Self {
        Self { items, source: DataSource::Network }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self.source, DataSource::OfflineCache { .. })
    }
}

impl<T> From<CachedList<T>> for Listing<T> {
    fn from(cached: CachedList<T>) -> Self {
        Self {
            items: cached.items,
            source: DataSource::OfflineCache { saved_at: cached.saved_at },
        }
    }
}

/// Best-effort on-disk mirror of list responses for offline display.
///
/// Reads never fail (a missing or unreadable entry is `None`) and every
/// write replaces the previous entry wholesale.
#[derive(Debug, Clone)]
pub struct OfflineCache {
    dir: PathBuf,
}

impl OfflineCache {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_dir(config.offline_cache_dir.clone())
    }

    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    pub async fn read<T>(&self, key: &CacheKey) -> Option<CachedList<T>>
    where
        T: DeserializeOwned,
    {
        let path = self.path_for(key);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) => {
                debug!("No offline entry for {} ({})", key.as_key(), e);
                return None;
            }
        };

        let envelope: CacheEnvelope = match serde_json::from_slice(&raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("Discarding unreadable offline entry {}: {}", key.as_key(), e);
                return None;
            }
        };

        let items = envelope
            .items
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    debug!("Skipping cached item in {}: {}", key.as_key(), e);
                    None
                }
            })
            .collect();

        Some(CachedList {
            items,
            saved_at: envelope.saved_at,
        })
    }

    pub async fn write<T>(&self, key: &CacheKey, items: &[T]) -> Result<(), AppError>
    where
        T: Serialize,
    {
        let items = items
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppError::Cache(e.to_string()))?;

        let envelope = CacheEnvelope {
            key: key.as_key(),
            saved_at: Utc::now(),
            items,
        };
        let bytes = serde_json::to_vec(&envelope).map_err(|e| AppError::Cache(e.to_string()))?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| AppError::Cache(format!("Cannot create {}: {}", self.dir.display(), e)))?;

        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| AppError::Cache(e.to_string()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| AppError::Cache(e.to_string()))?;

        debug!("Stored {} items under {}", envelope.items.len(), key.as_key());
        Ok(())
    }

    /// Same as [`write`](Self::write) but only logs failures; callers use
    /// this after a successful network read where the cache is secondary.
    pub async fn store<T>(&self, key: &CacheKey, items: &[T])
    where
        T: Serialize,
    {
        if let Err(e) = self.write(key, items).await {
            warn!("Failed to update offline cache {}: {}", key.as_key(), e);
        }
    }

    pub async fn remove(&self, key: &CacheKey) {
        if let Err(e) = tokio::fs::remove_file(self.path_for(key)).await {
            debug!("Nothing removed for {}: {}", key.as_key(), e);
        }
    }
}
