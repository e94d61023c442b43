//! Persistent `owner/repo` → license URL cache.
//!
//! The on-disk form is a pretty-printed JSON object whose values are either
//! a URL string or `null` ("looked up, nothing found"). A missing key means
//! the repository has never been looked up. Every write rewrites the whole
//! file so an interrupted run keeps everything resolved before it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::sync::Mutex;

/// Result of a cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    /// Never looked up.
    Miss,
    /// Looked up before; `None` means no license file was found.
    Hit(Option<String>),
}

pub struct LicenseCache {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, Option<String>>>,
}

impl LicenseCache {
    /// Load the cache from `path`, starting empty if the file is missing or unreadable.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let entries: BTreeMap<String, Option<String>> = match tokio::fs::read_to_string(&path).await {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Ignoring corrupt license cache");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No existing cache found, starting fresh");
                BTreeMap::new()
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Could not read license cache");
                BTreeMap::new()
            }
        };

        tracing::debug!(entries = entries.len(), "License cache loaded");

        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get(&self, key: &str) -> CacheLookup {
        match self.entries.lock().await.get(key) {
            Some(value) => CacheLookup::Hit(value.clone()),
            None => CacheLookup::Miss,
        }
    }

    /// Record an outcome and flush the whole cache to disk.
    ///
    /// Write failures are logged and otherwise ignored.
    pub async fn insert(&self, key: &str, license_url: Option<String>) {
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), license_url);

        // The lock is held across the write so flushes land in mutation order.
        if let Err(e) = write_entries(&self.path, &entries).await {
            tracing::error!(path = %self.path.display(), error = %e, "Error saving cache");
        }
    }

    /// Flush the current contents to disk.
    pub async fn flush(&self) -> Result<()> {
        let entries = self.entries.lock().await;
        write_entries(&self.path, &entries).await
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

async fn write_entries(path: &Path, entries: &BTreeMap<String, Option<String>>) -> Result<()> {
    let data = serde_json::to_string_pretty(entries)?;

    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, data)
        .await
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("Failed to replace {}", path.display()))?;

    Ok(())
}
