//! services/client/src/adapters/storage.rs
//!
//! File-backed implementation of the `StorageService` port. Each key is one JSON
//! document under the data directory.

use async_trait::async_trait;
use orbit_core::ports::{PortError, PortResult, StorageService};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Keys the client writes. `clear` removes exactly these.
pub const SESSION_KEY: &str = "session";
pub const PROFILE_KEY: &str = "profile";
pub const GAMIFICATION_KEY: &str = "gamification";
pub const KNOWN_KEYS: [&str; 3] = [SESSION_KEY, PROFILE_KEY, GAMIFICATION_KEY];

#[derive(Clone, Debug)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PortResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(PortError::Storage(format!("invalid storage key '{}'", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

fn storage_error(action: &str, path: &Path, err: std::io::Error) -> PortError {
    PortError::Storage(format!("failed to {} {}: {}", action, path.display(), err))
}

#[async_trait]
impl StorageService for FileStorage {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error("read", &path, e)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| storage_error("create", &self.dir, e))?;

        // Write beside the target, then rename over it.
        let tmp = self.dir.join(format!(".{}.{}.tmp", key, Uuid::new_v4()));
        if let Err(e) = tokio::fs::write(&tmp, value).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(storage_error("write", &tmp, e));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(storage_error("replace", &path, e));
        }
        debug!("Stored '{}' ({} bytes)", key, value.len());
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error("remove", &path, e)),
        }
    }

    async fn clear(&self) -> PortResult<()> {
        for key in KNOWN_KEYS {
            self.remove(key).await?;
        }
        Ok(())
    }
}
