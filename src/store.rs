//! Credential store - JSON file backed user registry

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::sync::RwLock;

use crate::models::UserRecord;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed credential store {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode credential store: {0}")]
    Encode(#[from] serde_json::Error),
}

/// In-memory username -> record mapping, rewritten to disk after every mutation.
///
/// Mutations hold the write lock until the file has been replaced, so
/// concurrent registrations and removals are applied one at a time.
pub struct CredentialStore {
    path: PathBuf,
    users: RwLock<BTreeMap<String, UserRecord>>,
}

impl CredentialStore {
    /// Load the store from its backing file. A missing file yields an empty store.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        let users = match tokio::fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str(&content).map_err(|source| StoreError::Malformed {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("Credential store {:?} not found, starting empty", path);
                BTreeMap::new()
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        tracing::info!("Loaded {} user(s) from {:?}", users.len(), path);

        Ok(Self {
            path,
            users: RwLock::new(users),
        })
    }

    /// Build a store from records already in memory (nothing is written until a mutation)
    pub fn from_records(path: impl Into<PathBuf>, records: impl IntoIterator<Item = UserRecord>) -> Self {
        let users = records
            .into_iter()
            .map(|record| (record.username.clone(), record))
            .collect();

        Self {
            path: path.into(),
            users: RwLock::new(users),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get(&self, username: &str) -> Option<UserRecord> {
        self.users.read().await.get(username).cloned()
    }

    pub async fn usernames(&self) -> Vec<String> {
        self.users.read().await.keys().cloned().collect()
    }

    /// Run `f` against a consistent view of every record
    pub async fn with_users<R>(&self, f: impl FnOnce(&BTreeMap<String, UserRecord>) -> R) -> R {
        let users = self.users.read().await;
        f(&users)
    }

    /// Insert or fully overwrite a record, then persist
    pub async fn register(&self, record: UserRecord) -> Result<(), StoreError> {
        let mut users = self.users.write().await;

        let mut updated = users.clone();
        updated.insert(record.username.clone(), record);
        self.persist(&updated).await?;

        *users = updated;
        Ok(())
    }

    /// Remove a record. Returns `false` (and writes nothing) when the user is unknown.
    pub async fn remove(&self, username: &str) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;

        if !users.contains_key(username) {
            return Ok(false);
        }

        let mut updated = users.clone();
        updated.remove(username);
        self.persist(&updated).await?;

        *users = updated;
        Ok(true)
    }

    /// Write to a sibling temp file, then rename over the store file
    async fn persist(&self, users: &BTreeMap<String, UserRecord>) -> Result<(), StoreError> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        users.serialize(&mut serializer)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::Io { path: parent.to_path_buf(), source })?;
        }

        let tmp_path = temp_path(&self.path);
        tokio::fs::write(&tmp_path, &buf)
            .await
            .map_err(|source| StoreError::Io { path: tmp_path.clone(), source })?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|source| StoreError::Io { path: self.path.clone(), source })?;

        tracing::debug!("Credential store written to {:?} ({} users)", self.path, users.len());
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
