use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use snafu::ResultExt;

use super::KeyValueStore;
use super::atomic::write_json_atomically;
use super::error::{LockPoisonedSnafu, ReadDocumentSnafu, StorageResult};

type ProfileDocument = BTreeMap<String, String>;

/// Profile store persisted as a single JSON object on disk.
///
/// The whole document is held in memory and rewritten through a temporary
/// file on every mutation, so readers never observe a half-written profile.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    document: Mutex<ProfileDocument>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let document = Self::read_document(&path)?;
        tracing::debug!(path = ?path, entries = document.len(), "opened profile store");

        Ok(Self {
            path,
            document: Mutex::new(document),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(path: &Path) -> StorageResult<ProfileDocument> {
        if !path.exists() {
            return Ok(ProfileDocument::new());
        }

        let content = std::fs::read_to_string(path).context(ReadDocumentSnafu {
            stage: "read-profile-document",
            path: path.to_path_buf(),
        })?;
        if content.trim().is_empty() {
            return Ok(ProfileDocument::new());
        }

        match serde_json::from_str::<ProfileDocument>(&content) {
            Ok(document) => Ok(document),
            Err(error) => {
                tracing::warn!(
                    "discarding malformed profile document at {:?}: {}",
                    path,
                    error
                );
                Ok(ProfileDocument::new())
            }
        }
    }

    fn persist(&self, document: &ProfileDocument) -> StorageResult<()> {
        write_json_atomically(&self.path, document)
    }

    fn mutate(
        &self,
        stage: &'static str,
        apply: impl FnOnce(&mut ProfileDocument),
    ) -> StorageResult<()> {
        let mut document = self
            .document
            .lock()
            .map_err(|_| LockPoisonedSnafu { stage }.build())?;

        // Stage the change on a copy so a failed write leaves memory and disk in agreement.
        let mut next = document.clone();
        apply(&mut next);
        self.persist(&next)?;
        *document = next;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let document = self.document.lock().map_err(|_| {
            LockPoisonedSnafu {
                stage: "file-store-get",
            }
            .build()
        })?;
        Ok(document.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.mutate("file-store-set", |document| {
            document.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.mutate("file-store-remove", |document| {
            document.remove(key);
        })
    }
}
