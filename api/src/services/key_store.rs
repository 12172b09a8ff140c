//! Key Persistence
//!
//! Keys are expensive to generate and must survive restarts: a verifying key
//! handed to third parties is useless if the service later proves under a
//! different one. Stores only move bytes (codec layout); decoding and
//! fingerprint checks belong to the key cache.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use zk_credential_circuits::CircuitKind;

use crate::error::ServiceError;

/// Encoded key pair of one circuit kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredKeys {
    pub proving_key: Vec<u8>,
    pub verifying_key: Vec<u8>,
}

/// Blocking persistence back-end. Called from worker threads only.
pub trait KeyStore: Send + Sync {
    /// `Ok(None)` when nothing (or only half a pair) is stored for `kind`
    fn load(&self, kind: CircuitKind) -> Result<Option<StoredKeys>, ServiceError>;

    fn save(&self, kind: CircuitKind, keys: &StoredKeys) -> Result<(), ServiceError>;
}

/// Process-lifetime store, for tests and deployments without `KEY_DIR`.
#[derive(Debug, Default)]
pub struct MemoryKeyStore {
    entries: Mutex<HashMap<CircuitKind, StoredKeys>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyStore for MemoryKeyStore {
    fn load(&self, kind: CircuitKind) -> Result<Option<StoredKeys>, ServiceError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| ServiceError::Storage("key store lock poisoned".to_string()))?;
        Ok(entries.get(&kind).cloned())
    }

    fn save(&self, kind: CircuitKind, keys: &StoredKeys) -> Result<(), ServiceError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| ServiceError::Storage("key store lock poisoned".to_string()))?;
        entries.insert(kind, keys.clone());
        Ok(())
    }
}

/// One `<kind>.pk` / `<kind>.vk` file pair per circuit kind under `dir`.
#[derive(Debug, Clone)]
pub struct FsKeyStore {
    dir: PathBuf,
}

impl FsKeyStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, kind: CircuitKind, extension: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", kind.as_str(), extension))
    }
}

impl KeyStore for FsKeyStore {
    fn load(&self, kind: CircuitKind) -> Result<Option<StoredKeys>, ServiceError> {
        let proving_key = read_optional(&self.path(kind, "pk"))?;
        let verifying_key = read_optional(&self.path(kind, "vk"))?;

        match (proving_key, verifying_key) {
            (Some(proving_key), Some(verifying_key)) => Ok(Some(StoredKeys {
                proving_key,
                verifying_key,
            })),
            (None, None) => Ok(None),
            _ => {
                tracing::warn!(circuit = %kind, dir = %self.dir.display(), "Incomplete key pair on disk, ignoring");
                Ok(None)
            }
        }
    }

    fn save(&self, kind: CircuitKind, keys: &StoredKeys) -> Result<(), ServiceError> {
        fs::create_dir_all(&self.dir)?;
        // Proving key first: a reader that sees the new vk also sees the new pk
        write_atomic(&self.path(kind, "pk"), &keys.proving_key)?;
        write_atomic(&self.path(kind, "vk"), &keys.verifying_key)?;
        Ok(())
    }
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, ServiceError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ServiceError::Storage(format!("{}: {}", path.display(), e))),
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ServiceError> {
    let staging = path.with_extension("tmp");
    fs::write(&staging, bytes)
        .and_then(|_| fs::rename(&staging, path))
        .map_err(|e| ServiceError::Storage(format!("{}: {}", path.display(), e)))
}
