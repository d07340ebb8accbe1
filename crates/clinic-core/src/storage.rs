//! Object storage for attachments.
//!
//! The store is key-based: callers put bytes under a key, persist the key
//! alongside the metadata, and delete by key later.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::models::AttachmentOwner;

/// Object storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Key-based object store.
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `key` and return the key the object is reachable at.
    fn put_object(&self, key: &str, bytes: &[u8], content_type: &str) -> StorageResult<String>;

    /// Remove the object. Deleting a missing key is not an error.
    fn delete_object(&self, key: &str) -> StorageResult<()>;
}

/// Build a storage key: `<owner>/<parent_id>/<digest prefix>-<file name>`.
///
/// The digest prefix keeps two uploads of the same file name apart.
pub fn attachment_key(owner: AttachmentOwner, parent_id: &str, file_name: &str, bytes: &[u8]) -> String {
    let digest = hex::encode(Sha256::digest(bytes));
    let prefix = match owner {
        AttachmentOwner::Event => "events",
        AttachmentOwner::Invoice => "invoices",
    };
    format!(
        "{}/{}/{}-{}",
        prefix,
        parent_id,
        &digest[..16],
        sanitize_file_name(file_name)
    )
}

fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_matches('.');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Object store rooted at a local directory.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> StorageResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> StorageResult<PathBuf> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl ObjectStore for FsObjectStore {
    fn put_object(&self, key: &str, bytes: &[u8], _content_type: &str) -> StorageResult<String> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        Ok(key.to_string())
    }

    fn delete_object(&self, key: &str) -> StorageResult<()> {
        let path = self.resolve(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory object store (for testing and ephemeral sessions).
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects
            .lock()
            .map(|objects| objects.contains_key(key))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.objects.lock().map(|objects| objects.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ObjectStore for MemoryObjectStore {
    fn put_object(&self, key: &str, bytes: &[u8], _content_type: &str) -> StorageResult<String> {
        let mut objects = self
            .objects
            .lock()
            .map_err(|e| StorageError::Backend(format!("Lock poisoned: {}", e)))?;
        objects.insert(key.to_string(), bytes.to_vec());
        Ok(key.to_string())
    }

    fn delete_object(&self, key: &str) -> StorageResult<()> {
        let mut objects = self
            .objects
            .lock()
            .map_err(|e| StorageError::Backend(format!("Lock poisoned: {}", e)))?;
        objects.remove(key);
        Ok(())
    }
}
