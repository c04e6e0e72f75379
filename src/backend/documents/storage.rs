/**
 * Document Storage Adapter
 *
 * Document bytes live outside the database behind the `DocumentStorage`
 * capability. Each version is stored under its own key
 * (`{document_key}_{version}`), so writes never overwrite an existing blob.
 *
 * # Implementations
 *
 * - `LocalStorage` - files under a base directory (tokio::fs)
 * - `MemoryStorage` - an in-process map, used by tests
 * - `ObjectStorage` - placeholder for a bucket backend; every call fails
 */

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

/// Storage key for one version of a document lineage
pub fn version_key(document_key: &str, version: i64) -> String {
    format!("{document_key}_{version}")
}

/// Put/get/delete bytes by key
///
/// `put` returns the locator to persist on the document row; `get` and
/// `delete` take that locator back. Deleting a missing locator is a no-op.
#[async_trait]
pub trait DocumentStorage: Send + Sync {
    /// Store bytes under a fresh key
    ///
    /// # Errors
    /// `AlreadyExists` if the key is taken
    async fn put(&self, key: &str, bytes: Bytes) -> io::Result<String>;

    async fn get(&self, locator: &str) -> io::Result<Bytes>;

    async fn delete(&self, locator: &str) -> io::Result<()>;
}

/// Files under a base directory, one file per locator
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Resolve a locator to a path, refusing anything that could escape the base
    fn resolve(&self, locator: &str) -> io::Result<PathBuf> {
        let valid = !locator.is_empty()
            && locator
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid storage key '{locator}'"),
            ));
        }
        Ok(self.base_path.join(locator))
    }
}

#[async_trait]
impl DocumentStorage for LocalStorage {
    async fn put(&self, key: &str, bytes: Bytes) -> io::Result<String> {
        let path = self.resolve(key)?;
        fs::create_dir_all(&self.base_path).await?;

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        let written = match file.write_all(&bytes).await {
            Ok(()) => file.sync_all().await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            drop(file);
            if let Err(cleanup) = fs::remove_file(&path).await {
                tracing::warn!("Failed to remove partial file {}: {}", path.display(), cleanup);
            }
            return Err(e);
        }

        tracing::debug!("Stored {} bytes at {}", bytes.len(), path.display());
        Ok(key.to_string())
    }

    async fn get(&self, locator: &str) -> io::Result<Bytes> {
        let path = self.resolve(locator)?;
        Ok(Bytes::from(fs::read(path).await?))
    }

    async fn delete(&self, locator: &str) -> io::Result<()> {
        let path = self.resolve(locator)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// In-process storage
#[derive(Default)]
pub struct MemoryStorage {
    blobs: RwLock<HashMap<String, Bytes>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, locator: &str) -> bool {
        self.blobs.read().await.contains_key(locator)
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait]
impl DocumentStorage for MemoryStorage {
    async fn put(&self, key: &str, bytes: Bytes) -> io::Result<String> {
        let mut blobs = self.blobs.write().await;
        if blobs.contains_key(key) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("storage key '{key}' already exists"),
            ));
        }
        blobs.insert(key.to_string(), bytes);
        Ok(key.to_string())
    }

    async fn get(&self, locator: &str) -> io::Result<Bytes> {
        self.blobs.read().await.get(locator).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no blob at '{locator}'"))
        })
    }

    async fn delete(&self, locator: &str) -> io::Result<()> {
        self.blobs.write().await.remove(locator);
        Ok(())
    }
}

/// Object storage backend
///
/// Not wired to a provider yet; selecting it makes every storage call fail.
pub struct ObjectStorage {
    bucket: String,
}

impl ObjectStorage {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
        }
    }

    fn unsupported(&self) -> io::Error {
        io::Error::new(
            io::ErrorKind::Unsupported,
            format!("object storage is not configured (bucket '{}')", self.bucket),
        )
    }
}

#[async_trait]
impl DocumentStorage for ObjectStorage {
    async fn put(&self, _key: &str, _bytes: Bytes) -> io::Result<String> {
        Err(self.unsupported())
    }

    async fn get(&self, _locator: &str) -> io::Result<Bytes> {
        Err(self.unsupported())
    }

    async fn delete(&self, _locator: &str) -> io::Result<()> {
        Err(self.unsupported())
    }
}
