//! Object sink backends.
//!
//! A sink stores named binary objects. Partitioning only ever calls
//! [`ObjectSink::put`]; [`ObjectSink::get`] exists for reading objects back.
//!
//! # Available Backends
//!
//! - [`FileSystemSink`] - One file per object under a root directory
//! - [`MemorySink`] - In-process map, for tests and embedding

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::error::{SkyhookError, SkyhookResult};
use crate::partition::bucket_index::SegmentKey;

/// Durable named-blob storage.
///
/// Implementations must accept concurrent `put` calls for distinct names.
#[async_trait]
pub trait ObjectSink: Send + Sync {
    /// Store `payload` under `name`, replacing any previous payload.
    ///
    /// When this returns `Ok`, the whole payload is associated with the name.
    async fn put(&self, name: &str, payload: Vec<u8>) -> SkyhookResult<()>;

    /// Read back the payload stored under `name`
    async fn get(&self, name: &str) -> SkyhookResult<Vec<u8>>;

    /// Human-readable location of this sink, for logs
    fn location(&self) -> String;
}

/// Derives object names from segment keys
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectNaming {
    prefix: String,
}

impl Default for ObjectNaming {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_OBJECT_PREFIX)
    }
}

impl ObjectNaming {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// `<prefix><bucket id>` for live buckets, `<prefix>flush-<n>` for overflow segments
    pub fn segment_object(&self, key: &SegmentKey) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// `<prefix>col-<index>` for column partitions
    pub fn column_object(&self, column_index: usize) -> String {
        format!("{}col-{}", self.prefix, column_index)
    }
}

/// Filesystem-based object sink.
///
/// Each object is a file named after the object directly under `root`.
/// Writes go to a hidden temporary file first and are renamed into place
/// after `sync_all`, and the root directory is synced after the rename, so a
/// reader sees either the old or the new payload and a completed put
/// survives a crash.
pub struct FileSystemSink {
    root: PathBuf,
    temp_seq: AtomicU64,
}

impl FileSystemSink {
    /// Create a sink rooted at `root`; the directory is created on first write
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            temp_seq: AtomicU64::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory
    pub async fn initialize(&self) -> SkyhookResult<()> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    fn object_path(&self, name: &str) -> SkyhookResult<PathBuf> {
        if name.is_empty() || name.contains('/') || name.contains('\\') || name.starts_with('.') {
            return Err(SkyhookError::sink(name, "invalid object name"));
        }
        Ok(self.root.join(name))
    }

    fn temp_path(&self, name: &str) -> PathBuf {
        let seq = self.temp_seq.fetch_add(1, Ordering::Relaxed);
        self.root.join(format!(".{}.{}.tmp", name, seq))
    }

    async fn write_atomic(&self, name: &str, target: &Path, payload: &[u8]) -> std::io::Result<()> {
        fs::create_dir_all(&self.root).await?;

        let temp = self.temp_path(name);
        let result = async {
            let mut file = fs::File::create(&temp).await?;
            file.write_all(payload).await?;
            file.sync_all().await?;
            fs::rename(&temp, target).await?;
            sync_dir(&self.root).await
        }
        .await;

        if result.is_err() {
            let _ = fs::remove_file(&temp).await;
        }
        result
    }
}

/// Persist directory entries so a completed rename survives a crash
#[cfg(unix)]
async fn sync_dir(dir: &Path) -> std::io::Result<()> {
    fs::File::open(dir).await?.sync_all().await
}

#[cfg(not(unix))]
async fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

#[async_trait]
impl ObjectSink for FileSystemSink {
    async fn put(&self, name: &str, payload: Vec<u8>) -> SkyhookResult<()> {
        let target = self.object_path(name)?;
        self.write_atomic(name, &target, &payload)
            .await
            .map_err(|e| SkyhookError::sink(name, e))
    }

    async fn get(&self, name: &str) -> SkyhookResult<Vec<u8>> {
        let path = self.object_path(name)?;
        fs::read(&path)
            .await
            .map_err(|e| SkyhookError::sink(name, e))
    }

    fn location(&self) -> String {
        self.root.to_string_lossy().to_string()
    }
}

/// In-memory object sink
#[derive(Default)]
pub struct MemorySink {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored object names, sorted
    pub async fn object_names(&self) -> Vec<String> {
        let objects = self.objects.read().await;
        let mut names: Vec<String> = objects.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of stored objects
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectSink for MemorySink {
    async fn put(&self, name: &str, payload: Vec<u8>) -> SkyhookResult<()> {
        let mut objects = self.objects.write().await;
        objects.insert(name.to_string(), payload);
        Ok(())
    }

    async fn get(&self, name: &str) -> SkyhookResult<Vec<u8>> {
        let objects = self.objects.read().await;
        objects
            .get(name)
            .cloned()
            .ok_or_else(|| SkyhookError::sink(name, "object not found"))
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
