//! Shared fixtures for transfer integration tests
#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use parking_lot::Mutex;
use replica_object_store::{
    ContentId, ObjectContent, ObjectProperties, ObjectWrite, ReplicaStore, StoreError, WriteMode,
};

/// What the scripted store answers to an existence check.
#[derive(Debug, Clone, Copy)]
pub enum Existing {
    Missing,
    Present,
    Broken,
}

/// Outcome of one scripted write.
#[derive(Debug, Clone, Copy)]
pub enum Outcome {
    Ok,
    Fail,
    AlreadyExists,
}

/// A [`ReplicaStore`] that answers from a script and records every write.
///
/// Writes beyond the end of the script succeed.
#[derive(Debug)]
pub struct ScriptedStore {
    existing: Existing,
    script: Mutex<VecDeque<Outcome>>,
    writes: Mutex<Vec<ObjectWrite>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    stored: Mutex<Option<ObjectContent>>,
    remove_on_write: Mutex<Option<PathBuf>>,
}

impl ScriptedStore {
    pub fn new(existing: Existing, script: impl IntoIterator<Item = Outcome>) -> Arc<Self> {
        Arc::new(Self {
            existing,
            script: Mutex::new(script.into_iter().collect()),
            writes: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            stored: Mutex::new(None),
            remove_on_write: Mutex::new(None),
        })
    }

    /// Delete `path` while serving the next write, so the caller's own
    /// cleanup finds nothing to remove.
    pub fn remove_during_write(&self, path: &Path) {
        *self.remove_on_write.lock() = Some(path.to_path_buf());
    }

    /// A store whose every write fails.
    pub fn failing(existing: Existing, attempts: usize) -> Arc<Self> {
        Self::new(existing, std::iter::repeat(Outcome::Fail).take(attempts))
    }

    /// A store holding one object for reads.
    pub fn holding(data: &'static [u8], checksum: Option<String>) -> Arc<Self> {
        let store = Self::new(Existing::Present, []);
        *store.stored.lock() = Some(ObjectContent {
            data: Bytes::from_static(data),
            properties: properties(data.len() as u64, checksum),
        });
        store
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().len()
    }

    pub fn modes(&self) -> Vec<WriteMode> {
        self.writes.lock().iter().map(|w| w.mode).collect()
    }

    pub fn writes(&self) -> Vec<ObjectWrite> {
        self.writes.lock().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

fn properties(length: u64, checksum: Option<String>) -> ObjectProperties {
    ObjectProperties {
        length,
        last_modified: Utc::now(),
        e_tag: None,
        media_type: Some("application/zip".into()),
        checksum,
    }
}

#[async_trait]
impl ReplicaStore for ScriptedStore {
    async fn properties(&self, container: &str, key: &str) -> Result<ObjectProperties, StoreError> {
        match self.existing {
            Existing::Missing => Err(StoreError::NotFound {
                container: container.into(),
                key: key.into(),
            }),
            Existing::Present => Ok(properties(1, None)),
            Existing::Broken => Err(StoreError::Io(std::io::Error::other("connection refused"))),
        }
    }

    async fn write(&self, write: ObjectWrite) -> Result<ContentId, StoreError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;

        let outcome = self.script.lock().pop_front().unwrap_or(Outcome::Ok);
        if let Some(path) = self.remove_on_write.lock().take() {
            std::fs::remove_file(path).unwrap();
        }
        let container = write.container.clone();
        let key = write.key.clone();
        let attempt = {
            let mut writes = self.writes.lock();
            writes.push(write);
            writes.len()
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match outcome {
            Outcome::Ok => Ok(ContentId(format!("etag-{attempt}"))),
            Outcome::Fail => Err(StoreError::Io(std::io::Error::other("503 service unavailable"))),
            Outcome::AlreadyExists => Err(StoreError::AlreadyExists { container, key }),
        }
    }

    async fn read(&self, container: &str, key: &str) -> Result<ObjectContent, StoreError> {
        self.stored.lock().clone().ok_or_else(|| StoreError::NotFound {
            container: container.into(),
            key: key.into(),
        })
    }
}

/// Write a bag file into `dir` and return its path.
pub fn bag_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}
