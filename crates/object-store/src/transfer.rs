//! Bag transfer engine.
//!
//! An upload checks whether the key already exists, then writes the whole
//! bag with create or overwrite semantics, retrying failed writes up to
//! the configured bound. The local bag is removed only after a write is
//! confirmed. Attempts for one key are strictly sequential.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use tokio::sync::watch;

use crate::error::{StoreError, TransferError};
use crate::retry::RetryConfig;
use crate::store::{checksum, ContentId, ObjectContent, ObjectWrite, ReplicaStore, WriteMode};

/// One bag to push.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub container: String,
    pub key: String,
    /// Local bag file; removed after a confirmed write.
    pub path: PathBuf,
    pub media_type: String,
}

/// Outcome of a committed upload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadReceipt {
    pub container: String,
    pub key: String,
    pub content_id: String,
    /// Mode of the write that succeeded.
    pub mode: String,
    pub attempts: u32,
    pub length: u64,
    pub checksum: String,
    /// False when the local bag could not be deleted.
    pub source_removed: bool,
}

/// Pushes and pulls bags through a [`ReplicaStore`].
///
/// The engine holds no per-key lock. Callers serialize uploads to the same
/// key; different keys may run concurrently on clones of one engine.
#[derive(Debug, Clone)]
pub struct TransferEngine {
    store: Arc<dyn ReplicaStore>,
    retry: RetryConfig,
    shutdown: Option<watch::Receiver<bool>>,
}

impl TransferEngine {
    pub fn new(store: Arc<dyn ReplicaStore>, retry: RetryConfig) -> Self {
        Self {
            store,
            retry,
            shutdown: None,
        }
    }

    /// Stop retrying once `shutdown` turns true.
    ///
    /// An attempt already in flight always runs to completion.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Upload one bag file and delete it once the store confirms the write.
    ///
    /// On failure the local file is left in place.
    pub async fn upload(&self, request: UploadRequest) -> Result<UploadReceipt, TransferError> {
        let UploadRequest {
            container,
            key,
            path,
            media_type,
        } = request;
        validate_address(&container, &key)?;

        let content = match tokio::fs::read(&path).await {
            Ok(data) => Bytes::from(data),
            Err(source) => return Err(TransferError::SourceUnreadable { path, source }),
        };
        let length = content.len() as u64;
        let checksum = checksum(&content);

        let mut mode = self.initial_mode(&container, &key).await;
        let max_attempts = self.retry.max_attempts();
        let mut shutdown = self.shutdown.clone();
        let mut attempts = 0u32;

        let last = loop {
            if attempts > 0 {
                let delay = self.retry.delay(attempts);
                if is_cancelled(&shutdown) || !backoff(delay, &mut shutdown).await {
                    tracing::info!(container = %container, key = %key, attempts, "upload cancelled");
                    return Err(TransferError::Cancelled {
                        container,
                        key,
                        attempts,
                    });
                }
            }

            attempts += 1;
            tracing::debug!(container = %container, key = %key, attempt = attempts, %mode, "writing bag");

            let write = ObjectWrite {
                container: container.clone(),
                key: key.clone(),
                content: content.clone(),
                length,
                media_type: media_type.clone(),
                checksum: checksum.clone(),
                mode,
            };

            match self.store.write(write).await {
                Ok(ContentId(content_id)) => {
                    let source_removed = match tokio::fs::remove_file(&path).await {
                        Ok(()) => true,
                        Err(e) => {
                            tracing::warn!(path = %path.display(), error = %e, "failed to remove local bag after upload");
                            false
                        }
                    };
                    tracing::info!(
                        container = %container,
                        key = %key,
                        attempts,
                        %mode,
                        length,
                        "bag committed"
                    );
                    return Ok(UploadReceipt {
                        container,
                        key,
                        content_id,
                        mode: mode.to_string(),
                        attempts,
                        length,
                        checksum,
                        source_removed,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        container = %container,
                        key = %key,
                        attempt = attempts,
                        max_attempts,
                        error = %e,
                        "bag write failed"
                    );
                    if matches!(e, StoreError::AlreadyExists { .. }) {
                        mode = WriteMode::Overwrite;
                    }
                    if attempts >= max_attempts {
                        break e;
                    }
                }
            }
        };

        Err(TransferError::Exhausted {
            container,
            key,
            attempts,
            last,
        })
    }

    /// Fetch one bag. A single attempt; no retry.
    ///
    /// When the store recorded a checksum at upload, the content is verified
    /// against it.
    pub async fn download(&self, container: &str, key: &str) -> Result<ObjectContent, TransferError> {
        validate_address(container, key)?;

        let content = match self.store.read(container, key).await {
            Ok(content) => content,
            Err(StoreError::NotFound { .. }) => {
                return Err(TransferError::NotFound {
                    container: container.to_string(),
                    key: key.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(expected) = &content.properties.checksum {
            let actual = checksum(&content.data);
            if !expected.eq_ignore_ascii_case(&actual) {
                return Err(TransferError::ChecksumMismatch {
                    container: container.to_string(),
                    key: key.to_string(),
                    expected: expected.clone(),
                    actual,
                });
            }
        }

        tracing::debug!(container, key, length = content.data.len(), "bag downloaded");
        Ok(content)
    }

    /// CheckExisting: overwrite what exists, create what does not, and
    /// optimistically create when existence cannot be determined.
    async fn initial_mode(&self, container: &str, key: &str) -> WriteMode {
        match self.store.properties(container, key).await {
            Ok(props) => {
                tracing::debug!(container, key, length = props.length, "object exists, overwriting");
                WriteMode::Overwrite
            }
            Err(StoreError::NotFound { .. }) => {
                tracing::debug!(container, key, "object not found, creating");
                WriteMode::Create
            }
            Err(e) => {
                tracing::warn!(container, key, error = %e, "existence check failed, attempting create");
                WriteMode::Create
            }
        }
    }
}

fn validate_address(container: &str, key: &str) -> Result<(), TransferError> {
    if container.is_empty() || key.is_empty() {
        return Err(TransferError::InvalidAddress {
            container: container.to_string(),
            key: key.to_string(),
        });
    }
    Ok(())
}

fn is_cancelled(shutdown: &Option<watch::Receiver<bool>>) -> bool {
    shutdown.as_ref().is_some_and(|rx| *rx.borrow())
}

/// Sleep for `delay`. Returns false if shutdown was signalled first.
async fn backoff(delay: Duration, shutdown: &mut Option<watch::Receiver<bool>>) -> bool {
    match shutdown {
        Some(rx) => {
            tokio::select! {
                _ = tokio::time::sleep(delay) => true,
                Ok(_) = rx.wait_for(|stop| *stop) => false,
            }
        }
        None => {
            tokio::time::sleep(delay).await;
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ObjectStoreReplica;

    #[tokio::test]
    async fn test_rejects_empty_address() {
        let engine = TransferEngine::new(Arc::new(ObjectStoreReplica::memory()), RetryConfig::default());
        let err = engine
            .upload(UploadRequest {
                container: String::new(),
                key: "item-1".into(),
                path: PathBuf::from("/nonexistent"),
                media_type: "application/zip".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::InvalidAddress { .. }));

        let err = engine.download("group-1", "").await.unwrap_err();
        assert!(matches!(err, TransferError::InvalidAddress { .. }));
    }

    #[tokio::test]
    async fn test_missing_source_is_not_retried() {
        let engine = TransferEngine::new(Arc::new(ObjectStoreReplica::memory()), RetryConfig::immediate(5));
        let err = engine
            .upload(UploadRequest {
                container: "group-1".into(),
                key: "item-1".into(),
                path: PathBuf::from("/nonexistent/bag.zip"),
                media_type: "application/zip".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::SourceUnreadable { .. }));
        assert_eq!(err.attempts(), None);
    }
}
