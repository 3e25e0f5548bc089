//! Replica storage for archival bags
//!
//! This crate moves packaged bags between local disk and a remote replica
//! store. It provides:
//!
//! - [`ReplicaStore`], the minimal backend contract (properties, write, read)
//! - [`ObjectStoreReplica`], an implementation over S3, MinIO, the local
//!   filesystem or memory
//! - [`TransferEngine`], which uploads with bounded retry and removes the
//!   local bag only after a confirmed write
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use replica_object_store::{
//!     ObjectStoreConfig, ObjectStoreReplica, RetryConfig, TransferEngine, UploadRequest,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = ObjectStoreReplica::new(ObjectStoreConfig::Local {
//!     path: "/var/lib/replica".into(),
//! })
//! .await?;
//! let engine = TransferEngine::new(Arc::new(store), RetryConfig::default());
//!
//! let receipt = engine
//!     .upload(UploadRequest {
//!         container: "group-4".into(),
//!         key: "item-17".into(),
//!         path: "/tmp/item-17.zip".into(),
//!         media_type: "application/zip".into(),
//!     })
//!     .await?;
//! println!("stored as {} after {} attempt(s)", receipt.content_id, receipt.attempts);
//! # Ok(())
//! # }
//! ```

mod error;
mod retry;
mod storage;
mod store;
mod transfer;

pub use error::{StoreError, TransferError};
pub use retry::RetryConfig;
pub use storage::{ObjectStoreConfig, ObjectStoreReplica};
pub use store::{
    checksum, ContentId, ObjectContent, ObjectProperties, ObjectWrite, ReplicaStore, WriteMode,
    CHECKSUM_ALGORITHM,
};
pub use transfer::{TransferEngine, UploadReceipt, UploadRequest};
