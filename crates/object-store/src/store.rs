//! The replica store capability.
//!
//! [`ReplicaStore`] is the whole contract the transfer engine needs from a
//! backend: look up an object's properties, write an object, read an object.
//! Objects are addressed by a logical container and a content key.

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::error::StoreError;

/// Algorithm used for [`ObjectWrite::checksum`].
pub const CHECKSUM_ALGORITHM: &str = "SHA-256";

/// Hex-encoded SHA-256 of `data`.
pub fn checksum(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Whether a write creates a new object or replaces an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteMode {
    /// The object is not expected to exist.
    Create,
    /// The object exists and is replaced in place.
    Overwrite,
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteMode::Create => write!(f, "create"),
            WriteMode::Overwrite => write!(f, "overwrite"),
        }
    }
}

/// Properties of a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectProperties {
    pub length: u64,
    pub last_modified: DateTime<Utc>,
    pub e_tag: Option<String>,
    pub media_type: Option<String>,
    /// Hex SHA-256 recorded at write time, when the backend keeps it.
    pub checksum: Option<String>,
}

/// Identifier the backend assigned to a written object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentId(pub String);

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One complete object write.
#[derive(Debug, Clone)]
pub struct ObjectWrite {
    pub container: String,
    pub key: String,
    pub content: Bytes,
    pub length: u64,
    pub media_type: String,
    pub checksum: String,
    pub mode: WriteMode,
}

/// An object's content together with its properties.
#[derive(Debug, Clone)]
pub struct ObjectContent {
    pub data: Bytes,
    pub properties: ObjectProperties,
}

/// Minimal backend contract for replica storage.
///
/// Every call is a single attempt; retrying is the caller's business.
/// Implementations report a missing object as [`StoreError::NotFound`].
#[async_trait]
pub trait ReplicaStore: Send + Sync + fmt::Debug {
    /// Properties of `container/key`.
    async fn properties(&self, container: &str, key: &str) -> Result<ObjectProperties, StoreError>;

    /// Write the full content of one object.
    ///
    /// A [`WriteMode::Create`] write may fail with
    /// [`StoreError::AlreadyExists`] on backends with conditional puts.
    async fn write(&self, write: ObjectWrite) -> Result<ContentId, StoreError>;

    /// Read the full content of `container/key`.
    async fn read(&self, container: &str, key: &str) -> Result<ObjectContent, StoreError>;
}
