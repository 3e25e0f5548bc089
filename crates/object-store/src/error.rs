//! Error types for replica storage and transfers.

use std::path::PathBuf;

/// Errors from a single store operation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The object does not exist
    #[error("object not found: {container}/{key}")]
    NotFound { container: String, key: String },

    /// A create-only write found an existing object
    #[error("object already exists: {container}/{key}")]
    AlreadyExists { container: String, key: String },

    /// A write declared a length that does not match its content
    #[error("length mismatch for {container}/{key}: declared {declared}, content is {actual} bytes")]
    LengthMismatch {
        container: String,
        key: String,
        declared: u64,
        actual: u64,
    },

    /// Object storage error
    #[error("object storage error: {0}")]
    Backend(#[from] object_store::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// S3 bucket not found - must be created before use
    #[error("S3 bucket '{0}' does not exist. Create it before replicating to it.")]
    BucketNotFound(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Errors reported by the transfer engine.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// Container or key is empty
    #[error("invalid object address '{container}/{key}'")]
    InvalidAddress { container: String, key: String },

    /// The local bag could not be read; nothing was sent
    #[error("cannot read local bag {path}: {source}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Every permitted write attempt failed
    #[error("upload of {container}/{key} failed after {attempts} attempt(s): {last}")]
    Exhausted {
        container: String,
        key: String,
        attempts: u32,
        #[source]
        last: StoreError,
    },

    /// Shutdown was requested before the next attempt
    #[error("upload of {container}/{key} cancelled after {attempts} attempt(s)")]
    Cancelled {
        container: String,
        key: String,
        attempts: u32,
    },

    /// Download target does not exist
    #[error("object not found: {container}/{key}")]
    NotFound { container: String, key: String },

    /// Downloaded content does not match the checksum recorded at upload
    #[error("checksum mismatch for {container}/{key}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        container: String,
        key: String,
        expected: String,
        actual: String,
    },

    /// Store error outside the retried write path
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl TransferError {
    /// Number of write attempts made, when the error came out of the upload loop.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            TransferError::Exhausted { attempts, .. }
            | TransferError::Cancelled { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }
}

/// Transfer failures surface to schedulers as I/O errors.
impl From<TransferError> for std::io::Error {
    fn from(err: TransferError) -> Self {
        let kind = match &err {
            TransferError::InvalidAddress { .. } => std::io::ErrorKind::InvalidInput,
            TransferError::SourceUnreadable { source, .. } => source.kind(),
            TransferError::NotFound { .. } => std::io::ErrorKind::NotFound,
            TransferError::ChecksumMismatch { .. } => std::io::ErrorKind::InvalidData,
            TransferError::Cancelled { .. } => std::io::ErrorKind::Interrupted,
            TransferError::Exhausted { .. } | TransferError::Store(_) => std::io::ErrorKind::Other,
        };
        std::io::Error::new(kind, err)
    }
}
