//! Object storage backend abstraction (S3/MinIO/local filesystem/memory).

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{
    Attribute, AttributeValue, Attributes, GetOptions, ObjectStore, PutMode, PutOptions,
    PutPayload,
};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::store::{ContentId, ObjectContent, ObjectProperties, ObjectWrite, ReplicaStore, WriteMode};

/// User metadata key under which the content checksum is stored.
const CHECKSUM_METADATA_KEY: &str = "sha256";

/// Configuration for the object storage backend.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectStoreConfig {
    /// In-memory storage (for testing)
    #[default]
    Memory,

    /// Local filesystem storage
    Local {
        /// Path to the storage directory
        path: PathBuf,
    },

    /// S3-compatible storage (AWS S3, MinIO, etc.)
    S3 {
        /// S3 endpoint URL (e.g., "http://localhost:9000" for MinIO)
        endpoint: String,
        /// Access key ID
        access_key: String,
        /// Secret access key
        secret_key: String,
        /// Bucket name
        bucket: String,
        /// Optional region (defaults to "us-east-1")
        region: Option<String>,
    },
}

/// What a backend can do beyond plain puts and gets.
#[derive(Debug, Clone, Copy)]
struct Features {
    /// Content type and user metadata travel with the object.
    attributes: bool,
    /// `PutMode::Create` is honored.
    conditional_create: bool,
}

/// [`ReplicaStore`] over any `object_store` backend.
///
/// Objects live at `<container>/<key>`.
#[derive(Debug, Clone)]
pub struct ObjectStoreReplica {
    inner: Arc<dyn ObjectStore>,
    features: Features,
}

impl ObjectStoreReplica {
    /// Create a new storage backend from configuration.
    pub async fn new(config: ObjectStoreConfig) -> Result<Self, StoreError> {
        let storage = match &config {
            ObjectStoreConfig::Memory => Self::memory(),

            ObjectStoreConfig::Local { path } => {
                // Ensure directory exists
                tokio::fs::create_dir_all(path).await?;
                Self {
                    inner: Arc::new(
                        LocalFileSystem::new_with_prefix(path)
                            .map_err(|e| StoreError::InvalidConfig(e.to_string()))?,
                    ),
                    features: Features {
                        attributes: false,
                        conditional_create: true,
                    },
                }
            }

            ObjectStoreConfig::S3 {
                endpoint,
                access_key,
                secret_key,
                bucket,
                region,
            } => {
                let builder = AmazonS3Builder::new()
                    .with_endpoint(endpoint)
                    .with_access_key_id(access_key)
                    .with_secret_access_key(secret_key)
                    .with_bucket_name(bucket)
                    .with_region(region.as_deref().unwrap_or("us-east-1"))
                    .with_allow_http(endpoint.starts_with("http://"));

                let store: Arc<dyn ObjectStore> = Arc::new(
                    builder
                        .build()
                        .map_err(|e| StoreError::InvalidConfig(e.to_string()))?,
                );

                // Verify bucket exists by listing (empty prefix)
                // This will fail fast if the bucket doesn't exist
                {
                    use futures::TryStreamExt;
                    let prefix = ObjectPath::from("");
                    let mut stream = store.list(Some(&prefix));
                    match stream.try_next().await {
                        Ok(_) => {}
                        Err(object_store::Error::NotFound { .. }) => {
                            return Err(StoreError::BucketNotFound(bucket.clone()));
                        }
                        Err(e) => {
                            let msg = e.to_string();
                            if msg.contains("NoSuchBucket")
                                || msg.contains("bucket") && msg.contains("not")
                            {
                                return Err(StoreError::BucketNotFound(bucket.clone()));
                            }
                            return Err(e.into());
                        }
                    }
                }

                // S3 only honors create-if-absent when conditional puts are
                // configured, so creates go out as plain puts.
                Self {
                    inner: store,
                    features: Features {
                        attributes: true,
                        conditional_create: false,
                    },
                }
            }
        };

        tracing::debug!(?config, "replica storage ready");
        Ok(storage)
    }

    /// Create an in-memory storage backend.
    pub fn memory() -> Self {
        Self {
            inner: Arc::new(InMemory::new()),
            features: Features {
                attributes: true,
                conditional_create: true,
            },
        }
    }

    /// Build the object path for a content key.
    fn object_path(container: &str, key: &str) -> ObjectPath {
        ObjectPath::from_iter([container, key])
    }

    fn map_error(err: object_store::Error, container: &str, key: &str) -> StoreError {
        match err {
            object_store::Error::NotFound { .. } => StoreError::NotFound {
                container: container.to_string(),
                key: key.to_string(),
            },
            object_store::Error::AlreadyExists { .. } => StoreError::AlreadyExists {
                container: container.to_string(),
                key: key.to_string(),
            },
            e => StoreError::Backend(e),
        }
    }

    fn properties_from(meta: &object_store::ObjectMeta, attributes: &Attributes) -> ObjectProperties {
        let text = |attr: &Attribute| -> Option<String> {
            attributes.get(attr).map(|v: &AttributeValue| {
                let s: &str = v.as_ref();
                s.to_string()
            })
        };
        ObjectProperties {
            length: meta.size as u64,
            last_modified: meta.last_modified,
            e_tag: meta.e_tag.clone(),
            media_type: text(&Attribute::ContentType),
            checksum: text(&Attribute::Metadata(CHECKSUM_METADATA_KEY.into())),
        }
    }
}

#[async_trait]
impl ReplicaStore for ObjectStoreReplica {
    async fn properties(&self, container: &str, key: &str) -> Result<ObjectProperties, StoreError> {
        let path = Self::object_path(container, key);
        let options = GetOptions {
            head: true,
            ..Default::default()
        };
        let result = self
            .inner
            .get_opts(&path, options)
            .await
            .map_err(|e| Self::map_error(e, container, key))?;
        Ok(Self::properties_from(&result.meta, &result.attributes))
    }

    async fn write(&self, write: ObjectWrite) -> Result<ContentId, StoreError> {
        let actual = write.content.len() as u64;
        if write.length != actual {
            return Err(StoreError::LengthMismatch {
                container: write.container,
                key: write.key,
                declared: write.length,
                actual,
            });
        }
        let path = Self::object_path(&write.container, &write.key);

        let mode = match write.mode {
            WriteMode::Create if self.features.conditional_create => PutMode::Create,
            _ => PutMode::Overwrite,
        };

        let mut attributes = Attributes::new();
        if self.features.attributes {
            attributes.insert(Attribute::ContentType, write.media_type.clone().into());
            attributes.insert(
                Attribute::Metadata(CHECKSUM_METADATA_KEY.into()),
                write.checksum.clone().into(),
            );
        }

        let options = PutOptions {
            mode,
            attributes,
            ..Default::default()
        };
        let result = self
            .inner
            .put_opts(&path, PutPayload::from(write.content), options)
            .await
            .map_err(|e| Self::map_error(e, &write.container, &write.key))?;

        // Backends without an e-tag are addressed by the content checksum.
        Ok(ContentId(result.e_tag.unwrap_or(write.checksum)))
    }

    async fn read(&self, container: &str, key: &str) -> Result<ObjectContent, StoreError> {
        let path = Self::object_path(container, key);
        let result = self
            .inner
            .get(&path)
            .await
            .map_err(|e| Self::map_error(e, container, key))?;
        let properties = Self::properties_from(&result.meta, &result.attributes);
        let data = result
            .bytes()
            .await
            .map_err(|e| Self::map_error(e, container, key))?;
        Ok(ObjectContent { data, properties })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::checksum;
    use bytes::Bytes;

    fn object(container: &str, key: &str, data: &'static [u8], mode: WriteMode) -> ObjectWrite {
        ObjectWrite {
            container: container.to_string(),
            key: key.to_string(),
            content: Bytes::from_static(data),
            length: data.len() as u64,
            media_type: "application/zip".to_string(),
            checksum: checksum(data),
            mode,
        }
    }

    #[tokio::test]
    async fn test_memory_storage() {
        let storage = ObjectStoreReplica::memory();

        let err = storage.properties("group-1", "item-1").await.unwrap_err();
        assert!(err.is_not_found());

        storage
            .write(object("group-1", "item-1", b"hello world", WriteMode::Create))
            .await
            .unwrap();

        let props = storage.properties("group-1", "item-1").await.unwrap();
        assert_eq!(props.length, 11);
        assert_eq!(props.media_type.as_deref(), Some("application/zip"));
        assert_eq!(props.checksum, Some(checksum(b"hello world")));

        let content = storage.read("group-1", "item-1").await.unwrap();
        assert_eq!(content.data, Bytes::from_static(b"hello world"));
    }

    #[tokio::test]
    async fn test_create_conflicts_with_existing_object() {
        let storage = ObjectStoreReplica::memory();
        storage
            .write(object("c", "k", b"one", WriteMode::Create))
            .await
            .unwrap();

        let err = storage
            .write(object("c", "k", b"two", WriteMode::Create))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));

        storage
            .write(object("c", "k", b"two", WriteMode::Overwrite))
            .await
            .unwrap();
        let content = storage.read("c", "k").await.unwrap();
        assert_eq!(content.data, Bytes::from_static(b"two"));
    }

    #[tokio::test]
    async fn test_declared_length_must_match_content() {
        let storage = ObjectStoreReplica::memory();
        let mut write = object("c", "k", b"four", WriteMode::Create);
        write.length = 40;

        let err = storage.write(write).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::LengthMismatch {
                declared: 40,
                actual: 4,
                ..
            }
        ));
        assert!(storage.properties("c", "k").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_local_storage() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = ObjectStoreConfig::Local {
            path: temp_dir.path().to_path_buf(),
        };

        let storage = ObjectStoreReplica::new(config).await.unwrap();
        storage
            .write(object("group-2", "item-9", b"bag bytes", WriteMode::Create))
            .await
            .unwrap();

        // Verify file exists on disk
        let file_path = temp_dir.path().join("group-2").join("item-9");
        assert!(file_path.exists());

        let props = storage.properties("group-2", "item-9").await.unwrap();
        assert_eq!(props.length, 9);
        assert_eq!(props.checksum, None);

        let err = storage.read("group-2", "missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_config_from_toml() {
        let config: ObjectStoreConfig = toml::from_str(
            r#"
            type = "s3"
            endpoint = "http://localhost:9000"
            access_key = "minio"
            secret_key = "minio123"
            bucket = "replicas"
            "#,
        )
        .unwrap();
        assert!(matches!(config, ObjectStoreConfig::S3 { region: None, .. }));
    }
}
