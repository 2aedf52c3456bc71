//! Persistence backends for the link store document
//!
//! The document is always read and written whole. Two backends are
//! provided: a local JSON file and a Cloudflare R2 / AWS S3 object.

use crate::config::{CoreSettings, StorageBackend};
use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use aws_types::region::Region;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Error retrieving object from S3
    #[error("S3 Get error: {0}")]
    S3Get(Box<SdkError<GetObjectError>>),
    /// Error putting object into S3
    #[error("S3 put error: {0}")]
    S3Put(String),
    /// Error during JSON serialization or deserialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Standard I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Configuration error (missing credentials, etc.)
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Whole-document persistence medium
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStorage: Send + Sync {
    /// Read the whole document. `Ok(None)` if it does not exist yet.
    async fn read_document(&self) -> Result<Option<Vec<u8>>, StorageError>;
    /// Replace the whole document.
    async fn write_document(&self, body: Vec<u8>) -> Result<(), StorageError>;
    /// Check that the medium is reachable
    async fn check_connection(&self) -> Result<(), String>;
}

/// Document stored as a JSON file on the local filesystem
pub struct LocalFileStorage {
    path: PathBuf,
}

impl LocalFileStorage {
    /// Create a file-backed storage for `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl DocumentStorage for LocalFileStorage {
    async fn read_document(&self) -> Result<Option<Vec<u8>>, StorageError> {
        match tokio::fs::read(&self.path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    /// Writes to a sibling temp file, then renames it over the document
    async fn write_document(&self, body: Vec<u8>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let temp_path = self.temp_path();
        tokio::fs::write(&temp_path, &body).await?;

        if let Err(e) = tokio::fs::rename(&temp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(StorageError::Io(e));
        }

        debug!(path = %self.path.display(), bytes = body.len(), "Link store written");
        Ok(())
    }

    async fn check_connection(&self) -> Result<(), String> {
        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => parent.to_path_buf(),
            None => PathBuf::from("."),
        };
        if tokio::fs::try_exists(&dir).await.unwrap_or(false) {
            info!("Local link store directory is available: {}", dir.display());
        } else {
            // Created on first write
            info!("Local link store directory will be created: {}", dir.display());
        }
        Ok(())
    }
}

/// Document stored as an object in Cloudflare R2 (S3 API)
pub struct R2Storage {
    client: Client,
    bucket: String,
    key: String,
}

impl R2Storage {
    /// Create a new R2 storage instance
    ///
    /// # Errors
    ///
    /// Returns an error if R2 configuration is missing.
    pub async fn new(settings: &CoreSettings) -> Result<Self, StorageError> {
        let endpoint_url = settings
            .r2_endpoint_url
            .as_ref()
            .ok_or_else(|| StorageError::Config("R2_ENDPOINT_URL is missing".into()))?;
        let access_key = settings
            .r2_access_key_id
            .as_ref()
            .ok_or_else(|| StorageError::Config("R2_ACCESS_KEY_ID is missing".into()))?;
        let secret_key = settings
            .r2_secret_access_key
            .as_ref()
            .ok_or_else(|| StorageError::Config("R2_SECRET_ACCESS_KEY is missing".into()))?;
        let bucket = settings
            .r2_bucket_name
            .as_ref()
            .ok_or_else(|| StorageError::Config("R2_BUCKET_NAME is missing".into()))?;

        let credentials = Credentials::new(access_key, secret_key, None, None, "r2-storage");

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new("auto"))
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .endpoint_url(endpoint_url)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(s3_config),
            bucket: bucket.clone(),
            key: settings.links_object_key.clone(),
        })
    }
}

#[async_trait]
impl DocumentStorage for R2Storage {
    async fn read_document(&self) -> Result<Option<Vec<u8>>, StorageError> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .send()
            .await;

        match result {
            Ok(output) => {
                let data = output
                    .body
                    .collect()
                    .await
                    .map_err(|e| StorageError::Io(std::io::Error::other(e)))?
                    .into_bytes();
                Ok(Some(data.to_vec()))
            }
            Err(SdkError::ServiceError(err)) if err.err().is_no_such_key() => Ok(None),
            Err(e) => Err(StorageError::S3Get(Box::new(e))),
        }
    }

    async fn write_document(&self, body: Vec<u8>) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .body(ByteStream::from(body))
            .content_type("application/json")
            .send()
            .await
            .map_err(|e| StorageError::S3Put(e.to_string()))?;

        Ok(())
    }

    async fn check_connection(&self) -> Result<(), String> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => {
                info!("Successfully connected to R2 storage.");
                Ok(())
            }
            Err(e) => {
                let err_msg = format!("R2 connectivity test failed: {e:#?}");
                error!("{}", err_msg);
                Err(err_msg)
            }
        }
    }
}

/// Build the backend selected by `settings.storage_backend`
///
/// # Errors
///
/// Returns an error if the R2 backend is selected but not configured.
pub async fn open_storage(settings: &CoreSettings) -> Result<Arc<dyn DocumentStorage>, StorageError> {
    match settings.storage_backend {
        StorageBackend::Local => {
            info!("Using local link store: {}", settings.links_file);
            Ok(Arc::new(LocalFileStorage::new(&settings.links_file)))
        }
        StorageBackend::R2 => {
            let storage = R2Storage::new(settings).await?;
            info!(
                "Using R2 link store: {}/{}",
                storage.bucket, storage.key
            );
            Ok(Arc::new(storage))
        }
    }
}
