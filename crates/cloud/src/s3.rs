//! S3-backed storage signer and importer.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use vidova_core::collab::{
    upload_key, CollabError, PresignedUpload, StorageImporter, StorageSigner, UploadPurpose,
};

/// Lifetime of presigned GET and PUT URLs.
const PRESIGN_EXPIRY: Duration = Duration::from_secs(600);

/// Key prefix for imported provider results.
const IMPORT_FOLDER: &str = "outputs";

/// Fallback extension when an artifact URL has no recognizable one.
const DEFAULT_IMPORT_EXT: &str = "mp4";

/// S3 client wrapper implementing both storage collaborator seams.
#[derive(Clone)]
pub struct S3Storage {
    client: aws_sdk_s3::Client,
    http: reqwest::Client,
    bucket: String,
}

impl S3Storage {
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self {
            client,
            http: reqwest::Client::new(),
            bucket,
        }
    }

    /// Build a client from the ambient AWS config chain.
    pub async fn from_env(bucket: String) -> Self {
        let config = aws_config::load_from_env().await;
        Self::new(aws_sdk_s3::Client::new(&config), bucket)
    }

    fn presign_config() -> Result<PresigningConfig, CollabError> {
        PresigningConfig::expires_in(PRESIGN_EXPIRY)
            .map_err(|e| CollabError::new("storage", e))
    }
}

/// Derive an import key from the artifact URL's file extension.
fn import_key(url: &str) -> String {
    let ext = url
        .rsplit('/')
        .next()
        .and_then(|segment| segment.split('?').next())
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.len() <= 5)
        .unwrap_or(DEFAULT_IMPORT_EXT);
    format!("{IMPORT_FOLDER}/{}.{ext}", uuid::Uuid::new_v4())
}

#[async_trait]
impl StorageSigner for S3Storage {
    async fn presign_get(&self, key: &str) -> Result<String, CollabError> {
        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(Self::presign_config()?)
            .await
            .map_err(|e| CollabError::new("storage", e))?;
        Ok(presigned.uri().to_string())
    }

    async fn presign_upload(
        &self,
        file_name: &str,
        content_type: &str,
        purpose: UploadPurpose,
    ) -> Result<PresignedUpload, CollabError> {
        let key = upload_key(purpose, file_name);
        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .presigned(Self::presign_config()?)
            .await
            .map_err(|e| CollabError::new("storage", e))?;
        Ok(PresignedUpload {
            url: presigned.uri().to_string(),
            key,
        })
    }
}

#[async_trait]
impl StorageImporter for S3Storage {
    /// Download a provider-hosted artifact and persist it under an owned
    /// `outputs/` key. No retry: a failed import fails the job.
    async fn import_remote(&self, url: &str) -> Result<String, CollabError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| CollabError::new("storage-import", e))?
            .error_for_status()
            .map_err(|e| CollabError::new("storage-import", e))?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes()
            .await
            .map_err(|e| CollabError::new("storage-import", e))?;

        let key = import_key(url);
        let mut put = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(body.to_vec()));
        if let Some(content_type) = content_type {
            put = put.content_type(content_type);
        }
        put.send()
            .await
            .map_err(|e| CollabError::new("storage-import", e))?;

        tracing::info!(url, key = %key, "Imported provider artifact into owned storage");
        Ok(key)
    }
}
