//! S3 object-store client.

use std::path::Path;

use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use aws_sdk_s3::Client;
use futures::{StreamExt, TryStreamExt};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};

/// Part size for multipart transfers.
const PART_SIZE: u64 = 10 * 1024 * 1024;
/// Parts in flight during a multipart upload.
const UPLOAD_CONCURRENCY: usize = 5;
/// Ranged GETs in flight during a parallel download.
const DOWNLOAD_CONCURRENCY: usize = 10;

/// Configuration for the object-store client.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Bucket holding every pipeline artifact.
    pub bucket: String,
    /// AWS region.
    pub region: String,
}

impl StoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self {
            bucket: std::env::var("BUCKET_NAME")
                .map_err(|_| StorageError::config_error("BUCKET_NAME not set"))?,
            region: std::env::var("AWS_REGION")
                .map_err(|_| StorageError::config_error("AWS_REGION not set"))?,
        })
    }
}

/// Shared, thread-safe object-store client.
#[derive(Clone)]
pub struct ObjectStore {
    client: Client,
    bucket: String,
}

impl ObjectStore {
    /// Create a new client from configuration.
    pub async fn new(config: StoreConfig) -> StorageResult<Self> {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region))
            .load()
            .await;

        Ok(Self {
            client: Client::new(&sdk_config),
            bucket: config.bucket,
        })
    }

    /// Create from environment variables.
    pub async fn from_env() -> StorageResult<Self> {
        Self::new(StoreConfig::from_env()?).await
    }

    /// Bucket this client writes to.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Upload a local file. Files above one part size go through S3
    /// multipart with bounded part concurrency.
    pub async fn upload_file(
        &self,
        path: impl AsRef<Path>,
        key: &str,
        content_type: &str,
        cache_control: &str,
    ) -> StorageResult<()> {
        let path = path.as_ref();
        let size = tokio::fs::metadata(path).await?.len();

        if size > PART_SIZE {
            return self
                .upload_file_multipart(path, key, content_type, cache_control, size)
                .await;
        }

        debug!("Uploading {} to {}", path.display(), key);

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .cache_control(cache_control)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        Ok(())
    }

    async fn upload_file_multipart(
        &self,
        path: &Path,
        key: &str,
        content_type: &str,
        cache_control: &str,
        size: u64,
    ) -> StorageResult<()> {
        debug!("Multipart upload of {} ({} bytes) to {}", path.display(), size, key);

        let create = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .cache_control(cache_control)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;
        let upload_id = create
            .upload_id()
            .ok_or_else(|| StorageError::upload_failed("missing upload id"))?
            .to_string();

        let part_count = size.div_ceil(PART_SIZE);
        let result: StorageResult<Vec<CompletedPart>> = futures::stream::iter(0..part_count)
            .map(|i| {
                let client = self.client.clone();
                let bucket = self.bucket.clone();
                let key = key.to_string();
                let upload_id = upload_id.clone();
                let path = path.to_path_buf();
                async move {
                    let offset = i * PART_SIZE;
                    let len = PART_SIZE.min(size - offset) as usize;
                    let mut file = tokio::fs::File::open(&path).await?;
                    file.seek(std::io::SeekFrom::Start(offset)).await?;
                    let mut buf = vec![0u8; len];
                    file.read_exact(&mut buf).await?;

                    // S3 part numbers start at 1.
                    let part_number = (i + 1) as i32;
                    let out = client
                        .upload_part()
                        .bucket(&bucket)
                        .key(&key)
                        .upload_id(&upload_id)
                        .part_number(part_number)
                        .body(ByteStream::from(buf))
                        .send()
                        .await
                        .map_err(|e| StorageError::upload_failed(e.to_string()))?;

                    Ok(CompletedPart::builder()
                        .part_number(part_number)
                        .set_e_tag(out.e_tag().map(str::to_string))
                        .build())
                }
            })
            .buffered(UPLOAD_CONCURRENCY)
            .try_collect()
            .await;

        let parts = match result {
            Ok(parts) => parts,
            Err(e) => {
                // Best-effort abort so the bucket doesn't accrue orphans.
                let _ = self
                    .client
                    .abort_multipart_upload()
                    .bucket(&self.bucket)
                    .key(key)
                    .upload_id(&upload_id)
                    .send()
                    .await;
                return Err(e);
            }
        };

        self.client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(&upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(parts))
                    .build(),
            )
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        info!("Uploaded {} to {}", path.display(), key);
        Ok(())
    }

    /// Upload bytes under a key.
    pub async fn upload_bytes(
        &self,
        data: Vec<u8>,
        key: &str,
        content_type: &str,
        cache_control: &str,
    ) -> StorageResult<()> {
        debug!("Uploading {} bytes to {}", data.len(), key);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .cache_control(cache_control)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        Ok(())
    }

    /// Download an object as bytes.
    pub async fn download_bytes(&self, key: &str) -> StorageResult<Vec<u8>> {
        debug!("Downloading {}", key);

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.to_string().contains("NoSuchKey") {
                    StorageError::not_found(key)
                } else {
                    StorageError::download_failed(e.to_string())
                }
            })?;

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::download_failed(e.to_string()))?
            .into_bytes()
            .to_vec();

        Ok(bytes)
    }

    /// Download an object to a local file with parallel ranged GETs.
    /// Parts are fetched out of order but written in order.
    pub async fn download_file(&self, key: &str, path: impl AsRef<Path>) -> StorageResult<()> {
        let path = path.as_ref();
        let size = self
            .head(key)
            .await?
            .ok_or_else(|| StorageError::not_found(key))?;

        debug!("Downloading {} ({} bytes) to {}", key, size, path.display());

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(path).await?;

        if size == 0 {
            return Ok(());
        }

        let part_count = (size as u64).div_ceil(PART_SIZE);
        let mut parts = futures::stream::iter(0..part_count)
            .map(|i| {
                let client = self.client.clone();
                let bucket = self.bucket.clone();
                let key = key.to_string();
                async move {
                    let start = i * PART_SIZE;
                    let end = ((i + 1) * PART_SIZE).min(size as u64) - 1;
                    let response = client
                        .get_object()
                        .bucket(&bucket)
                        .key(&key)
                        .range(format!("bytes={}-{}", start, end))
                        .send()
                        .await
                        .map_err(|e| StorageError::download_failed(e.to_string()))?;
                    response
                        .body
                        .collect()
                        .await
                        .map(|data| data.into_bytes())
                        .map_err(|e| StorageError::download_failed(e.to_string()))
                }
            })
            .buffered(DOWNLOAD_CONCURRENCY);

        while let Some(part) = parts.next().await {
            file.write_all(&part?).await?;
        }
        file.flush().await?;

        info!("Downloaded {} to {}", key, path.display());
        Ok(())
    }

    /// Content length of an object, or `None` if it does not exist.
    pub async fn head(&self, key: &str) -> StorageResult<Option<i64>> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(out) => Ok(Some(out.content_length().unwrap_or(0))),
            Err(e) => {
                let msg = e.to_string();
                if msg.contains("NotFound") || msg.contains("NoSuchKey") {
                    Ok(None)
                } else {
                    Err(StorageError::HeadFailed(msg))
                }
            }
        }
    }

    /// Check whether an object exists.
    pub async fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.head(key).await?.is_some())
    }

    /// List every object under a prefix, following continuation tokens.
    pub async fn list_prefix(&self, prefix: &str) -> StorageResult<Vec<ObjectInfo>> {
        debug!("Listing objects with prefix: {}", prefix);

        let mut objects = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix);

            if let Some(token) = continuation_token {
                request = request.continuation_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| StorageError::ListFailed(e.to_string()))?;

            for obj in response.contents() {
                objects.push(ObjectInfo {
                    key: obj.key().unwrap_or_default().to_string(),
                    size: obj.size().unwrap_or(0) as u64,
                });
            }

            if response.is_truncated() == Some(true) {
                continuation_token = response.next_continuation_token().map(str::to_string);
            } else {
                break;
            }
        }

        Ok(objects)
    }
}

/// Information about a stored object.
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    /// Object key
    pub key: String,
    /// Size in bytes
    pub size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_split_covers_exact_multiple() {
        let size = 3 * PART_SIZE;
        assert_eq!(size.div_ceil(PART_SIZE), 3);
    }

    #[test]
    fn part_split_covers_remainder() {
        let size = 2 * PART_SIZE + 1;
        let parts = size.div_ceil(PART_SIZE);
        assert_eq!(parts, 3);
        // Last part is a single byte.
        let last_offset = (parts - 1) * PART_SIZE;
        assert_eq!(PART_SIZE.min(size - last_offset), 1);
    }

    #[test]
    fn ranged_get_bounds_are_inclusive() {
        let size: u64 = PART_SIZE + 10;
        let last = size.div_ceil(PART_SIZE) - 1;
        let start = last * PART_SIZE;
        let end = ((last + 1) * PART_SIZE).min(size) - 1;
        assert_eq!(start, PART_SIZE);
        assert_eq!(end, size - 1);
    }
}
