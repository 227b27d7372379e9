//! S3-compatible [`BlobStore`] implementation, backing production artifact
//! storage. Works against AWS S3 or any S3-compatible endpoint (MinIO, R2)
//! by pointing `endpoint_url` at it.

use async_trait::async_trait;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::primitives::ByteStream as S3ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use futures_util::StreamExt;

use crate::store::{
    BlobStore, CompletedPart, GetResult, MultipartBlobStore, ObjectHead, PartETag, PutResult,
    SignedUrlBlobStore, StoreCapabilities,
};
use crate::types::{ByteRange, ByteStream, UploadId};
use crate::{BlobError, BlobResult};

#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    pub endpoint_url: Option<String>,
}

impl S3Config {
    /// Load from `SENTINEL_S3_BUCKET` / `SENTINEL_S3_REGION` /
    /// `SENTINEL_S3_ENDPOINT` environment variables.
    pub fn from_env() -> BlobResult<Self> {
        let bucket = std::env::var("SENTINEL_S3_BUCKET")
            .map_err(|_| BlobError::invalid("SENTINEL_S3_BUCKET is not set"))?;
        let region = std::env::var("SENTINEL_S3_REGION").unwrap_or_else(|_| "us-east-1".to_string());
        let endpoint_url = std::env::var("SENTINEL_S3_ENDPOINT").ok();
        Ok(Self {
            bucket,
            region,
            endpoint_url,
        })
    }
}

pub struct S3CompatibleStore {
    client: Client,
    bucket: String,
}

impl S3CompatibleStore {
    pub async fn new(config: S3Config) -> BlobResult<Self> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint.clone());
        }
        let shared_config = loader.load().await;
        let client = Client::new(&shared_config);
        Ok(Self {
            client,
            bucket: config.bucket,
        })
    }

    /// Construct from environment variables, the common entry point for
    /// production deployments.
    pub async fn from_env() -> BlobResult<Self> {
        Self::new(S3Config::from_env()?).await
    }
}

#[async_trait]
impl BlobStore for S3CompatibleStore {
    async fn put(&self, key: &str, content_type: Option<&str>, stream: ByteStream) -> BlobResult<PutResult> {
        let mut buf = Vec::new();
        let mut stream = stream;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(BlobError::from)?;
            buf.extend_from_slice(&chunk);
        }
        let size_bytes = buf.len() as u64;

        let mut req = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(S3ByteStream::from(buf));
        if let Some(ct) = content_type {
            req = req.content_type(ct);
        }
        let output = req.send().await.map_err(BlobError::backend)?;

        Ok(PutResult {
            etag: output.e_tag().map(|s| s.to_string()),
            size_bytes,
            checksum: None,
        })
    }

    async fn get(&self, key: &str, range: Option<ByteRange>) -> BlobResult<GetResult> {
        let mut req = self.client.get_object().bucket(&self.bucket).key(key);
        if let Some(r) = &range {
            let header = match r.end {
                Some(end) => format!("bytes={}-{}", r.start, end),
                None => format!("bytes={}-", r.start),
            };
            req = req.range(header);
        }
        let output = req.send().await.map_err(|e| {
            if is_not_found(&e) {
                BlobError::not_found(key.to_string())
            } else {
                BlobError::backend(e)
            }
        })?;

        let size_bytes = output.content_length().unwrap_or(0).max(0) as u64;
        let content_type = output.content_type().map(|s| s.to_string());
        let etag = output.e_tag().map(|s| s.to_string());

        let resolved_range = range.map(|r| crate::store::ResolvedRange {
            start: r.start,
            end: r.end.unwrap_or(size_bytes.saturating_sub(1)),
            total_size: size_bytes,
        });

        let body = output.body;
        let stream = body
            .map(|chunk| chunk.map(Bytes::from).map_err(|e| std::io::Error::other(e.to_string())));

        Ok(GetResult {
            stream: Box::pin(stream),
            size_bytes,
            content_type,
            etag,
            resolved_range,
        })
    }

    async fn head(&self, key: &str) -> BlobResult<ObjectHead> {
        let output = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if is_not_found(&e) {
                    BlobError::not_found(key.to_string())
                } else {
                    BlobError::backend(e)
                }
            })?;

        Ok(ObjectHead {
            size_bytes: output.content_length().unwrap_or(0).max(0) as u64,
            content_type: output.content_type().map(|s| s.to_string()),
            etag: output.e_tag().map(|s| s.to_string()),
            last_modified: output.last_modified().map(|t| t.secs()),
        })
    }

    async fn delete(&self, key: &str) -> BlobResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(BlobError::backend)?;
        Ok(())
    }

    fn capabilities(&self) -> StoreCapabilities {
        StoreCapabilities::basic()
            .with_range()
            .with_multipart(Some(5 * 1024 * 1024), Some(5 * 1024 * 1024 * 1024))
    }
}

#[async_trait]
impl MultipartBlobStore for S3CompatibleStore {
    async fn init_multipart(&self, key: &str, content_type: Option<&str>) -> BlobResult<UploadId> {
        let mut req = self.client.create_multipart_upload().bucket(&self.bucket).key(key);
        if let Some(ct) = content_type {
            req = req.content_type(ct);
        }
        let output = req.send().await.map_err(BlobError::backend)?;
        let s3_upload_id = output
            .upload_id()
            .ok_or_else(|| BlobError::backend(std::io::Error::other("S3 did not return an upload id")))?;
        Ok(UploadId::from_string(s3_upload_id.to_string()))
    }

    async fn put_part(&self, upload_id: &UploadId, part_number: u32, stream: ByteStream) -> BlobResult<PartETag> {
        let mut buf = Vec::new();
        let mut stream = stream;
        while let Some(chunk) = stream.next().await {
            buf.extend_from_slice(&chunk.map_err(BlobError::from)?);
        }

        // S3's object key for a part upload is tracked by the coordinator,
        // not this store; callers key by `upload_id` alone in-process, so we
        // rely on the coordinator having issued `init_multipart` against the
        // same key it now calls us back on.
        let key = upload_id.as_str();
        let output = self
            .client
            .upload_part()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id.as_str())
            .part_number(part_number as i32)
            .body(S3ByteStream::from(buf))
            .send()
            .await
            .map_err(BlobError::backend)?;

        Ok(PartETag {
            part_number,
            etag: output.e_tag().unwrap_or_default().to_string(),
        })
    }

    async fn complete_multipart(&self, upload_id: &UploadId, parts: Vec<CompletedPart>) -> BlobResult<PutResult> {
        use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart as S3CompletedPart};

        let key = upload_id.as_str();
        let completed_parts: Vec<S3CompletedPart> = parts
            .into_iter()
            .map(|p| {
                S3CompletedPart::builder()
                    .part_number(p.part_number as i32)
                    .e_tag(p.etag)
                    .build()
            })
            .collect();

        let output = self
            .client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id.as_str())
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(completed_parts))
                    .build(),
            )
            .send()
            .await
            .map_err(BlobError::backend)?;

        Ok(PutResult {
            etag: output.e_tag().map(|s| s.to_string()),
            size_bytes: 0,
            checksum: None,
        })
    }

    async fn abort_multipart(&self, upload_id: &UploadId) -> BlobResult<()> {
        self.client
            .abort_multipart_upload()
            .bucket(&self.bucket)
            .key(upload_id.as_str())
            .upload_id(upload_id.as_str())
            .send()
            .await
            .map_err(BlobError::backend)?;
        Ok(())
    }
}

#[async_trait]
impl SignedUrlBlobStore for S3CompatibleStore {
    async fn sign_get(&self, _key: &str, _expires_in_secs: u64) -> BlobResult<String> {
        Err(BlobError::Unsupported)
    }

    async fn sign_put(&self, _key: &str, _content_type: Option<&str>, _expires_in_secs: u64) -> BlobResult<String> {
        Err(BlobError::Unsupported)
    }
}

fn is_not_found<E>(err: &aws_sdk_s3::error::SdkError<E>) -> bool
where
    E: std::fmt::Debug,
{
    matches!(err, aws_sdk_s3::error::SdkError::ServiceError(_)) && format!("{err:?}").contains("NotFound")
}
