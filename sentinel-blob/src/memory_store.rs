//! In-memory [`BlobStore`], used in tests and wherever `storage.backend =
//! "memory"` is configured. Same shape as `sentinel_db::memory::MemoryMetadataStore`
//! and `sentinel_graph::store::MemoryGraphStore`: one `Mutex`-guarded map,
//! good enough for a single process.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;

use crate::error::{BlobError, BlobResult};
use crate::store::{BlobStore, GetResult, ObjectHead, PutResult, StoreCapabilities};
use crate::types::ByteRange;

struct StoredBlob {
    bytes: Bytes,
    content_type: Option<String>,
}

#[derive(Default)]
pub struct MemoryBlobStore {
    objects: Mutex<HashMap<String, StoredBlob>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, content_type: Option<&str>, mut stream: crate::types::ByteStream) -> BlobResult<PutResult> {
        let mut buf = Vec::new();
        while let Some(chunk) = stream.next().await {
            buf.extend_from_slice(&chunk?);
        }
        let size_bytes = buf.len() as u64;
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredBlob { bytes: Bytes::from(buf), content_type: content_type.map(str::to_string) },
        );
        Ok(PutResult { etag: None, size_bytes, checksum: None })
    }

    async fn get(&self, key: &str, range: Option<ByteRange>) -> BlobResult<GetResult> {
        let stored = self
            .objects
            .lock()
            .unwrap()
            .get(key)
            .map(|b| (b.bytes.clone(), b.content_type.clone()))
            .ok_or_else(|| BlobError::not_found(key))?;
        let (bytes, content_type) = stored;
        let total_size = bytes.len() as u64;

        let (slice, resolved_range) = match range {
            Some(r) if r.is_valid(total_size) => {
                let end = r.end.unwrap_or(total_size.saturating_sub(1));
                let start = r.start as usize;
                let end_inclusive = (end as usize).min(bytes.len().saturating_sub(1));
                (
                    bytes.slice(start..=end_inclusive),
                    Some(crate::store::ResolvedRange { start: r.start, end, total_size }),
                )
            }
            Some(_) => return Err(BlobError::invalid("range not satisfiable")),
            None => (bytes, None),
        };

        let stream: crate::types::ByteStream = Box::pin(futures_util::stream::once(async move { Ok(slice) }));
        Ok(GetResult { stream, size_bytes: total_size, content_type, etag: None, resolved_range })
    }

    async fn head(&self, key: &str) -> BlobResult<ObjectHead> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|b| ObjectHead {
                size_bytes: b.bytes.len() as u64,
                content_type: b.content_type.clone(),
                etag: None,
                last_modified: None,
            })
            .ok_or_else(|| BlobError::not_found(key))
    }

    async fn delete(&self, key: &str) -> BlobResult<()> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    fn capabilities(&self) -> StoreCapabilities {
        StoreCapabilities::basic().with_range()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn stream_of(data: &'static [u8]) -> crate::types::ByteStream {
        Box::pin(stream::once(async move { Ok(Bytes::from(data)) }))
    }

    #[tokio::test]
    async fn put_then_get_roundtrips_bytes() {
        let store = MemoryBlobStore::new();
        store.put("job-1/report.pdf", Some("application/pdf"), stream_of(b"hello")).await.unwrap();

        let got = store.get("job-1/report.pdf", None).await.unwrap();
        assert_eq!(got.size_bytes, 5);
        assert_eq!(got.content_type.as_deref(), Some("application/pdf"));
    }

    #[tokio::test]
    async fn get_missing_key_is_not_found() {
        let store = MemoryBlobStore::new();
        assert!(store.get("missing", None).await.is_err());
    }

    #[tokio::test]
    async fn delete_removes_the_object() {
        let store = MemoryBlobStore::new();
        store.put("k", None, stream_of(b"x")).await.unwrap();
        store.delete("k").await.unwrap();
        assert!(store.head("k").await.is_err());
    }
}
