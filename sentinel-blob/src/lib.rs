//! Artifact storage for uploaded case evidence.
//!
//! Streaming-first, range-friendly, with multipart/chunked upload coordination
//! for the large audio/video artifacts a case can contain. Storage-backend
//! agnostic: the same [`BlobAdapter`] runs against an in-memory store in tests
//! and an S3-compatible store in production.
//!
//! ## Quick start
//!
//! ```rust
//! use sentinel_blob::prelude::*;
//! use std::io::Cursor;
//!
//! # #[tokio::main]
//! # async fn main() -> BlobResult<()> {
//! let store = sentinel_blob::S3CompatibleStore::from_env().await?;
//! let adapter = BlobAdapter::with_key_strategy(store, sentinel_blob::SentinelKeyStrategy, BlobConfig::default());
//!
//! let ctx = BlobCtx::new("job-42".to_string());
//! let data = b"evidence bytes";
//! let stream = futures::stream::once(async { Ok(bytes::Bytes::from(&data[..])) });
//! let put_request = BlobPut::new()
//!     .with_content_type("application/pdf")
//!     .with_filename("report.pdf");
//!
//! let receipt = adapter.put(ctx.clone(), put_request, Box::pin(stream)).await?;
//! let opened = adapter.open(ctx, receipt.id, None).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  Gateway/Worker │  ← business logic only
//! ├─────────────────┤
//! │   BlobAdapter   │  ← key strategy + upload coordination
//! ├─────────────────┤
//! │   BlobStore     │  ← storage primitives (S3, memory)
//! └─────────────────┘
//! ```

pub mod adapter;
mod config;
mod coordinator;
mod error;
mod memory_store;
mod receipt;
mod s3_store;
mod session_store;
pub mod store;
mod types;
mod upload;

// Re-export main types for clean API
pub use adapter::BlobAdapter;
pub use config::{BlobConfig, UploadRules};
pub use coordinator::DefaultUploadCoordinator;
pub use error::{BlobError, BlobResult};
pub use memory_store::MemoryBlobStore;
pub use receipt::{BlobReceipt, OpenedBlob, ResolvedRange};
pub use s3_store::{S3CompatibleStore, S3Config};
pub use store::{
    BlobStore, MultipartBlobStore, SignedUrlBlobStore, BlobKeyStrategy, DefaultKeyStrategy, SentinelKeyStrategy,
    PutResult, GetResult, ObjectHead, StoreCapabilities
};
pub use types::{
    BlobCtx, BlobId, BlobPut, ByteRange, ByteStream,
    UploadId, UploadSession, UploadStatus, PartReceipt, UploadProgress,
    ChunkSessionId, ChunkResult, ChunkSession
};
pub use upload::{UploadCoordinator, UploadIntent, UploadSessionStore};
pub use session_store::MemoryUploadSessionStore;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        BlobAdapter, BlobConfig, BlobError, BlobResult, BlobReceipt,
        BlobStore, BlobCtx, BlobId, BlobPut, ByteStream, SentinelKeyStrategy,
    };
}
