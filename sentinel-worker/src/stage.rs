//! The stage contract: stage-local state only. Each [`Stage`] takes an
//! immutable [`StageInput`] (the work item plus the previous stage's blob
//! path) and returns a [`StageOutput`] (a new blob path plus whatever
//! fields it produced); nothing mutable is threaded between stages in
//! memory, matching the "stage-local state" design note — the current blob
//! path lives in the Artifact row, re-read/written by each stage.

use std::sync::Arc;

use async_trait::async_trait;
use sentinel_core::error::SentinelResult;

use crate::collaborators::{Embedder, GraphExtractor, OcrExtractor, Summarizer, Transcriber, Translator, VisionAnalyzer};
use sentinel_blob::BlobStore;
use sentinel_db::MetadataStore;
use sentinel_graph::store::GraphStore;

/// Everything a stage may call through: storage, the metadata store, the
/// knowledge graph, and the AI collaborators. Cheap to clone (every field
/// is an `Arc`); one instance is shared by every worker task in a process.
pub struct WorkerContext {
    pub blob_store: Arc<dyn BlobStore>,
    pub metadata: Arc<dyn MetadataStore>,
    pub graph_store: Arc<dyn GraphStore>,
    pub transcriber: Arc<dyn Transcriber>,
    pub ocr: Arc<dyn OcrExtractor>,
    pub translator: Arc<dyn Translator>,
    pub summarizer: Arc<dyn Summarizer>,
    pub vision: Arc<dyn VisionAnalyzer>,
    pub embedder: Arc<dyn Embedder>,
    pub graph_extractor: Arc<dyn GraphExtractor>,
    /// The language every artifact's text is normalized to before
    /// summarization/embedding; drives [`sentinel_core::model::Artifact::needs_translation`].
    pub canonical_language: String,
}

#[derive(Debug, Clone)]
pub struct StageInput {
    pub job_id: String,
    pub artifact_id: String,
    pub filename: String,
    pub source_language: Option<String>,
    /// Where this stage should read its input from: the original upload
    /// for the first stage, the previous stage's output blob otherwise.
    pub blob_path: String,
}

#[derive(Debug, Clone, Default)]
pub struct StageOutput {
    /// If this stage produced a new named derivative (`"transcript"`,
    /// `"translation"`, `"summary"`, ...), the role and blob path to
    /// record on the Artifact row.
    pub blob_role: Option<(String, String)>,
    /// Where the *next* stage should read from. Usually `blob_role`'s
    /// path; unchanged from the input when a stage is skipped (translate)
    /// or doesn't produce a new blob (embed).
    pub next_blob_path: String,
    pub summary_text: Option<String>,
}

#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;
    async fn run(&self, cx: &WorkerContext, input: &StageInput) -> SentinelResult<StageOutput>;
}

/// Reads a blob fully into a `String`, for stages that operate on text.
/// Artifacts in this pipeline are never large enough to need streaming
/// decode (the largest blobs are audio/video originals, read as raw bytes
/// instead via [`read_blob_bytes`]).
pub(crate) async fn read_blob_text(blob_store: &dyn BlobStore, path: &str) -> SentinelResult<String> {
    let bytes = read_blob_bytes(blob_store, path).await?;
    String::from_utf8(bytes).map_err(|e| sentinel_core::error::SentinelError::stage_failed(format!("blob {path} is not valid utf-8: {e}")))
}

pub(crate) async fn read_blob_bytes(blob_store: &dyn BlobStore, path: &str) -> SentinelResult<Vec<u8>> {
    use futures_util::StreamExt;

    let opened = blob_store
        .get(path, None)
        .await
        .map_err(|e| sentinel_core::error::SentinelError::transient_io(format!("blob get {path} failed: {e}")))?;
    let mut buf = Vec::new();
    let mut stream = opened.stream;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| sentinel_core::error::SentinelError::transient_io(format!("blob stream {path} failed: {e}")))?;
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

pub(crate) async fn write_blob_text(blob_store: &dyn BlobStore, path: &str, content_type: &str, text: &str) -> SentinelResult<()> {
    write_blob_bytes(blob_store, path, content_type, text.as_bytes().to_vec()).await
}

pub(crate) async fn write_blob_bytes(blob_store: &dyn BlobStore, path: &str, content_type: &str, data: Vec<u8>) -> SentinelResult<()> {
    let bytes = bytes::Bytes::from(data);
    let stream: sentinel_blob::ByteStream = Box::pin(futures_util::stream::once(async move { Ok(bytes) }));
    blob_store
        .put(path, Some(content_type), stream)
        .await
        .map_err(|e| sentinel_core::error::SentinelError::transient_io(format!("blob put {path} failed: {e}")))?;
    Ok(())
}
