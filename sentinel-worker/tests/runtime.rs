//! End-to-end coverage of [`WorkerRuntime`] against in-memory backends:
//! a typed pipeline run followed by the graph handoff, a transient failure
//! that retries and then succeeds, and a failure that exhausts retries and
//! lands the artifact in its terminal `Failed` state.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream;
use sentinel_blob::store::BlobStore;
use sentinel_blob::MemoryBlobStore;
use sentinel_core::config::QueueRetryConfig;
use sentinel_core::error::{SentinelError, SentinelResult};
use sentinel_core::model::{ArtifactStatus, JobStatus, MediaType};
use sentinel_db::memory::MemoryMetadataStore;
use sentinel_db::store::MetadataStore;
use sentinel_db::types::{NewArtifactInput, NewJobInput};
use sentinel_graph::store::MemoryGraphStore;
use sentinel_queue::backend::memory::MemoryBackend;
use sentinel_queue::backend::QueueBackend;
use sentinel_queue::status::StatusHub;
use sentinel_queue::work_item::{queue_for, GRAPH_QUEUE};
use sentinel_queue::{JobMessage, QueueCtx, WorkItem, WorkItemMetadata};
use sentinel_worker::collaborators::stub::{
    StubEmbedder, StubGraphExtractor, StubSummarizer, StubTranscriber, StubTranslator, StubVisionAnalyzer,
};
use sentinel_worker::collaborators::OcrExtractor;
use sentinel_worker::{WorkerContext, WorkerRuntime};
use uuid::Uuid;

/// Always succeeds; used for the happy-path test.
struct OkOcr;
#[async_trait]
impl OcrExtractor for OkOcr {
    async fn extract_text(&self, document_bytes: &[u8], _language: Option<&str>) -> SentinelResult<String> {
        Ok(format!("[extracted text, {} bytes]", document_bytes.len()))
    }
}

/// Fails with a transient error the first `fail_times` calls, then succeeds.
struct FlakyOcr {
    calls: AtomicU32,
    fail_times: u32,
}

#[async_trait]
impl OcrExtractor for FlakyOcr {
    async fn extract_text(&self, document_bytes: &[u8], _language: Option<&str>) -> SentinelResult<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.fail_times {
            return Err(SentinelError::transient_io("ocr backend unavailable"));
        }
        Ok(format!("[extracted text, {} bytes]", document_bytes.len()))
    }
}

/// Always fails with a non-retryable error.
struct BrokenOcr;
#[async_trait]
impl OcrExtractor for BrokenOcr {
    async fn extract_text(&self, _document_bytes: &[u8], _language: Option<&str>) -> SentinelResult<String> {
        Err(SentinelError::stage_failed("document is not a supported format"))
    }
}

/// Fails (permanently) only for documents whose bytes contain the literal
/// marker `POISON`, so one job can carry both a healthy and a doomed
/// artifact side by side.
struct PoisonMarkerOcr;
#[async_trait]
impl OcrExtractor for PoisonMarkerOcr {
    async fn extract_text(&self, document_bytes: &[u8], _language: Option<&str>) -> SentinelResult<String> {
        if document_bytes.windows(6).any(|w| w == b"POISON") {
            return Err(SentinelError::stage_failed("poison artifact"));
        }
        Ok(format!("[extracted text, {} bytes]", document_bytes.len()))
    }
}

fn context_with_ocr(ocr: Arc<dyn OcrExtractor>) -> Arc<WorkerContext> {
    Arc::new(WorkerContext {
        blob_store: Arc::new(MemoryBlobStore::new()),
        metadata: Arc::new(MemoryMetadataStore::new()),
        graph_store: Arc::new(MemoryGraphStore::new()),
        transcriber: Arc::new(StubTranscriber),
        ocr,
        translator: Arc::new(StubTranslator),
        summarizer: Arc::new(StubSummarizer),
        vision: Arc::new(StubVisionAnalyzer),
        embedder: Arc::new(StubEmbedder::default()),
        graph_extractor: Arc::new(StubGraphExtractor),
        canonical_language: "en".to_string(),
    })
}

/// Creates a Job with one queued Document artifact, writes its upload blob,
/// and enqueues the matching work item onto the document queue. Returns the
/// artifact id.
async fn seed_document_job(context: &WorkerContext, backend: &MemoryBackend, ctx: QueueCtx, job_id: &str) -> String {
    let blob_path = format!("{job_id}/report.pdf");
    let bytes = Bytes::from_static(b"%PDF-1.4 fake document bytes");
    context.blob_store.put(&blob_path, Some("application/pdf"), Box::pin(stream::once(async move { Ok(bytes) }))).await.unwrap();

    let input = NewJobInput {
        job_id: job_id.to_string(),
        case_name: "case-alpha".to_string(),
        owner_id: Uuid::new_v4(),
        owner_supervisor_id: None,
        artifacts: vec![NewArtifactInput {
            filename: "report.pdf".to_string(),
            media_type: MediaType::Document,
            source_language: None,
            blob_path: blob_path.clone(),
        }],
        suspects: vec![],
    };
    let (_job, artifacts) = context.metadata.create_job(input).await.unwrap();
    let artifact = &artifacts[0];

    let item = WorkItem {
        job_id: job_id.to_string(),
        artifact_id: artifact.id.clone(),
        blob_path,
        filename: "report.pdf".to_string(),
        media_type: MediaType::Document,
        metadata: WorkItemMetadata { language: None },
        attempt: 0,
    };
    let payload = serde_json::to_vec(&item).unwrap();
    let message = JobMessage::new("document".to_string(), payload, "json".to_string(), queue_for(MediaType::Document).to_string());
    backend.enqueue(ctx, message).await.unwrap();

    artifact.id.clone()
}

/// Creates a Job with two queued Document artifacts — one whose upload
/// bytes are clean, one carrying the `POISON` marker — and enqueues both
/// work items. Returns `(healthy_artifact_id, poisoned_artifact_id)`.
async fn seed_two_document_job(context: &WorkerContext, backend: &MemoryBackend, ctx: QueueCtx, job_id: &str) -> (String, String) {
    let healthy_path = format!("{job_id}/healthy.pdf");
    let poisoned_path = format!("{job_id}/poisoned.pdf");
    let healthy_bytes = Bytes::from_static(b"%PDF-1.4 clean document bytes");
    let poisoned_bytes = Bytes::from_static(b"%PDF-1.4 POISON marker inside");
    context.blob_store.put(&healthy_path, Some("application/pdf"), Box::pin(stream::once(async move { Ok(healthy_bytes) }))).await.unwrap();
    context.blob_store.put(&poisoned_path, Some("application/pdf"), Box::pin(stream::once(async move { Ok(poisoned_bytes) }))).await.unwrap();

    let input = NewJobInput {
        job_id: job_id.to_string(),
        case_name: "case-beta".to_string(),
        owner_id: Uuid::new_v4(),
        owner_supervisor_id: None,
        artifacts: vec![
            NewArtifactInput { filename: "healthy.pdf".to_string(), media_type: MediaType::Document, source_language: None, blob_path: healthy_path.clone() },
            NewArtifactInput { filename: "poisoned.pdf".to_string(), media_type: MediaType::Document, source_language: None, blob_path: poisoned_path.clone() },
        ],
        suspects: vec![],
    };
    let (_job, artifacts) = context.metadata.create_job(input).await.unwrap();
    let healthy = &artifacts[0];
    let poisoned = &artifacts[1];

    for (artifact, blob_path, filename) in [(healthy, healthy_path, "healthy.pdf"), (poisoned, poisoned_path, "poisoned.pdf")] {
        let item = WorkItem {
            job_id: job_id.to_string(),
            artifact_id: artifact.id.clone(),
            blob_path,
            filename: filename.to_string(),
            media_type: MediaType::Document,
            metadata: WorkItemMetadata { language: None },
            attempt: 0,
        };
        let payload = serde_json::to_vec(&item).unwrap();
        let message = JobMessage::new("document".to_string(), payload, "json".to_string(), queue_for(MediaType::Document).to_string());
        backend.enqueue(ctx.clone(), message).await.unwrap();
    }

    (healthy.id.clone(), poisoned.id.clone())
}

fn retry_config(max_retries: u32) -> QueueRetryConfig {
    QueueRetryConfig {
        max_retries,
        backoff_base_secs: 0,
        visibility_timeout_secs: 30,
        dlq_retention_days: 7,
    }
}

#[tokio::test]
async fn document_pipeline_runs_end_to_end_through_graph_handoff() {
    let backend = Arc::new(MemoryBackend::new());
    let context = context_with_ocr(Arc::new(OkOcr));
    let ctx = QueueCtx::new("tenant-a".to_string());
    let job_id = "job-success".to_string();
    let artifact_id = seed_document_job(&context, &backend, ctx.clone(), &job_id).await;

    let runtime = WorkerRuntime::new(backend.clone(), context.clone(), Arc::new(StatusHub::new()), retry_config(3), "tenant-a".to_string());

    // Drains the document queue: extract_text -> translate -> summarize -> embed.
    assert!(runtime.process_next_typed(&["document"]).await.unwrap());

    let artifact = context.metadata.get_artifact(&artifact_id).await.unwrap();
    assert_eq!(artifact.status, ArtifactStatus::AwaitingGraph);
    assert!(artifact.blob_paths.contains_key("summary"));

    // Drains the graph handoff.
    assert!(runtime.process_next_graph().await.unwrap());

    let artifact = context.metadata.get_artifact(&artifact_id).await.unwrap();
    assert_eq!(artifact.status, ArtifactStatus::Completed);

    let job = context.metadata.get_job(&job_id).await.unwrap();
    assert_eq!(job.completed_count, 1);
    assert_eq!(job.status, JobStatus::Completed);

    // No more work left on either queue.
    assert!(!runtime.process_next_typed(&["document"]).await.unwrap());
    assert!(!runtime.process_next_graph().await.unwrap());
}

#[tokio::test]
async fn transient_stage_failure_retries_then_succeeds() {
    let backend = Arc::new(MemoryBackend::new());
    let context = context_with_ocr(Arc::new(FlakyOcr { calls: AtomicU32::new(0), fail_times: 1 }));
    let ctx = QueueCtx::new("tenant-b".to_string());
    let job_id = "job-flaky".to_string();
    let artifact_id = seed_document_job(&context, &backend, ctx.clone(), &job_id).await;

    let runtime = WorkerRuntime::new(backend.clone(), context.clone(), Arc::new(StatusHub::new()), retry_config(1), "tenant-b".to_string());

    // First attempt fails on extract_text and schedules an immediate retry
    // (backoff_base_secs is 0 in this config).
    assert!(runtime.process_next_typed(&["document"]).await.unwrap());
    let artifact = context.metadata.get_artifact(&artifact_id).await.unwrap();
    assert_eq!(artifact.status, ArtifactStatus::Processing);

    // Second attempt succeeds and runs the rest of the pipeline.
    assert!(runtime.process_next_typed(&["document"]).await.unwrap());
    let artifact = context.metadata.get_artifact(&artifact_id).await.unwrap();
    assert_eq!(artifact.status, ArtifactStatus::AwaitingGraph);
}

#[tokio::test]
async fn stage_failure_exhausting_retries_marks_artifact_and_job_failed() {
    let backend = Arc::new(MemoryBackend::new());
    let context = context_with_ocr(Arc::new(BrokenOcr));
    let ctx = QueueCtx::new("tenant-c".to_string());
    let job_id = "job-broken".to_string();
    let artifact_id = seed_document_job(&context, &backend, ctx.clone(), &job_id).await;

    let runtime = WorkerRuntime::new(backend.clone(), context.clone(), Arc::new(StatusHub::new()), retry_config(3), "tenant-c".to_string());

    // stage_failed is non-retryable regardless of max_retries, so one pass
    // is enough to land the artifact (and the job) in its terminal state.
    assert!(runtime.process_next_typed(&["document"]).await.unwrap());

    let artifact = context.metadata.get_artifact(&artifact_id).await.unwrap();
    assert_eq!(artifact.status, ArtifactStatus::Failed);
    assert!(artifact.error.is_some());

    let job = context.metadata.get_job(&job_id).await.unwrap();
    assert_eq!(job.failed_count, 1);
    assert_eq!(job.status, JobStatus::Failed);
}

#[tokio::test]
async fn transient_failure_past_max_retries_is_terminal() {
    let backend = Arc::new(MemoryBackend::new());
    // Always transient, never succeeds, but with zero retries allowed.
    let context = context_with_ocr(Arc::new(FlakyOcr { calls: AtomicU32::new(0), fail_times: u32::MAX }));
    let ctx = QueueCtx::new("tenant-d".to_string());
    let job_id = "job-exhausted".to_string();
    let artifact_id = seed_document_job(&context, &backend, ctx.clone(), &job_id).await;

    let runtime = WorkerRuntime::new(backend.clone(), context.clone(), Arc::new(StatusHub::new()), retry_config(0), "tenant-d".to_string());

    assert!(runtime.process_next_typed(&["document"]).await.unwrap());

    let artifact = context.metadata.get_artifact(&artifact_id).await.unwrap();
    assert_eq!(artifact.status, ArtifactStatus::Failed);

    let dlq = backend.list_dlq(ctx, queue_for(MediaType::Document)).await.unwrap();
    assert_eq!(dlq.len(), 1);
}

#[tokio::test]
async fn job_with_one_poisoned_artifact_among_healthy_ones_reaches_partial() {
    let backend = Arc::new(MemoryBackend::new());
    let context = context_with_ocr(Arc::new(PoisonMarkerOcr));
    let ctx = QueueCtx::new("tenant-f".to_string());
    let job_id = "job-partial".to_string();
    let (healthy_id, poisoned_id) = seed_two_document_job(&context, &backend, ctx.clone(), &job_id).await;

    let runtime = WorkerRuntime::new(backend.clone(), context.clone(), Arc::new(StatusHub::new()), retry_config(2), "tenant-f".to_string());

    // Drain both artifacts through the typed pipeline; the healthy one hands
    // off to the graph queue, the poisoned one fails outright.
    assert!(runtime.process_next_typed(&["document"]).await.unwrap());
    assert!(runtime.process_next_typed(&["document"]).await.unwrap());
    assert!(!runtime.process_next_typed(&["document"]).await.unwrap());

    let poisoned = context.metadata.get_artifact(&poisoned_id).await.unwrap();
    assert_eq!(poisoned.status, ArtifactStatus::Failed);

    let healthy = context.metadata.get_artifact(&healthy_id).await.unwrap();
    assert_eq!(healthy.status, ArtifactStatus::AwaitingGraph);

    // Poisoned artifact already folded into the job's counters; healthy one
    // still needs the graph handoff before the job can close out.
    let job = context.metadata.get_job(&job_id).await.unwrap();
    assert_eq!(job.failed_count, 1);
    assert_eq!(job.completed_count, 0);
    assert_eq!(job.status, JobStatus::Processing);

    assert!(runtime.process_next_graph().await.unwrap());

    let job = context.metadata.get_job(&job_id).await.unwrap();
    assert_eq!(job.completed_count, 1);
    assert_eq!(job.failed_count, 1);
    assert_eq!(job.status, JobStatus::Partial);
}

#[tokio::test]
async fn graph_queue_stays_empty_until_typed_pipeline_hands_off() {
    let backend = Arc::new(MemoryBackend::new());
    let context = context_with_ocr(Arc::new(OkOcr));
    let ctx = QueueCtx::new("tenant-e".to_string());
    seed_document_job(&context, &backend, ctx.clone(), "job-order").await;

    assert!(backend.dequeue(ctx.clone(), &[GRAPH_QUEUE]).await.unwrap().is_none());

    let runtime = WorkerRuntime::new(backend.clone(), context.clone(), Arc::new(StatusHub::new()), retry_config(3), "tenant-e".to_string());
    assert!(runtime.process_next_typed(&["document"]).await.unwrap());

    assert!(backend.dequeue(ctx, &[GRAPH_QUEUE]).await.unwrap().is_some());
}
