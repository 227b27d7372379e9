//! The typed payload carried inside a [`crate::JobMessage`]'s `payload_bytes`
//! for every media-type queue, plus the queue/DLQ naming convention.

use sentinel_core::model::MediaType;
use serde::{Deserialize, Serialize};

/// One unit of work dispatched to a typed worker: the artifact to process
/// plus enough metadata to locate its blob and resume mid-pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    pub job_id: String,
    pub artifact_id: String,
    pub blob_path: String,
    pub filename: String,
    pub media_type: MediaType,
    #[serde(default)]
    pub metadata: WorkItemMetadata,
    pub attempt: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkItemMetadata {
    pub language: Option<String>,
}

/// Queue name for a media type's worker pool, e.g. `"document"`.
pub fn queue_for(media_type: MediaType) -> &'static str {
    media_type.queue_name()
}

/// The dead-letter queue name for a given source queue, e.g.
/// `"document.dlq"`.
pub fn dlq_for(queue: &str) -> String {
    format!("{queue}.dlq")
}

/// The shared terminal stage's queue name, fed by every media-type pipeline
/// once per-stage processing completes.
pub const GRAPH_QUEUE: &str = "graph";
