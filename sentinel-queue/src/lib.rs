//! # sentinel-queue: lease-based job fabric
//!
//! One named queue per media type (`document`, `audio`, `video`, `cdr`) plus
//! a shared `graph` queue for the terminal stage, each with a `.dlq` sibling.
//! Consumption is lease-based: a worker `dequeue`s a [`WorkItem`], gets a
//! [`LeaseToken`] good for a visibility timeout, and must `ack_complete` or
//! `ack_fail` before it expires or the job becomes eligible for redelivery.
//!
//! ## Quick start
//!
//! ```rust
//! use sentinel_queue::prelude::*;
//! use sentinel_queue::work_item::{WorkItem, WorkItemMetadata, queue_for};
//! use sentinel_core::model::MediaType;
//!
//! let item = WorkItem {
//!     job_id: "job-1".into(),
//!     artifact_id: "art-1".into(),
//!     blob_path: "job-1/report.pdf".into(),
//!     filename: "report.pdf".into(),
//!     media_type: MediaType::Document,
//!     metadata: WorkItemMetadata { language: Some("en".into()) },
//!     attempt: 1,
//! };
//! let queue = queue_for(item.media_type);
//! assert_eq!(queue, "document");
//! ```

pub mod types;
pub mod error;
pub mod backend;
pub mod status;
pub mod work_item;

pub use types::{
    JobId, QueueCtx, JobPriority, JobStatus, JobMessage, JobRecord,
    LeasedJob, QueueCapabilities, JobEvent
};
pub use error::{QueueError, QueueResult};
pub use backend::QueueBackend;
pub use work_item::{WorkItem, WorkItemMetadata, queue_for, dlq_for, GRAPH_QUEUE};
pub use status::{ArtifactStatusEvent, StatusHub};

pub mod prelude {
    pub use crate::QueueBackend;
    pub use crate::{QueueCtx, JobId, JobPriority, JobStatus, QueueResult};
    pub use crate::{WorkItem, WorkItemMetadata, queue_for, dlq_for, GRAPH_QUEUE};
    pub use crate::{ArtifactStatusEvent, StatusHub};
    pub use async_trait::async_trait;
}
