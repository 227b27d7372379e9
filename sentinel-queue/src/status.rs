//! Per-job status pub/sub: `job_status:{job_id}`.
//!
//! Generalizes the backend's single global `event_broadcaster` (see
//! [`crate::observability::analytics`]) to one `broadcast` channel per job,
//! since SSE subscribers only ever care about one job at a time and a
//! global channel would make every subscriber filter every other job's
//! traffic. Not durable: a subscriber that misses an event must reconcile
//! from the Metadata Store, as spec'd.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 256;

/// One artifact-status delta, broadcast on `job_status:{job_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactStatusEvent {
    #[serde(rename = "type")]
    pub event_type: &'static str,
    pub job_id: String,
    pub artifact_id: String,
    pub filename: String,
    pub status: String,
    pub current_stage: Option<String>,
    pub processing_stages: std::collections::BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ArtifactStatusEvent {
    pub fn new(
        job_id: impl Into<String>,
        artifact_id: impl Into<String>,
        filename: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            event_type: "artifact_status",
            job_id: job_id.into(),
            artifact_id: artifact_id.into(),
            filename: filename.into(),
            status: status.into(),
            current_stage: None,
            processing_stages: Default::default(),
            error_message: None,
        }
    }

    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.current_stage = Some(stage.into());
        self
    }

    pub fn with_processing_stages(mut self, stages: std::collections::BTreeMap<String, f64>) -> Self {
        self.processing_stages = stages;
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }
}

/// Registry of one broadcast channel per `job_id`, created lazily on first
/// publish or subscribe and never explicitly torn down (channels with no
/// receivers are cheap; a bounded process lifetime reaps them naturally).
#[derive(Default)]
pub struct StatusHub {
    channels: Mutex<HashMap<String, broadcast::Sender<ArtifactStatusEvent>>>,
}

impl StatusHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn channel(&self, job_id: &str) -> broadcast::Sender<ArtifactStatusEvent> {
        let mut channels = self.channels.lock().unwrap();
        channels
            .entry(job_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }

    /// Broadcast an event on `job_status:{job_id}`. Best-effort: if there
    /// are no current subscribers this is a no-op.
    pub fn publish_status(&self, job_id: &str, event: ArtifactStatusEvent) {
        let sender = self.channel(job_id);
        let _ = sender.send(event);
    }

    /// Subscribe to `job_status:{job_id}`. Events published before this
    /// call are not replayed.
    pub fn subscribe_status(&self, job_id: &str) -> broadcast::Receiver<ArtifactStatusEvent> {
        self.channel(job_id).subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let hub = StatusHub::new();
        let mut rx = hub.subscribe_status("job-1");

        hub.publish_status(
            "job-1",
            ArtifactStatusEvent::new("job-1", "art-1", "report.pdf", "processing").with_stage("extract_text"),
        );

        let event = rx.recv().await.unwrap();
        assert_eq!(event.artifact_id, "art-1");
        assert_eq!(event.current_stage.as_deref(), Some("extract_text"));
    }

    #[tokio::test]
    async fn subscribers_on_different_jobs_are_isolated() {
        let hub = StatusHub::new();
        let mut rx_a = hub.subscribe_status("job-a");
        let mut rx_b = hub.subscribe_status("job-b");

        hub.publish_status("job-a", ArtifactStatusEvent::new("job-a", "art-1", "f.pdf", "completed"));

        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let hub = StatusHub::new();
        hub.publish_status("job-x", ArtifactStatusEvent::new("job-x", "art-1", "f.pdf", "queued"));
    }
}
