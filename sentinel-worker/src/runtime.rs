//! The worker loop: dequeue a [`WorkItem`], run it through its media type's
//! stage sequence (or the shared graph pipeline, for the `graph` queue),
//! and ack. Mirrors the shape of [`sentinel_queue::adapter`]'s
//! `Worker::run`/`process_next_job`, generalized from dispatch-by-registered-
//! job-type to the fixed per-media-type stage pipelines built in
//! [`crate::pipelines`].

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use sentinel_core::config::QueueRetryConfig;
use sentinel_core::error::{SentinelError, SentinelResult};
use sentinel_core::model::{Artifact, ArtifactStatus};
use sentinel_db::StageUpdate;
use sentinel_queue::backend::QueueBackend;
use sentinel_queue::status::{ArtifactStatusEvent, StatusHub};
use sentinel_queue::types::{JobId, LeasedJob, LeaseToken};
use sentinel_queue::work_item::GRAPH_QUEUE;
use sentinel_queue::{JobMessage, QueueCtx, WorkItem};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::pipelines::{graph_pipeline, stages_for};
use crate::stage::{Stage, StageInput, WorkerContext};

/// Drives typed-media worker loops and the graph worker loop against one
/// [`QueueBackend`]. One instance is shared by every task spawned for a
/// process; `run_typed`/`run_graph` are cheap to call repeatedly from
/// separate `tokio::spawn`s, one per queue.
pub struct WorkerRuntime<B: QueueBackend + ?Sized> {
    backend: Arc<B>,
    context: Arc<WorkerContext>,
    status_hub: Arc<StatusHub>,
    retry: QueueRetryConfig,
    tenant_id: String,
}

impl<B: QueueBackend + Send + Sync + 'static> WorkerRuntime<B> {
    pub fn new(backend: Arc<B>, context: Arc<WorkerContext>, status_hub: Arc<StatusHub>, retry: QueueRetryConfig, tenant_id: String) -> Self {
        Self { backend, context, status_hub, retry, tenant_id }
    }

    fn ctx(&self) -> QueueCtx {
        QueueCtx::new(self.tenant_id.clone())
    }

    /// Polls `queues` (typed-media queue names) until `shutdown` resolves.
    pub async fn run_typed(&self, queues: &[&str], mut shutdown: oneshot::Receiver<()>) {
        info!(?queues, "typed worker loop started");
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(?queues, "typed worker loop shutting down");
                    break;
                }
                processed = self.process_next_typed(queues) => {
                    self.idle_on_empty_or_error(processed).await;
                }
            }
        }
    }

    /// Polls the shared `graph` queue until `shutdown` resolves.
    pub async fn run_graph(&self, mut shutdown: oneshot::Receiver<()>) {
        info!("graph worker loop started");
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("graph worker loop shutting down");
                    break;
                }
                processed = self.process_next_graph() => {
                    self.idle_on_empty_or_error(processed).await;
                }
            }
        }
    }

    async fn idle_on_empty_or_error(&self, processed: SentinelResult<bool>) {
        match processed {
            Ok(true) => {}
            Ok(false) => tokio::time::sleep(Duration::from_millis(200)).await,
            Err(e) => {
                error!(error = %e, "worker loop iteration failed");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }

    /// Runs one dequeue-and-process iteration against `queues`. Returns
    /// `Ok(false)` when there was nothing to dequeue. Exposed beyond
    /// `run_typed`'s loop so tests can drive the runtime one step at a time.
    pub async fn process_next_typed(&self, queues: &[&str]) -> SentinelResult<bool> {
        let leased = match self.backend.dequeue(self.ctx(), queues).await.map_err(queue_err)? {
            Some(leased) => leased,
            None => return Ok(false),
        };

        let item: WorkItem = decode_work_item(&leased)?;
        let stages = stages_for(item.media_type);

        match self.run_stages(&item, &stages, &leased).await {
            Ok(final_blob_path) => {
                self.backend
                    .ack_complete(self.ctx(), leased.job_id().clone(), leased.lease_token.clone(), None)
                    .await
                    .map_err(queue_err)?;
                let artifact = self.context.metadata.mark_awaiting_graph(&item.artifact_id).await?;
                self.publish_artifact_event(&artifact, None, None);
                self.enqueue_graph_handoff(&item, final_blob_path).await?;
                info!(job_id = %item.job_id, artifact_id = %item.artifact_id, "artifact pipeline completed, handed off to graph queue");
            }
            Err((stage_name, err)) => {
                self.handle_stage_failure(&item, &leased, stage_name, err).await?;
            }
        }

        Ok(true)
    }

    /// Single-iteration counterpart to `process_next_typed` for the shared
    /// graph queue.
    pub async fn process_next_graph(&self) -> SentinelResult<bool> {
        let leased = match self.backend.dequeue(self.ctx(), &[GRAPH_QUEUE]).await.map_err(queue_err)? {
            Some(leased) => leased,
            None => return Ok(false),
        };

        let item: WorkItem = decode_work_item(&leased)?;
        let stages = graph_pipeline();

        match self.run_stages(&item, &stages, &leased).await {
            Ok(_) => {
                self.backend
                    .ack_complete(self.ctx(), leased.job_id().clone(), leased.lease_token.clone(), None)
                    .await
                    .map_err(queue_err)?;
                // Only the graph worker closes out the Job's terminal status;
                // typed pipelines mutate Artifact fields but hand off here.
                let (artifact, job) = self.context.metadata.finish_artifact(&item.artifact_id, ArtifactStatus::Completed, None).await?;
                self.publish_artifact_event(&artifact, None, None);
                debug!(job_id = %job.id, job_status = ?job.status, "job counters updated after graph stage");
            }
            Err((stage_name, err)) => {
                self.handle_stage_failure(&item, &leased, stage_name, err).await?;
            }
        }

        Ok(true)
    }

    async fn enqueue_graph_handoff(&self, item: &WorkItem, final_blob_path: String) -> SentinelResult<()> {
        let graph_item = WorkItem {
            job_id: item.job_id.clone(),
            artifact_id: item.artifact_id.clone(),
            blob_path: final_blob_path,
            filename: item.filename.clone(),
            media_type: item.media_type,
            metadata: item.metadata.clone(),
            attempt: 0,
        };
        let payload = serde_json::to_vec(&graph_item).map_err(|e| SentinelError::fatal(e.to_string()))?;
        let message = JobMessage::new("extract_graph".to_string(), payload, "json".to_string(), GRAPH_QUEUE.to_string())
            .with_max_retries(self.retry.max_retries);
        self.backend.enqueue(self.ctx(), message).await.map_err(queue_err)?;
        Ok(())
    }

    /// Runs `stages` in order, re-reading/writing the Artifact's blob path
    /// through the metadata store between each (stage-local state only — see
    /// [`crate::stage`]). Returns the final blob path on success, or the
    /// name of the stage that failed alongside its error.
    async fn run_stages(&self, item: &WorkItem, stages: &[Arc<dyn Stage>], leased: &LeasedJob) -> Result<String, (&'static str, SentinelError)> {
        let mut blob_path = item.blob_path.clone();

        for stage in stages {
            let input = StageInput {
                job_id: item.job_id.clone(),
                artifact_id: item.artifact_id.clone(),
                filename: item.filename.clone(),
                source_language: item.metadata.language.clone(),
                blob_path: blob_path.clone(),
            };

            let artifact = self
                .context
                .metadata
                .enter_stage(&item.artifact_id, stage.name())
                .await
                .map_err(|e| (stage.name(), e))?;
            self.publish_artifact_event(&artifact, Some(stage.name()), None);

            let (stop_tx, stop_rx) = oneshot::channel();
            let heartbeat = self.spawn_heartbeat(leased.job_id().clone(), leased.lease_token.clone(), stop_rx);

            let started = std::time::Instant::now();
            let result = stage.run(&self.context, &input).await;
            let _ = stop_tx.send(());
            let _ = heartbeat.await;

            let output = match result {
                Ok(output) => output,
                Err(e) => return Err((stage.name(), e)),
            };

            let elapsed_ms = started.elapsed().as_millis() as u64;
            let update = StageUpdate {
                blob_role: output.blob_role.clone(),
                elapsed_ms,
                summary_text: output.summary_text.clone(),
            };
            let artifact = self
                .context
                .metadata
                .complete_stage(&item.artifact_id, stage.name(), update)
                .await
                .map_err(|e| (stage.name(), e))?;
            self.publish_artifact_event(&artifact, Some(stage.name()), None);

            blob_path = output.next_blob_path;
        }

        Ok(blob_path)
    }

    /// Extends the lease on a fixed interval for the duration of one stage's
    /// run; stopped by dropping/sending on `stop_rx`. Failure to extend
    /// (lease already reassigned elsewhere) ends the task quietly — the
    /// stage itself will fail its ack once its lease token is rejected.
    fn spawn_heartbeat(&self, job_id: JobId, lease_token: LeaseToken, mut stop_rx: oneshot::Receiver<()>) -> JoinHandle<()> {
        let backend = self.backend.clone();
        let tenant_id = self.tenant_id.clone();
        let period = self.retry.visibility_timeout() / 2;
        let extension = self.retry.visibility_timeout();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period.max(Duration::from_secs(1)));
            ticker.tick().await; // first tick fires immediately; skip it
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        let ctx = QueueCtx::new(tenant_id.clone());
                        if backend.heartbeat_extend(ctx, job_id.clone(), lease_token.clone(), extension).await.is_err() {
                            break;
                        }
                    }
                }
            }
        })
    }

    async fn handle_stage_failure(&self, item: &WorkItem, leased: &LeasedJob, stage_name: &str, err: SentinelError) -> SentinelResult<()> {
        warn!(job_id = %item.job_id, artifact_id = %item.artifact_id, stage = stage_name, error = %err, "stage failed");

        let attempt = leased.record.attempt;
        let max_retries = leased.record.message.max_retries;
        let retry_at = if err.kind.is_retryable() && attempt <= max_retries {
            chrono::Duration::from_std(self.retry.backoff_for_attempt(attempt))
                .ok()
                .map(|backoff| chrono::Utc::now() + backoff)
        } else {
            None
        };

        self.backend
            .ack_fail(self.ctx(), leased.job_id().clone(), leased.lease_token.clone(), err.message.clone(), retry_at)
            .await
            .map_err(queue_err)?;

        // Only terminate the Artifact (and fold into the Job's counters) once
        // retries are exhausted or the failure is permanent — a scheduled
        // retry leaves the Artifact mid-pipeline.
        if retry_at.is_none() {
            let (artifact, job) = self
                .context
                .metadata
                .finish_artifact(&item.artifact_id, ArtifactStatus::Failed, Some(err.message.clone()))
                .await?;
            self.publish_artifact_event(&artifact, None, Some(err.message));
            debug!(job_id = %job.id, job_status = ?job.status, "job counters updated after artifact failure");
        }

        Ok(())
    }

    fn publish_artifact_event(&self, artifact: &Artifact, current_stage: Option<&str>, error: Option<String>) {
        let stages: BTreeMap<String, f64> = artifact.processing_stages.iter().map(|(k, v)| (k.clone(), *v as f64)).collect();
        let mut event = ArtifactStatusEvent::new(artifact.job_id.clone(), artifact.id.clone(), artifact.filename.clone(), artifact_status_name(artifact.status))
            .with_processing_stages(stages);
        if let Some(stage) = current_stage.or(artifact.current_stage.as_deref()) {
            event = event.with_stage(stage);
        }
        if let Some(message) = error {
            event = event.with_error(message);
        }
        self.status_hub.publish_status(&artifact.job_id, event);
    }
}

fn decode_work_item(leased: &LeasedJob) -> SentinelResult<WorkItem> {
    serde_json::from_slice(&leased.message().payload_bytes).map_err(|e| SentinelError::stage_failed(format!("malformed work item payload: {e}")))
}

fn artifact_status_name(status: ArtifactStatus) -> &'static str {
    match status {
        ArtifactStatus::Queued => "queued",
        ArtifactStatus::Processing => "processing",
        ArtifactStatus::AwaitingGraph => "awaiting_graph",
        ArtifactStatus::Completed => "completed",
        ArtifactStatus::Failed => "failed",
    }
}

/// Queue-fabric errors surfaced while driving the loop itself (dequeue/ack
/// races, not stage failures) are treated as transient: the next poll will
/// either see the job again or see it handled by whoever won the race.
fn queue_err(err: sentinel_queue::QueueError) -> SentinelError {
    SentinelError::transient_io(err.to_string())
}
