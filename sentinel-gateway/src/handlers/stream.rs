//! `GET /jobs/{job_id}/status/stream`: snapshot current artifact statuses
//! from the Metadata Store, then forward every event broadcast on the
//! job's status channel until the job reaches a terminal state or the
//! client disconnects, per the status pub/sub contract (the channel never
//! replays, so the snapshot always comes from the store).

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::Stream;
use sentinel_core::model::{Artifact, ArtifactStatus};
use sentinel_queue::status::ArtifactStatusEvent;

use crate::auth::AuthenticatedPrincipal;
use crate::error::GatewayResult;
use crate::state::GatewayState;

fn artifact_status_name(status: ArtifactStatus) -> &'static str {
    match status {
        ArtifactStatus::Queued => "queued",
        ArtifactStatus::Processing => "processing",
        ArtifactStatus::AwaitingGraph => "awaiting_graph",
        ArtifactStatus::Completed => "completed",
        ArtifactStatus::Failed => "failed",
    }
}

fn snapshot_event(artifact: &Artifact) -> ArtifactStatusEvent {
    let stages = artifact.processing_stages.iter().map(|(k, v)| (k.clone(), *v as f64)).collect();
    let mut event = ArtifactStatusEvent::new(artifact.job_id.clone(), artifact.id.clone(), artifact.filename.clone(), artifact_status_name(artifact.status))
        .with_processing_stages(stages);
    if let Some(stage) = &artifact.current_stage {
        event = event.with_stage(stage.clone());
    }
    if let Some(err) = &artifact.error {
        event = event.with_error(err.clone());
    }
    event
}

fn is_terminal(status: &str) -> bool {
    status == "completed" || status == "failed"
}

fn to_sse_event(event: &ArtifactStatusEvent) -> Event {
    Event::default().event("artifact_status").json_data(event).unwrap_or_else(|_| Event::default().event("artifact_status").data("{}"))
}

fn terminal_event(job_id: &str) -> Event {
    Event::default().event("job_terminal").data(format!("{{\"job_id\":\"{job_id}\"}}"))
}

pub async fn stream_status(
    State(state): State<GatewayState>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    Path(job_id): Path<String>,
) -> GatewayResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let results = state.metadata.get_results(&principal, &job_id).await?;

    let total = results.job.artifact_count;
    let mut done = results.artifacts.iter().filter(|a| matches!(a.status, ArtifactStatus::Completed | ArtifactStatus::Failed)).count() as u32;
    let snapshot: Vec<ArtifactStatusEvent> = results.artifacts.iter().map(snapshot_event).collect();

    let mut receiver = state.status_hub.subscribe_status(&job_id);

    let stream = async_stream::stream! {
        for event in &snapshot {
            yield Ok(to_sse_event(event));
        }

        if total == 0 || done >= total {
            yield Ok(terminal_event(&job_id));
            return;
        }

        loop {
            match receiver.recv().await {
                Ok(event) => {
                    let terminal = is_terminal(&event.status);
                    yield Ok(to_sse_event(&event));
                    if terminal {
                        done += 1;
                        if done >= total {
                            yield Ok(terminal_event(&job_id));
                            return;
                        }
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => return,
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default().interval(Duration::from_secs(15))))
}
