//! Admin-only dead-letter-queue inspection and requeue. Not RBAC-scoped by
//! ownership at all — gated solely on role, since a DLQ holds work items,
//! not job-owned rows.

use axum::extract::{Path, State};
use axum::Json;
use sentinel_queue::{JobId, JobRecord, QueueCtx};
use serde::{Deserialize, Serialize};

use crate::auth::{require_admin, AuthenticatedPrincipal};
use crate::error::GatewayResult;
use crate::state::GatewayState;

#[derive(Debug, Deserialize)]
pub struct RequeueRequest {
    pub job_id: String,
}

#[derive(Debug, Serialize)]
pub struct RequeueResponse {
    pub queue: String,
    pub job_id: String,
    pub requeued: bool,
}

pub async fn list_dlq(
    State(state): State<GatewayState>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    Path(queue): Path<String>,
) -> GatewayResult<Json<Vec<JobRecord>>> {
    require_admin(&principal)?;
    let ctx = QueueCtx::new(state.tenant_id.clone());
    let records = state.queue.list_dlq(ctx, &queue).await.map_err(|e| sentinel_core::error::SentinelError::transient_io(e.to_string()))?;
    Ok(Json(records))
}

pub async fn requeue(
    State(state): State<GatewayState>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    Path(queue): Path<String>,
    Json(body): Json<RequeueRequest>,
) -> GatewayResult<Json<RequeueResponse>> {
    require_admin(&principal)?;
    let ctx = QueueCtx::new(state.tenant_id.clone());
    state
        .queue
        .requeue_from_dlq(ctx, &queue, JobId::from_string(body.job_id.clone()))
        .await
        .map_err(|e| sentinel_core::error::SentinelError::transient_io(e.to_string()))?;
    Ok(Json(RequeueResponse { queue, job_id: body.job_id, requeued: true }))
}
