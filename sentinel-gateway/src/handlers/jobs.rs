use axum::extract::{Path, Query, State};
use axum::Json;
use sentinel_core::model::Job;
use sentinel_db::{JobResults, JobSummary};
use serde::Deserialize;

use crate::auth::AuthenticatedPrincipal;
use crate::error::GatewayResult;
use crate::state::GatewayState;

const DEFAULT_LIMIT: u32 = 50;

#[derive(Debug, Deserialize)]
pub struct ListJobsQuery {
    pub case_name: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

pub async fn list_jobs(
    State(state): State<GatewayState>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    Query(query): Query<ListJobsQuery>,
) -> GatewayResult<Json<Vec<JobSummary>>> {
    let jobs = state.metadata.list_jobs(&principal, query.case_name.as_deref(), query.limit, query.offset).await?;
    Ok(Json(jobs))
}

pub async fn get_job(
    State(state): State<GatewayState>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    Path(job_id): Path<String>,
) -> GatewayResult<Json<Job>> {
    let job = state.metadata.get_job_scoped(&principal, &job_id).await?;
    Ok(Json(job))
}

pub async fn get_results(
    State(state): State<GatewayState>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    Path(job_id): Path<String>,
) -> GatewayResult<Json<JobResults>> {
    let results = state.metadata.get_results(&principal, &job_id).await?;
    Ok(Json(results))
}
