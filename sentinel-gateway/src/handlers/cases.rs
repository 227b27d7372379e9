use axum::extract::{Path, State};
use axum::Json;
use sentinel_db::JobSummary;

use crate::auth::AuthenticatedPrincipal;
use crate::error::GatewayResult;
use crate::state::GatewayState;

pub async fn list_cases(State(state): State<GatewayState>, AuthenticatedPrincipal(principal): AuthenticatedPrincipal) -> GatewayResult<Json<Vec<String>>> {
    let cases = state.metadata.list_cases(&principal).await?;
    Ok(Json(cases))
}

pub async fn case_jobs(
    State(state): State<GatewayState>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    Path(case_name): Path<String>,
) -> GatewayResult<Json<Vec<JobSummary>>> {
    let jobs = state.metadata.case_jobs(&principal, &case_name).await?;
    Ok(Json(jobs))
}
