use axum::extract::{Multipart, State};
use axum::Json;

use crate::auth::AuthenticatedPrincipal;
use crate::error::GatewayResult;
use crate::state::GatewayState;
use crate::upload::{handle_upload, UploadResponse};

pub async fn upload(
    State(state): State<GatewayState>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    multipart: Multipart,
) -> GatewayResult<Json<UploadResponse>> {
    let response = handle_upload(&state, &principal, multipart).await?;
    Ok(Json(response))
}
