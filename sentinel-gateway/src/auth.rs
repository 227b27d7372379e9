//! Bearer-token authentication extractor: every handler that takes a
//! [`Principal`] gets one for free, or the request is rejected before the
//! handler body runs.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use sentinel_auth::{extract_bearer_token, verify_token};
use sentinel_core::error::SentinelError;
use sentinel_core::rbac::Principal;

use crate::error::GatewayError;
use crate::state::GatewayState;

pub struct AuthenticatedPrincipal(pub Principal);

impl FromRequestParts<GatewayState> for AuthenticatedPrincipal {
    type Rejection = GatewayError;

    async fn from_request_parts(parts: &mut Parts, state: &GatewayState) -> Result<Self, Self::Rejection> {
        let header = parts.headers.get(axum::http::header::AUTHORIZATION).and_then(|v| v.to_str().ok());
        let token = extract_bearer_token(header).ok_or_else(|| SentinelError::authorization("missing bearer token"))?;
        let principal = verify_token(&state.jwt, token)?;
        Ok(AuthenticatedPrincipal(principal))
    }
}

/// Rejects with `authorization` unless the caller is an admin. Used by the
/// DLQ endpoints, which are not scoped by ownership at all.
pub fn require_admin(principal: &Principal) -> Result<(), SentinelError> {
    if principal.role == sentinel_core::model::Role::Admin {
        Ok(())
    } else {
        Err(SentinelError::authorization("admin role required"))
    }
}
