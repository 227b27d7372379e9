//! HTTP surface: bearer-authenticated upload, RBAC-scoped job/case reads,
//! SSE status streaming, and admin DLQ inspection, built as a small
//! `axum::Router` app-builder over the fabric's other crates.

pub mod app;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod state;
pub mod upload;

pub use app::GatewayApp;
pub use error::{GatewayError, GatewayResult};
pub use state::GatewayState;
