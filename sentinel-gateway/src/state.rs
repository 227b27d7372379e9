//! Shared, clone-cheap handle to every collaborator a handler needs:
//! metadata store, blob store, queue backend, status hub, and the
//! JWT/retry configuration carried from [`sentinel_core::config::SentinelConfig`].

use std::sync::Arc;

use sentinel_auth::JwtConfig;
use sentinel_blob::BlobStore;
use sentinel_core::config::{GatewayConfig, QueueRetryConfig};
use sentinel_db::MetadataStore;
use sentinel_queue::backend::QueueBackend;
use sentinel_queue::status::StatusHub;

#[derive(Clone)]
pub struct GatewayState {
    pub metadata: Arc<dyn MetadataStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub queue: Arc<dyn QueueBackend>,
    pub status_hub: Arc<StatusHub>,
    pub jwt: JwtConfig,
    pub retry: QueueRetryConfig,
    pub gateway: GatewayConfig,
    /// Single-tenant deployments use a fixed context; multi-tenant hosting
    /// is explicitly out of scope (see the purpose-and-scope non-goals).
    pub tenant_id: String,
}

impl GatewayState {
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        blobs: Arc<dyn BlobStore>,
        queue: Arc<dyn QueueBackend>,
        status_hub: Arc<StatusHub>,
        jwt: JwtConfig,
        retry: QueueRetryConfig,
        gateway: GatewayConfig,
    ) -> Self {
        Self {
            metadata,
            blobs,
            queue,
            status_hub,
            jwt,
            retry,
            gateway,
            tenant_id: "default".to_string(),
        }
    }
}
