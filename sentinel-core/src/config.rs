//! Typed, init-time-loaded configuration.
//!
//! Loaded once at process startup from a YAML file plus environment
//! overrides (`SENTINEL__SECTION__KEY`), then handed around behind `Arc`.
//! There is no runtime mutation path, unlike a flat `app.set`/`app.get`
//! store: every setting here is read many times per second from hot
//! request/worker paths and is known in full at startup.

use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_bind")]
    pub bind_addr: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_max_upload_bytes() -> u64 {
    512 * 1024 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueRetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_base_secs")]
    pub backoff_base_secs: u64,
    #[serde(default = "default_visibility_timeout_secs")]
    pub visibility_timeout_secs: u64,
    /// How long a job stays in a dead-letter queue before the reaper
    /// purges it for good.
    #[serde(default = "default_dlq_retention_days")]
    pub dlq_retention_days: u64,
}

fn default_max_retries() -> u32 {
    3
}
fn default_backoff_base_secs() -> u64 {
    60
}
fn default_visibility_timeout_secs() -> u64 {
    30
}
fn default_dlq_retention_days() -> u64 {
    7
}

impl Default for QueueRetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff_base_secs: default_backoff_base_secs(),
            visibility_timeout_secs: default_visibility_timeout_secs(),
            dlq_retention_days: default_dlq_retention_days(),
        }
    }
}

impl QueueRetryConfig {
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let secs = self.backoff_base_secs.saturating_mul(1u64 << attempt.saturating_sub(1).min(16));
        Duration::from_secs(secs)
    }

    pub fn visibility_timeout(&self) -> Duration {
        Duration::from_secs(self.visibility_timeout_secs)
    }

    pub fn dlq_retention(&self) -> Duration {
        Duration::from_secs(self.dlq_retention_days.saturating_mul(86_400))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency_per_queue: usize,
}

fn default_concurrency() -> usize {
    4
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency_per_queue: default_concurrency(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_backend")]
    pub backend: String,
    pub s3_bucket: Option<String>,
    pub s3_endpoint: Option<String>,
    pub database_url: Option<String>,
}

fn default_backend() -> String {
    "memory".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            s3_bucket: None,
            s3_endpoint: None,
            database_url: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_jwt_ttl_secs")]
    pub jwt_ttl_secs: u64,
    /// Read from `SENTINEL__AUTH__JWT_SECRET` in production; never committed.
    pub jwt_secret: Option<String>,
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

fn default_jwt_ttl_secs() -> u64 {
    3600
}
fn default_bcrypt_cost() -> u32 {
    10
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_ttl_secs: default_jwt_ttl_secs(),
            jwt_secret: None,
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SentinelConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub queue: QueueRetryConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl SentinelConfig {
    /// Load from an optional YAML file plus `SENTINEL__`-prefixed env
    /// overrides (double underscore separates nesting, as in
    /// `SENTINEL__QUEUE__MAX_RETRIES=5`).
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("SENTINEL")
                .separator("__")
                .try_parsing(true),
        );
        let cfg = builder.build()?;
        Ok(cfg.try_deserialize().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_per_attempt() {
        let cfg = QueueRetryConfig::default();
        assert_eq!(cfg.backoff_for_attempt(1), Duration::from_secs(60));
        assert_eq!(cfg.backoff_for_attempt(2), Duration::from_secs(120));
        assert_eq!(cfg.backoff_for_attempt(3), Duration::from_secs(240));
    }

    #[test]
    fn dlq_retention_defaults_to_seven_days() {
        let cfg = QueueRetryConfig::default();
        assert_eq!(cfg.dlq_retention(), Duration::from_secs(7 * 86_400));
    }

    #[test]
    fn load_with_no_file_uses_defaults() {
        let cfg = SentinelConfig::load(None).expect("defaults must load");
        assert_eq!(cfg.queue.max_retries, 3);
        assert_eq!(cfg.gateway.bind_addr, "0.0.0.0:8080");
    }
}
