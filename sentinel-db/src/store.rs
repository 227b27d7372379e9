//! [`MetadataStore`]: the relational metadata surface the gateway's write
//! path and the workers' stage pipelines both go through.

use async_trait::async_trait;
use sentinel_core::error::SentinelResult;
use sentinel_core::model::{ActivityLogEntry, Artifact, ArtifactStatus, Chunk, Job, Suspect};
use sentinel_core::rbac::Principal;
use uuid::Uuid;

use crate::types::{JobResults, JobSummary, NewJobInput};

/// One stage's write-back: the new blob this stage produced (if any), the
/// elapsed time to record, and free-text output for stages that produce a
/// human-readable artifact (summarization).
#[derive(Debug, Clone, Default)]
pub struct StageUpdate {
    pub blob_role: Option<(String, String)>,
    pub elapsed_ms: u64,
    pub summary_text: Option<String>,
}

#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Write the Job row, its Suspect rows, and the initial queued Artifact
    /// rows in a single transaction. Returns the created Job with its
    /// assigned `id` and the Artifacts in submission order (their
    /// `id`/`blob_path` are needed to publish the matching work items).
    async fn create_job(&self, input: NewJobInput) -> SentinelResult<(Job, Vec<Artifact>)>;

    async fn get_job(&self, job_id: &str) -> SentinelResult<Job>;

    /// RBAC-filtered single-job fetch: returns the same `not-found` whether
    /// the job does not exist or merely falls outside the principal's view
    /// scope, so a caller can't distinguish the two.
    async fn get_job_scoped(&self, principal: &Principal, job_id: &str) -> SentinelResult<Job>;

    async fn get_artifact(&self, artifact_id: &str) -> SentinelResult<Artifact>;

    /// Record entry into `stage`, overwriting (never appending) any prior
    /// record for the same `(artifact_id, stage)` pair, since delivery is
    /// at-least-once and a stage must be safe to re-run.
    async fn enter_stage(&self, artifact_id: &str, stage: &str) -> SentinelResult<Artifact>;

    /// Record a stage's completion: blob path, elapsed time, and optional
    /// summary text, all keyed by `(artifact_id, stage)` so a retry
    /// overwrites rather than duplicates.
    async fn complete_stage(&self, artifact_id: &str, stage: &str, update: StageUpdate) -> SentinelResult<Artifact>;

    /// Mark an artifact terminal (`completed` or `failed`) and fold the
    /// result into its job's counters via compare-and-set on the job's
    /// `version`, retrying the read-modify-write on conflict.
    async fn finish_artifact(
        &self,
        artifact_id: &str,
        status: ArtifactStatus,
        error: Option<String>,
    ) -> SentinelResult<(Artifact, Job)>;

    /// Mark an artifact as waiting on the shared graph queue's terminal
    /// stage, once its own typed pipeline has finished. Unlike
    /// `finish_artifact`, this does not fold into the job's counters —
    /// only the graph worker closes a job out.
    async fn mark_awaiting_graph(&self, artifact_id: &str) -> SentinelResult<Artifact>;

    async fn insert_chunk(&self, chunk: Chunk) -> SentinelResult<()>;

    /// All suspects recorded against `job_id`, unscoped by RBAC — callers
    /// are worker stages operating on a job they were already handed.
    async fn suspects_for_job(&self, job_id: &str) -> SentinelResult<Vec<Suspect>>;

    async fn get_chunk(&self, chunk_id: Uuid) -> SentinelResult<Chunk>;

    async fn append_activity_log(&self, entry: ActivityLogEntry) -> SentinelResult<()>;

    async fn suspects_count(&self, job_id: &str) -> SentinelResult<u32>;

    /// RBAC-filtered job listing, optionally narrowed to one case.
    async fn list_jobs(
        &self,
        principal: &Principal,
        case_name: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> SentinelResult<Vec<JobSummary>>;

    /// RBAC-filtered full results bundle for one job.
    async fn get_results(&self, principal: &Principal, job_id: &str) -> SentinelResult<JobResults>;

    /// RBAC-filtered distinct case names the principal can see jobs in.
    async fn list_cases(&self, principal: &Principal) -> SentinelResult<Vec<String>>;

    /// RBAC-filtered jobs within one case.
    async fn case_jobs(&self, principal: &Principal, case_name: &str) -> SentinelResult<Vec<JobSummary>>;
}
