//! Request/response shapes for [`crate::store::MetadataStore`] that don't
//! belong on the shared domain model itself (upload inputs, RBAC-filtered
//! list views, the bundled results payload).

use sentinel_core::model::{Artifact, Job, MediaType, Suspect};
use uuid::Uuid;

/// One file plus its declared media type/language, as submitted in a single
/// upload call. `job_id`/`id` are assigned by the store on insert.
#[derive(Debug, Clone)]
pub struct NewArtifactInput {
    pub filename: String,
    pub media_type: MediaType,
    pub source_language: Option<String>,
    pub blob_path: String,
}

/// One suspect's ordered key/value fields, as submitted with a job.
#[derive(Debug, Clone)]
pub struct NewSuspectInput {
    pub fields: Vec<(String, String)>,
}

/// Everything the atomic upload transaction needs to write in one go: the
/// Job row, its Suspect rows, and the initial (queued) Artifact rows.
#[derive(Debug, Clone)]
pub struct NewJobInput {
    /// Pre-generated by the caller (the gateway) so the blob keys it writes
    /// under `<job_id>/<filename>` agree with the row this transaction
    /// creates.
    pub job_id: String,
    pub case_name: String,
    pub owner_id: Uuid,
    /// Denormalized at write time from the creating principal, so RBAC
    /// scoping at read time never needs a join against the user table.
    pub owner_supervisor_id: Option<Uuid>,
    pub artifacts: Vec<NewArtifactInput>,
    pub suspects: Vec<NewSuspectInput>,
}

/// A job enriched with derived counters for list views.
#[derive(Debug, Clone, serde::Serialize)]
pub struct JobSummary {
    #[serde(flatten)]
    pub job: Job,
    pub suspects_count: u32,
}

/// The full bundle returned by `GET /jobs/{job_id}/results`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct JobResults {
    pub job: Job,
    pub artifacts: Vec<Artifact>,
    pub suspects: Vec<Suspect>,
}
