//! In-memory [`MetadataStore`], used in tests and as the default when no
//! Postgres deployment is configured. Same shape and locking discipline as
//! `sentinel_graph::store::MemoryGraphStore`: one `Mutex`-guarded map per
//! entity, good enough for a single process.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use sentinel_core::error::{SentinelError, SentinelResult};
use sentinel_core::model::{
    ActivityLogEntry, Artifact, ArtifactStatus, Chunk, Job, JobStatus, Suspect, SuspectField,
};
use sentinel_core::rbac::Principal;
use uuid::Uuid;

use crate::store::{MetadataStore, StageUpdate};
use crate::types::{JobResults, JobSummary, NewJobInput};

struct StoredJob {
    job: Job,
    owner_supervisor_id: Option<Uuid>,
}

#[derive(Default)]
pub struct MemoryMetadataStore {
    jobs: Mutex<HashMap<String, StoredJob>>,
    artifacts: Mutex<HashMap<String, Artifact>>,
    suspects: Mutex<HashMap<String, Vec<Suspect>>>,
    chunks: Mutex<HashMap<Uuid, Chunk>>,
    activity: Mutex<Vec<ActivityLogEntry>>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn visible(principal: &Principal, stored: &StoredJob) -> bool {
        principal.can_view_job(&stored.job.id, stored.job.owner_id, stored.owner_supervisor_id)
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn create_job(&self, input: NewJobInput) -> SentinelResult<(Job, Vec<Artifact>)> {
        let job_id = input.job_id.clone();
        let now = Utc::now();
        let job = Job {
            id: job_id.clone(),
            case_name: input.case_name,
            owner_id: input.owner_id,
            status: JobStatus::Queued,
            artifact_count: input.artifacts.len() as u32,
            completed_count: 0,
            failed_count: 0,
            version: 0,
            created_at: now,
            updated_at: now,
        };

        let artifacts: Vec<Artifact> = input
            .artifacts
            .into_iter()
            .map(|a| Artifact {
                id: Uuid::new_v4().to_string(),
                job_id: job_id.clone(),
                filename: a.filename,
                media_type: a.media_type,
                source_language: a.source_language,
                blob_path: a.blob_path,
                blob_paths: Default::default(),
                status: ArtifactStatus::Queued,
                current_stage: None,
                processing_stages: Default::default(),
                summary_text: None,
                error: None,
                created_at: now,
                updated_at: now,
            })
            .collect();

        let suspects: Vec<Suspect> = input
            .suspects
            .into_iter()
            .map(|s| Suspect {
                id: Uuid::new_v4(),
                job_id: job_id.clone(),
                fields: s
                    .fields
                    .into_iter()
                    .map(|(key, value)| SuspectField { id: Uuid::new_v4(), key, value })
                    .collect(),
            })
            .collect();

        self.jobs.lock().unwrap().insert(
            job_id.clone(),
            StoredJob { job: job.clone(), owner_supervisor_id: input.owner_supervisor_id },
        );
        for artifact in &artifacts {
            self.artifacts.lock().unwrap().insert(artifact.id.clone(), artifact.clone());
        }
        self.suspects.lock().unwrap().insert(job_id, suspects);

        Ok((job, artifacts))
    }

    async fn get_job(&self, job_id: &str) -> SentinelResult<Job> {
        self.jobs
            .lock()
            .unwrap()
            .get(job_id)
            .map(|s| s.job.clone())
            .ok_or_else(|| SentinelError::not_found(format!("job {job_id} not found")))
    }

    async fn get_job_scoped(&self, principal: &Principal, job_id: &str) -> SentinelResult<Job> {
        self.jobs
            .lock()
            .unwrap()
            .get(job_id)
            .filter(|s| Self::visible(principal, s))
            .map(|s| s.job.clone())
            .ok_or_else(|| SentinelError::not_found(format!("job {job_id} not found")))
    }

    async fn get_artifact(&self, artifact_id: &str) -> SentinelResult<Artifact> {
        self.artifacts
            .lock()
            .unwrap()
            .get(artifact_id)
            .cloned()
            .ok_or_else(|| SentinelError::not_found(format!("artifact {artifact_id} not found")))
    }

    async fn enter_stage(&self, artifact_id: &str, stage: &str) -> SentinelResult<Artifact> {
        let mut artifacts = self.artifacts.lock().unwrap();
        let artifact = artifacts
            .get_mut(artifact_id)
            .ok_or_else(|| SentinelError::not_found(format!("artifact {artifact_id} not found")))?;
        artifact.status = ArtifactStatus::Processing;
        artifact.current_stage = Some(stage.to_string());
        artifact.updated_at = Utc::now();
        Ok(artifact.clone())
    }

    async fn complete_stage(&self, artifact_id: &str, stage: &str, update: StageUpdate) -> SentinelResult<Artifact> {
        let mut artifacts = self.artifacts.lock().unwrap();
        let artifact = artifacts
            .get_mut(artifact_id)
            .ok_or_else(|| SentinelError::not_found(format!("artifact {artifact_id} not found")))?;
        artifact.processing_stages.insert(stage.to_string(), update.elapsed_ms);
        if let Some((role, path)) = update.blob_role {
            artifact.blob_paths.insert(role, path);
        }
        if let Some(summary) = update.summary_text {
            artifact.summary_text = Some(summary);
        }
        artifact.updated_at = Utc::now();
        Ok(artifact.clone())
    }

    async fn finish_artifact(
        &self,
        artifact_id: &str,
        status: ArtifactStatus,
        error: Option<String>,
    ) -> SentinelResult<(Artifact, Job)> {
        let job_id = {
            let mut artifacts = self.artifacts.lock().unwrap();
            let artifact = artifacts
                .get_mut(artifact_id)
                .ok_or_else(|| SentinelError::not_found(format!("artifact {artifact_id} not found")))?;
            artifact.status = status;
            artifact.error = error;
            artifact.current_stage = None;
            artifact.updated_at = Utc::now();
            artifact.job_id.clone()
        };
        let artifact = self.get_artifact(artifact_id).await?;

        let mut jobs = self.jobs.lock().unwrap();
        let stored = jobs
            .get_mut(&job_id)
            .ok_or_else(|| SentinelError::not_found(format!("job {job_id} not found")))?;
        stored.job.fold_artifact_result(matches!(status, ArtifactStatus::Completed));
        Ok((artifact, stored.job.clone()))
    }

    async fn mark_awaiting_graph(&self, artifact_id: &str) -> SentinelResult<Artifact> {
        let mut artifacts = self.artifacts.lock().unwrap();
        let artifact = artifacts
            .get_mut(artifact_id)
            .ok_or_else(|| SentinelError::not_found(format!("artifact {artifact_id} not found")))?;
        artifact.status = ArtifactStatus::AwaitingGraph;
        artifact.current_stage = None;
        artifact.updated_at = Utc::now();
        Ok(artifact.clone())
    }

    async fn insert_chunk(&self, chunk: Chunk) -> SentinelResult<()> {
        self.chunks.lock().unwrap().insert(chunk.id, chunk);
        Ok(())
    }

    async fn suspects_for_job(&self, job_id: &str) -> SentinelResult<Vec<Suspect>> {
        Ok(self.suspects.lock().unwrap().get(job_id).cloned().unwrap_or_default())
    }

    async fn get_chunk(&self, chunk_id: Uuid) -> SentinelResult<Chunk> {
        self.chunks
            .lock()
            .unwrap()
            .get(&chunk_id)
            .cloned()
            .ok_or_else(|| SentinelError::not_found(format!("chunk {chunk_id} not found")))
    }

    async fn append_activity_log(&self, entry: ActivityLogEntry) -> SentinelResult<()> {
        self.activity.lock().unwrap().push(entry);
        Ok(())
    }

    async fn suspects_count(&self, job_id: &str) -> SentinelResult<u32> {
        Ok(self.suspects.lock().unwrap().get(job_id).map(|v| v.len() as u32).unwrap_or(0))
    }

    async fn list_jobs(
        &self,
        principal: &Principal,
        case_name: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> SentinelResult<Vec<JobSummary>> {
        let jobs = self.jobs.lock().unwrap();
        let mut visible: Vec<&StoredJob> = jobs
            .values()
            .filter(|s| Self::visible(principal, s))
            .filter(|s| case_name.map(|c| s.job.case_name == c).unwrap_or(true))
            .collect();
        visible.sort_by_key(|s| s.job.created_at);
        visible.reverse();

        let suspects = self.suspects.lock().unwrap();
        Ok(visible
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|s| JobSummary {
                job: s.job.clone(),
                suspects_count: suspects.get(&s.job.id).map(|v| v.len() as u32).unwrap_or(0),
            })
            .collect())
    }

    async fn get_results(&self, principal: &Principal, job_id: &str) -> SentinelResult<JobResults> {
        let job = {
            let jobs = self.jobs.lock().unwrap();
            let stored = jobs
                .get(job_id)
                .ok_or_else(|| SentinelError::not_found(format!("job {job_id} not found")))?;
            if !Self::visible(principal, stored) {
                return Err(SentinelError::authorization("job is outside your view scope"));
            }
            stored.job.clone()
        };
        let artifacts: Vec<Artifact> = self
            .artifacts
            .lock()
            .unwrap()
            .values()
            .filter(|a| a.job_id == job_id)
            .cloned()
            .collect();
        let suspects = self.suspects.lock().unwrap().get(job_id).cloned().unwrap_or_default();
        Ok(JobResults { job, artifacts, suspects })
    }

    async fn list_cases(&self, principal: &Principal) -> SentinelResult<Vec<String>> {
        let jobs = self.jobs.lock().unwrap();
        let mut cases: Vec<String> = jobs
            .values()
            .filter(|s| Self::visible(principal, s))
            .map(|s| s.job.case_name.clone())
            .collect();
        cases.sort();
        cases.dedup();
        Ok(cases)
    }

    async fn case_jobs(&self, principal: &Principal, case_name: &str) -> SentinelResult<Vec<JobSummary>> {
        self.list_jobs(principal, Some(case_name), u32::MAX, 0).await
    }
}
