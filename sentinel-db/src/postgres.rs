//! `sqlx`-backed [`MetadataStore`] implementation.
//!
//! Queries are hand-written against the dynamic `sqlx::query`/`query_as`
//! API rather than the `sqlx::query!` macro family: the macros need a live
//! database at build time to type-check against, which this deployment
//! target does not have. Everything else — `PgPool`, explicit
//! `Transaction` scoping for the upload write path, compare-and-set on
//! `jobs.version` for the aggregate counters — follows the same pattern
//! `sentinel-queue`'s optional `postgres`/`sqlite` backend features sketch.
//!
//! Expected schema (see `migrations/` conceptually; not shipped as actual
//! migration files in this exercise):
//!
//! ```sql
//! CREATE TABLE jobs (
//!     id TEXT PRIMARY KEY,
//!     case_name TEXT NOT NULL,
//!     owner_id UUID NOT NULL,
//!     owner_supervisor_id UUID,
//!     status TEXT NOT NULL,
//!     artifact_count INT NOT NULL,
//!     completed_count INT NOT NULL,
//!     failed_count INT NOT NULL,
//!     version BIGINT NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL,
//!     updated_at TIMESTAMPTZ NOT NULL
//! );
//! CREATE TABLE artifacts (
//!     id TEXT PRIMARY KEY,
//!     job_id TEXT NOT NULL REFERENCES jobs(id),
//!     filename TEXT NOT NULL,
//!     media_type TEXT NOT NULL,
//!     source_language TEXT,
//!     blob_path TEXT NOT NULL,
//!     blob_paths JSONB NOT NULL,
//!     status TEXT NOT NULL,
//!     current_stage TEXT,
//!     processing_stages JSONB NOT NULL,
//!     summary_text TEXT,
//!     error TEXT,
//!     created_at TIMESTAMPTZ NOT NULL,
//!     updated_at TIMESTAMPTZ NOT NULL
//! );
//! CREATE TABLE suspects (id UUID PRIMARY KEY, job_id TEXT NOT NULL REFERENCES jobs(id));
//! CREATE TABLE suspect_fields (id UUID PRIMARY KEY, suspect_id UUID NOT NULL REFERENCES suspects(id), seq INT NOT NULL, key TEXT NOT NULL, value TEXT NOT NULL);
//! CREATE TABLE chunks (id UUID PRIMARY KEY, artifact_id TEXT NOT NULL, sequence INT NOT NULL, text TEXT NOT NULL, embedding JSONB);
//! CREATE TABLE activity_log (id UUID PRIMARY KEY, job_id TEXT NOT NULL, artifact_id TEXT, stage TEXT, message TEXT NOT NULL, created_at TIMESTAMPTZ NOT NULL);
//! ```

use async_trait::async_trait;
use chrono::Utc;
use sentinel_core::error::{SentinelError, SentinelResult};
use sentinel_core::model::{
    ActivityLogEntry, Artifact, ArtifactStatus, Chunk, Job, JobStatus, MediaType, Suspect, SuspectField,
};
use sentinel_core::rbac::Principal;
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use crate::store::{MetadataStore, StageUpdate};
use crate::types::{JobResults, JobSummary, NewJobInput};

pub struct PostgresMetadataStore {
    pool: PgPool,
}

impl PostgresMetadataStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> SentinelResult<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| SentinelError::transient_io(format!("postgres connect failed: {e}")))?;
        Ok(Self::new(pool))
    }
}

fn to_db(e: sqlx::Error) -> SentinelError {
    SentinelError::transient_io(format!("metadata store error: {e}"))
}

fn job_status_str(s: JobStatus) -> &'static str {
    match s {
        JobStatus::Queued => "queued",
        JobStatus::Processing => "processing",
        JobStatus::Completed => "completed",
        JobStatus::Partial => "partial",
        JobStatus::Failed => "failed",
    }
}

fn job_status_from_str(s: &str) -> JobStatus {
    match s {
        "processing" => JobStatus::Processing,
        "completed" => JobStatus::Completed,
        "partial" => JobStatus::Partial,
        "failed" => JobStatus::Failed,
        _ => JobStatus::Queued,
    }
}

fn artifact_status_str(s: ArtifactStatus) -> &'static str {
    match s {
        ArtifactStatus::Queued => "queued",
        ArtifactStatus::Processing => "processing",
        ArtifactStatus::AwaitingGraph => "awaiting_graph",
        ArtifactStatus::Completed => "completed",
        ArtifactStatus::Failed => "failed",
    }
}

fn artifact_status_from_str(s: &str) -> ArtifactStatus {
    match s {
        "processing" => ArtifactStatus::Processing,
        "awaiting_graph" => ArtifactStatus::AwaitingGraph,
        "completed" => ArtifactStatus::Completed,
        "failed" => ArtifactStatus::Failed,
        _ => ArtifactStatus::Queued,
    }
}

fn job_from_row(row: &PgRow) -> SentinelResult<Job> {
    Ok(Job {
        id: row.try_get("id").map_err(to_db)?,
        case_name: row.try_get("case_name").map_err(to_db)?,
        owner_id: row.try_get("owner_id").map_err(to_db)?,
        status: job_status_from_str(row.try_get::<String, _>("status").map_err(to_db)?.as_str()),
        artifact_count: row.try_get::<i32, _>("artifact_count").map_err(to_db)? as u32,
        completed_count: row.try_get::<i32, _>("completed_count").map_err(to_db)? as u32,
        failed_count: row.try_get::<i32, _>("failed_count").map_err(to_db)? as u32,
        version: row.try_get("version").map_err(to_db)?,
        created_at: row.try_get("created_at").map_err(to_db)?,
        updated_at: row.try_get("updated_at").map_err(to_db)?,
    })
}

fn artifact_from_row(row: &PgRow) -> SentinelResult<Artifact> {
    let media_type = MediaType::from_queue_name(row.try_get::<String, _>("media_type").map_err(to_db)?.as_str())
        .ok_or_else(|| SentinelError::fatal("unrecognized media_type in storage"))?;
    let blob_paths: serde_json::Value = row.try_get("blob_paths").map_err(to_db)?;
    let processing_stages: serde_json::Value = row.try_get("processing_stages").map_err(to_db)?;
    Ok(Artifact {
        id: row.try_get("id").map_err(to_db)?,
        job_id: row.try_get("job_id").map_err(to_db)?,
        filename: row.try_get("filename").map_err(to_db)?,
        media_type,
        source_language: row.try_get("source_language").map_err(to_db)?,
        blob_path: row.try_get("blob_path").map_err(to_db)?,
        blob_paths: serde_json::from_value(blob_paths).unwrap_or_default(),
        status: artifact_status_from_str(row.try_get::<String, _>("status").map_err(to_db)?.as_str()),
        current_stage: row.try_get("current_stage").map_err(to_db)?,
        processing_stages: serde_json::from_value(processing_stages).unwrap_or_default(),
        summary_text: row.try_get("summary_text").map_err(to_db)?,
        error: row.try_get("error").map_err(to_db)?,
        created_at: row.try_get("created_at").map_err(to_db)?,
        updated_at: row.try_get("updated_at").map_err(to_db)?,
    })
}

/// Builds the `WHERE` fragment enforcing the owner-id half of RBAC scope,
/// since the predicate needs to run in SQL (it drives LIMIT/OFFSET) rather
/// than being applied after fetching every row. Mirrors
/// `Principal::can_view_job_owned_by`; the job_id prefix half of the
/// predicate is redundant here since every row's owner/supervisor columns
/// are exactly what its job_id was built from.
fn rbac_clause(principal: &Principal, next_param: &mut i32) -> (String, Vec<Uuid>) {
    use sentinel_core::model::Role;
    match principal.role {
        Role::Admin => ("TRUE".to_string(), vec![]),
        Role::Manager => {
            let a = *next_param;
            let b = a + 1;
            *next_param += 2;
            (format!("(owner_id = ${a} OR owner_supervisor_id = ${b})"), vec![principal.user_id, principal.user_id])
        }
        Role::Analyst => {
            let a = *next_param;
            *next_param += 1;
            (format!("owner_id = ${a}"), vec![principal.user_id])
        }
    }
}

#[async_trait]
impl MetadataStore for PostgresMetadataStore {
    async fn create_job(&self, input: NewJobInput) -> SentinelResult<(Job, Vec<Artifact>)> {
        let mut tx = self.pool.begin().await.map_err(to_db)?;
        let job_id = input.job_id.clone();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO jobs (id, case_name, owner_id, owner_supervisor_id, status, artifact_count, completed_count, failed_count, version, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, 0, 0, 0, $7, $7)",
        )
        .bind(&job_id)
        .bind(&input.case_name)
        .bind(input.owner_id)
        .bind(input.owner_supervisor_id)
        .bind(job_status_str(JobStatus::Queued))
        .bind(input.artifacts.len() as i32)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(to_db)?;

        let mut artifacts = Vec::with_capacity(input.artifacts.len());
        for a in &input.artifacts {
            let artifact_id = Uuid::new_v4().to_string();
            sqlx::query(
                "INSERT INTO artifacts (id, job_id, filename, media_type, source_language, blob_path, blob_paths, status, current_stage, processing_stages, summary_text, error, created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, '{}'::jsonb, $7, NULL, '{}'::jsonb, NULL, NULL, $8, $8)",
            )
            .bind(&artifact_id)
            .bind(&job_id)
            .bind(&a.filename)
            .bind(a.media_type.queue_name())
            .bind(&a.source_language)
            .bind(&a.blob_path)
            .bind(artifact_status_str(ArtifactStatus::Queued))
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(to_db)?;

            artifacts.push(Artifact {
                id: artifact_id,
                job_id: job_id.clone(),
                filename: a.filename.clone(),
                media_type: a.media_type,
                source_language: a.source_language.clone(),
                blob_path: a.blob_path.clone(),
                blob_paths: Default::default(),
                status: ArtifactStatus::Queued,
                current_stage: None,
                processing_stages: Default::default(),
                summary_text: None,
                error: None,
                created_at: now,
                updated_at: now,
            });
        }

        for s in &input.suspects {
            let suspect_id = Uuid::new_v4();
            sqlx::query("INSERT INTO suspects (id, job_id) VALUES ($1, $2)")
                .bind(suspect_id)
                .bind(&job_id)
                .execute(&mut *tx)
                .await
                .map_err(to_db)?;
            for (seq, (key, value)) in s.fields.iter().enumerate() {
                sqlx::query("INSERT INTO suspect_fields (id, suspect_id, seq, key, value) VALUES ($1, $2, $3, $4, $5)")
                    .bind(Uuid::new_v4())
                    .bind(suspect_id)
                    .bind(seq as i32)
                    .bind(key)
                    .bind(value)
                    .execute(&mut *tx)
                    .await
                    .map_err(to_db)?;
            }
        }

        tx.commit().await.map_err(to_db)?;

        let job = Job {
            id: job_id,
            case_name: input.case_name,
            owner_id: input.owner_id,
            status: JobStatus::Queued,
            artifact_count: artifacts.len() as u32,
            completed_count: 0,
            failed_count: 0,
            version: 0,
            created_at: now,
            updated_at: now,
        };
        Ok((job, artifacts))
    }

    async fn get_job(&self, job_id: &str) -> SentinelResult<Job> {
        let row = sqlx::query("SELECT * FROM jobs WHERE id = $1")
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(to_db)?
            .ok_or_else(|| SentinelError::not_found(format!("job {job_id} not found")))?;
        job_from_row(&row)
    }

    async fn get_job_scoped(&self, principal: &Principal, job_id: &str) -> SentinelResult<Job> {
        let row = sqlx::query("SELECT * FROM jobs WHERE id = $1")
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(to_db)?
            .ok_or_else(|| SentinelError::not_found(format!("job {job_id} not found")))?;
        let owner_supervisor_id: Option<Uuid> = row.try_get("owner_supervisor_id").map_err(to_db)?;
        let job = job_from_row(&row)?;
        if !principal.can_view_job(&job.id, job.owner_id, owner_supervisor_id) {
            return Err(SentinelError::not_found(format!("job {job_id} not found")));
        }
        Ok(job)
    }

    async fn get_artifact(&self, artifact_id: &str) -> SentinelResult<Artifact> {
        let row = sqlx::query("SELECT * FROM artifacts WHERE id = $1")
            .bind(artifact_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(to_db)?
            .ok_or_else(|| SentinelError::not_found(format!("artifact {artifact_id} not found")))?;
        artifact_from_row(&row)
    }

    async fn enter_stage(&self, artifact_id: &str, stage: &str) -> SentinelResult<Artifact> {
        sqlx::query("UPDATE artifacts SET status = $1, current_stage = $2, updated_at = $3 WHERE id = $4")
            .bind(artifact_status_str(ArtifactStatus::Processing))
            .bind(stage)
            .bind(Utc::now())
            .bind(artifact_id)
            .execute(&self.pool)
            .await
            .map_err(to_db)?;
        self.get_artifact(artifact_id).await
    }

    async fn complete_stage(&self, artifact_id: &str, stage: &str, update: StageUpdate) -> SentinelResult<Artifact> {
        let mut artifact = self.get_artifact(artifact_id).await?;
        artifact.processing_stages.insert(stage.to_string(), update.elapsed_ms);
        if let Some((role, path)) = &update.blob_role {
            artifact.blob_paths.insert(role.clone(), path.clone());
        }
        if let Some(summary) = &update.summary_text {
            artifact.summary_text = Some(summary.clone());
        }
        sqlx::query(
            "UPDATE artifacts SET blob_paths = $1, processing_stages = $2, summary_text = $3, updated_at = $4 WHERE id = $5",
        )
        .bind(serde_json::to_value(&artifact.blob_paths).map_err(|e| SentinelError::fatal(e.to_string()))?)
        .bind(serde_json::to_value(&artifact.processing_stages).map_err(|e| SentinelError::fatal(e.to_string()))?)
        .bind(&artifact.summary_text)
        .bind(Utc::now())
        .bind(artifact_id)
        .execute(&self.pool)
        .await
        .map_err(to_db)?;
        self.get_artifact(artifact_id).await
    }

    async fn finish_artifact(
        &self,
        artifact_id: &str,
        status: ArtifactStatus,
        error: Option<String>,
    ) -> SentinelResult<(Artifact, Job)> {
        let job_id: String = sqlx::query("SELECT job_id FROM artifacts WHERE id = $1")
            .bind(artifact_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(to_db)?
            .ok_or_else(|| SentinelError::not_found(format!("artifact {artifact_id} not found")))?
            .try_get("job_id")
            .map_err(to_db)?;

        sqlx::query("UPDATE artifacts SET status = $1, error = $2, current_stage = NULL, updated_at = $3 WHERE id = $4")
            .bind(artifact_status_str(status))
            .bind(&error)
            .bind(Utc::now())
            .bind(artifact_id)
            .execute(&self.pool)
            .await
            .map_err(to_db)?;
        let artifact = self.get_artifact(artifact_id).await?;

        // Compare-and-set loop on jobs.version: re-read, fold in Rust
        // (same rule as sentinel_core::model::Job::fold_artifact_result),
        // write back guarded by the version the read saw, retry on conflict.
        loop {
            let mut job = self.get_job(&job_id).await?;
            let expected_version = job.version;
            job.fold_artifact_result(matches!(status, ArtifactStatus::Completed));

            let result = sqlx::query(
                "UPDATE jobs SET status = $1, completed_count = $2, failed_count = $3, version = $4, updated_at = $5
                 WHERE id = $6 AND version = $7",
            )
            .bind(job_status_str(job.status))
            .bind(job.completed_count as i32)
            .bind(job.failed_count as i32)
            .bind(job.version)
            .bind(Utc::now())
            .bind(&job_id)
            .bind(expected_version)
            .execute(&self.pool)
            .await
            .map_err(to_db)?;

            if result.rows_affected() == 1 {
                return Ok((artifact, job));
            }
            // Another worker updated this job's counters concurrently; retry.
        }
    }

    async fn mark_awaiting_graph(&self, artifact_id: &str) -> SentinelResult<Artifact> {
        sqlx::query("UPDATE artifacts SET status = $1, current_stage = NULL, updated_at = $2 WHERE id = $3")
            .bind(artifact_status_str(ArtifactStatus::AwaitingGraph))
            .bind(Utc::now())
            .bind(artifact_id)
            .execute(&self.pool)
            .await
            .map_err(to_db)?;
        self.get_artifact(artifact_id).await
    }

    async fn insert_chunk(&self, chunk: Chunk) -> SentinelResult<()> {
        // Chunk ids are deterministic (derived from artifact_id + sequence),
        // so a retried embed stage upserts rather than duplicating rows.
        sqlx::query(
            "INSERT INTO chunks (id, artifact_id, sequence, text, embedding) VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (id) DO UPDATE SET text = EXCLUDED.text, embedding = EXCLUDED.embedding",
        )
        .bind(chunk.id)
        .bind(&chunk.artifact_id)
        .bind(chunk.sequence as i32)
        .bind(&chunk.text)
        .bind(chunk.embedding.as_ref().map(|e| serde_json::to_value(e).unwrap()))
        .execute(&self.pool)
        .await
        .map_err(to_db)?;
        Ok(())
    }

    async fn suspects_for_job(&self, job_id: &str) -> SentinelResult<Vec<Suspect>> {
        let suspect_rows = sqlx::query("SELECT id FROM suspects WHERE job_id = $1")
            .bind(job_id)
            .fetch_all(&self.pool)
            .await
            .map_err(to_db)?;
        let mut suspects = Vec::with_capacity(suspect_rows.len());
        for row in &suspect_rows {
            let suspect_id: Uuid = row.try_get("id").map_err(to_db)?;
            let field_rows = sqlx::query("SELECT id, key, value FROM suspect_fields WHERE suspect_id = $1 ORDER BY seq")
                .bind(suspect_id)
                .fetch_all(&self.pool)
                .await
                .map_err(to_db)?;
            let fields = field_rows
                .iter()
                .map(|r| {
                    Ok(SuspectField {
                        id: r.try_get("id").map_err(to_db)?,
                        key: r.try_get("key").map_err(to_db)?,
                        value: r.try_get("value").map_err(to_db)?,
                    })
                })
                .collect::<SentinelResult<Vec<_>>>()?;
            suspects.push(Suspect { id: suspect_id, job_id: job_id.to_string(), fields });
        }
        Ok(suspects)
    }

    async fn get_chunk(&self, chunk_id: Uuid) -> SentinelResult<Chunk> {
        let row = sqlx::query("SELECT * FROM chunks WHERE id = $1")
            .bind(chunk_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(to_db)?
            .ok_or_else(|| SentinelError::not_found(format!("chunk {chunk_id} not found")))?;
        let embedding: Option<serde_json::Value> = row.try_get("embedding").map_err(to_db)?;
        Ok(Chunk {
            id: row.try_get("id").map_err(to_db)?,
            artifact_id: row.try_get("artifact_id").map_err(to_db)?,
            sequence: row.try_get::<i32, _>("sequence").map_err(to_db)? as u32,
            text: row.try_get("text").map_err(to_db)?,
            embedding: embedding.and_then(|v| serde_json::from_value(v).ok()),
        })
    }

    async fn append_activity_log(&self, entry: ActivityLogEntry) -> SentinelResult<()> {
        sqlx::query(
            "INSERT INTO activity_log (id, job_id, artifact_id, stage, message, created_at) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(entry.id)
        .bind(&entry.job_id)
        .bind(&entry.artifact_id)
        .bind(&entry.stage)
        .bind(&entry.message)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(to_db)?;
        Ok(())
    }

    async fn suspects_count(&self, job_id: &str) -> SentinelResult<u32> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM suspects WHERE job_id = $1")
            .bind(job_id)
            .fetch_one(&self.pool)
            .await
            .map_err(to_db)?;
        Ok(row.try_get::<i64, _>("n").map_err(to_db)? as u32)
    }

    async fn list_jobs(
        &self,
        principal: &Principal,
        case_name: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> SentinelResult<Vec<JobSummary>> {
        let mut next_param = 1;
        let (clause, uuids) = rbac_clause(principal, &mut next_param);
        let mut sql = format!("SELECT * FROM jobs WHERE {clause}");
        if case_name.is_some() {
            sql.push_str(&format!(" AND case_name = ${next_param}"));
            next_param += 1;
        }
        sql.push_str(&format!(" ORDER BY created_at DESC LIMIT ${next_param} OFFSET ${}", next_param + 1));

        let mut query = sqlx::query(&sql);
        for u in &uuids {
            query = query.bind(u);
        }
        if let Some(c) = case_name {
            query = query.bind(c);
        }
        query = query.bind(limit as i64).bind(offset as i64);

        let rows = query.fetch_all(&self.pool).await.map_err(to_db)?;
        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            let job = job_from_row(row)?;
            let suspects_count = self.suspects_count(&job.id).await?;
            out.push(JobSummary { job, suspects_count });
        }
        Ok(out)
    }

    async fn get_results(&self, principal: &Principal, job_id: &str) -> SentinelResult<JobResults> {
        let job = self.get_job(job_id).await?;
        let owner_supervisor_id: Option<Uuid> = sqlx::query("SELECT owner_supervisor_id FROM jobs WHERE id = $1")
            .bind(job_id)
            .fetch_one(&self.pool)
            .await
            .map_err(to_db)?
            .try_get("owner_supervisor_id")
            .map_err(to_db)?;
        if !principal.can_view_job(&job.id, job.owner_id, owner_supervisor_id) {
            return Err(SentinelError::authorization("job is outside your view scope"));
        }

        let artifact_rows = sqlx::query("SELECT * FROM artifacts WHERE job_id = $1")
            .bind(job_id)
            .fetch_all(&self.pool)
            .await
            .map_err(to_db)?;
        let artifacts = artifact_rows.iter().map(artifact_from_row).collect::<SentinelResult<Vec<_>>>()?;

        let suspect_rows = sqlx::query("SELECT id FROM suspects WHERE job_id = $1")
            .bind(job_id)
            .fetch_all(&self.pool)
            .await
            .map_err(to_db)?;
        let mut suspects = Vec::with_capacity(suspect_rows.len());
        for row in &suspect_rows {
            let suspect_id: Uuid = row.try_get("id").map_err(to_db)?;
            let field_rows = sqlx::query("SELECT id, key, value FROM suspect_fields WHERE suspect_id = $1 ORDER BY seq")
                .bind(suspect_id)
                .fetch_all(&self.pool)
                .await
                .map_err(to_db)?;
            let fields = field_rows
                .iter()
                .map(|r| {
                    Ok(SuspectField {
                        id: r.try_get("id").map_err(to_db)?,
                        key: r.try_get("key").map_err(to_db)?,
                        value: r.try_get("value").map_err(to_db)?,
                    })
                })
                .collect::<SentinelResult<Vec<_>>>()?;
            suspects.push(Suspect { id: suspect_id, job_id: job_id.to_string(), fields });
        }

        Ok(JobResults { job, artifacts, suspects })
    }

    async fn list_cases(&self, principal: &Principal) -> SentinelResult<Vec<String>> {
        let mut next_param = 1;
        let (clause, uuids) = rbac_clause(principal, &mut next_param);
        let sql = format!("SELECT DISTINCT case_name FROM jobs WHERE {clause} ORDER BY case_name");
        let mut query = sqlx::query(&sql);
        for u in &uuids {
            query = query.bind(u);
        }
        let rows = query.fetch_all(&self.pool).await.map_err(to_db)?;
        rows.iter().map(|r| r.try_get("case_name").map_err(to_db)).collect()
    }

    async fn case_jobs(&self, principal: &Principal, case_name: &str) -> SentinelResult<Vec<JobSummary>> {
        self.list_jobs(principal, Some(case_name), u32::MAX, 0).await
    }
}
