//! Domain model shared across the fabric: jobs, artifacts, suspects, chunks,
//! graph entities, and activity log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Analyst,
}

impl Role {
    /// Whether `self` may view a job owned by `owner`, given `owner`'s
    /// supervisor chain. Admins see everything; managers see their own jobs
    /// and jobs of analysts they supervise; analysts see only their own.
    pub fn outranks_for_scope(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub supervisor_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Document,
    Audio,
    Video,
    Cdr,
}

impl MediaType {
    pub fn queue_name(&self) -> &'static str {
        match self {
            MediaType::Document => "document",
            MediaType::Audio => "audio",
            MediaType::Video => "video",
            MediaType::Cdr => "cdr",
        }
    }

    pub fn from_queue_name(name: &str) -> Option<Self> {
        match name {
            "document" => Some(MediaType::Document),
            "audio" => Some(MediaType::Audio),
            "video" => Some(MediaType::Video),
            "cdr" => Some(MediaType::Cdr),
            _ => None,
        }
    }

    /// Ordered stage names this media type's pipeline runs through, before
    /// the shared terminal `graph` stage.
    pub fn stage_sequence(&self) -> &'static [&'static str] {
        match self {
            MediaType::Document => &["extract_text", "translate", "summarize", "embed"],
            MediaType::Audio => &["transcribe", "translate", "summarize", "embed"],
            MediaType::Video => &["frame_extraction", "transcribe", "analyze_frames", "translate", "summarize", "embed"],
            MediaType::Cdr => &["parse_records", "suspect_matching", "summarize"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Partial,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactStatus {
    Queued,
    Processing,
    /// The typed pipeline's last stage has finished; the artifact is
    /// waiting on the shared `graph` queue's terminal stage.
    AwaitingGraph,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub case_name: String,
    pub owner_id: Uuid,
    pub status: JobStatus,
    pub artifact_count: u32,
    pub completed_count: u32,
    pub failed_count: u32,
    /// Monotonic version for compare-and-set aggregate updates.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Folds one artifact's terminal status into the job's counters and
    /// recomputes the job's own terminal status once every artifact has
    /// reported in. Mirrors the compare-and-set update used at the storage
    /// layer: callers must re-read `version` and retry on conflict.
    pub fn fold_artifact_result(&mut self, artifact_succeeded: bool) {
        if artifact_succeeded {
            self.completed_count += 1;
        } else {
            self.failed_count += 1;
        }
        let reported = self.completed_count + self.failed_count;
        if reported >= self.artifact_count {
            self.status = if self.failed_count == 0 {
                JobStatus::Completed
            } else if self.completed_count == 0 {
                JobStatus::Failed
            } else {
                JobStatus::Partial
            };
        } else {
            self.status = JobStatus::Processing;
        }
        self.version += 1;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub id: String,
    pub job_id: String,
    pub filename: String,
    pub media_type: MediaType,
    /// Source-language hint supplied at upload; `None`/empty means "use the
    /// canonical language," which also means the optional translate stage
    /// is skipped (invariant 3 in the testable-properties list).
    pub source_language: Option<String>,
    pub blob_path: String,
    /// role (e.g. `"transcript"`, `"summary"`) -> derived blob path, one
    /// entry written per completed stage that produces a new blob.
    pub blob_paths: std::collections::BTreeMap<String, String>,
    pub status: ArtifactStatus,
    /// Most recently entered stage name; always present once processing starts.
    pub current_stage: Option<String>,
    /// stage name -> elapsed milliseconds, accumulated as stages complete.
    pub processing_stages: std::collections::BTreeMap<String, u64>,
    pub summary_text: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Artifact {
    /// Whether the translate stage should run for this artifact: skipped
    /// iff `source_language` is already the canonical language (empty/unset
    /// is treated as "no translation needed").
    pub fn needs_translation(&self, canonical_language: &str) -> bool {
        match self.source_language.as_deref() {
            None | Some("") => false,
            Some(lang) => lang != canonical_language,
        }
    }
}

/// One analyst-supplied key/value fact about a suspect. Order is
/// significant and preserved; the pipeline treats the value opaquely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuspectField {
    pub id: Uuid,
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suspect {
    pub id: Uuid,
    pub job_id: String,
    pub fields: Vec<SuspectField>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: Uuid,
    pub artifact_id: String,
    pub sequence: u32,
    pub text: String,
    pub embedding: Option<Vec<f32>>,
}

/// An extracted entity, deduplicated within a case by `(kind, label_normalized)`.
/// `provenance` accumulates every artifact that contributed to it, since the
/// same node can surface from more than one artifact in a case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub case_name: String,
    pub label: String,
    pub kind: String,
    pub properties: serde_json::Value,
    pub provenance: Vec<String>,
}

impl GraphNode {
    pub fn normalized_label(&self) -> String {
        self.label.trim().to_lowercase()
    }

    /// Merge another extraction of the "same" node: union provenance,
    /// last-writer-wins on conflicting properties.
    pub fn merge_from(&mut self, other_properties: serde_json::Value, other_artifact_id: &str) {
        if let (Some(existing), Some(incoming)) = (self.properties.as_object_mut(), other_properties.as_object()) {
            for (key, value) in incoming {
                existing.insert(key.clone(), value.clone());
            }
        } else if self.properties.is_null() {
            self.properties = other_properties;
        }
        if !self.provenance.iter().any(|a| a == other_artifact_id) {
            self.provenance.push(other_artifact_id.to_string());
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    pub case_name: String,
    pub from_node: String,
    pub to_node: String,
    pub relation: String,
    pub properties: serde_json::Value,
    pub artifact_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub id: Uuid,
    pub job_id: String,
    pub artifact_id: Option<String>,
    pub stage: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_job() -> Job {
        Job {
            id: "job-1".into(),
            case_name: "case-1".into(),
            owner_id: Uuid::nil(),
            status: JobStatus::Processing,
            artifact_count: 2,
            completed_count: 0,
            failed_count: 0,
            version: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn completed_when_all_artifacts_succeed() {
        let mut job = sample_job();
        job.fold_artifact_result(true);
        assert_eq!(job.status, JobStatus::Processing);
        job.fold_artifact_result(true);
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.version, 2);
    }

    #[test]
    fn failed_when_all_artifacts_fail() {
        let mut job = sample_job();
        job.fold_artifact_result(false);
        job.fold_artifact_result(false);
        assert_eq!(job.status, JobStatus::Failed);
    }

    #[test]
    fn partial_when_mixed() {
        let mut job = sample_job();
        job.fold_artifact_result(true);
        job.fold_artifact_result(false);
        assert_eq!(job.status, JobStatus::Partial);
    }

    #[test]
    fn graph_node_merge_unions_provenance_and_overwrites_properties() {
        let mut node = GraphNode {
            id: "node-1".into(),
            case_name: "C3".into(),
            label: "Acme Ltd".into(),
            kind: "Organization".into(),
            properties: serde_json::json!({"country": "US"}),
            provenance: vec!["artifact-a".into()],
        };

        node.merge_from(serde_json::json!({"country": "UK", "ticker": "ACM"}), "artifact-b");

        assert_eq!(node.provenance, vec!["artifact-a", "artifact-b"]);
        assert_eq!(node.properties["country"], "UK");
        assert_eq!(node.properties["ticker"], "ACM");
    }

    #[test]
    fn graph_node_merge_is_idempotent_for_same_artifact() {
        let mut node = GraphNode {
            id: "node-1".into(),
            case_name: "C3".into(),
            label: "Acme Ltd".into(),
            kind: "Organization".into(),
            properties: serde_json::json!({}),
            provenance: vec!["artifact-a".into()],
        };
        node.merge_from(serde_json::json!({}), "artifact-a");
        assert_eq!(node.provenance, vec!["artifact-a"]);
    }

    #[test]
    fn translation_skipped_when_source_matches_canonical() {
        let mut artifact = sample_artifact();
        artifact.source_language = Some("en".into());
        assert!(!artifact.needs_translation("en"));
        artifact.source_language = Some("hi".into());
        assert!(artifact.needs_translation("en"));
        artifact.source_language = None;
        assert!(!artifact.needs_translation("en"));
        artifact.source_language = Some(String::new());
        assert!(!artifact.needs_translation("en"));
    }

    fn sample_artifact() -> Artifact {
        Artifact {
            id: "artifact-1".into(),
            job_id: "job-1".into(),
            filename: "a.mp3".into(),
            media_type: MediaType::Audio,
            source_language: None,
            blob_path: "job-1/a.mp3".into(),
            blob_paths: Default::default(),
            status: ArtifactStatus::Queued,
            current_stage: None,
            processing_stages: Default::default(),
            summary_text: None,
            error: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn normalized_label_trims_and_lowercases() {
        let node = GraphNode {
            id: "node-1".into(),
            case_name: "C3".into(),
            label: "  Acme Ltd ".into(),
            kind: "Organization".into(),
            properties: serde_json::json!({}),
            provenance: vec![],
        };
        assert_eq!(node.normalized_label(), "acme ltd");
    }
}
