//! The unified upload transaction: parse the multipart form, validate the
//! parallel `files[]`/`media_types[]`/`languages[]` arrays, write blobs and
//! the Job/Artifact/Suspect rows, and publish one work item per artifact.

use axum::extract::Multipart;
use bytes::Bytes;
use sentinel_blob::BlobStore;
use sentinel_core::error::{SentinelError, SentinelResult};
use sentinel_core::model::{ArtifactStatus, MediaType};
use sentinel_core::rbac::Principal;
use sentinel_db::{MetadataStore, NewArtifactInput, NewJobInput, NewSuspectInput};
use sentinel_queue::backend::QueueBackend;
use sentinel_queue::work_item::{queue_for, WorkItem, WorkItemMetadata};
use sentinel_queue::{JobMessage, QueueCtx};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::GatewayState;

const MAX_CASE_NAME_LEN: usize = 100;

fn allowed_extensions(media_type: MediaType) -> &'static [&'static str] {
    match media_type {
        MediaType::Document => &["pdf", "doc", "docx", "txt", "rtf"],
        MediaType::Audio => &["mp3", "wav", "m4a", "flac", "ogg"],
        MediaType::Video => &["mp4", "mov", "mkv", "avi", "webm"],
        MediaType::Cdr => &["csv", "xml", "json"],
    }
}

fn extension_of(filename: &str) -> Option<String> {
    filename.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase())
}

#[derive(Debug, Deserialize)]
struct SuspectFieldPayload {
    key: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct SuspectPayload {
    #[serde(default)]
    fields: Vec<SuspectFieldPayload>,
}

#[derive(Debug, Clone)]
struct RawFile {
    filename: String,
    content_type: Option<String>,
    bytes: Bytes,
}

#[derive(Debug, Default)]
struct ParsedForm {
    case_name: Option<String>,
    suspects_raw: Option<String>,
    files: Vec<RawFile>,
    media_types: Vec<String>,
    languages: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub job_id: String,
    pub status: &'static str,
    pub total_files: u32,
    pub suspects_count: u32,
    pub message: String,
}

async fn parse_multipart(mut multipart: Multipart) -> SentinelResult<ParsedForm> {
    let mut form = ParsedForm::default();

    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| SentinelError::validation(format!("malformed multipart body: {e}")))?;
        let Some(field) = field else { break };

        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "case_name" => {
                let text = field.text().await.map_err(|e| SentinelError::validation(e.to_string()))?;
                form.case_name = Some(text);
            }
            "suspects" => {
                let text = field.text().await.map_err(|e| SentinelError::validation(e.to_string()))?;
                form.suspects_raw = Some(text);
            }
            "media_types" => {
                let text = field.text().await.map_err(|e| SentinelError::validation(e.to_string()))?;
                form.media_types.push(text);
            }
            "languages" => {
                let text = field.text().await.map_err(|e| SentinelError::validation(e.to_string()))?;
                form.languages.push(text);
            }
            "files" => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| SentinelError::validation("file part is missing a filename"))?;
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(|e| SentinelError::validation(format!("failed to read file part: {e}")))?;
                form.files.push(RawFile { filename, content_type, bytes });
            }
            other => {
                return Err(SentinelError::validation(format!("unexpected form field '{other}'")));
            }
        }
    }

    Ok(form)
}

struct ValidatedUpload {
    case_name: String,
    files: Vec<RawFile>,
    media_types: Vec<MediaType>,
    languages: Vec<Option<String>>,
    suspects: Vec<NewSuspectInput>,
}

fn validate(form: ParsedForm, max_file_size: u64) -> SentinelResult<ValidatedUpload> {
    let case_name = form.case_name.unwrap_or_default();
    if case_name.is_empty() || case_name.len() > MAX_CASE_NAME_LEN {
        return Err(SentinelError::validation("case_name is required and must be at most 100 characters"));
    }

    if form.files.is_empty() {
        return Err(SentinelError::validation("at least one file is required"));
    }
    if form.files.len() != form.media_types.len() || form.files.len() != form.languages.len() {
        return Err(SentinelError::validation("files, media_types, and languages must be the same length"));
    }

    let mut media_types = Vec::with_capacity(form.media_types.len());
    let mut languages = Vec::with_capacity(form.languages.len());

    for (file, (media_type_raw, language_raw)) in form.files.iter().zip(form.media_types.iter().zip(form.languages.iter())) {
        let media_type = MediaType::from_queue_name(media_type_raw)
            .ok_or_else(|| SentinelError::validation(format!("unknown media_type '{media_type_raw}'")))?;

        let language = if language_raw.is_empty() { None } else { Some(language_raw.clone()) };
        if matches!(media_type, MediaType::Audio | MediaType::Video) && language.is_none() {
            return Err(SentinelError::validation(format!("{} '{}' requires a non-empty language", media_type.queue_name(), file.filename)));
        }

        if file.bytes.len() as u64 > max_file_size {
            return Err(SentinelError::validation(format!("'{}' exceeds the maximum upload size", file.filename)));
        }

        let extension = extension_of(&file.filename)
            .ok_or_else(|| SentinelError::validation(format!("'{}' has no file extension", file.filename)))?;
        if !allowed_extensions(media_type).contains(&extension.as_str()) {
            return Err(SentinelError::validation(format!("'{}' has an extension not allowed for {}", file.filename, media_type.queue_name())));
        }

        media_types.push(media_type);
        languages.push(language);
    }

    let suspects = match form.suspects_raw {
        Some(raw) if !raw.trim().is_empty() => {
            let payloads: Vec<SuspectPayload> =
                serde_json::from_str(&raw).map_err(|e| SentinelError::validation(format!("malformed suspects payload: {e}")))?;
            payloads
                .into_iter()
                .map(|p| NewSuspectInput { fields: p.fields.into_iter().map(|f| (f.key, f.value)).collect() })
                .collect()
        }
        _ => Vec::new(),
    };

    Ok(ValidatedUpload { case_name, files: form.files, media_types, languages, suspects })
}

fn file_stream(bytes: Bytes) -> sentinel_blob::ByteStream {
    Box::pin(futures_util::stream::once(async move { Ok::<Bytes, std::io::Error>(bytes) }))
}

/// Runs the full transaction described in the upload operation's contract:
/// write blobs, write the Job/Artifact/Suspect rows, then publish one work
/// item per artifact. A failure partway through the publish loop marks the
/// remaining and failing artifacts `failed` rather than leaving them stuck
/// `queued` forever; blobs already written are left for a prefix sweeper.
pub async fn handle_upload(state: &GatewayState, principal: &Principal, multipart: Multipart) -> SentinelResult<UploadResponse> {
    let form = parse_multipart(multipart).await?;
    let validated = validate(form, state.gateway.max_upload_bytes)?;

    let job_id = principal.build_job_id(Uuid::new_v4());
    let mut artifact_inputs = Vec::with_capacity(validated.files.len());
    for file in &validated.files {
        let blob_path = format!("{job_id}/{}", file.filename);
        state
            .blobs
            .put(&blob_path, file.content_type.as_deref(), file_stream(file.bytes.clone()))
            .await
            .map_err(|e| SentinelError::transient_io(format!("failed to store '{}': {e}", file.filename)))?;
        artifact_inputs.push((blob_path, file));
    }

    let artifacts: Vec<NewArtifactInput> = artifact_inputs
        .iter()
        .zip(validated.media_types.iter())
        .zip(validated.languages.iter())
        .map(|(((blob_path, file), media_type), language)| NewArtifactInput {
            filename: file.filename.clone(),
            media_type: *media_type,
            source_language: language.clone(),
            blob_path: blob_path.clone(),
        })
        .collect();

    let suspects_count = validated.suspects.len() as u32;
    let total_files = artifacts.len() as u32;

    let input = NewJobInput {
        job_id: job_id.clone(),
        case_name: validated.case_name,
        owner_id: principal.user_id,
        owner_supervisor_id: principal.supervisor_id,
        artifacts,
        suspects: validated.suspects,
    };

    let (job, created_artifacts) = state.metadata.create_job(input).await?;

    publish_work_items(state, &created_artifacts, &validated.languages).await?;

    Ok(UploadResponse {
        job_id: job.id,
        status: "queued",
        total_files,
        suspects_count,
        message: "upload accepted".to_string(),
    })
}

async fn publish_work_items(state: &GatewayState, artifacts: &[sentinel_core::model::Artifact], languages: &[Option<String>]) -> SentinelResult<()> {
    let ctx = QueueCtx::new(state.tenant_id.clone());

    for (artifact, language) in artifacts.iter().zip(languages.iter()) {
        let item = WorkItem {
            job_id: artifact.job_id.clone(),
            artifact_id: artifact.id.clone(),
            blob_path: artifact.blob_path.clone(),
            filename: artifact.filename.clone(),
            media_type: artifact.media_type,
            metadata: WorkItemMetadata { language: language.clone() },
            attempt: 0,
        };
        let queue = queue_for(artifact.media_type);
        let payload = serde_json::to_vec(&item).map_err(|e| SentinelError::fatal(e.to_string()))?;
        let message = JobMessage::new(queue.to_string(), payload, "json".to_string(), queue.to_string()).with_max_retries(state.retry.max_retries);

        if let Err(err) = state.queue.enqueue(ctx.clone(), message).await {
            let reason = format!("failed to publish work item: {err}");
            state.metadata.finish_artifact(&artifact.id, ArtifactStatus::Failed, Some(reason.clone())).await?;
            return Err(SentinelError::transient_io(reason));
        }
    }

    Ok(())
}
