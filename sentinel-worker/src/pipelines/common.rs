//! Stages shared by more than one media type's pipeline: the optional
//! translate step, summarization, and embedding/chunking.

use async_trait::async_trait;
use sentinel_core::error::SentinelResult;
use sentinel_core::model::Chunk;
use uuid::Uuid;

use crate::stage::{read_blob_text, write_blob_text, Stage, StageInput, StageOutput, WorkerContext};

/// Target chunk length in characters; small enough to keep the deterministic
/// stub embedder's output meaningfully different chunk to chunk.
const CHUNK_SIZE: usize = 400;

/// Namespace for deriving chunk ids, so a re-run of the embed stage
/// (at-least-once delivery) upserts the same rows instead of duplicating
/// them.
const CHUNK_ID_NAMESPACE: Uuid = Uuid::from_bytes([
    0x6f, 0x3b, 0x1a, 0x9d, 0x0c, 0x44, 0x4a, 0x1e, 0x9c, 0x2b, 0x5e, 0x7d, 0x8a, 0x31, 0x0f, 0x62,
]);

fn chunk_id(artifact_id: &str, sequence: u32) -> Uuid {
    Uuid::new_v5(&CHUNK_ID_NAMESPACE, format!("{artifact_id}:{sequence}").as_bytes())
}

pub struct TranslateStage;

#[async_trait]
impl Stage for TranslateStage {
    fn name(&self) -> &'static str {
        "translate"
    }

    async fn run(&self, cx: &WorkerContext, input: &StageInput) -> SentinelResult<StageOutput> {
        let needs_translation = match input.source_language.as_deref() {
            None | Some("") => false,
            Some(lang) => lang != cx.canonical_language,
        };
        if !needs_translation {
            return Ok(StageOutput {
                blob_role: None,
                next_blob_path: input.blob_path.clone(),
                summary_text: None,
            });
        }

        let text = read_blob_text(cx.blob_store.as_ref(), &input.blob_path).await?;
        let translated = cx
            .translator
            .translate(&text, input.source_language.as_deref().unwrap_or(""), &cx.canonical_language)
            .await?;

        let path = format!("{}/{}.translation.txt", input.job_id, input.filename);
        write_blob_text(cx.blob_store.as_ref(), &path, "text/plain", &translated).await?;

        Ok(StageOutput {
            blob_role: Some(("translation".to_string(), path.clone())),
            next_blob_path: path,
            summary_text: None,
        })
    }
}

pub struct SummarizeStage;

#[async_trait]
impl Stage for SummarizeStage {
    fn name(&self) -> &'static str {
        "summarize"
    }

    async fn run(&self, cx: &WorkerContext, input: &StageInput) -> SentinelResult<StageOutput> {
        let text = read_blob_text(cx.blob_store.as_ref(), &input.blob_path).await?;
        let summary = cx.summarizer.summarize(&text).await?;

        let path = format!("{}/{}.summary.txt", input.job_id, input.filename);
        write_blob_text(cx.blob_store.as_ref(), &path, "text/plain", &summary).await?;

        Ok(StageOutput {
            blob_role: Some(("summary".to_string(), path)),
            // The embed stage still runs over the full text, not the
            // summary, so the chained blob path is left untouched.
            next_blob_path: input.blob_path.clone(),
            summary_text: Some(summary),
        })
    }
}

pub struct EmbedStage;

#[async_trait]
impl Stage for EmbedStage {
    fn name(&self) -> &'static str {
        "embed"
    }

    async fn run(&self, cx: &WorkerContext, input: &StageInput) -> SentinelResult<StageOutput> {
        let text = read_blob_text(cx.blob_store.as_ref(), &input.blob_path).await?;

        let chunks = chunk_text(&text, CHUNK_SIZE);
        for (sequence, chunk_text_value) in chunks.into_iter().enumerate() {
            let embedding = cx.embedder.embed(&chunk_text_value).await?;
            let chunk = Chunk {
                id: chunk_id(&input.artifact_id, sequence as u32),
                artifact_id: input.artifact_id.clone(),
                sequence: sequence as u32,
                text: chunk_text_value,
                embedding: Some(embedding),
            };
            cx.metadata.insert_chunk(chunk).await?;
        }

        Ok(StageOutput {
            blob_role: None,
            next_blob_path: input.blob_path.clone(),
            summary_text: None,
        })
    }
}

fn chunk_text(text: &str, size: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    text.chars()
        .collect::<Vec<char>>()
        .chunks(size)
        .map(|c| c.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_text_splits_on_fixed_boundaries() {
        let text = "a".repeat(1000);
        let chunks = chunk_text(&text, 400);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 400);
        assert_eq!(chunks[2].len(), 200);
    }

    #[test]
    fn chunk_text_of_empty_string_is_empty() {
        assert!(chunk_text("", 400).is_empty());
    }

    #[test]
    fn chunk_id_is_deterministic_per_artifact_and_sequence() {
        let a = chunk_id("artifact-1", 3);
        let b = chunk_id("artifact-1", 3);
        assert_eq!(a, b);
        assert_ne!(a, chunk_id("artifact-1", 4));
        assert_ne!(a, chunk_id("artifact-2", 3));
    }
}
