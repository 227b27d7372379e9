//! `frame_extraction -> transcribe -> analyze_frames -> translate ->
//! summarize -> embed`. Frame extraction has to run first: it's the only
//! stage that needs the raw video bytes, and by design every later stage
//! only sees the previous stage's blob path, which after transcription is
//! transcript text.

use std::sync::Arc;

use async_trait::async_trait;
use sentinel_core::error::{SentinelError, SentinelResult};

use crate::pipelines::audio::TranscribeStage;
use crate::pipelines::common::{EmbedStage, SummarizeStage, TranslateStage};
use crate::stage::{read_blob_bytes, read_blob_text, write_blob_bytes, write_blob_text, Stage, StageInput, StageOutput, WorkerContext};

/// Reads the original upload (it runs before `TranscribeStage`, so the
/// chained blob path is still the raw video) and writes the extracted
/// frame data under a `frames_raw` role. Passes the video path through
/// unchanged so `TranscribeStage` still gets raw bytes, not frame data.
pub struct FrameExtractionStage;

#[async_trait]
impl Stage for FrameExtractionStage {
    fn name(&self) -> &'static str {
        "frame_extraction"
    }

    async fn run(&self, cx: &WorkerContext, input: &StageInput) -> SentinelResult<StageOutput> {
        let video_bytes = read_blob_bytes(cx.blob_store.as_ref(), &input.blob_path).await?;
        let frames = cx.vision.extract_frames(&video_bytes).await?;

        let path = format!("{}/{}.frames_raw.bin", input.job_id, input.filename);
        write_blob_bytes(cx.blob_store.as_ref(), &path, "application/octet-stream", frames).await?;

        Ok(StageOutput {
            blob_role: Some(("frames_raw".to_string(), path)),
            next_blob_path: input.blob_path.clone(),
            summary_text: None,
        })
    }
}

/// By the time this stage runs, the chained blob path is the transcript
/// (the previous stage is `TranscribeStage`), so the frame data extracted
/// by `FrameExtractionStage` is fetched out of band through the Artifact's
/// recorded blob roles rather than through the chain.
pub struct AnalyzeFramesStage;

#[async_trait]
impl Stage for AnalyzeFramesStage {
    fn name(&self) -> &'static str {
        "analyze_frames"
    }

    async fn run(&self, cx: &WorkerContext, input: &StageInput) -> SentinelResult<StageOutput> {
        let artifact = cx.metadata.get_artifact(&input.artifact_id).await?;
        let frames_path = artifact
            .blob_paths
            .get("frames_raw")
            .ok_or_else(|| SentinelError::stage_failed("frame_extraction has not produced frames_raw yet"))?;
        let frame_bytes = read_blob_bytes(cx.blob_store.as_ref(), frames_path).await?;
        let frame_analysis = cx.vision.analyze_frames(&frame_bytes).await?;

        let transcript = read_blob_text(cx.blob_store.as_ref(), &input.blob_path).await?;
        let combined = format!("{transcript}\n\n{frame_analysis}");

        let path = format!("{}/{}.frames.txt", input.job_id, input.filename);
        write_blob_text(cx.blob_store.as_ref(), &path, "text/plain", &combined).await?;

        Ok(StageOutput {
            blob_role: Some(("frames".to_string(), path.clone())),
            next_blob_path: path,
            summary_text: None,
        })
    }
}

pub fn pipeline() -> Vec<Arc<dyn Stage>> {
    vec![
        Arc::new(FrameExtractionStage),
        Arc::new(TranscribeStage),
        Arc::new(AnalyzeFramesStage),
        Arc::new(TranslateStage),
        Arc::new(SummarizeStage),
        Arc::new(EmbedStage),
    ]
}
