//! `transcribe -> translate -> summarize -> embed`.

use std::sync::Arc;

use async_trait::async_trait;
use sentinel_core::error::SentinelResult;

use crate::pipelines::common::{EmbedStage, SummarizeStage, TranslateStage};
use crate::stage::{read_blob_bytes, write_blob_text, Stage, StageInput, StageOutput, WorkerContext};

pub struct TranscribeStage;

#[async_trait]
impl Stage for TranscribeStage {
    fn name(&self) -> &'static str {
        "transcribe"
    }

    async fn run(&self, cx: &WorkerContext, input: &StageInput) -> SentinelResult<StageOutput> {
        let bytes = read_blob_bytes(cx.blob_store.as_ref(), &input.blob_path).await?;
        let transcript = cx.transcriber.transcribe(&bytes).await?;

        let path = format!("{}/{}.transcript.txt", input.job_id, input.filename);
        write_blob_text(cx.blob_store.as_ref(), &path, "text/plain", &transcript).await?;

        Ok(StageOutput {
            blob_role: Some(("transcript".to_string(), path.clone())),
            next_blob_path: path,
            summary_text: None,
        })
    }
}

pub fn pipeline() -> Vec<Arc<dyn Stage>> {
    vec![Arc::new(TranscribeStage), Arc::new(TranslateStage), Arc::new(SummarizeStage), Arc::new(EmbedStage)]
}
