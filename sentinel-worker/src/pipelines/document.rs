//! `extract_text -> translate -> summarize -> embed`.

use std::sync::Arc;

use async_trait::async_trait;
use sentinel_core::error::SentinelResult;

use crate::pipelines::common::{EmbedStage, SummarizeStage, TranslateStage};
use crate::stage::{read_blob_bytes, write_blob_text, Stage, StageInput, StageOutput, WorkerContext};

pub struct ExtractTextStage;

#[async_trait]
impl Stage for ExtractTextStage {
    fn name(&self) -> &'static str {
        "extract_text"
    }

    async fn run(&self, cx: &WorkerContext, input: &StageInput) -> SentinelResult<StageOutput> {
        let bytes = read_blob_bytes(cx.blob_store.as_ref(), &input.blob_path).await?;
        let text = cx.ocr.extract_text(&bytes, input.source_language.as_deref()).await?;

        let path = format!("{}/{}.text.txt", input.job_id, input.filename);
        write_blob_text(cx.blob_store.as_ref(), &path, "text/plain", &text).await?;

        Ok(StageOutput {
            blob_role: Some(("text".to_string(), path.clone())),
            next_blob_path: path,
            summary_text: None,
        })
    }
}

pub fn pipeline() -> Vec<Arc<dyn Stage>> {
    vec![Arc::new(ExtractTextStage), Arc::new(TranslateStage), Arc::new(SummarizeStage), Arc::new(EmbedStage)]
}
