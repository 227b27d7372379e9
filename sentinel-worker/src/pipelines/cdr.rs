//! `parse_records -> suspect_matching -> summarize`. Call-detail records
//! need no translation and no embedding: parsing and suspect matching are
//! deterministic, local transforms, not AI collaborator calls, and there's
//! no free-text worth chunking once the match report replaces the raw feed.

use std::sync::Arc;

use async_trait::async_trait;
use sentinel_core::error::SentinelResult;

use crate::pipelines::common::SummarizeStage;
use crate::stage::{read_blob_bytes, read_blob_text, write_blob_text, Stage, StageInput, StageOutput, WorkerContext};

pub struct ParseRecordsStage;

#[async_trait]
impl Stage for ParseRecordsStage {
    fn name(&self) -> &'static str {
        "parse_records"
    }

    async fn run(&self, cx: &WorkerContext, input: &StageInput) -> SentinelResult<StageOutput> {
        let bytes = read_blob_bytes(cx.blob_store.as_ref(), &input.blob_path).await?;
        let raw = String::from_utf8_lossy(&bytes);
        let normalized: String = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        let path = format!("{}/{}.records.txt", input.job_id, input.filename);
        write_blob_text(cx.blob_store.as_ref(), &path, "text/plain", &normalized).await?;

        Ok(StageOutput {
            blob_role: Some(("records".to_string(), path.clone())),
            next_blob_path: path,
            summary_text: None,
        })
    }
}

pub struct SuspectMatchingStage;

#[async_trait]
impl Stage for SuspectMatchingStage {
    fn name(&self) -> &'static str {
        "suspect_matching"
    }

    async fn run(&self, cx: &WorkerContext, input: &StageInput) -> SentinelResult<StageOutput> {
        let records = read_blob_text(cx.blob_store.as_ref(), &input.blob_path).await?;
        let haystack = records.to_lowercase();

        let suspects = cx.metadata.suspects_for_job(&input.job_id).await?;
        let mut report = String::new();
        let mut any_match = false;
        for suspect in &suspects {
            let hits: Vec<&str> = suspect
                .fields
                .iter()
                .filter(|f| !f.value.is_empty() && haystack.contains(&f.value.to_lowercase()))
                .map(|f| f.key.as_str())
                .collect();
            if hits.is_empty() {
                continue;
            }
            any_match = true;
            report.push_str(&format!("suspect {}: matched on {}\n", suspect.id, hits.join(", ")));
        }
        if !any_match {
            report.push_str("no suspect fields matched any record\n");
        }

        let path = format!("{}/{}.suspect_matches.txt", input.job_id, input.filename);
        write_blob_text(cx.blob_store.as_ref(), &path, "text/plain", &report).await?;

        Ok(StageOutput {
            blob_role: Some(("suspect_matches".to_string(), path)),
            // Summarization still runs over the parsed records, not the
            // match report.
            next_blob_path: input.blob_path.clone(),
            summary_text: None,
        })
    }
}

pub fn pipeline() -> Vec<Arc<dyn Stage>> {
    vec![Arc::new(ParseRecordsStage), Arc::new(SuspectMatchingStage), Arc::new(SummarizeStage)]
}
