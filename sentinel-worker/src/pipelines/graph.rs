//! The shared terminal stage, fed by every media-type pipeline's `graph`
//! queue handoff: extracts entities/relations from an artifact's text and
//! folds them into the case-scoped knowledge graph.

use std::sync::Arc;

use async_trait::async_trait;
use sentinel_core::error::SentinelResult;
use std::collections::HashMap;

use crate::stage::{read_blob_text, Stage, StageInput, StageOutput, WorkerContext};

pub struct GraphExtractStage;

#[async_trait]
impl Stage for GraphExtractStage {
    fn name(&self) -> &'static str {
        "extract_graph"
    }

    async fn run(&self, cx: &WorkerContext, input: &StageInput) -> SentinelResult<StageOutput> {
        let job = cx.metadata.get_job(&input.job_id).await?;
        let text = read_blob_text(cx.blob_store.as_ref(), &input.blob_path).await?;
        let extraction = cx.graph_extractor.extract(&text).await?;

        let mut node_ids: HashMap<String, String> = HashMap::new();
        for entity in &extraction.entities {
            let node = cx
                .graph_store
                .upsert_node(&job.case_name, &entity.label, &entity.kind, entity.properties.clone(), &input.artifact_id)
                .await?;
            node_ids.insert(entity.label.clone(), node.id);
        }

        for relation in &extraction.relations {
            let (Some(from_id), Some(to_id)) = (node_ids.get(&relation.from_label), node_ids.get(&relation.to_label)) else {
                // Relation refers to an entity this extraction pass didn't
                // also surface as a node; skip rather than link to nothing.
                continue;
            };
            cx.graph_store
                .upsert_edge(&job.case_name, from_id, to_id, &relation.relation, relation.properties.clone(), &input.artifact_id)
                .await?;
        }

        Ok(StageOutput {
            blob_role: None,
            next_blob_path: input.blob_path.clone(),
            summary_text: None,
        })
    }
}

pub fn pipeline() -> Vec<Arc<dyn Stage>> {
    vec![Arc::new(GraphExtractStage)]
}
