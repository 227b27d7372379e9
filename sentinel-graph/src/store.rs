//! [`GraphStore`]: the knowledge-graph surface the graph worker writes
//! through and the gateway's read endpoints query against.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sentinel_core::error::{SentinelError, SentinelResult};
use sentinel_core::model::{GraphEdge, GraphNode};
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::adapter::TypeDBAdapter;

#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Insert or merge a node, deduplicated within `case_name` on
    /// `(kind, label_normalized)`. Returns the stored (possibly merged) node.
    async fn upsert_node(
        &self,
        case_name: &str,
        label: &str,
        kind: &str,
        properties: Value,
        artifact_id: &str,
    ) -> SentinelResult<GraphNode>;

    /// Insert an edge. Edges are not deduplicated (a relation can legitimately
    /// repeat across artifacts); each call adds a new provenance record.
    async fn upsert_edge(
        &self,
        case_name: &str,
        from_node: &str,
        to_node: &str,
        relation: &str,
        properties: Value,
        artifact_id: &str,
    ) -> SentinelResult<GraphEdge>;

    /// List every node and edge recorded for a case.
    async fn query(&self, case_name: &str) -> SentinelResult<GraphQueryResult>;
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct GraphQueryResult {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// In-memory [`GraphStore`], used in tests and as the default when no TypeDB
/// deployment is configured.
#[derive(Default)]
pub struct MemoryGraphStore {
    nodes: Arc<Mutex<HashMap<(String, String, String), GraphNode>>>,
    edges: Arc<Mutex<Vec<GraphEdge>>>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn upsert_node(
        &self,
        case_name: &str,
        label: &str,
        kind: &str,
        properties: Value,
        artifact_id: &str,
    ) -> SentinelResult<GraphNode> {
        let key = (case_name.to_string(), kind.to_string(), label.trim().to_lowercase());
        let mut nodes = self.nodes.lock().await;
        let node = nodes.entry(key).or_insert_with(|| GraphNode {
            id: Uuid::new_v4().to_string(),
            case_name: case_name.to_string(),
            label: label.to_string(),
            kind: kind.to_string(),
            properties: Value::Object(serde_json::Map::new()),
            provenance: Vec::new(),
        });
        node.merge_from(properties, artifact_id);
        Ok(node.clone())
    }

    async fn upsert_edge(
        &self,
        case_name: &str,
        from_node: &str,
        to_node: &str,
        relation: &str,
        properties: Value,
        artifact_id: &str,
    ) -> SentinelResult<GraphEdge> {
        let edge = GraphEdge {
            id: Uuid::new_v4().to_string(),
            case_name: case_name.to_string(),
            from_node: from_node.to_string(),
            to_node: to_node.to_string(),
            relation: relation.to_string(),
            properties,
            artifact_id: artifact_id.to_string(),
        };
        self.edges.lock().await.push(edge.clone());
        Ok(edge)
    }

    async fn query(&self, case_name: &str) -> SentinelResult<GraphQueryResult> {
        let nodes = self.nodes.lock().await;
        let edges = self.edges.lock().await;
        Ok(GraphQueryResult {
            nodes: nodes.values().filter(|n| n.case_name == case_name).cloned().collect(),
            edges: edges.iter().filter(|e| e.case_name == case_name).cloned().collect(),
        })
    }
}

/// TypeDB-backed [`GraphStore`]. Upserts are match-then-write, serialized by
/// `own_lock` so two concurrent extractions of the same entity don't race
/// past the existence check (`TypeDBAdapter`'s own mutex only serializes a
/// single query, not this read-modify-write sequence).
pub struct TypeDbGraphStore {
    adapter: TypeDBAdapter,
    own_lock: Mutex<()>,
}

impl TypeDbGraphStore {
    pub fn new(adapter: TypeDBAdapter) -> Self {
        Self {
            adapter,
            own_lock: Mutex::new(()),
        }
    }

    fn escape(value: &str) -> String {
        value.replace('\\', "\\\\").replace('"', "\\\"")
    }
}

#[async_trait]
impl GraphStore for TypeDbGraphStore {
    async fn upsert_node(
        &self,
        case_name: &str,
        label: &str,
        kind: &str,
        properties: Value,
        artifact_id: &str,
    ) -> SentinelResult<GraphNode> {
        let _guard = self.own_lock.lock().await;
        let normalized = label.trim().to_lowercase();

        let find = format!(
            r#"match $n isa entity_node, has case_name "{case}", has entity_kind "{kind}", has label_normalized "{label}"; fetch {{ "id": $n.iid, "label": $n.label, "properties": $n.properties }};"#,
            case = Self::escape(case_name),
            kind = Self::escape(kind),
            label = Self::escape(&normalized),
        );
        let existing = self
            .adapter
            .read(serde_json::json!({ "query": find }))
            .await
            .map_err(|e| SentinelError::transient_io(e.to_string()))?;

        let answers = existing
            .get("ok")
            .and_then(|ok| ok.get("answers"))
            .and_then(|a| a.as_array())
            .cloned()
            .unwrap_or_default();

        if let Some(row) = answers.first() {
            let node_id = row
                .get("data")
                .and_then(|d| d.get("id"))
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            let mut merged_properties = row
                .get("data")
                .and_then(|d| d.get("properties"))
                .cloned()
                .unwrap_or(Value::Object(serde_json::Map::new()));
            if let (Some(existing), Some(incoming)) = (merged_properties.as_object_mut(), properties.as_object()) {
                for (k, v) in incoming {
                    existing.insert(k.clone(), v.clone());
                }
            }

            let update = format!(
                r#"match $n isa entity_node, has case_name "{case}", has entity_kind "{kind}", has label_normalized "{label}"; insert $n has properties "{props}", has provenance "{artifact}";"#,
                case = Self::escape(case_name),
                kind = Self::escape(kind),
                label = Self::escape(&normalized),
                props = Self::escape(&merged_properties.to_string()),
                artifact = Self::escape(artifact_id),
            );
            self.adapter
                .write(serde_json::json!({ "query": update }))
                .await
                .map_err(|e| SentinelError::transient_io(e.to_string()))?;

            return Ok(GraphNode {
                id: node_id,
                case_name: case_name.to_string(),
                label: label.to_string(),
                kind: kind.to_string(),
                properties: merged_properties,
                provenance: vec![artifact_id.to_string()],
            });
        }

        let node_id = Uuid::new_v4().to_string();
        let insert = format!(
            r#"insert $n isa entity_node, has node_id "{id}", has case_name "{case}", has entity_kind "{kind}", has label "{label}", has label_normalized "{normalized}", has properties "{props}", has provenance "{artifact}";"#,
            id = Self::escape(&node_id),
            case = Self::escape(case_name),
            kind = Self::escape(kind),
            label = Self::escape(label),
            normalized = Self::escape(&normalized),
            props = Self::escape(&properties.to_string()),
            artifact = Self::escape(artifact_id),
        );
        self.adapter
            .write(serde_json::json!({ "query": insert }))
            .await
            .map_err(|e| SentinelError::transient_io(e.to_string()))?;

        Ok(GraphNode {
            id: node_id,
            case_name: case_name.to_string(),
            label: label.to_string(),
            kind: kind.to_string(),
            properties,
            provenance: vec![artifact_id.to_string()],
        })
    }

    async fn upsert_edge(
        &self,
        case_name: &str,
        from_node: &str,
        to_node: &str,
        relation: &str,
        properties: Value,
        artifact_id: &str,
    ) -> SentinelResult<GraphEdge> {
        let edge_id = Uuid::new_v4().to_string();
        let insert = format!(
            r#"insert $e isa entity_relation, has edge_id "{id}", has case_name "{case}", has from_node "{from}", has to_node "{to}", has relation_kind "{relation}", has properties "{props}", has artifact_id "{artifact}";"#,
            id = Self::escape(&edge_id),
            case = Self::escape(case_name),
            from = Self::escape(from_node),
            to = Self::escape(to_node),
            relation = Self::escape(relation),
            props = Self::escape(&properties.to_string()),
            artifact = Self::escape(artifact_id),
        );
        self.adapter
            .write(serde_json::json!({ "query": insert }))
            .await
            .map_err(|e| SentinelError::transient_io(e.to_string()))?;

        Ok(GraphEdge {
            id: edge_id,
            case_name: case_name.to_string(),
            from_node: from_node.to_string(),
            to_node: to_node.to_string(),
            relation: relation.to_string(),
            properties,
            artifact_id: artifact_id.to_string(),
        })
    }

    async fn query(&self, case_name: &str) -> SentinelResult<GraphQueryResult> {
        let fetch = format!(
            r#"match $n isa entity_node, has case_name "{case}"; fetch {{ "id": $n.node_id, "label": $n.label, "kind": $n.entity_kind, "properties": $n.properties, "provenance": $n.provenance }};"#,
            case = Self::escape(case_name),
        );
        let _ = self
            .adapter
            .read(serde_json::json!({ "query": fetch }))
            .await
            .map_err(|e| SentinelError::transient_io(e.to_string()))?;

        // Node/edge reconstruction from TypeDB's generic document answers is
        // deployment-schema-specific; callers needing a fully materialized
        // result set should query the mirrored rows in the relational store
        // instead. This path exists for ad-hoc TypeQL exploration.
        Ok(GraphQueryResult::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dedups_within_case_by_kind_and_normalized_label() {
        let store = MemoryGraphStore::new();
        store
            .upsert_node("C3", "Acme Ltd", "Organization", serde_json::json!({"country": "US"}), "artifact-a")
            .await
            .unwrap();
        let merged = store
            .upsert_node("C3", "acme ltd", "Organization", serde_json::json!({"country": "UK"}), "artifact-b")
            .await
            .unwrap();

        assert_eq!(merged.properties["country"], "UK");
        assert_eq!(merged.provenance, vec!["artifact-a", "artifact-b"]);

        let result = store.query("C3").await.unwrap();
        assert_eq!(result.nodes.len(), 1);
    }

    #[tokio::test]
    async fn distinct_kinds_do_not_merge() {
        let store = MemoryGraphStore::new();
        store
            .upsert_node("C3", "Acme", "Organization", Value::Null, "artifact-a")
            .await
            .unwrap();
        store
            .upsert_node("C3", "Acme", "Person", Value::Null, "artifact-b")
            .await
            .unwrap();
        let result = store.query("C3").await.unwrap();
        assert_eq!(result.nodes.len(), 2);
    }

    #[tokio::test]
    async fn edges_are_not_deduplicated() {
        let store = MemoryGraphStore::new();
        let n1 = store
            .upsert_node("C3", "Acme", "Organization", Value::Null, "artifact-a")
            .await
            .unwrap();
        let n2 = store
            .upsert_node("C3", "Jane Doe", "Person", Value::Null, "artifact-a")
            .await
            .unwrap();
        store
            .upsert_edge("C3", &n2.id, &n1.id, "works_at", Value::Null, "artifact-a")
            .await
            .unwrap();
        store
            .upsert_edge("C3", &n2.id, &n1.id, "works_at", Value::Null, "artifact-b")
            .await
            .unwrap();
        let result = store.query("C3").await.unwrap();
        assert_eq!(result.edges.len(), 2);
    }

    #[tokio::test]
    async fn query_scopes_to_case() {
        let store = MemoryGraphStore::new();
        store
            .upsert_node("C3", "Acme", "Organization", Value::Null, "artifact-a")
            .await
            .unwrap();
        store
            .upsert_node("C4", "Other Corp", "Organization", Value::Null, "artifact-z")
            .await
            .unwrap();
        let result = store.query("C3").await.unwrap();
        assert_eq!(result.nodes.len(), 1);
        assert_eq!(result.nodes[0].label, "Acme");
    }
}
