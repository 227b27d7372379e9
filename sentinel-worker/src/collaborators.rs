//! AI collaborator traits: the stage pipelines call through these, but the
//! actual transcription/translation/summarization/vision/embedding/graph-
//! extraction models are external services. Each trait ships one
//! deterministic stub implementation, used by tests and as the default
//! when no real collaborator is wired in.

use async_trait::async_trait;
use sentinel_core::error::SentinelResult;
use serde_json::Value;

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio_bytes: &[u8]) -> SentinelResult<String>;
}

#[async_trait]
pub trait OcrExtractor: Send + Sync {
    /// `language` is a hint for the OCR model's character set/dictionary
    /// (e.g. `"ar"`, `"ja"`); `None` lets it auto-detect.
    async fn extract_text(&self, document_bytes: &[u8], language: Option<&str>) -> SentinelResult<String>;
}

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, source_language: &str, target_language: &str) -> SentinelResult<String>;
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str) -> SentinelResult<String>;
}

#[async_trait]
pub trait VisionAnalyzer: Send + Sync {
    /// Pulls representative frame images out of raw video bytes. The
    /// result is opaque frame data (not text) meant to be stored and later
    /// handed to `analyze_frames`.
    async fn extract_frames(&self, video_bytes: &[u8]) -> SentinelResult<Vec<u8>>;

    /// Describes previously-extracted frame data.
    async fn analyze_frames(&self, frame_bytes: &[u8]) -> SentinelResult<String>;
}

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Fixed-dimension embedding for one chunk of text.
    async fn embed(&self, text: &str) -> SentinelResult<Vec<f32>>;

    fn dimensions(&self) -> usize;
}

#[derive(Debug, Clone)]
pub struct ExtractedEntity {
    pub label: String,
    pub kind: String,
    pub properties: Value,
}

#[derive(Debug, Clone)]
pub struct ExtractedRelation {
    pub from_label: String,
    pub to_label: String,
    pub relation: String,
    pub properties: Value,
}

#[derive(Debug, Clone, Default)]
pub struct GraphExtraction {
    pub entities: Vec<ExtractedEntity>,
    pub relations: Vec<ExtractedRelation>,
}

#[async_trait]
pub trait GraphExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> SentinelResult<GraphExtraction>;
}

/// Deterministic stand-ins for every collaborator above, good enough to
/// exercise the pipeline wiring end to end without a live model behind it.
pub mod stub {
    use super::*;

    pub struct StubTranscriber;
    #[async_trait]
    impl Transcriber for StubTranscriber {
        async fn transcribe(&self, audio_bytes: &[u8]) -> SentinelResult<String> {
            Ok(format!("[transcript, {} bytes of audio]", audio_bytes.len()))
        }
    }

    pub struct StubOcrExtractor;
    #[async_trait]
    impl OcrExtractor for StubOcrExtractor {
        async fn extract_text(&self, document_bytes: &[u8], language: Option<&str>) -> SentinelResult<String> {
            match language {
                Some(lang) => Ok(format!("[extracted text ({lang}), {} bytes of document]", document_bytes.len())),
                None => Ok(format!("[extracted text, {} bytes of document]", document_bytes.len())),
            }
        }
    }

    pub struct StubTranslator;
    #[async_trait]
    impl Translator for StubTranslator {
        async fn translate(&self, text: &str, source_language: &str, target_language: &str) -> SentinelResult<String> {
            Ok(format!("[{source_language}->{target_language}] {text}"))
        }
    }

    pub struct StubSummarizer;
    #[async_trait]
    impl Summarizer for StubSummarizer {
        async fn summarize(&self, text: &str) -> SentinelResult<String> {
            let head: String = text.chars().take(120).collect();
            Ok(format!("Summary: {head}"))
        }
    }

    pub struct StubVisionAnalyzer;
    #[async_trait]
    impl VisionAnalyzer for StubVisionAnalyzer {
        async fn extract_frames(&self, video_bytes: &[u8]) -> SentinelResult<Vec<u8>> {
            Ok(format!("[{} frame bytes extracted from video]", video_bytes.len()).into_bytes())
        }

        async fn analyze_frames(&self, frame_bytes: &[u8]) -> SentinelResult<String> {
            Ok(format!("[frame analysis, {} bytes of frame data]", frame_bytes.len()))
        }
    }

    pub struct StubEmbedder {
        pub dims: usize,
    }
    impl Default for StubEmbedder {
        fn default() -> Self {
            Self { dims: 8 }
        }
    }
    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, text: &str) -> SentinelResult<Vec<f32>> {
            let mut vector = vec![0f32; self.dims];
            for (i, byte) in text.bytes().enumerate() {
                vector[i % self.dims] += byte as f32;
            }
            let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt().max(1.0);
            Ok(vector.into_iter().map(|v| v / norm).collect())
        }

        fn dimensions(&self) -> usize {
            self.dims
        }
    }

    pub struct StubGraphExtractor;
    #[async_trait]
    impl GraphExtractor for StubGraphExtractor {
        async fn extract(&self, text: &str) -> SentinelResult<GraphExtraction> {
            let mut seen = std::collections::BTreeSet::new();
            let mut entities = Vec::new();
            for word in text.split_whitespace() {
                let cleaned: String = word.chars().filter(|c| c.is_alphanumeric()).collect();
                if cleaned.len() > 2 && cleaned.chars().next().map(|c| c.is_uppercase()).unwrap_or(false) {
                    if seen.insert(cleaned.clone()) {
                        entities.push(ExtractedEntity {
                            label: cleaned,
                            kind: "Entity".to_string(),
                            properties: Value::Object(Default::default()),
                        });
                    }
                }
            }
            Ok(GraphExtraction { entities, relations: Vec::new() })
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn stub_embedder_is_deterministic_and_normalized() {
            let embedder = StubEmbedder::default();
            let a = embedder.embed("hello world").await.unwrap();
            let b = embedder.embed("hello world").await.unwrap();
            assert_eq!(a, b);
            assert_eq!(a.len(), 8);
        }

        #[tokio::test]
        async fn stub_graph_extractor_finds_capitalized_words_once_each() {
            let extractor = StubGraphExtractor;
            let extraction = extractor.extract("Acme Corp met with Acme Corp and Globex Inc").await.unwrap();
            let labels: Vec<_> = extraction.entities.iter().map(|e| e.label.as_str()).collect();
            assert!(labels.contains(&"Acme"));
            assert!(labels.contains(&"Corp"));
            assert!(labels.contains(&"Globex"));
            assert_eq!(labels.iter().filter(|l| **l == "Acme").count(), 1);
        }
    }
}
