//! Typed worker stage pipelines: document/audio/video/cdr fan-out plus the
//! shared graph terminal stage, driven by [`runtime::WorkerRuntime`] against
//! any [`sentinel_queue::backend::QueueBackend`].

pub mod collaborators;
pub mod pipelines;
pub mod runtime;
pub mod stage;

pub use collaborators::{Embedder, GraphExtractor, OcrExtractor, Summarizer, Transcriber, Translator, VisionAnalyzer};
pub use pipelines::{graph_pipeline, stages_for};
pub use runtime::WorkerRuntime;
pub use stage::{Stage, StageInput, StageOutput, WorkerContext};

pub mod prelude {
    pub use crate::{
        Embedder, GraphExtractor, OcrExtractor, Stage, StageInput, StageOutput, Summarizer, Transcriber, Translator,
        VisionAnalyzer, WorkerContext, WorkerRuntime,
    };
    pub use crate::pipelines::{graph_pipeline, stages_for};
}
