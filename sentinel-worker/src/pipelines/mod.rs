//! One ordered [`Stage`] sequence per media type, plus the shared graph
//! stage every typed pipeline hands off to on success.

pub mod audio;
pub mod cdr;
pub mod common;
pub mod document;
pub mod graph;
pub mod video;

use std::sync::Arc;

use sentinel_core::model::MediaType;

use crate::stage::Stage;

/// The stage sequence a media type's artifacts run through before handing
/// off to the graph queue. Order matches [`MediaType::stage_sequence`].
pub fn stages_for(media_type: MediaType) -> Vec<Arc<dyn Stage>> {
    match media_type {
        MediaType::Document => document::pipeline(),
        MediaType::Audio => audio::pipeline(),
        MediaType::Video => video::pipeline(),
        MediaType::Cdr => cdr::pipeline(),
    }
}

/// The single-stage pipeline run by the graph worker.
pub fn graph_pipeline() -> Vec<Arc<dyn Stage>> {
    graph::pipeline()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names_match_media_type_sequence() {
        for media_type in [MediaType::Document, MediaType::Audio, MediaType::Video, MediaType::Cdr] {
            let stages = stages_for(media_type);
            let names: Vec<&str> = stages.iter().map(|s| s.name()).collect();
            assert_eq!(names, media_type.stage_sequence());
        }
    }

    #[test]
    fn graph_pipeline_is_single_stage() {
        assert_eq!(graph_pipeline().len(), 1);
        assert_eq!(graph_pipeline()[0].name(), "extract_graph");
    }
}
