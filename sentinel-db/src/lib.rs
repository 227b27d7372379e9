//! sentinel-db: the relational metadata store backing jobs, artifacts,
//! suspects, chunks, and the activity log, with RBAC-filtered reads and a
//! compare-and-set write path for job aggregate counters.

pub mod memory;
pub mod postgres;
pub mod store;
pub mod types;

pub use memory::MemoryMetadataStore;
pub use postgres::PostgresMetadataStore;
pub use store::{MetadataStore, StageUpdate};
pub use types::{JobResults, JobSummary, NewArtifactInput, NewJobInput, NewSuspectInput};

pub mod prelude {
    pub use crate::{
        JobResults, JobSummary, MemoryMetadataStore, MetadataStore, NewArtifactInput, NewJobInput,
        NewSuspectInput, PostgresMetadataStore, StageUpdate,
    };
    pub use async_trait::async_trait;
}
