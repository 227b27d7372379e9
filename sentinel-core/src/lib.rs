//! sentinel-core: domain model, error taxonomy, and configuration shared by
//! every crate in the Sentinel AI job fabric.

pub mod config;
pub mod error;
pub mod model;
pub mod rbac;

pub use config::SentinelConfig;
pub use error::{ErrorKind, JobOutcome, SentinelError, SentinelResult};
pub use model::*;
pub use rbac::Principal;

pub mod prelude {
    pub use crate::config::SentinelConfig;
    pub use crate::error::{ErrorKind, JobOutcome, SentinelError, SentinelResult};
    pub use crate::model::*;
    pub use crate::rbac::Principal;
}
