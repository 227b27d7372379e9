//! Structured error taxonomy shared by every Sentinel crate.
//!
//! Mirrors the shape of a Feathers-style error: a stable `kind`, a
//! human-readable `message`, and optional structured `data`. Transport
//! crates (`sentinel-gateway`) decide how to serialize it; worker crates
//! decide how to map it onto retry behavior via [`JobOutcome`].

use std::fmt;

use serde_json::Value;

/// The eight error kinds a stage or handler can fail with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or missing input (bad upload, bad query params).
    Validation,
    /// Missing, invalid, or expired credentials.
    Authorization,
    /// Referenced entity does not exist or is outside the caller's scope.
    NotFound,
    /// The requested mutation conflicts with current state (e.g. stale version).
    Conflict,
    /// A collaborator (storage, queue, network) failed in a way that is
    /// expected to succeed on retry.
    TransientIo,
    /// A worker stage produced a definitive, non-retryable failure.
    StageFailed,
    /// A stage repeatedly fails in a way that corrupts state if retried as-is.
    Poison,
    /// Programmer error / invariant violation; should not normally happen.
    Fatal,
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::Authorization => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::TransientIo => 503,
            ErrorKind::StageFailed => 422,
            ErrorKind::Poison => 422,
            ErrorKind::Fatal => 500,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "Validation",
            ErrorKind::Authorization => "Authorization",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::TransientIo => "TransientIo",
            ErrorKind::StageFailed => "StageFailed",
            ErrorKind::Poison => "Poison",
            ErrorKind::Fatal => "Fatal",
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Authorization => "authorization",
            ErrorKind::NotFound => "not-found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::TransientIo => "transient-io",
            ErrorKind::StageFailed => "stage-failed",
            ErrorKind::Poison => "poison",
            ErrorKind::Fatal => "fatal",
        }
    }

    /// Whether a worker should retry the stage that produced this kind.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::TransientIo)
    }
}

#[derive(Debug)]
pub struct SentinelError {
    pub kind: ErrorKind,
    pub message: String,
    pub data: Option<Value>,
    pub source: Option<anyhow::Error>,
}

impl SentinelError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            data: None,
            source: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    pub fn code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, msg)
    }
    pub fn authorization(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authorization, msg)
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, msg)
    }
    pub fn transient_io(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::TransientIo, msg)
    }
    pub fn stage_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::StageFailed, msg)
    }
    pub fn poison(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Poison, msg)
    }
    pub fn fatal(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Fatal, msg)
    }

    /// Collapse an arbitrary error into a `SentinelError`, keeping it if it
    /// already is one.
    pub fn normalize(err: anyhow::Error) -> SentinelError {
        match err.downcast::<SentinelError>() {
            Ok(se) => se,
            Err(other) => SentinelError::fatal(other.to_string()).with_source(other),
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "name": self.kind.name(),
            "className": self.kind.class_name(),
            "code": self.code(),
            "message": self.message,
            "data": self.data,
        })
    }
}

impl fmt::Display for SentinelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.kind.name(), self.code(), self.message)
    }
}

impl std::error::Error for SentinelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_deref()
    }
}

pub type SentinelResult<T> = std::result::Result<T, SentinelError>;

/// Outcome of a worker stage, used to decide retry vs. terminal failure
/// independent of the HTTP-facing [`ErrorKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Retryable,
    Permanent,
}

impl From<&SentinelError> for JobOutcome {
    fn from(err: &SentinelError) -> Self {
        if err.kind.is_retryable() {
            JobOutcome::Retryable
        } else {
            JobOutcome::Permanent
        }
    }
}

#[macro_export]
macro_rules! bail_sentinel {
    ($ctor:ident, $msg:expr) => {
        return Err($crate::error::SentinelError::$ctor($msg));
    };
    ($ctor:ident, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::error::SentinelError::$ctor(format!($fmt, $($arg)*)));
    };
}
