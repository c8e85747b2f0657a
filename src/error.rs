use thiserror::Error;

/// The error taxonomy shared by every component in the orchestration core.
///
/// Each component propagates one of these variants rather than inventing its
/// own; `GameResult::err` and the worker message protocol both carry this
/// type so a caller on either side of a channel sees the same vocabulary.
#[derive(Debug, Error, Clone)]
pub enum Error {
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    Shape { expected: Vec<usize>, got: Vec<usize> },

    #[error("value out of range: {0}")]
    Value(String),

    #[error("model error: {0}")]
    ModelError(String),

    #[error("terminated")]
    Terminated,

    #[error("overloaded")]
    Overloaded,

    #[error("simulation error: {0}")]
    SimError(String),

    #[error("protocol error: {0}")]
    ProtocolError(String),

    #[error("worker crashed: {0}")]
    WorkerCrashed(String),
}

pub type Result<T> = std::result::Result<T, Error>;
