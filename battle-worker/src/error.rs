use thiserror::Error;

/// Fatal conditions that end the worker's `run` loop.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("duplicate battle id: {0}")]
    DuplicateBattleId(String),
    #[error("battle request had no frames")]
    EmptyMessage,
    #[error("malformed battle request: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("a battle dispatch task panicked")]
    DispatchPanicked,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
