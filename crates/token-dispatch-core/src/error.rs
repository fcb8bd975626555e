use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Invalid token document: {0}")]
    InvalidDocument(String),

    #[error("Invalid delivery options: {0}")]
    InvalidOptions(String),

    #[error(
        "Payload exceeds budget of {budget} bytes (direct: {direct}, compressed: {compressed}, largest chunk: {largest_chunk})"
    )]
    SizeExceeded {
        budget: usize,
        direct: usize,
        compressed: usize,
        largest_chunk: usize,
    },

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Incomplete chunk set: expected {expected} chunks, got {got}")]
    IncompleteChunkSet { expected: usize, got: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DispatchError>;
