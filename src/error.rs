use thiserror::Error;
use token_dispatch_core::DispatchError;

use crate::delivery::types::TransportErrorKind;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(
        "Delivery failed at envelope {index} of {total} ({succeeded} delivered): {message}"
    )]
    Transport {
        index: usize,
        succeeded: usize,
        total: usize,
        kind: TransportErrorKind,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, DeliveryError>;
