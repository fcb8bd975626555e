//! Delivery-specific types: transport trait, transport responses and errors,
//! and the result reported after a plan has been sent.

use std::sync::Arc;

use async_trait::async_trait;
use token_dispatch_core::{Envelope, FileContent};

use crate::error::DeliveryError;

/// Status returned by the dispatch endpoint when the event was accepted.
pub const DISPATCH_ACCEPTED: u16 = 204;

// ============================================================================
// TokenTransport: network layer
// ============================================================================

/// Sends one envelope (or one file) to the remote repository.
///
/// Implementations report the remote status verbatim; deciding whether a
/// status counts as success is left to the coordinator. Timeouts belong here,
/// not in the coordinator.
#[async_trait]
pub trait TokenTransport: Send + Sync {
    /// Trigger the remote workflow keyed by the envelope's event type.
    /// Accepted events answer 204; oversized or malformed ones 422.
    async fn dispatch_event(
        &self,
        envelope: &Envelope,
    ) -> Result<TransportResponse, TransportError>;

    /// Write a file straight into the repository. Answers 200 or 201.
    async fn put_file(&self, file: &FileContent) -> Result<TransportResponse, TransportError>;
}

/// Raw status and body of a remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_dispatch_success(&self) -> bool {
        self.status == DISPATCH_ACCEPTED
    }

    pub fn is_upload_success(&self) -> bool {
        matches!(self.status, 200 | 201)
    }
}

/// Classification of transport failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Request never got a response (connection, TLS, timeout).
    Network,
    /// Bad or missing credentials (401/403).
    Auth,
    /// Remote refused the payload, usually for size (413/422).
    Rejected,
    /// Any other non-success status.
    Remote,
}

impl TransportErrorKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => TransportErrorKind::Auth,
            413 | 422 => TransportErrorKind::Rejected,
            _ => TransportErrorKind::Remote,
        }
    }
}

/// A failed transport call.
#[derive(Debug, Clone)]
pub struct TransportError {
    pub message: String,
    pub kind: TransportErrorKind,
    /// Remote status, when a response was received.
    pub status: Option<u16>,
}

impl TransportError {
    /// A network-level failure with no response.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: TransportErrorKind::Network,
            status: None,
        }
    }

    pub fn with_kind(message: impl Into<String>, kind: TransportErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
            status: None,
        }
    }

    /// Turn a non-success response into an error classified by its status.
    pub fn from_response(response: &TransportResponse) -> Self {
        let message = if response.body.trim().is_empty() {
            format!("unexpected status {}", response.status)
        } else {
            format!("status {}: {}", response.status, response.body.trim())
        };
        Self {
            message,
            kind: TransportErrorKind::from_status(response.status),
            status: Some(response.status),
        }
    }
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TransportError {}

// ============================================================================
// Delivery results
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Every call succeeded.
    Success,
    /// Some calls succeeded before one failed; the rest were not sent.
    PartialFailure,
    /// The first call failed.
    Failure,
}

/// Details of the call that stopped a delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    /// 1-based position of the failed call.
    pub index: usize,
    /// Category of the envelope, or the file path for uploads.
    pub category: String,
    pub status: Option<u16>,
    pub kind: TransportErrorKind,
    pub message: String,
}

/// Outcome of sending a plan. Transport failures land here, never as `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResult {
    pub outcome: DeliveryOutcome,
    pub succeeded: usize,
    pub total: usize,
    pub first_failure: Option<DeliveryFailure>,
}

impl DeliveryResult {
    pub fn is_success(&self) -> bool {
        self.outcome == DeliveryOutcome::Success
    }

    /// Convert a failed delivery into `DeliveryError::Transport`.
    pub fn ensure_success(&self) -> Result<(), DeliveryError> {
        match &self.first_failure {
            None => Ok(()),
            Some(failure) => Err(DeliveryError::Transport {
                index: failure.index,
                succeeded: self.succeeded,
                total: self.total,
                kind: failure.kind,
                message: failure.message.clone(),
            }),
        }
    }
}

/// Progress callback payload, fired after each successful call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryProgress {
    pub index: usize,
    pub total: usize,
    pub category: String,
}

pub type DeliveryProgressCallback = Arc<dyn Fn(&DeliveryProgress) + Send + Sync>;

// ============================================================================
// Coordinator options
// ============================================================================

/// Configuration for `DeliveryCoordinator`.
#[derive(Clone, Default)]
pub struct CoordinatorOptions {
    /// After a successful file upload, also dispatch the metadata envelope
    /// so the remote workflow learns about the new file (default: false).
    pub notify_after_upload: bool,
    /// Called to report progress
    pub on_progress: Option<DeliveryProgressCallback>,
}
