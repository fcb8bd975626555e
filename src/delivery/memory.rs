//! MemoryTransport: a `TokenTransport` that records calls in memory.
//!
//! Every call is recorded before a response is produced. Responses come from
//! a script queue; once the queue is empty, dispatches answer 204 and uploads
//! answer 201.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use token_dispatch_core::{
    reassemble, DispatchError, DispatchPayload, Envelope, FileContent, TokenDocument,
};

use super::types::{TokenTransport, TransportError, TransportResponse, DISPATCH_ACCEPTED};

type Scripted = Result<TransportResponse, TransportError>;

/// In-memory transport for tests and dry runs.
///
/// Interior mutability via `parking_lot::Mutex`, so the transport can sit
/// behind `Arc<dyn TokenTransport>`.
#[derive(Default)]
pub struct MemoryTransport {
    /// Wire payloads of every dispatch, in call order
    dispatched: Mutex<Vec<DispatchPayload>>,
    /// Every uploaded file, in call order
    uploaded: Mutex<Vec<FileContent>>,
    /// Pending responses, consumed one per call
    script: Mutex<VecDeque<Scripted>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue responses with the given statuses and empty bodies.
    pub fn with_statuses(statuses: impl IntoIterator<Item = u16>) -> Self {
        let transport = Self::new();
        for status in statuses {
            transport.push_response(TransportResponse::new(status, ""));
        }
        transport
    }

    pub fn push_response(&self, response: TransportResponse) {
        self.script.lock().push_back(Ok(response));
    }

    /// Queue a failure that never reached the remote side.
    pub fn push_error(&self, error: TransportError) {
        self.script.lock().push_back(Err(error));
    }

    pub fn dispatched(&self) -> Vec<DispatchPayload> {
        self.dispatched.lock().clone()
    }

    pub fn uploaded(&self) -> Vec<FileContent> {
        self.uploaded.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.dispatched.lock().len() + self.uploaded.lock().len()
    }

    /// Rebuild the token document from every dispatched payload, the way the
    /// receiving workflow would.
    pub fn received_document(&self) -> Result<TokenDocument, DispatchError> {
        let payloads: Vec<_> = self
            .dispatched
            .lock()
            .iter()
            .map(|p| p.client_payload.clone())
            .collect();
        reassemble(&payloads)
    }

    fn next_response(&self, default_status: u16) -> Scripted {
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(TransportResponse::new(default_status, "")))
    }
}

#[async_trait]
impl TokenTransport for MemoryTransport {
    async fn dispatch_event(
        &self,
        envelope: &Envelope,
    ) -> Result<TransportResponse, TransportError> {
        self.dispatched.lock().push(envelope.to_payload());
        self.next_response(DISPATCH_ACCEPTED)
    }

    async fn put_file(&self, file: &FileContent) -> Result<TransportResponse, TransportError> {
        self.uploaded.lock().push(file.clone());
        self.next_response(201)
    }
}
