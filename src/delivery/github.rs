//! GitHub transport: repository dispatch events and contents API writes.
//!
//! Request bodies are the exact bytes of `encode_envelope` / `encode_file`,
//! so the size checked during selection is the size that goes on the wire.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Method};
use token_dispatch_core::{encode_envelope, encode_file, Envelope, FileContent};
use tracing::debug;

use super::types::{TokenTransport, TransportError, TransportErrorKind, TransportResponse};
use crate::config::DispatchConfig;
use crate::error::{DeliveryError, Result};

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

pub struct GitHubTransport {
    client: Client,
    config: DispatchConfig,
}

impl GitHubTransport {
    /// Validate `config` and build an HTTP client with its timeout.
    pub fn new(config: DispatchConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.timeout())
            .use_rustls_tls()
            .build()
            .map_err(|e| DeliveryError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn dispatches_url(&self) -> String {
        format!(
            "{}/repos/{}/dispatches",
            self.config.api_base.trim_end_matches('/'),
            self.config.owner_repo
        )
    }

    pub fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/contents/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.owner_repo,
            path.trim_start_matches('/')
        )
    }

    async fn send(
        &self,
        method: Method,
        url: String,
        body: Vec<u8>,
    ) -> std::result::Result<TransportResponse, TransportError> {
        debug!(method = %method, url = %url, bytes = body.len(), "sending request");
        let response = self
            .client
            .request(method, &url)
            .header(AUTHORIZATION, format!("token {}", self.config.token))
            .header(ACCEPT, GITHUB_ACCEPT)
            .header(USER_AGENT, &self.config.user_agent)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| TransportError::new(format!("request to {} failed: {}", url, e)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::new(format!("reading response body failed: {}", e)))?;
        Ok(TransportResponse::new(status, body))
    }
}

fn encoding_failure(err: impl std::fmt::Display) -> TransportError {
    TransportError::with_kind(
        format!("could not encode request body: {}", err),
        TransportErrorKind::Rejected,
    )
}

#[async_trait]
impl TokenTransport for GitHubTransport {
    async fn dispatch_event(
        &self,
        envelope: &Envelope,
    ) -> std::result::Result<TransportResponse, TransportError> {
        let body = encode_envelope(envelope).map_err(encoding_failure)?;
        self.send(Method::POST, self.dispatches_url(), body).await
    }

    async fn put_file(
        &self,
        file: &FileContent,
    ) -> std::result::Result<TransportResponse, TransportError> {
        let body = encode_file(file).map_err(encoding_failure)?;
        self.send(Method::PUT, self.contents_url(&file.path), body).await
    }
}
