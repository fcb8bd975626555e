//! Size-adaptive delivery of design-token documents.
//!
//! A document is turned into a [`DeliveryPlan`] by [`select`] (direct,
//! compressed, chunked or file upload) and then sent, one call at a time, by
//! a [`DeliveryCoordinator`] through a [`TokenTransport`].
//!
//! The selection machinery lives in `token-dispatch-core` and is re-exported
//! here.

use std::sync::Arc;

pub mod config;
pub mod delivery;
pub mod error;

pub use config::DispatchConfig;
#[cfg(feature = "github")]
pub use delivery::GitHubTransport;
pub use delivery::{
    CoordinatorOptions, DeliveryCoordinator, DeliveryFailure, DeliveryOutcome,
    DeliveryProgress, DeliveryResult, MemoryTransport, TokenTransport, TransportError,
    TransportErrorKind, TransportResponse,
};
pub use error::{DeliveryError, Result};
pub use token_dispatch_core::{
    compress, decode_envelope, decode_tokens, decompress, encode_envelope, estimate,
    reassemble, select, split, ClientPayload, DeliveryOptions, DeliveryPlan, DispatchError,
    DispatchPayload, Envelope, FileContent, PayloadBody, PlannedEnvelope, Sequence,
    StrategyKind, StrategyPreference, TokenDocument,
};

/// Select a strategy for `document` and deliver it through `transport`.
///
/// Selection errors are returned as `Err`; transport failures are reported
/// in the `DeliveryResult`.
pub async fn send_tokens(
    document: &TokenDocument,
    options: &DeliveryOptions,
    transport: Arc<dyn TokenTransport>,
) -> Result<DeliveryResult> {
    let plan = select(document, options)?;
    Ok(DeliveryCoordinator::new(transport).deliver(&plan).await)
}
