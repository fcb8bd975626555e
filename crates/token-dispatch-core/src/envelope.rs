//! Envelope JSON encode/decode, plus token recovery on the receiving side.

use crate::chunk::merge_fragments;
use crate::compress::decompress;
use crate::error::{DispatchError, Result};
use crate::types::{ClientPayload, DispatchPayload, Envelope, FileContent, TokenDocument};

/// Encode an envelope as the compact JSON request body.
pub fn encode_envelope(envelope: &Envelope) -> Result<Vec<u8>> {
    serde_json::to_vec(&envelope.to_payload()).map_err(|e| DispatchError::Encoding(e.to_string()))
}

/// Encode a file-upload body.
pub fn encode_file(file: &FileContent) -> Result<Vec<u8>> {
    serde_json::to_vec(file).map_err(|e| DispatchError::Encoding(e.to_string()))
}

/// Decode a request body into its wire form.
pub fn decode_envelope(data: &[u8]) -> Result<DispatchPayload> {
    Ok(serde_json::from_slice(data)?)
}

/// Recover the token document carried by one payload.
///
/// Compressed payloads are gunzipped first. Metadata-only payloads (file
/// uploads) carry no tokens and are rejected.
pub fn decode_tokens(payload: &ClientPayload) -> Result<TokenDocument> {
    let tokens = payload.tokens.as_deref().ok_or_else(|| {
        DispatchError::InvalidPayload(format!(
            "payload for {} carries no tokens (upload method: {})",
            payload.filename,
            payload.upload_method.as_deref().unwrap_or("none")
        ))
    })?;

    if payload.compressed.unwrap_or(false) {
        let json = decompress(tokens)?;
        TokenDocument::from_slice(&json)
    } else {
        TokenDocument::from_json(tokens)
    }
}

/// Rebuild a document from every payload of a plan.
///
/// Chunked payloads must all declare the same `totalCategories`, and exactly
/// that many must be present.
pub fn reassemble(payloads: &[ClientPayload]) -> Result<TokenDocument> {
    if payloads.is_empty() {
        return Err(DispatchError::InvalidPayload("no payloads to reassemble".to_string()));
    }

    let mut declared = None;
    for payload in payloads {
        match (declared, payload.total_categories) {
            (None, Some(total)) => declared = Some(total),
            (Some(expected), Some(total)) if expected != total => {
                return Err(DispatchError::InvalidPayload(format!(
                    "mixed chunk sets: totalCategories {} and {}",
                    expected, total
                )));
            }
            _ => {}
        }
    }

    if let Some(expected) = declared {
        if payloads.len() != expected {
            return Err(DispatchError::IncompleteChunkSet {
                expected,
                got: payloads.len(),
            });
        }
    }

    let fragments = payloads
        .iter()
        .map(decode_tokens)
        .collect::<Result<Vec<_>>>()?;
    Ok(merge_fragments(fragments))
}
