//! gzip + base64 codec for the `tokens` field.
//!
//! Format: standard base64 (padded) of a gzip member at the default level.
//! The receiving workflow reverses it with a plain gunzip.

use std::io::{Read, Write};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{DispatchError, Result};

/// Compress bytes and encode the gzip stream as base64.
pub fn compress(data: &[u8]) -> Result<String> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| DispatchError::Encoding(format!("gzip write failed: {}", e)))?;
    let gz = encoder
        .finish()
        .map_err(|e| DispatchError::Encoding(format!("gzip finish failed: {}", e)))?;
    Ok(STANDARD.encode(gz))
}

/// Decode base64 and gunzip back to the original bytes.
pub fn decompress(encoded: &str) -> Result<Vec<u8>> {
    let gz = STANDARD
        .decode(encoded.trim())
        .map_err(|e| DispatchError::Encoding(format!("invalid base64: {}", e)))?;
    let mut out = Vec::new();
    GzDecoder::new(gz.as_slice())
        .read_to_end(&mut out)
        .map_err(|e| DispatchError::Encoding(format!("invalid gzip stream: {}", e)))?;
    Ok(out)
}
