//! Category-boundary chunking and deep-merge reassembly.
//!
//! A document is split into one fragment per top-level category. A category
//! whose trial envelope does not fit the per-chunk budget is split once more
//! by its immediate sub-keys. Splitting stops there: a sub-key fragment that
//! is still too large is emitted unchanged and flagged later by the selector.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::Result;
use crate::size::estimate;
use crate::types::{DeliveryOptions, Envelope, Sequence, TokenDocument};

/// One fragment of a document: `{category: subtree}` or
/// `{category: {subkey: value}}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// `category` or `category.subkey`.
    pub category: String,
    pub fragment: TokenDocument,
}

impl Chunk {
    pub fn to_envelope(&self, options: &DeliveryOptions, sequence: Sequence) -> Result<Envelope> {
        Ok(Envelope::chunk(
            options,
            self.fragment.to_json()?,
            self.category.clone(),
            sequence,
        ))
    }
}

/// Partition `document` along category boundaries.
///
/// Chunks come back in document order; sequence numbers are not assigned
/// here because the final count is only known once every category has been
/// measured.
pub fn split(
    document: &TokenDocument,
    per_chunk_budget: usize,
    options: &DeliveryOptions,
) -> Result<Vec<Chunk>> {
    // Total used for trial envelopes before the real count is known.
    let provisional = Sequence {
        index: 1,
        total: document.len(),
    };
    let mut chunks = Vec::with_capacity(document.len());

    for (category, subtree) in document.categories() {
        let whole = Chunk {
            category: category.clone(),
            fragment: TokenDocument::new().with_category(category.clone(), subtree.clone()),
        };
        let trial = estimate(&whole.to_envelope(options, provisional)?);

        if trial < per_chunk_budget {
            debug!(category = %category, size = trial, "category fits in one chunk");
            chunks.push(whole);
            continue;
        }

        match subtree.as_object() {
            Some(children) if !children.is_empty() => {
                debug!(
                    category = %category,
                    size = trial,
                    budget = per_chunk_budget,
                    subkeys = children.len(),
                    "splitting category by sub-key"
                );
                for (key, value) in children {
                    let mut inner = Map::new();
                    inner.insert(key.clone(), value.clone());
                    chunks.push(Chunk {
                        category: format!("{}.{}", category, key),
                        fragment: TokenDocument::new()
                            .with_category(category.clone(), Value::Object(inner)),
                    });
                }
            }
            _ => {
                warn!(
                    category = %category,
                    size = trial,
                    budget = per_chunk_budget,
                    "category has no sub-keys to split on, emitting as-is"
                );
                chunks.push(whole);
            }
        }
    }

    Ok(chunks)
}

/// Deep-union fragments back into one document.
///
/// Objects merge key by key; any other value replaces what was there.
pub fn merge_fragments(fragments: impl IntoIterator<Item = TokenDocument>) -> TokenDocument {
    let mut merged = Map::new();
    for fragment in fragments {
        if let Value::Object(source) = fragment.into_value() {
            deep_merge(&mut merged, source);
        }
    }
    TokenDocument::from(merged)
}

fn deep_merge(target: &mut Map<String, Value>, source: Map<String, Value>) {
    for (key, value) in source {
        if let Value::Object(incoming) = value {
            if let Some(Value::Object(existing)) = target.get_mut(&key) {
                deep_merge(existing, incoming);
                continue;
            }
            target.insert(key, Value::Object(incoming));
        } else {
            target.insert(key, value);
        }
    }
}
