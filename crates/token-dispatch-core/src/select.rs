//! Strategy selection.
//!
//! Strategies are tried in a fixed order and the first whose envelope is
//! strictly below the budget wins:
//!
//! 1. Direct: the whole document as raw JSON.
//! 2. Compressed: gzip + base64 of the same JSON.
//! 3. Chunked: one envelope per category (or sub-key), best effort.
//!
//! File upload is never picked automatically; callers opt into it through
//! [`StrategyPreference::FileUpload`] because it changes what the receiver
//! has to do.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, info, warn};

use crate::chunk::split;
use crate::compress::compress;
use crate::error::{DispatchError, Result};
use crate::size::estimate;
use crate::types::{
    DeliveryOptions, DeliveryPlan, Envelope, FileContent, PayloadBody, PlannedEnvelope,
    Sequence, StrategyKind, StrategyPreference, TokenDocument,
};

/// Build a delivery plan for `document`. No I/O happens here.
pub fn select(document: &TokenDocument, options: &DeliveryOptions) -> Result<DeliveryPlan> {
    options.validate()?;
    let budget = options.size_budget;

    if options.strategy == StrategyPreference::FileUpload {
        return file_upload_plan(document, options);
    }

    let json = document.to_json()?;

    let direct = Envelope::whole(options, PayloadBody::Raw(json.clone()));
    let direct_size = estimate(&direct);
    debug!(size = direct_size, budget, "direct envelope measured");
    if direct_size < budget {
        info!(strategy = %StrategyKind::Direct, size = direct_size, "strategy selected");
        return Ok(single(StrategyKind::Direct, direct, direct_size, budget));
    }

    let compressed = Envelope::whole(
        options,
        PayloadBody::Compressed {
            data: compress(json.as_bytes())?,
            original_size: json.len(),
        },
    );
    let compressed_size = estimate(&compressed);
    debug!(size = compressed_size, budget, "compressed envelope measured");
    if compressed_size < budget {
        info!(
            strategy = %StrategyKind::Compressed,
            size = compressed_size,
            original = direct_size,
            "strategy selected"
        );
        return Ok(single(
            StrategyKind::Compressed,
            compressed,
            compressed_size,
            budget,
        ));
    }

    let mut plan = chunked_plan(document, options)?;
    if plan.is_empty() {
        // No categories to split: the whole document goes as one flagged envelope.
        warn!(size = direct_size, budget, "document has no categories to split");
        plan = DeliveryPlan {
            kind: StrategyKind::Direct,
            envelopes: vec![PlannedEnvelope {
                envelope: direct,
                size: direct_size,
                oversized: true,
            }],
            file: None,
            budget,
        };
    }
    if plan.oversized().next().is_some() && !options.allow_oversized_chunks {
        return Err(DispatchError::SizeExceeded {
            budget,
            direct: direct_size,
            compressed: compressed_size,
            largest_chunk: plan.largest(),
        });
    }

    info!(
        strategy = %plan.kind,
        chunks = plan.len(),
        oversized = plan.oversized().count(),
        "strategy selected"
    );
    Ok(plan)
}

fn single(kind: StrategyKind, envelope: Envelope, size: usize, budget: usize) -> DeliveryPlan {
    DeliveryPlan {
        kind,
        envelopes: vec![PlannedEnvelope {
            envelope,
            size,
            oversized: false,
        }],
        file: None,
        budget,
    }
}

fn chunked_plan(document: &TokenDocument, options: &DeliveryOptions) -> Result<DeliveryPlan> {
    let budget = options.size_budget;
    let chunks = split(document, options.per_chunk_budget(), options)?;
    let total = chunks.len();

    let mut envelopes = Vec::with_capacity(total);
    for (i, chunk) in chunks.iter().enumerate() {
        let sequence = Sequence { index: i + 1, total };
        let envelope = chunk.to_envelope(options, sequence)?;
        let size = estimate(&envelope);
        let oversized = size >= budget;
        if oversized {
            warn!(
                category = %chunk.category,
                index = sequence.index,
                total,
                size,
                budget,
                "chunk still exceeds budget after splitting"
            );
        }
        envelopes.push(PlannedEnvelope {
            envelope,
            size,
            oversized,
        });
    }

    Ok(DeliveryPlan {
        kind: StrategyKind::Chunked,
        envelopes,
        file: None,
        budget,
    })
}

fn file_upload_plan(document: &TokenDocument, options: &DeliveryOptions) -> Result<DeliveryPlan> {
    let pretty = document.to_pretty_json()?;
    let file = FileContent {
        message: options.commit_message.clone(),
        content: STANDARD.encode(pretty.as_bytes()),
        path: options.file_path.clone(),
    };
    let envelope = Envelope::whole(
        options,
        PayloadBody::FileReference {
            tokens_size: pretty.len(),
        },
    );
    let size = estimate(&envelope);
    info!(
        strategy = %StrategyKind::FileUpload,
        path = %file.path,
        file_size = pretty.len(),
        "strategy selected"
    );

    let mut plan = single(StrategyKind::FileUpload, envelope, size, options.size_budget);
    plan.file = Some(file);
    Ok(plan)
}
