use serde_json::{json, Map, Value};
use token_dispatch::{
    compress, decode_tokens, decompress, estimate, reassemble, select, ClientPayload,
    DeliveryOptions, DispatchError, Envelope, PayloadBody, StrategyKind, TokenDocument,
};

use crate::{noisy_doc, small_doc};

fn payloads(doc: &TokenDocument, options: &DeliveryOptions) -> (StrategyKind, Vec<ClientPayload>) {
    let plan = select(doc, options).unwrap();
    let payloads = plan
        .envelopes
        .iter()
        .map(|p| p.envelope.to_payload().client_payload)
        .collect();
    (plan.kind, payloads)
}

#[test]
fn small_document_is_sent_verbatim() {
    let (kind, payloads) = payloads(&small_doc(), &DeliveryOptions::default());
    assert_eq!(kind, StrategyKind::Direct);
    assert_eq!(payloads.len(), 1);
    assert_eq!(
        payloads[0].tokens.as_deref(),
        Some(r##"{"colors":{"primary":"#0088fe"},"spacing":{"small":"8px"}}"##)
    );
    assert_eq!(payloads[0].filename, "design-tokens.json");
    assert_eq!(payloads[0].commit_message, "Update design tokens");
}

#[test]
fn large_repetitive_document_is_compressed() {
    let mut typography = Map::new();
    for i in 0..600 {
        typography.insert(
            format!("style{}", i),
            json!({ "fontFamily": "Inter, sans-serif", "fontSize": "16px", "lineHeight": "1.5" }),
        );
    }
    let doc = TokenDocument::new().with_category("typography", Value::Object(typography));
    assert!(doc.to_json().unwrap().len() > 25_000);

    let (kind, payloads) = payloads(&doc, &DeliveryOptions::default());
    assert_eq!(kind, StrategyKind::Compressed);
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].compressed, Some(true));
    assert_eq!(decode_tokens(&payloads[0]).unwrap(), doc);
}

#[test]
fn oversized_category_is_split_by_subkey() {
    // Eight ~3KB colors entries: the category alone is far past the 15,000
    // byte per-chunk budget, spacing is tiny.
    let doc = noisy_doc(8, 3_000);
    let (kind, payloads) = payloads(&doc, &DeliveryOptions::default());

    assert_eq!(kind, StrategyKind::Chunked);
    assert_eq!(payloads.len(), 8 + 1);
    let categories: Vec<_> = payloads
        .iter()
        .map(|p| p.category.clone().unwrap())
        .collect();
    assert_eq!(categories[0], "colors.palette0");
    assert_eq!(categories[7], "colors.palette7");
    assert_eq!(categories[8], "spacing");
    assert!(payloads.iter().all(|p| p.total_categories == Some(9)));
}

#[test]
fn every_strategy_reconstructs_the_document() {
    let doc = noisy_doc(6, 900);
    for budget in [2_000, 4_000, 8_000, 20_000] {
        let options = DeliveryOptions {
            size_budget: budget,
            envelope_overhead: budget / 4,
            ..Default::default()
        };
        let (kind, payloads) = payloads(&doc, &options);
        assert_eq!(
            reassemble(&payloads).unwrap(),
            doc,
            "budget {} using {}",
            budget,
            kind
        );
    }
}

#[test]
fn escalation_follows_budget() {
    let doc = noisy_doc(6, 900);
    let kinds: Vec<StrategyKind> = [2_000, 20_000]
        .iter()
        .map(|&budget| {
            let options = DeliveryOptions {
                size_budget: budget,
                envelope_overhead: budget / 4,
                ..Default::default()
            };
            select(&doc, &options).unwrap().kind
        })
        .collect();
    assert_eq!(kinds, [StrategyKind::Chunked, StrategyKind::Direct]);
}

#[test]
fn exact_budget_is_over_the_limit() {
    let doc = small_doc();
    let probe = DeliveryOptions {
        envelope_overhead: 10,
        ..Default::default()
    };
    let size = estimate(&Envelope::whole(
        &probe,
        PayloadBody::Raw(doc.to_json().unwrap()),
    ));

    let below = DeliveryOptions {
        size_budget: size + 1,
        ..probe.clone()
    };
    assert_eq!(select(&doc, &below).unwrap().kind, StrategyKind::Direct);

    let exact = DeliveryOptions {
        size_budget: size,
        ..probe
    };
    assert_ne!(select(&doc, &exact).unwrap().kind, StrategyKind::Direct);
}

#[test]
fn compression_round_trips_serialized_documents() {
    for doc in [small_doc(), noisy_doc(3, 500), TokenDocument::new()] {
        let json = doc.to_json().unwrap();
        let restored = decompress(&compress(json.as_bytes()).unwrap()).unwrap();
        assert_eq!(restored, json.as_bytes());
    }
}

#[test]
fn strict_mode_refuses_oversized_chunks() {
    let doc = TokenDocument::new()
        .with_category("colors", json!({ "wall": crate::noise(3, 40_000) }));
    let options = DeliveryOptions {
        allow_oversized_chunks: false,
        ..Default::default()
    };
    let err = select(&doc, &options).unwrap_err();
    assert!(matches!(err, DispatchError::SizeExceeded { budget: 20_000, .. }));
    assert!(err.to_string().contains("exceeds budget of 20000 bytes"));
}
