use std::sync::{Arc, Mutex};

use token_dispatch::{
    select, send_tokens, CoordinatorOptions, DeliveryCoordinator, DeliveryOptions,
    DeliveryOutcome, DeliveryProgress, MemoryTransport, StrategyKind, StrategyPreference,
    TransportError, TransportErrorKind, TransportResponse,
};

use crate::{chunked_plan, noisy_doc, small_doc};

fn coordinator(transport: &Arc<MemoryTransport>) -> DeliveryCoordinator {
    DeliveryCoordinator::new(transport.clone())
}

fn categories(transport: &MemoryTransport) -> Vec<String> {
    transport
        .dispatched()
        .into_iter()
        .map(|p| p.client_payload.category.unwrap_or_default())
        .collect()
}

// ============================================================================
// Chunked plans
// ============================================================================

#[tokio::test]
async fn rejected_third_chunk_stops_delivery() {
    let transport = Arc::new(MemoryTransport::with_statuses([204, 204, 422]));
    let result = coordinator(&transport).deliver(&chunked_plan(4)).await;

    assert_eq!(result.outcome, DeliveryOutcome::PartialFailure);
    assert_eq!(result.succeeded, 2);
    assert_eq!(result.total, 4);

    let failure = result.first_failure.expect("failure detail");
    assert_eq!(failure.index, 3);
    assert_eq!(failure.category, "group3");
    assert_eq!(failure.status, Some(422));
    assert_eq!(failure.kind, TransportErrorKind::Rejected);

    // Chunk 4 is never sent.
    assert_eq!(categories(&transport), ["group1", "group2", "group3"]);
}

#[tokio::test]
async fn failed_first_chunk_is_a_full_failure() {
    let transport = Arc::new(MemoryTransport::with_statuses([401]));
    let result = coordinator(&transport).deliver(&chunked_plan(3)).await;

    assert_eq!(result.outcome, DeliveryOutcome::Failure);
    assert_eq!(result.succeeded, 0);
    assert_eq!(result.total, 3);
    assert_eq!(result.first_failure.unwrap().kind, TransportErrorKind::Auth);
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn chunks_are_sent_in_sequence_order() {
    let transport = Arc::new(MemoryTransport::new());
    let result = coordinator(&transport).deliver(&chunked_plan(5)).await;

    assert!(result.is_success());
    assert_eq!(result.succeeded, 5);
    assert_eq!(
        categories(&transport),
        ["group1", "group2", "group3", "group4", "group5"]
    );
    for payload in transport.dispatched() {
        assert_eq!(payload.client_payload.total_categories, Some(5));
    }
}

#[tokio::test]
async fn failed_chunk_is_not_retried() {
    let transport = Arc::new(MemoryTransport::new());
    transport.push_response(TransportResponse::new(204, ""));
    transport.push_error(TransportError::new("connection reset by peer"));

    let result = coordinator(&transport).deliver(&chunked_plan(3)).await;

    assert_eq!(result.outcome, DeliveryOutcome::PartialFailure);
    assert_eq!(transport.call_count(), 2);
    let failure = result.first_failure.unwrap();
    assert_eq!(failure.kind, TransportErrorKind::Network);
    assert_eq!(failure.status, None);
    assert_eq!(failure.message, "connection reset by peer");
}

#[tokio::test]
async fn selected_chunks_arrive_reconstructible() {
    let doc = noisy_doc(12, 2_500);
    let plan = select(&doc, &DeliveryOptions::default()).unwrap();
    assert_eq!(plan.kind, StrategyKind::Chunked);

    let transport = Arc::new(MemoryTransport::new());
    let result = coordinator(&transport).deliver(&plan).await;

    assert!(result.is_success());
    assert_eq!(result.total, plan.len());
    assert_eq!(transport.received_document().unwrap(), doc);
}

#[tokio::test]
async fn progress_reports_each_success() {
    let seen: Arc<Mutex<Vec<DeliveryProgress>>> = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = Arc::clone(&seen);
    let transport = Arc::new(MemoryTransport::with_statuses([204, 204, 500]));
    let coordinator = DeliveryCoordinator::with_options(
        transport.clone(),
        CoordinatorOptions {
            on_progress: Some(Arc::new(move |p: &DeliveryProgress| {
                seen_clone.lock().unwrap().push(p.clone())
            })),
            ..Default::default()
        },
    );

    let result = coordinator.deliver(&chunked_plan(4)).await;
    assert_eq!(result.outcome, DeliveryOutcome::PartialFailure);
    assert_eq!(result.first_failure.unwrap().kind, TransportErrorKind::Remote);

    let log = seen.lock().unwrap();
    assert_eq!(log.len(), 2, "only successful calls report progress");
    assert_eq!(log[0].index, 1);
    assert_eq!(log[1].index, 2);
    assert_eq!(log[1].total, 4);
    assert_eq!(log[1].category, "group2");
}

#[tokio::test]
async fn empty_plan_is_refused() {
    let transport = Arc::new(MemoryTransport::new());
    let result = coordinator(&transport).deliver(&chunked_plan(0)).await;

    assert_eq!(result.outcome, DeliveryOutcome::Failure);
    assert_eq!((result.succeeded, result.total), (0, 1));
    let failure = result.first_failure.unwrap();
    assert_eq!(failure.kind, TransportErrorKind::Rejected);
    assert!(failure.message.contains("no envelopes"));
    assert_eq!(transport.call_count(), 0);
}

// ============================================================================
// Single-envelope plans
// ============================================================================

#[tokio::test]
async fn direct_plan_is_one_call() {
    let transport = Arc::new(MemoryTransport::new());
    let result = send_tokens(&small_doc(), &DeliveryOptions::default(), transport.clone())
        .await
        .unwrap();

    assert!(result.is_success());
    assert_eq!((result.succeeded, result.total), (1, 1));
    let dispatched = transport.dispatched();
    assert_eq!(dispatched.len(), 1);
    assert_eq!(dispatched[0].event_type, "update-tokens");
    assert_eq!(transport.received_document().unwrap(), small_doc());
}

#[tokio::test]
async fn direct_rejection_is_reported_verbatim() {
    let transport = Arc::new(MemoryTransport::new());
    transport.push_response(TransportResponse::new(422, "Unprocessable Entity"));
    let result = send_tokens(&small_doc(), &DeliveryOptions::default(), transport.clone())
        .await
        .unwrap();

    assert_eq!(result.outcome, DeliveryOutcome::Failure);
    let failure = result.first_failure.clone().unwrap();
    assert_eq!(failure.status, Some(422));
    assert_eq!(failure.message, "status 422: Unprocessable Entity");

    let err = result.ensure_success().unwrap_err();
    assert!(err.to_string().contains("envelope 1 of 1"));
}

#[tokio::test]
async fn selection_errors_are_returned_before_sending() {
    let transport = Arc::new(MemoryTransport::new());
    let options = DeliveryOptions {
        size_budget: 100,
        ..Default::default()
    };
    assert!(send_tokens(&small_doc(), &options, transport.clone())
        .await
        .is_err());
    assert_eq!(transport.call_count(), 0);
}

// ============================================================================
// File uploads
// ============================================================================

fn upload_options() -> DeliveryOptions {
    DeliveryOptions {
        strategy: StrategyPreference::FileUpload,
        ..Default::default()
    }
}

#[tokio::test]
async fn file_upload_writes_file_only() {
    let plan = select(&small_doc(), &upload_options()).unwrap();
    let transport = Arc::new(MemoryTransport::new());
    let result = coordinator(&transport).deliver(&plan).await;

    assert!(result.is_success());
    assert_eq!(result.total, 1);
    assert!(transport.dispatched().is_empty());
    let uploaded = transport.uploaded();
    assert_eq!(uploaded.len(), 1);
    assert_eq!(uploaded[0].path, "src/tokens/figma-export/design-tokens.json");
}

#[tokio::test]
async fn file_upload_can_notify_workflow() {
    let plan = select(&small_doc(), &upload_options()).unwrap();
    let transport = Arc::new(MemoryTransport::new());
    let coordinator = DeliveryCoordinator::with_options(
        transport.clone(),
        CoordinatorOptions {
            notify_after_upload: true,
            ..Default::default()
        },
    );

    let result = coordinator.deliver(&plan).await;
    assert!(result.is_success());
    assert_eq!(result.total, 2);

    let dispatched = transport.dispatched();
    assert_eq!(dispatched.len(), 1);
    assert_eq!(dispatched[0].client_payload.upload_method.as_deref(), Some("file"));
    assert!(dispatched[0].client_payload.tokens.is_none());
}

#[tokio::test]
async fn failed_upload_skips_notification() {
    let plan = select(&small_doc(), &upload_options()).unwrap();
    let transport = Arc::new(MemoryTransport::with_statuses([409]));
    let coordinator = DeliveryCoordinator::with_options(
        transport.clone(),
        CoordinatorOptions {
            notify_after_upload: true,
            ..Default::default()
        },
    );

    let result = coordinator.deliver(&plan).await;
    assert_eq!(result.outcome, DeliveryOutcome::Failure);
    assert_eq!(result.total, 2);
    let failure = result.first_failure.unwrap();
    assert_eq!(failure.category, "src/tokens/figma-export/design-tokens.json");
    assert_eq!(failure.status, Some(409));
    assert!(transport.dispatched().is_empty());
}

#[tokio::test]
async fn upload_plan_without_file_fails() {
    let mut plan = select(&small_doc(), &upload_options()).unwrap();
    plan.file = None;
    let transport = Arc::new(MemoryTransport::new());
    let result = coordinator(&transport).deliver(&plan).await;

    assert_eq!(result.outcome, DeliveryOutcome::Failure);
    assert_eq!(transport.call_count(), 0);
}
