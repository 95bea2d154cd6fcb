/// Bulk Write Tests
///
/// Tests best-effort chunked writes: per-request unprocessed reporting, failing chunks
/// and mixed put/delete batches.
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

mod helpers;
use dynamo_bulk::requests::delete_request;
use helpers::*;

/// 50 puts with chunk 2 failing: 25 written, 25 handed back
#[tokio::test]
async fn test_bulk_write_second_chunk_fails() {
    init_tracing();
    let backend = Arc::new(MockBackend::new().fail_on(30));
    let executor = executor(&backend);

    let output = executor
        .bulk_write_best_effort(&CancellationToken::new(), put_requests(0..50))
        .await
        .unwrap();

    assert_eq!(output.chunk_count, 2);
    assert_eq!(output.processed_count(), 25);
    assert_eq!(output.failed_count(), 25);
    assert_eq!(output.success_rate(), 50.0);

    let unprocessed: Vec<String> = output.unprocessed.iter().map(request_pk).collect();
    assert_eq!(unprocessed, (25..50).map(id_for).collect::<Vec<_>>());

    let failures = output.error.expect("chunk 2 failure should be reported");
    assert_eq!(failures.positions(), vec![2]);
    assert!(failures.to_string().contains("chunk 2"));

    assert_eq!(backend.stored(), 25, "Only chunk 1 should be applied");
    assert!(backend.contains(24));
    assert!(!backend.contains(25));
}

/// Every request is applied in chunks of at most 25
#[tokio::test]
async fn test_bulk_write_chunking() {
    let backend = Arc::new(MockBackend::new());
    let executor = executor(&backend);

    let output = executor
        .bulk_write_best_effort(&CancellationToken::new(), put_requests(0..60))
        .await
        .unwrap();

    assert!(output.is_success());
    assert_eq!(output.processed_count(), 60);
    assert_eq!(output.chunk_count, 3);
    assert_eq!(backend.chunk_sizes(), vec![25, 25, 10]);
    assert_eq!(backend.stored(), 60);
}

/// Requests the backend leaves unprocessed are returned, the rest are written
#[tokio::test]
async fn test_bulk_write_returns_unprocessed_requests() {
    let backend = Arc::new(
        MockBackend::new()
            .unprocessed_on(2)
            .unprocessed_on(26)
            .unprocessed_on(27),
    );
    let executor = executor(&backend);

    let output = executor
        .bulk_write_best_effort(&CancellationToken::new(), put_requests(0..30))
        .await
        .unwrap();

    assert!(output.error.is_none());
    assert_eq!(output.processed_count(), 27);

    let mut unprocessed: Vec<String> = output.unprocessed.iter().map(request_pk).collect();
    unprocessed.sort();
    assert_eq!(unprocessed, vec![id_for(2), id_for(26), id_for(27)]);

    let written: Vec<String> = output.written.iter().map(request_pk).collect();
    assert!(!written.contains(&id_for(2)));
    assert_eq!(backend.stored(), 27);
}

/// Puts and deletes can be mixed in one call
#[tokio::test]
async fn test_bulk_write_mixed_puts_and_deletes() {
    let backend = Arc::new(MockBackend::with_records(0..10));
    let executor = executor(&backend);

    let mut requests = put_requests(10..20);
    for id in 0..5 {
        requests.push(delete_request(key(id)).unwrap());
    }

    let output = executor
        .bulk_write_best_effort(&CancellationToken::new(), requests)
        .await
        .unwrap();

    assert!(output.is_success());
    assert_eq!(output.processed_count(), 15);
    assert_eq!(backend.stored(), 15);
    assert!(!backend.contains(0));
    assert!(backend.contains(5));
    assert!(backend.contains(19));
}

/// An empty request list succeeds without touching the backend
#[tokio::test]
async fn test_bulk_write_empty_input() {
    let backend = Arc::new(MockBackend::new());
    let executor = executor(&backend);

    let output = executor
        .bulk_write_best_effort(&CancellationToken::new(), Vec::new())
        .await
        .unwrap();

    assert!(output.is_success());
    assert_eq!(output.chunk_count, 0);
    assert_eq!(output.success_rate(), 100.0);
    assert_eq!(backend.calls(), 0);
}

/// A cancelled token fails the call when no chunk got to run, handing every request back
#[tokio::test]
async fn test_bulk_write_cancelled() {
    let backend = Arc::new(MockBackend::new());
    let executor = executor(&backend);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = executor
        .bulk_write_best_effort(&cancel, put_requests(0..40))
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(backend.stored(), 0);
    assert_eq!(err.into_unprocessed_requests().unwrap(), put_requests(0..40));
}

/// A single-chunk write hit by a transport error can be resubmitted from the error
#[tokio::test]
async fn test_bulk_write_single_chunk_failure_keeps_requests() {
    let backend = Arc::new(MockBackend::new().fail_on(3));
    let executor = executor(&backend);
    let cancel = CancellationToken::new();

    let err = executor
        .bulk_write_best_effort(&cancel, put_requests(0..10))
        .await
        .unwrap_err();

    assert!(err.is_dispatch_error());
    assert!(!err.is_cancelled());
    assert_eq!(err.failed_positions(), vec![1]);
    assert_eq!(backend.stored(), 0);

    let pending = err.into_unprocessed_requests().unwrap();
    assert_eq!(pending, put_requests(0..10), "No request should be lost");

    // Resubmitting without the poisoned request goes through
    let retry: Vec<_> = pending
        .into_iter()
        .filter(|request| request_pk(request) != id_for(3))
        .collect();
    let output = executor.bulk_write_best_effort(&cancel, retry).await.unwrap();
    assert!(output.is_success());
    assert_eq!(backend.stored(), 9);
}

/// Two calls sharing one executor run side by side
#[tokio::test]
async fn test_bulk_write_concurrent_calls_share_backend() {
    let backend = Arc::new(MockBackend::new().fail_on(110));
    let first = executor(&backend);
    let second = first.clone();
    let cancel = CancellationToken::new();

    let (left, right) = tokio::join!(
        first.bulk_write_best_effort(&cancel, put_requests(0..50)),
        second.bulk_write_best_effort(&cancel, put_requests(100..150)),
    );

    assert!(left.unwrap().is_success());

    let right = right.unwrap();
    assert_eq!(right.processed_count(), 25);
    assert_eq!(right.error.unwrap().positions(), vec![1]);

    assert_eq!(backend.stored(), 75);
}
