/// Example: Retrying unprocessed requests from a best-effort bulk write
///
/// The executor never retries on its own. Unprocessed requests, including every request
/// of a chunk whose call failed, come back in the output and the caller decides when and
/// how often to resubmit them.
///
/// Run against LocalStack with:
///
/// ```text
/// AWS_PROFILE=localstack RUST_LOG=info cargo run --example bulk_write_with_retry
/// ```
use aws_sdk_dynamodb::types::WriteRequest;
use dynamo_bulk::{BulkExecutor, Error, StorageBackend, requests::put_requests};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Serialize)]
struct Event {
    pk: String,
    kind: String,
    ttl: i64,
}

/// Resubmit unprocessed requests with exponential backoff
///
/// Returns whatever is still unprocessed after `max_attempts` calls, or when `cancel`
/// fires. A call where every chunk failed hands its requests back through the error,
/// so a fully throttled attempt is retried like any other.
async fn write_with_retry<B: StorageBackend>(
    executor: &BulkExecutor<B>,
    cancel: &CancellationToken,
    requests: Vec<WriteRequest>,
    max_attempts: usize,
) -> Result<Vec<WriteRequest>, Error> {
    let mut pending = requests;
    let mut delay = Duration::from_millis(100);

    for attempt in 1..=max_attempts {
        if pending.is_empty() || cancel.is_cancelled() {
            break;
        }

        tracing::info!(attempt, requests = pending.len(), "writing batch");
        pending = match executor.bulk_write_best_effort(cancel, pending).await {
            Ok(output) => {
                if let Some(failures) = &output.error {
                    tracing::warn!(%failures, "some chunks failed");
                }
                tracing::info!(
                    written = output.processed_count(),
                    unprocessed = output.failed_count(),
                    success_rate = output.success_rate(),
                    "attempt finished"
                );
                output.unprocessed
            }
            Err(err) => {
                tracing::warn!(error = %err, "no chunk completed");
                err.into_unprocessed_requests()?
            }
        };

        if !pending.is_empty() && attempt < max_attempts {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
            delay *= 2;
        }
    }

    Ok(pending)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let client = dynamo_bulk::dynamodb_client().await;
    let executor = BulkExecutor::builder()
        .backend(Arc::new(client))
        .table_name("events")
        .build()?;

    let config = dynamo_bulk::DbConfig::new("events", 7);
    let ttl = config.record_expiry(chrono::Utc::now());
    let events: Vec<Event> = (0..500)
        .map(|i| Event {
            pk: format!("event-{i}"),
            kind: "signup".to_string(),
            ttl,
        })
        .collect();

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    let _ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.cancel();
        }
    });

    let leftover = write_with_retry(&executor, &cancel, put_requests(&events)?, 5).await?;
    if leftover.is_empty() {
        tracing::info!("all events written");
    } else {
        tracing::error!(unprocessed = leftover.len(), "giving up on remaining events");
    }

    Ok(())
}
