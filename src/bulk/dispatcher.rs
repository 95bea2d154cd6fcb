use futures_util::StreamExt;
use std::future::Future;
use tokio_stream::{self as stream};
use tokio_util::sync::CancellationToken;

use crate::bulk::{Chunk, ChunkOutcome, ChunkResponse};
use crate::error::Error;

/// Run `executor` once per chunk, all chunks concurrently, and wait for every call
///
/// Each invocation gets a clone of `cancel` and an owned copy of its chunk's items.
/// The returned outcomes are index-aligned with `chunks`, whatever order the calls
/// complete in. A failing call only affects its own slot.
///
/// Chunks not yet started when `cancel` fires are reported as [`Error::Cancelled`]
/// without calling the executor. Calls already in flight are left to the backend's
/// own cancellation handling; no per-chunk timeout is applied here.
#[tracing::instrument(level = "debug", skip_all, fields(chunks = chunks.len()))]
pub async fn dispatch<T, U, F, Fut>(
    cancel: &CancellationToken,
    chunks: &[Chunk<U>],
    executor: F,
) -> Vec<ChunkOutcome<T, U>>
where
    U: Clone,
    F: Fn(CancellationToken, Vec<U>) -> Fut,
    Fut: Future<Output = Result<ChunkResponse<T, U>, Error>>,
{
    if chunks.is_empty() {
        return Vec::new();
    }

    let executor = &executor;
    let mut slots: Vec<Option<ChunkOutcome<T, U>>> = chunks.iter().map(|_| None).collect();

    let mut completions = stream::iter(chunks.iter().enumerate().map(|(slot, chunk)| {
        let cancel = cancel.clone();
        async move {
            if cancel.is_cancelled() {
                return (slot, ChunkOutcome::Failed(Error::Cancelled));
            }
            let outcome = ChunkOutcome::from(executor(cancel, chunk.items.clone()).await);
            (slot, outcome)
        }
    }))
    .buffer_unordered(chunks.len());

    while let Some((slot, outcome)) = completions.next().await {
        match &outcome {
            ChunkOutcome::Completed(response) => tracing::debug!(
                position = slot + 1,
                items = response.items.len(),
                unprocessed = response.unprocessed.len(),
                "chunk completed"
            ),
            ChunkOutcome::Failed(error) => {
                tracing::warn!(position = slot + 1, error = %error, "chunk failed")
            }
        }
        slots[slot] = Some(outcome);
    }

    let outcomes: Vec<ChunkOutcome<T, U>> = slots.into_iter().flatten().collect();
    debug_assert_eq!(outcomes.len(), chunks.len());
    outcomes
}
