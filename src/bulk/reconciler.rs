use crate::bulk::{Chunk, ChunkOutcome};
use crate::error::{ChunkFailure, ChunkFailures, Error, Unprocessed};

/// Merged view of a best-effort call's chunk outcomes
#[derive(Debug)]
pub struct BestEffortMerge<T, U> {
    /// Returned or applied items of every completed chunk, chunk order kept within a chunk
    pub items: Vec<T>,
    /// Backend-reported unprocessed inputs plus every input of a failed chunk
    pub unprocessed: Vec<U>,
    /// Failed chunks, if any
    pub failures: Option<ChunkFailures>,
    /// Number of chunks merged
    pub chunk_count: usize,
}

impl<T, U> BestEffortMerge<T, U> {
    /// Whether every chunk failed, leaving nothing applied
    pub fn all_failed(&self) -> bool {
        self.failures.as_ref().is_some_and(ChunkFailures::all_failed)
    }

    /// Turn a merge where every chunk failed into [`Error::Dispatch`]
    ///
    /// The error carries every unprocessed input. A merge with at least one completed
    /// chunk is returned unchanged; its failures travel alongside the unprocessed inputs.
    pub fn into_result(self) -> Result<Self, Error>
    where
        Vec<U>: Into<Unprocessed>,
    {
        match self.failures {
            Some(failures) if failures.all_failed() => Err(Error::Dispatch {
                failures,
                unprocessed: self.unprocessed.into(),
            }),
            failures => Ok(Self { failures, ..self }),
        }
    }
}

/// Merge outcomes for reads and best-effort writes
///
/// `outcomes[i]` must be the outcome of `chunks[i]`. A failed chunk contributes all of
/// its inputs to the unprocessed set, so returned plus unprocessed always accounts for
/// every input of a write.
pub fn merge_best_effort<T, U>(
    chunks: Vec<Chunk<U>>,
    outcomes: Vec<ChunkOutcome<T, U>>,
) -> BestEffortMerge<T, U> {
    debug_assert_eq!(chunks.len(), outcomes.len());

    let chunk_count = chunks.len();
    let mut items = Vec::new();
    let mut unprocessed = Vec::new();
    let mut failures = Vec::new();

    for (chunk, outcome) in chunks.into_iter().zip(outcomes) {
        match outcome {
            ChunkOutcome::Completed(response) => {
                items.extend(response.items);
                unprocessed.extend(response.unprocessed);
            }
            ChunkOutcome::Failed(error) => {
                failures.push(ChunkFailure {
                    position: chunk.position(),
                    error,
                });
                unprocessed.extend(chunk.into_items());
            }
        }
    }

    let failures = if failures.is_empty() {
        None
    } else {
        tracing::warn!(
            failed = failures.len(),
            chunks = chunk_count,
            unprocessed = unprocessed.len(),
            "bulk call finished with failed chunks"
        );
        Some(ChunkFailures::new(failures, chunk_count))
    };

    BestEffortMerge {
        items,
        unprocessed,
        failures,
        chunk_count,
    }
}

/// Merge outcomes for transactional writes
///
/// Any failed chunk fails the whole call with one [`Error::Chunk`] naming the lowest
/// failing position. Chunks that committed are not rolled back: atomicity only holds
/// within a chunk.
pub fn merge_transactional<T, U>(outcomes: Vec<ChunkOutcome<T, U>>) -> Result<(), Error> {
    let total = outcomes.len();
    let mut first: Option<Error> = None;

    for (index, outcome) in outcomes.into_iter().enumerate() {
        let ChunkOutcome::Failed(error) = outcome else {
            continue;
        };

        if first.is_some() {
            tracing::warn!(position = index + 1, total, error = %error, "additional transactional chunk failed");
            continue;
        }

        first = Some(Error::Chunk {
            position: index + 1,
            total,
            source: Box::new(error),
        });
    }

    match first {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
