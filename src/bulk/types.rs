use aws_sdk_dynamodb::types::{AttributeValue, WriteRequest};
use std::{collections::HashMap, time::Duration};

use crate::error::{ChunkFailures, Error};
use crate::methods::right_diff;

/// A backend record: attribute name to typed value
pub type Item = HashMap<String, AttributeValue>;

/// The attributes that uniquely identify an [`Item`] within a table
pub type Key = HashMap<String, AttributeValue>;

/// An ordered, contiguous slice of a bulk call's input
#[derive(Clone, Debug, PartialEq)]
pub struct Chunk<U> {
    pub(crate) index: usize,
    pub(crate) items: Vec<U>,
}

impl<U> Chunk<U> {
    /// 0-based index of the chunk in planned order
    pub fn index(&self) -> usize {
        self.index
    }

    /// 1-based position, as used in error reports
    pub fn position(&self) -> usize {
        self.index + 1
    }

    /// Items of the chunk in input order
    pub fn items(&self) -> &[U] {
        &self.items
    }

    /// Number of items in the chunk
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the chunk holds no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Take the items out of the chunk
    pub fn into_items(self) -> Vec<U> {
        self.items
    }
}

/// What a backend call reported for one chunk
#[derive(Debug)]
pub struct ChunkResponse<T, U> {
    /// Items returned (reads) or applied (writes), in chunk order
    pub items: Vec<T>,
    /// Inputs the backend accepted but did not apply
    pub unprocessed: Vec<U>,
}

impl<T, U> ChunkResponse<T, U> {
    /// A response where everything applied and nothing came back
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            unprocessed: Vec::new(),
        }
    }
}

/// Result of executing exactly one chunk
#[derive(Debug)]
pub enum ChunkOutcome<T, U> {
    /// The backend call returned; some inputs may still be unprocessed
    Completed(ChunkResponse<T, U>),
    /// The call failed as a whole; nothing in the chunk counts as applied
    Failed(Error),
}

impl<T, U> ChunkOutcome<T, U> {
    /// Whether the chunk call itself failed
    pub fn is_failed(&self) -> bool {
        matches!(self, ChunkOutcome::Failed(_))
    }
}

impl<T, U> From<Result<ChunkResponse<T, U>, Error>> for ChunkOutcome<T, U> {
    fn from(result: Result<ChunkResponse<T, U>, Error>) -> Self {
        match result {
            Ok(response) => ChunkOutcome::Completed(response),
            Err(error) => ChunkOutcome::Failed(error),
        }
    }
}

/// Output of [`BulkExecutor::bulk_read`](crate::bulk::BulkExecutor::bulk_read)
#[must_use = "bulk read results contain unprocessed keys that should be checked"]
#[derive(Debug, Default)]
pub struct BulkReadOutput {
    /// Items returned; order is kept within a chunk, not across chunks
    pub items: Vec<Item>,
    /// Keys the backend did not process, including every key of a failed chunk
    pub unprocessed_keys: Vec<Key>,
    /// Diagnostic aggregate of failed chunks, alongside the unprocessed keys
    pub error: Option<ChunkFailures>,
    /// Number of chunks dispatched
    pub chunk_count: usize,
    /// Wall-clock time of the whole call
    pub total_duration: Duration,
}

impl BulkReadOutput {
    /// Check if every key was processed and no chunk failed
    pub fn is_success(&self) -> bool {
        self.unprocessed_keys.is_empty() && self.error.is_none()
    }

    /// Number of keys the caller still has to retry
    pub fn failed_count(&self) -> usize {
        self.unprocessed_keys.len()
    }

    /// Requested keys that were neither returned nor left unprocessed, i.e. not found
    pub fn missing_keys(&self, requested: &[Key]) -> Vec<Key> {
        let pending = right_diff(&self.items, requested);
        right_diff(&self.unprocessed_keys, &pending)
    }
}

/// Output of [`BulkExecutor::bulk_write_best_effort`](crate::bulk::BulkExecutor::bulk_write_best_effort)
#[must_use = "bulk write results contain unprocessed requests that should be checked"]
#[derive(Debug, Default)]
pub struct BulkWriteOutput {
    /// Requests the backend applied
    pub written: Vec<WriteRequest>,
    /// Requests not applied, including every request of a failed chunk
    pub unprocessed: Vec<WriteRequest>,
    /// Diagnostic aggregate of failed chunks, alongside the unprocessed requests
    pub error: Option<ChunkFailures>,
    /// Number of chunks dispatched
    pub chunk_count: usize,
    /// Wall-clock time of the whole call
    pub total_duration: Duration,
}

impl BulkWriteOutput {
    /// Check if all requests were applied
    pub fn is_success(&self) -> bool {
        self.unprocessed.is_empty() && self.error.is_none()
    }

    /// Get total number of requests applied
    pub fn processed_count(&self) -> usize {
        self.written.len()
    }

    /// Get total number of requests left unprocessed
    pub fn failed_count(&self) -> usize {
        self.unprocessed.len()
    }

    /// Get success rate as a percentage (0.0 to 100.0)
    pub fn success_rate(&self) -> f64 {
        let total = self.processed_count() + self.failed_count();
        if total == 0 {
            return 100.0;
        }
        (self.processed_count() as f64 / total as f64) * 100.0
    }
}
