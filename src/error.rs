use aws_sdk_dynamodb::error::BuildError;
use aws_sdk_dynamodb::operation::batch_get_item::BatchGetItemError;
use aws_sdk_dynamodb::operation::batch_write_item::BatchWriteItemError;
use aws_sdk_dynamodb::operation::transact_write_items::TransactWriteItemsError;
use aws_sdk_dynamodb::types::WriteRequest;
use aws_smithy_runtime_api::client::result::SdkError;
use aws_smithy_runtime_api::http::Response;
use serde_dynamo::Error as SerdeDynamoError;
use std::error::Error as StdError;
use std::fmt;

use crate::bulk::Key;

type DynamoBatchGetItemError = SdkError<BatchGetItemError, Response>;
type DynamoBatchWriteItemError = SdkError<BatchWriteItemError, Response>;
type DynamoTransactWriteItemsError = SdkError<TransactWriteItemsError, Response>;

/// Boxed error produced by a non-SDK storage backend
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Bulk operation error
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Empty table name, missing backend handle or malformed helper input
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A chunk ceiling of zero was requested
    #[error("chunk ceiling must be greater than zero")]
    InvalidCeiling,
    /// The shared cancellation token fired while a chunk call was in flight
    #[error("operation cancelled")]
    Cancelled,
    /// Serde DynamoDB serialization/deserialization error
    #[error("DynamoDB serialization error: {0}")]
    SerdeDynamo(#[from] SerdeDynamoError),
    /// DynamoDB request builder error
    #[error("DynamoDB request builder error: {0}")]
    BuildError(#[from] BuildError),
    /// DynamoDB BatchGetItem operation error
    #[error("DynamoDB BatchGetItem operation failed: {0}")]
    DynamoBatchGetItemError(#[from] DynamoBatchGetItemError),
    /// DynamoDB BatchWriteItem operation error
    #[error("DynamoDB BatchWriteItem operation failed: {0}")]
    DynamoBatchWriteItemError(#[from] DynamoBatchWriteItemError),
    /// DynamoDB TransactWriteItems operation error
    #[error("DynamoDB TransactWriteItems operation failed: {0}")]
    DynamoTransactWriteItemsError(#[from] DynamoTransactWriteItemsError),
    /// Transport or server error reported by a non-SDK backend
    #[error("storage backend error: {0}")]
    Backend(BoxError),
    /// A single chunk failed; positions are 1-based
    #[error("chunk {position} of {total} failed: {source}")]
    Chunk {
        /// 1-based position of the failing chunk
        position: usize,
        /// Number of chunks the call was planned into
        total: usize,
        /// Cause reported for the chunk
        source: Box<Error>,
    },
    /// Every chunk of a best-effort call failed, so nothing was applied
    ///
    /// All inputs of the call come back in `unprocessed`.
    #[error("{failures}")]
    Dispatch {
        /// Cause of each failing chunk
        failures: ChunkFailures,
        /// Every input of the call, in chunk order
        unprocessed: Unprocessed,
    },
}

impl Error {
    /// Build a [`Error::Backend`] from anything convertible into a boxed error
    pub fn backend(error: impl Into<BoxError>) -> Self {
        Error::Backend(error.into())
    }

    /// Check if the error was raised by input validation before any chunk was planned
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Error::InvalidInput(_) | Error::InvalidCeiling)
    }

    /// Check if the error is, or wraps, a cancellation
    pub fn is_cancelled(&self) -> bool {
        match self {
            Error::Cancelled => true,
            Error::Chunk { source, .. } => source.is_cancelled(),
            Error::Dispatch { failures, .. } => failures.all_cancelled(),
            _ => false,
        }
    }

    /// Check if the error came out of one or more chunk dispatches
    pub fn is_dispatch_error(&self) -> bool {
        matches!(self, Error::Chunk { .. } | Error::Dispatch { .. })
    }

    /// Check if the error is a serialization/deserialization error
    ///
    /// Returns `true` for DynamoDB serialization errors.
    pub fn is_serialization_error(&self) -> bool {
        matches!(self, Error::SerdeDynamo(_))
    }

    /// 1-based positions of the chunks this error reports on
    pub fn failed_positions(&self) -> Vec<usize> {
        match self {
            Error::Chunk { position, .. } => vec![*position],
            Error::Dispatch { failures, .. } => failures.positions(),
            _ => Vec::new(),
        }
    }

    /// Inputs handed back by a best-effort call where every chunk failed
    pub fn unprocessed(&self) -> Option<&Unprocessed> {
        match self {
            Error::Dispatch { unprocessed, .. } => Some(unprocessed),
            _ => None,
        }
    }

    /// Take back the keys of a failed bulk read, or get the error back unchanged
    pub fn into_unprocessed_keys(self) -> Result<Vec<Key>, Self> {
        match self {
            Error::Dispatch {
                unprocessed: Unprocessed::Keys(keys),
                ..
            } => Ok(keys),
            other => Err(other),
        }
    }

    /// Take back the requests of a failed bulk write, or get the error back unchanged
    pub fn into_unprocessed_requests(self) -> Result<Vec<WriteRequest>, Self> {
        match self {
            Error::Dispatch {
                unprocessed: Unprocessed::Requests(requests),
                ..
            } => Ok(requests),
            other => Err(other),
        }
    }
}

/// Inputs a best-effort call could not apply
#[derive(Clone, Debug, PartialEq)]
pub enum Unprocessed {
    /// Keys of a bulk read
    Keys(Vec<Key>),
    /// Put/delete requests of a bulk write
    Requests(Vec<WriteRequest>),
}

impl Unprocessed {
    /// Number of inputs handed back
    pub fn len(&self) -> usize {
        match self {
            Unprocessed::Keys(keys) => keys.len(),
            Unprocessed::Requests(requests) => requests.len(),
        }
    }

    /// Whether nothing was handed back
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<Key>> for Unprocessed {
    fn from(keys: Vec<Key>) -> Self {
        Unprocessed::Keys(keys)
    }
}

impl From<Vec<WriteRequest>> for Unprocessed {
    fn from(requests: Vec<WriteRequest>) -> Self {
        Unprocessed::Requests(requests)
    }
}

/// One failed chunk of a bulk call
#[derive(Debug)]
pub struct ChunkFailure {
    /// 1-based position of the chunk in the planned order
    pub position: usize,
    /// Cause reported for the chunk
    pub error: Error,
}

/// Aggregated chunk failures of one bulk call
///
/// Renders one line per failing chunk, in chunk order.
#[derive(Debug)]
pub struct ChunkFailures {
    failures: Vec<ChunkFailure>,
    total: usize,
}

impl ChunkFailures {
    pub(crate) fn new(failures: Vec<ChunkFailure>, total: usize) -> Self {
        Self { failures, total }
    }

    /// Failing chunks in ascending position order
    pub fn failures(&self) -> &[ChunkFailure] {
        &self.failures
    }

    /// Number of chunks the call was planned into
    pub fn total_chunks(&self) -> usize {
        self.total
    }

    /// Number of failing chunks
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Whether no chunk failed
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// 1-based positions of the failing chunks
    pub fn positions(&self) -> Vec<usize> {
        self.failures.iter().map(|f| f.position).collect()
    }

    /// Whether every chunk of the call failed
    pub fn all_failed(&self) -> bool {
        self.total > 0 && self.failures.len() == self.total
    }

    /// Whether every failing chunk was cancelled
    pub fn all_cancelled(&self) -> bool {
        !self.failures.is_empty() && self.failures.iter().all(|f| f.error.is_cancelled())
    }
}

impl fmt::Display for ChunkFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} chunks failed", self.failures.len(), self.total)?;
        for failure in &self.failures {
            write!(f, "\n  chunk {}: {}", failure.position, failure.error)?;
        }
        Ok(())
    }
}

impl StdError for ChunkFailures {}
