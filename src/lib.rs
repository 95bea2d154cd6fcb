//! # DynamoDB Bulk Executor
//!
//! Executes arbitrarily large bulk reads and writes against DynamoDB despite the
//! per-call ceilings the service imposes:
//! - `BatchGetItem`: 100 keys per call
//! - `BatchWriteItem`: 25 requests per call, each applied independently
//! - `TransactWriteItems`: 100 items per call, applied atomically
//!
//! ## Features
//!
//! - **Chunking**: inputs are split into ordered, backend-sized chunks
//! - **Concurrent dispatch**: one backend call per chunk, all in flight together,
//!   outcomes kept in chunk order
//! - **Explicit partial failure**: unprocessed keys/requests, including every input of a
//!   chunk whose call failed, are handed back to the caller; nothing is retried internally
//! - **Cancellation**: every entry point takes a [`CancellationToken`](tokio_util::sync::CancellationToken)
//! - **Pluggable backend**: [`StorageBackend`] is implemented for
//!   [`aws_sdk_dynamodb::Client`] and is easy to fake in tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dynamo_bulk::{BulkExecutor, Error, requests::put_requests};
//! use serde::Serialize;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[derive(Serialize)]
//! struct User {
//!     user_id: String,
//!     email: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let client = dynamo_bulk::dynamodb_client().await;
//!     let executor = BulkExecutor::builder()
//!         .backend(Arc::new(client))
//!         .table_name("users")
//!         .build()?;
//!
//!     let users: Vec<User> = (0..60)
//!         .map(|i| User {
//!             user_id: format!("user-{i}"),
//!             email: format!("user-{i}@example.com"),
//!         })
//!         .collect();
//!
//!     let cancel = CancellationToken::new();
//!     let output = executor
//!         .bulk_write_best_effort(&cancel, put_requests(&users)?)
//!         .await?;
//!
//!     // Unprocessed requests are the caller's to retry
//!     if !output.unprocessed.is_empty() {
//!         println!("{} requests left unprocessed", output.unprocessed.len());
//!     }
//!
//!     Ok(())
//! }
//! ```
#![deny(
    warnings,
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    unused_allocation,
    unused_comparisons,
    unused_parens,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results,
    deprecated,
    unknown_lints,
    unreachable_code,
    unused_mut
)]

mod error;
pub use error::{BoxError, ChunkFailure, ChunkFailures, Error, Unprocessed};

/// Storage backend seam and its DynamoDB implementation
pub mod backend;

/// Chunk planning, concurrent dispatch, outcome merging and the bulk executor
pub mod bulk;

/// Table configuration
pub mod config;

/// Key/item difference helpers
pub mod methods;

/// Typed bulk access to a configured entity table
pub mod repository;

pub mod requests;

mod reserved;
pub use reserved::is_reserved_word;

// Re-export main types for convenience
pub use backend::{BatchGetOutput, StorageBackend};
pub use bulk::{BulkExecutor, BulkReadOutput, BulkWriteOutput, Item, Key};
pub use config::DbConfig;
pub use repository::{BulkRecords, EntityRepository};

// Re-export aws-config types for configuration
pub use aws_config::{
    BehaviorVersion, Region, SdkConfig, defaults,
    meta::region::{ProvideRegion, RegionProviderChain},
    retry::{RetryConfig, RetryMode},
    timeout::TimeoutConfig,
};

// Re-export aws-types for advanced configuration
pub use aws_types::sdk_config::Builder as SdkConfigBuilder;

use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::time::Duration;

/// Load AWS configuration with the defaults used by [`dynamodb_client`]
///
/// It configures:
/// - Adaptive retry mode with 3 max attempts
/// - Exponential backoff starting at 1 second
/// - Connect timeout: 3 seconds
/// - Read timeout: 20 seconds
/// - Operation timeout: 60 seconds
/// - LocalStack support via AWS_PROFILE=localstack
///
/// The SDK-level retry only covers whole failed requests. Unprocessed keys and
/// requests reported inside a successful response are never retried here.
pub async fn load_sdk_config() -> SdkConfig {
    let timeout_config = TimeoutConfig::builder()
        .connect_timeout(Duration::from_secs(3))
        .read_timeout(Duration::from_secs(20))
        .operation_timeout(Duration::from_secs(60))
        .build();

    let mut loader = defaults(BehaviorVersion::latest())
        .retry_config(
            RetryConfig::adaptive()
                .with_max_attempts(3)
                .with_initial_backoff(Duration::from_secs(1)),
        )
        .timeout_config(timeout_config);

    // Support LocalStack via AWS_PROFILE=localstack
    if std::env::var("AWS_PROFILE").unwrap_or_default() == "localstack" {
        loader = loader.endpoint_url("http://127.0.0.1:4566");
    }

    loader.load().await
}

/// Build a DynamoDB client from [`load_sdk_config`]
///
/// The client is cheap to clone and safe to share; build it once at process start and
/// hand it to every [`BulkExecutor`] or [`EntityRepository`].
///
/// # Example
///
/// ```rust,no_run
/// # async fn example() {
/// let client = dynamo_bulk::dynamodb_client().await;
/// # let _ = client;
/// # }
/// ```
pub async fn dynamodb_client() -> DynamoDbClient {
    DynamoDbClient::new(&load_sdk_config().await)
}

/// Build a DynamoDB client from a caller-supplied AWS config
///
/// # Example
///
/// ```rust,no_run
/// #[tokio::main]
/// async fn main() {
///     let config = dynamo_bulk::defaults(dynamo_bulk::BehaviorVersion::latest())
///         .region(dynamo_bulk::Region::new("us-west-2"))
///         .load()
///         .await;
///     let client = dynamo_bulk::dynamodb_client_with_config(&config);
/// #   let _ = client;
/// }
/// ```
pub fn dynamodb_client_with_config(config: &SdkConfig) -> DynamoDbClient {
    DynamoDbClient::new(config)
}
