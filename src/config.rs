use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::error::Error;

/// Table settings the bulk layer is handed at process start
///
/// Deserializable so callers can source it from whatever configuration they load; this
/// crate never reads it from the environment itself.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct DbConfig {
    /// Table all bulk calls target
    pub table_name: String,
    /// Global secondary index name, e.g. `SK-DATA-index`
    #[serde(default)]
    pub gsi_index_name: String,
    /// Local secondary index name, e.g. `LSK-index`
    #[serde(default)]
    pub lsi_index_name: String,
    /// Lifetime of a record in days
    pub record_ttl_days: u32,
    /// Lifetime of version-topic command records; falls back to `record_ttl_days`
    #[serde(default)]
    pub version_topic_ttl_days: Option<u32>,
}

impl DbConfig {
    /// Config for `table_name` with the given record lifetime
    pub fn new(table_name: impl Into<String>, record_ttl_days: u32) -> Self {
        Self {
            table_name: table_name.into(),
            record_ttl_days,
            ..Default::default()
        }
    }

    /// Set the global secondary index name
    pub fn with_gsi_index_name(mut self, name: impl Into<String>) -> Self {
        self.gsi_index_name = name.into();
        self
    }

    /// Set the local secondary index name
    pub fn with_lsi_index_name(mut self, name: impl Into<String>) -> Self {
        self.lsi_index_name = name.into();
        self
    }

    /// Override the lifetime of version-topic records
    pub fn with_version_topic_ttl_days(mut self, days: u32) -> Self {
        self.version_topic_ttl_days = Some(days);
        self
    }

    /// Reject a config without a table name
    pub fn validate(&self) -> Result<(), Error> {
        if self.table_name.trim().is_empty() {
            return Err(Error::InvalidInput("DbConfig.table_name is empty".to_string()));
        }
        Ok(())
    }

    /// Lifetime of version-topic records in days
    pub fn version_topic_ttl(&self) -> u32 {
        self.version_topic_ttl_days.unwrap_or(self.record_ttl_days)
    }

    /// Epoch-seconds expiry for a record written at `now`
    pub fn record_expiry(&self, now: DateTime<Utc>) -> i64 {
        expiry(now, self.record_ttl_days)
    }

    /// Epoch-seconds expiry for a version-topic record written at `now`
    pub fn version_topic_expiry(&self, now: DateTime<Utc>) -> i64 {
        expiry(now, self.version_topic_ttl())
    }
}

fn expiry(now: DateTime<Utc>, days: u32) -> i64 {
    now.checked_add_signed(Duration::days(i64::from(days)))
        .map_or(i64::MAX, |at| at.timestamp())
}
