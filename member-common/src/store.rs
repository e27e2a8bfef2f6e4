//! Storage collaborators consumed by the migration pipeline.
use std::time;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{CanonicalMember, DuplicateSet, SourceMember};

/// Enumeration of errors for read queries against a member store.
/// Errors can originate from sqlx and are wrapped by us to provide additional context.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("{command} query exceeded its deadline of {timeout:?}")]
    Timeout {
        command: String,
        timeout: time::Duration,
    },
    #[error("{command} query failed with: {error}")]
    Database { command: String, error: sqlx::Error },
    #[error("failed to decode member document: {0}")]
    Decode(#[from] serde_json::Error),
}

impl QueryError {
    /// Whether the query failed because its deadline was exceeded.
    pub fn is_timeout(&self) -> bool {
        matches!(self, QueryError::Timeout { .. })
    }
}

/// Enumeration of errors for a single insert. These are captured per member and never abort a run.
#[derive(Error, Debug)]
pub enum InsertError {
    #[error("insert exceeded its deadline of {timeout:?}")]
    Timeout { timeout: time::Duration },
    #[error("insert failed with: {0}")]
    Database(#[from] sqlx::Error),
    #[error("failed to encode member document: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl InsertError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, InsertError::Timeout { .. })
    }
}

/// Read access to the full source data set.
#[async_trait]
pub trait SourceReader: Send + Sync {
    /// Fetch every source member. No filter, no pagination.
    async fn fetch_all(&self) -> Result<Vec<SourceMember>, QueryError>;
}

/// The destination data set members are migrated into.
#[async_trait]
pub trait DestinationStore: Send + Sync {
    /// Return which of `names` already exist, in a single round-trip.
    /// The returned map only contains names that exist.
    async fn exists_by_names(&self, names: &[String]) -> Result<DuplicateSet, QueryError>;

    /// Insert one member. Exactly one attempt is made.
    async fn insert_one(&self, member: &CanonicalMember) -> Result<(), InsertError>;
}
