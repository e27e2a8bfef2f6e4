use member_common::pgstore::ConnectionError;
use member_common::store::QueryError;
use thiserror::Error;

/// Enumeration of reasons a source member cannot be normalized.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizationError {
    #[error("member name is empty")]
    EmptyName,
    #[error("birth date '{0}' is not a YYYY-MM-DD date")]
    DateFormat(String),
    #[error("baptism year '{0}' is not an integer")]
    NumericFormat(String),
}

/// Enumeration of errors that abort a migration run before or instead of completing it.
/// Insert failures are not part of this: they are captured per member and reported.
#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("failed to connect to the database: {0}")]
    Connection(#[from] ConnectionError),
    #[error("failed to fetch source members: {0}")]
    Fetch(#[source] QueryError),
    #[error("failed to normalize member #{index} ('{name}'): {error}")]
    Normalization {
        index: usize,
        name: String,
        error: NormalizationError,
    },
    #[error("failed to look up existing members: {0}")]
    DuplicateDetection(#[source] QueryError),
    #[error("failed to write run report: {0}")]
    Report(#[from] std::io::Error),
}

impl From<envconfig::Error> for MigrationError {
    fn from(error: envconfig::Error) -> Self {
        MigrationError::Configuration(error.to_string())
    }
}

impl MigrationError {
    /// Whether the run was aborted because a storage deadline was exceeded.
    pub fn is_timeout(&self) -> bool {
        match self {
            MigrationError::Fetch(error) | MigrationError::DuplicateDetection(error) => {
                error.is_timeout()
            }
            MigrationError::Connection(ConnectionError::Timeout(_)) => true,
            _ => false,
        }
    }
}
