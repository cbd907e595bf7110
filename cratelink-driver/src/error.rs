use std::fmt;

use cratelink_core::err::Error;
use thiserror::Error as ThisError;

/// An optional capability of the driver or backing cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    ManualCommit,
    Savepoints,
    Rollback,
    SchemaSelection,
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ManualCommit => "Manual commit",
            Self::Savepoints => "Savepoints",
            Self::Rollback => "Rollback",
            Self::SchemaSelection => "Schema selection",
        };
        write!(f, "{name}")
    }
}

/// Errors surfaced while establishing or using a connection
#[derive(Debug, ThisError)]
pub enum DriverError {
    /// The connection string violates the url grammar
    #[error("{0}")]
    MalformedUrl(String),
    /// The underlying client could not be constructed or initialised
    #[error("Failed to connect to cluster at '{url}': {reason}")]
    UnreachableCluster { url: String, reason: Error },
    /// An optional operation the backing cluster does not provide
    #[error("{0} is not supported by the cluster")]
    Unsupported(Feature),
    /// The logical connection has been closed
    #[error("Connection is closed")]
    ConnectionClosed,
    /// No registered driver accepts the url
    #[error("No registered driver accepts url '{0}'")]
    NoDriver(String),
}
