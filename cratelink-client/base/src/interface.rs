use std::fmt;

use cratelink_core::{err::Result, version::ServerVersion};
use serde::{Deserialize, Serialize};

/// One host:port pair identifying a reachable node of the backing cluster
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// The outcome of executing a statement against the cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Column names in projection order
    pub cols: Vec<String>,
    /// Row data
    pub rows: Vec<Vec<serde_json::Value>>,
    /// Rows returned, or rows affected for write statements
    pub row_count: u64,
}

impl QueryResult {
    pub fn new(cols: Vec<String>, rows: Vec<Vec<serde_json::Value>>) -> Self {
        let row_count = rows.len() as u64;
        Self {
            cols,
            rows,
            row_count,
        }
    }

    /// A result for a write statement that affected the supplied number of rows
    pub fn affected(row_count: u64) -> Self {
        Self {
            cols: vec![],
            rows: vec![],
            row_count,
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![], vec![])
    }
}

/// An open client to the backing cluster
/// One client is shared by all logical connections with equal endpoint keys
pub trait ClusterClient: Send + Sync {
    /// Executes the supplied statement against the cluster
    fn execute(&self, statement: &str, params: &[serde_json::Value]) -> Result<QueryResult>;

    /// The version reported by the cluster
    fn server_version(&self) -> Result<ServerVersion>;

    /// Closes the client, terminating transport to all endpoints
    fn close(&self) -> Result<()>;
}

/// Constructs clients bound to a set of cluster endpoints
pub trait ClientConnector: Send + Sync {
    /// Opens a client against the supplied endpoints
    /// This is the one blocking call made while a client handle is constructed
    fn connect(&self, endpoints: &[Endpoint]) -> Result<Box<dyn ClusterClient>>;
}
