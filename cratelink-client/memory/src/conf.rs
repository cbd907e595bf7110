use std::collections::HashMap;

use cratelink_client_base::interface::QueryResult;
use cratelink_core::{
    config,
    err::{Context, Result},
};
use serde::{Deserialize, Serialize};

/// The config for an in-memory cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryClusterConfig {
    /// The version the cluster reports
    #[serde(default = "default_version")]
    pub version: String,
    /// Canned responses keyed by statement text
    #[serde(default)]
    pub responses: HashMap<String, QueryResult>,
}

fn default_version() -> String {
    "0.57.8".to_string()
}

impl Default for MemoryClusterConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            responses: HashMap::new(),
        }
    }
}

impl MemoryClusterConfig {
    pub fn parse(options: config::Value) -> Result<Self> {
        config::from_value::<Self>(options)
            .context("Failed to parse connection configuration options")
    }
}
