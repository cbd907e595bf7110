use std::{collections::HashMap, sync::Arc};

use cratelink_client_memory::{MemoryClientConnector, MemoryCluster};
use cratelink_driver::CrateDriver;

/// Starts an in-memory cluster reporting the supplied version
pub fn start_cluster(version: &str) -> Arc<MemoryCluster> {
    Arc::new(MemoryCluster::new(version))
}

/// Creates a driver that opens clients against the cluster
pub fn driver_for(cluster: &Arc<MemoryCluster>) -> CrateDriver {
    CrateDriver::new(MemoryClientConnector::new(Arc::clone(cluster)))
}

pub fn no_options() -> HashMap<String, String> {
    HashMap::new()
}
