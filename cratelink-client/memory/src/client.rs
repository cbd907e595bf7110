use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use cratelink_client_base::interface::{ClientConnector, ClusterClient, Endpoint, QueryResult};
use cratelink_core::{
    err::{bail, Result},
    version::ServerVersion,
};
use cratelink_logging::debug;
use itertools::Itertools;

use crate::MemoryCluster;

/// Opens in-memory clients against a shared cluster
#[derive(Clone)]
pub struct MemoryClientConnector {
    cluster: Arc<MemoryCluster>,
}

impl MemoryClientConnector {
    pub fn new(cluster: Arc<MemoryCluster>) -> Self {
        Self { cluster }
    }

    pub fn cluster(&self) -> Arc<MemoryCluster> {
        Arc::clone(&self.cluster)
    }
}

impl ClientConnector for MemoryClientConnector {
    fn connect(&self, endpoints: &[Endpoint]) -> Result<Box<dyn ClusterClient>> {
        self.cluster.connect()?;
        debug!("Opened memory client to [{}]", endpoints.iter().join(", "));

        Ok(Box::new(MemoryClient::new(Arc::clone(&self.cluster))))
    }
}

/// A client bound to the in-memory cluster
pub struct MemoryClient {
    cluster: Arc<MemoryCluster>,
    closed: AtomicBool,
}

impl MemoryClient {
    pub fn new(cluster: Arc<MemoryCluster>) -> Self {
        Self {
            cluster,
            closed: AtomicBool::new(false),
        }
    }

    fn check_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            bail!("Memory client is closed");
        }
        Ok(())
    }
}

impl ClusterClient for MemoryClient {
    fn execute(&self, statement: &str, params: &[serde_json::Value]) -> Result<QueryResult> {
        self.check_open()?;
        self.cluster.execute(statement, params)
    }

    fn server_version(&self) -> Result<ServerVersion> {
        self.check_open()?;
        self.cluster.server_version()
    }

    fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            bail!("Memory client is already closed");
        }

        self.cluster.note_close();
        Ok(())
    }
}
