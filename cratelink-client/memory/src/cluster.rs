use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicU32, Ordering},
        Mutex, MutexGuard,
    },
    thread,
    time::Duration,
};

use cratelink_client_base::interface::QueryResult;
use cratelink_core::{
    err::{bail, Context, Error, Result},
    version::ServerVersion,
};

use crate::MemoryClusterConfig;

/// An in-memory stand-in for a live cluster
/// Most useful for testing
pub struct MemoryCluster {
    version: Mutex<String>,
    responses: Mutex<HashMap<String, QueryResult>>,
    executed: Mutex<Vec<(String, Vec<serde_json::Value>)>>,
    connects: AtomicU32,
    closes: AtomicU32,
    fail_connects: AtomicBool,
    connect_delay: Mutex<Option<Duration>>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| Error::msg("Failed to lock memory cluster state"))
}

impl MemoryCluster {
    pub fn new(version: impl Into<String>) -> Self {
        Self::from_config(MemoryClusterConfig {
            version: version.into(),
            responses: HashMap::new(),
        })
    }

    pub fn from_config(conf: MemoryClusterConfig) -> Self {
        Self {
            version: Mutex::new(conf.version),
            responses: Mutex::new(conf.responses),
            executed: Mutex::new(vec![]),
            connects: AtomicU32::new(0),
            closes: AtomicU32::new(0),
            fail_connects: AtomicBool::new(false),
            connect_delay: Mutex::new(None),
        }
    }

    /// Registers a canned response for the statement
    pub fn add_response(&self, statement: impl Into<String>, response: QueryResult) -> Result<()> {
        lock(&self.responses)?.insert(statement.into(), response);
        Ok(())
    }

    /// Overrides the version string the cluster reports
    pub fn set_version(&self, version: impl Into<String>) -> Result<()> {
        *lock(&self.version)? = version.into();
        Ok(())
    }

    /// When enabled, client connects fail as if no endpoint were reachable
    pub fn set_fail_connects(&self, fail: bool) {
        self.fail_connects.store(fail, Ordering::SeqCst);
    }

    /// Delays client connects, widening race windows in tests
    pub fn set_connect_delay(&self, delay: Option<Duration>) -> Result<()> {
        *lock(&self.connect_delay)? = delay;
        Ok(())
    }

    /// The number of clients successfully opened against the cluster
    pub fn connect_count(&self) -> u32 {
        self.connects.load(Ordering::SeqCst)
    }

    /// The number of clients closed against the cluster
    pub fn close_count(&self) -> u32 {
        self.closes.load(Ordering::SeqCst)
    }

    /// The statements executed so far, in order
    pub fn executed(&self) -> Result<Vec<(String, Vec<serde_json::Value>)>> {
        Ok(lock(&self.executed)?.clone())
    }

    pub(crate) fn connect(&self) -> Result<()> {
        let delay = *lock(&self.connect_delay)?;
        if let Some(delay) = delay {
            thread::sleep(delay);
        }

        if self.fail_connects.load(Ordering::SeqCst) {
            bail!("No reachable endpoint");
        }

        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    pub(crate) fn execute(
        &self,
        statement: &str,
        params: &[serde_json::Value],
    ) -> Result<QueryResult> {
        lock(&self.executed)?.push((statement.to_string(), params.to_vec()));

        lock(&self.responses)?
            .get(statement)
            .cloned()
            .with_context(|| format!("No response configured for statement '{statement}'"))
    }

    pub(crate) fn server_version(&self) -> Result<ServerVersion> {
        lock(&self.version)?.parse()
    }

    pub(crate) fn note_close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}
