use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard},
};

use cratelink_client_base::interface::{ClientConnector, ClusterClient};
use cratelink_core::err::{Error, Result};
use cratelink_logging::warn;

use crate::{error::DriverError, url::ConnectionString};

/// State for one shared client entry
struct HandleState {
    client: Arc<dyn ClusterClient>,
    refs: usize,
}

type HandleMap = Arc<Mutex<HashMap<String, HandleState>>>;

/// Shares underlying clients between logical connections with equal endpoint keys
///
/// The registry owns each client. Handles contribute a reference count and the
/// client is closed when the last handle for its key is released.
#[derive(Clone)]
pub struct ClientHandleRegistry {
    connector: Arc<dyn ClientConnector>,
    handles: HandleMap,
}

impl ClientHandleRegistry {
    /// Creates a registry that constructs clients through the supplied connector
    pub fn new(connector: impl ClientConnector + 'static) -> Self {
        Self {
            connector: Arc::new(connector),
            handles: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns a handle to the client for the connection string's endpoint key,
    /// constructing the client on first use
    ///
    /// Construction happens under the registry lock, so concurrent callers for
    /// one key never construct two clients. A failed construction leaves the
    /// registry unchanged.
    pub fn acquire(&self, conn_str: &ConnectionString) -> Result<ClientHandle> {
        let key = conn_str.endpoint_key();
        let mut handles = self.lock_handles()?;

        if let Some(state) = handles.get_mut(&key) {
            state.refs += 1;
            return Ok(ClientHandle::new(
                key,
                Arc::clone(&state.client),
                Arc::clone(&self.handles),
            ));
        }

        let client: Arc<dyn ClusterClient> = match self.connector.connect(&conn_str.endpoints) {
            Ok(client) => Arc::from(client),
            Err(reason) => {
                return Err(DriverError::UnreachableCluster { url: key, reason }.into());
            }
        };

        handles.insert(
            key.clone(),
            HandleState {
                client: Arc::clone(&client),
                refs: 1,
            },
        );

        Ok(ClientHandle::new(key, client, Arc::clone(&self.handles)))
    }

    /// The endpoint keys with live clients
    pub fn urls(&self) -> Result<Vec<String>> {
        Ok(self.lock_handles()?.keys().cloned().collect())
    }

    /// The number of handles held against the key
    pub fn handle_count(&self, key: &str) -> Result<usize> {
        Ok(self
            .lock_handles()?
            .get(key)
            .map(|state| state.refs)
            .unwrap_or(0))
    }

    fn lock_handles(&self) -> Result<MutexGuard<'_, HashMap<String, HandleState>>> {
        self.handles
            .lock()
            .map_err(|_| Error::msg("Failed to lock client handle registry"))
    }
}

/// A counted reference to a shared client
/// Dropping the handle releases the reference; the last release closes the client
pub struct ClientHandle {
    key: String,
    client: Arc<dyn ClusterClient>,
    handles: HandleMap,
}

impl ClientHandle {
    fn new(key: String, client: Arc<dyn ClusterClient>, handles: HandleMap) -> Self {
        Self {
            key,
            client,
            handles,
        }
    }

    /// The endpoint key this handle is registered under
    pub fn url(&self) -> &str {
        &self.key
    }

    /// The shared client
    pub fn client(&self) -> &dyn ClusterClient {
        self.client.as_ref()
    }
}

impl fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientHandle")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl Drop for ClientHandle {
    fn drop(&mut self) {
        let mut handles = match self.handles.lock() {
            Ok(handles) => handles,
            Err(_) => {
                warn!(
                    "Failed to lock client handle registry while releasing '{}'",
                    self.key
                );
                return;
            }
        };

        let state = match handles.get_mut(&self.key) {
            Some(state) => state,
            None => {
                warn!("Client handle '{}' was already released", self.key);
                return;
            }
        };

        state.refs -= 1;
        if state.refs == 0 {
            handles.remove(&self.key);
            if let Err(err) = self.client.close() {
                warn!("Failed to close client for '{}': {:?}", self.key, err);
            }
        }
    }
}
