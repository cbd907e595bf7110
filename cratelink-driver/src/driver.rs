use std::{collections::HashMap, sync::Arc};

use cratelink_client_base::interface::ClientConnector;
use cratelink_core::err::Result;
use cratelink_logging::debug;

use crate::{
    connection::CrateConnection,
    error::DriverError,
    registry::ClientHandleRegistry,
    url::{ConnectionString, UrlResolver},
};

/// The scheme token in connection strings owned by the crate driver
pub const SCHEME: &str = "crate";

/// A url driver the hosting application can register for routing
pub trait UrlDriver: Send + Sync {
    /// Tests whether the url carries a scheme this driver owns
    fn accepts_url(&self, url: &str) -> bool;

    /// Opens a connection for the url
    /// Returns None when the url belongs to another driver
    fn connect(
        &self,
        url: &str,
        base_options: &HashMap<String, String>,
    ) -> Result<Option<CrateConnection>>;
}

/// The driver for clusters reachable over `crate://` connection strings
pub struct CrateDriver {
    resolver: UrlResolver,
    registry: ClientHandleRegistry,
}

impl CrateDriver {
    /// Creates a driver that opens clients through the supplied connector
    pub fn new(connector: impl ClientConnector + 'static) -> Self {
        Self {
            resolver: UrlResolver::new(SCHEME),
            registry: ClientHandleRegistry::new(connector),
        }
    }

    /// The resolver for this driver's url grammar
    pub fn resolver(&self) -> &UrlResolver {
        &self.resolver
    }

    /// Parses the url without connecting
    pub fn resolve(
        &self,
        url: &str,
        base_options: &HashMap<String, String>,
    ) -> Result<Option<ConnectionString>> {
        self.resolver.resolve(url, base_options)
    }

    /// The endpoint keys with live shared clients
    pub fn client_urls(&self) -> Result<Vec<String>> {
        self.registry.urls()
    }

    /// The driver release version
    pub fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}

impl UrlDriver for CrateDriver {
    fn accepts_url(&self, url: &str) -> bool {
        self.resolver.accepts_url(url)
    }

    fn connect(
        &self,
        url: &str,
        base_options: &HashMap<String, String>,
    ) -> Result<Option<CrateConnection>> {
        let conn_str = match self.resolver.resolve(url, base_options)? {
            Some(conn_str) => conn_str,
            None => return Ok(None),
        };

        debug!("Connecting to '{}'", conn_str.endpoint_key());

        let handle = self.registry.acquire(&conn_str)?;
        let ConnectionString {
            schema, options, ..
        } = conn_str;

        let mut connection = CrateConnection::connect(handle, options)?;
        if let Some(schema) = schema.as_deref() {
            connection.set_schema(schema)?;
        }

        Ok(Some(connection))
    }
}

/// Routes connection urls across the drivers registered by the hosting application
///
/// There is no load time registration. Hosts register each driver explicitly,
/// once, during process initialisation.
#[derive(Default)]
pub struct DriverRegistry {
    drivers: Vec<Arc<dyn UrlDriver>>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a driver as a routing candidate
    pub fn register(&mut self, driver: Arc<dyn UrlDriver>) {
        self.drivers.push(driver);
    }

    /// Opens a connection via the first registered driver that accepts the url
    pub fn connect(
        &self,
        url: &str,
        base_options: &HashMap<String, String>,
    ) -> Result<CrateConnection> {
        for driver in self.drivers.iter() {
            if let Some(connection) = driver.connect(url, base_options)? {
                return Ok(connection);
            }
        }

        Err(DriverError::NoDriver(url.to_string()).into())
    }
}
