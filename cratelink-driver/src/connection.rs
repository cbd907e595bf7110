use std::collections::HashMap;

use cratelink_client_base::interface::QueryResult;
use cratelink_core::{err::Result, version::ServerVersion};
use cratelink_logging::{debug, Truncated};

use crate::{
    error::{DriverError, Feature},
    registry::ClientHandle,
};

/// The option enabling strict mode on a session
pub const OPTION_STRICT: &str = "strict";

/// Clusters below this version ignore a session schema
pub const MIN_SCHEMA_VERSION: ServerVersion = ServerVersion::new(0, 48, 1);

/// Longest statement prefix included in debug logs
const MAX_LOGGED_STATEMENT: usize = 1024;

/// A logical connection to the cluster
///
/// Shares its underlying client with other open connections to the same
/// endpoints. Closing the connection releases its reference; the client is
/// closed when the last reference goes.
#[derive(Debug)]
pub struct CrateConnection {
    handle: Option<ClientHandle>,
    options: HashMap<String, String>,
    client_info: HashMap<String, String>,
    schema: Option<String>,
    version: ServerVersion,
}

impl CrateConnection {
    /// Initialises a session over the supplied handle
    ///
    /// Fetches the cluster version as the one initialisation round trip. On
    /// failure the handle is released before the error propagates, so a failed
    /// connect never leaks a reference.
    pub fn connect(handle: ClientHandle, options: HashMap<String, String>) -> Result<Self> {
        let version = match handle.client().server_version() {
            Ok(version) => version,
            Err(reason) => {
                let url = handle.url().to_string();
                drop(handle);
                return Err(DriverError::UnreachableCluster { url, reason }.into());
            }
        };

        debug!("Connected to '{}' (cluster version {})", handle.url(), version);

        Ok(Self {
            handle: Some(handle),
            options,
            client_info: HashMap::new(),
            schema: None,
            version,
        })
    }

    fn handle(&self) -> Result<&ClientHandle> {
        match self.handle.as_ref() {
            Some(handle) => Ok(handle),
            None => Err(DriverError::ConnectionClosed.into()),
        }
    }

    /// Whether the `strict` option is enabled on this session
    pub fn strict(&self) -> bool {
        self.options
            .get(OPTION_STRICT)
            .map(|value| value.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    fn fail_if_strict(&self, feature: Feature) -> Result<()> {
        if self.strict() {
            return Err(DriverError::Unsupported(feature).into());
        }
        Ok(())
    }

    /// Whether the given optional capability is available on this session
    pub fn supports(&self, feature: Feature) -> bool {
        match feature {
            Feature::ManualCommit | Feature::Savepoints | Feature::Rollback => false,
            Feature::SchemaSelection => self.version >= MIN_SCHEMA_VERSION,
        }
    }

    /// Executes a statement through the shared client
    pub fn execute(&self, statement: &str, params: &[serde_json::Value]) -> Result<QueryResult> {
        let handle = self.handle()?;
        debug!(
            "Executing statement: {}",
            Truncated::new(Some(MAX_LOGGED_STATEMENT), statement)
        );

        handle.client().execute(statement, params)
    }

    /// Closes the connection, releasing its reference to the shared client
    /// Closing an already closed connection has no effect
    pub fn close(&mut self) {
        self.handle.take();
    }

    pub fn is_closed(&self) -> bool {
        self.handle.is_none()
    }

    /// The endpoint key of the shared client
    pub fn url(&self) -> Result<&str> {
        Ok(self.handle()?.url())
    }

    /// The version the cluster reported at connect
    pub fn server_version(&self) -> Result<ServerVersion> {
        self.handle()?;
        Ok(self.version)
    }

    /// The options this session was opened with
    pub fn options(&self) -> &HashMap<String, String> {
        &self.options
    }

    /// The session schema, if one has been selected
    pub fn schema(&self) -> Result<Option<&str>> {
        self.handle()?;
        Ok(self.schema.as_deref())
    }

    /// Selects the session schema
    /// Clusters below MIN_SCHEMA_VERSION ignore the selection
    pub fn set_schema(&mut self, schema: &str) -> Result<()> {
        self.handle()?;

        if !self.supports(Feature::SchemaSelection) {
            debug!(
                "Cluster version {} ignores schema selection, '{}' not applied",
                self.version, schema
            );
            return Ok(());
        }

        self.schema = Some(schema.to_string());
        Ok(())
    }

    /// Auto-commit is always enabled; the cluster commits each statement on execution
    pub fn auto_commit(&self) -> Result<bool> {
        self.handle()?;
        Ok(true)
    }

    /// Disabling auto-commit is not supported
    /// Outside strict mode the call is accepted and ignored
    pub fn set_auto_commit(&mut self, auto_commit: bool) -> Result<()> {
        self.handle()?;
        if !auto_commit {
            self.fail_if_strict(Feature::ManualCommit)?;
        }
        Ok(())
    }

    /// Commit has no effect under auto-commit
    pub fn commit(&mut self) -> Result<()> {
        self.handle()?;
        self.fail_if_strict(Feature::ManualCommit)
    }

    /// Rollback is not provided by the cluster
    pub fn rollback(&mut self) -> Result<()> {
        self.handle()?;
        self.fail_if_strict(Feature::Rollback)
    }

    pub fn set_savepoint(&mut self, _name: &str) -> Result<()> {
        self.handle()?;
        self.fail_if_strict(Feature::Savepoints)
    }

    pub fn release_savepoint(&mut self, _name: &str) -> Result<()> {
        self.handle()?;
        self.fail_if_strict(Feature::Savepoints)
    }

    pub fn rollback_to_savepoint(&mut self, _name: &str) -> Result<()> {
        self.handle()?;
        self.fail_if_strict(Feature::Rollback)
    }

    /// Free-form client info pairs kept on the session, never sent to the cluster
    pub fn client_info(&self, name: &str) -> Result<Option<&str>> {
        self.handle()?;
        Ok(self.client_info.get(name).map(|value| value.as_str()))
    }

    pub fn client_info_map(&self) -> Result<&HashMap<String, String>> {
        self.handle()?;
        Ok(&self.client_info)
    }

    pub fn set_client_info(&mut self, name: &str, value: &str) -> Result<()> {
        self.handle()?;
        self.client_info.insert(name.to_string(), value.to_string());
        Ok(())
    }

    /// Replaces the whole client info map
    pub fn set_client_info_map(&mut self, info: HashMap<String, String>) -> Result<()> {
        self.handle()?;
        self.client_info = info;
        Ok(())
    }
}
