use std::collections::HashMap;

use cratelink_client_base::interface::Endpoint;
use cratelink_core::err::{bail, Result};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::DriverError;

/// The parsed form of a connection string
/// Built once per connect call and discarded after handle acquisition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionString {
    /// The cluster endpoints, in url order
    pub endpoints: Vec<Endpoint>,
    /// The schema selected for the session, if any
    pub schema: Option<String>,
    /// Connect options, base options overlaid by query parameters
    pub options: HashMap<String, String>,
}

impl ConnectionString {
    pub fn new(
        endpoints: Vec<Endpoint>,
        schema: Option<String>,
        options: HashMap<String, String>,
    ) -> Self {
        Self {
            endpoints,
            schema,
            options,
        }
    }

    /// The canonical key for the cluster (and schema) this string points at
    /// Logical connections with equal keys share one underlying client
    pub fn endpoint_key(&self) -> String {
        let hosts = self.endpoints.iter().join(",");

        match self.schema.as_deref() {
            Some(schema) => format!("{hosts}/{schema}"),
            None => hosts,
        }
    }
}

/// Parses connection strings for one url scheme
pub struct UrlResolver {
    short_prefix: String,
    long_prefix: String,
}

impl UrlResolver {
    /// Creates a resolver owning `scheme://` and `jdbc:scheme://` urls
    pub fn new(scheme: &str) -> Self {
        Self {
            short_prefix: format!("{scheme}://"),
            long_prefix: format!("jdbc:{scheme}://"),
        }
    }

    pub fn short_prefix(&self) -> &str {
        &self.short_prefix
    }

    pub fn long_prefix(&self) -> &str {
        &self.long_prefix
    }

    /// Tests whether the url carries one of this resolver's scheme prefixes
    pub fn accepts_url(&self, url: &str) -> bool {
        url.starts_with(&self.short_prefix) || url.starts_with(&self.long_prefix)
    }

    /// Parses the url, overlaying its query parameters on the base options
    ///
    /// Returns None when the url does not carry this resolver's scheme so the
    /// caller can route it to another driver.
    pub fn resolve(
        &self,
        url: &str,
        base_options: &HashMap<String, String>,
    ) -> Result<Option<ConnectionString>> {
        let remainder = if let Some(rest) = url.strip_prefix(&self.long_prefix) {
            rest
        } else if let Some(rest) = url.strip_prefix(&self.short_prefix) {
            rest
        } else {
            return Ok(None);
        };

        let (path, query) = match remainder.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (remainder, None),
        };

        let mut options = base_options.clone();
        if let Some(query) = query {
            self.parse_query(query, &mut options)?;
        }

        let (hosts, schema) = self.parse_path(path)?;
        let endpoints = self.parse_hosts(hosts)?;

        Ok(Some(ConnectionString::new(endpoints, schema, options)))
    }

    /// Renders the url for a connection string under this resolver's scheme
    /// resolve() reverses this rendering
    pub fn to_url(&self, conn_str: &ConnectionString) -> String {
        let mut url = format!("{}{}", self.short_prefix, conn_str.endpoint_key());

        if !conn_str.options.is_empty() {
            let query = conn_str
                .options
                .iter()
                .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
                .join("&");
            url.push('?');
            url.push_str(&query);
        }

        url
    }

    fn format_hint(&self) -> String {
        format!(
            "[jdbc:]{}host:port[,host:port ...][/schema][?option=value]",
            self.short_prefix
        )
    }

    /// Applies `key=value` query parameters to the options
    /// Any malformed pair fails the whole parse so options are never half applied
    fn parse_query(&self, query: &str, options: &mut HashMap<String, String>) -> Result<()> {
        for token in query.split('&').filter(|token| !token.is_empty()) {
            let (key, value) = match token.split_once('=') {
                Some(pair) => pair,
                None => bail!(DriverError::MalformedUrl(format!(
                    "Invalid option '{token}'. Valid format is: option=value&option=value"
                ))),
            };

            if key.is_empty() || value.is_empty() || value.contains('?') || value.contains('=') {
                bail!(DriverError::MalformedUrl(format!(
                    "Invalid option '{token}'. Valid format is: option=value&option=value"
                )));
            }

            let value = urlencoding::decode(value).map_err(|_| {
                DriverError::MalformedUrl(format!(
                    "Option '{key}' value is not valid percent-encoded utf-8"
                ))
            })?;

            options.insert(key.to_string(), value.into_owned());
        }

        Ok(())
    }

    /// Splits the path into the host list and optional schema
    /// The grammar allows a single schema segment at most
    fn parse_path<'a>(&self, path: &'a str) -> Result<(&'a str, Option<String>)> {
        if path.is_empty() || path == "/" {
            return Ok(("", None));
        }

        let mut segments = path.split('/').collect::<Vec<_>>();
        while segments.last() == Some(&"") {
            segments.pop();
        }

        match segments.len() {
            0 => Ok(("", None)),
            1 => Ok((segments[0], None)),
            2 => Ok((segments[0], Some(segments[1].to_string()))),
            _ => bail!(DriverError::MalformedUrl(format!(
                "Url contains more than one schema segment. Valid format is: {}",
                self.format_hint()
            ))),
        }
    }

    /// Parses the comma-separated host list into endpoints
    fn parse_hosts(&self, hosts: &str) -> Result<Vec<Endpoint>> {
        if hosts.is_empty() {
            bail!(DriverError::MalformedUrl(format!(
                "Url contains no hosts. Valid format is: {}",
                self.format_hint()
            )));
        }

        hosts
            .split(',')
            .map(|entry| self.parse_host(entry.trim()))
            .collect()
    }

    fn parse_host(&self, entry: &str) -> Result<Endpoint> {
        let (host, port) = match entry.rsplit_once(':') {
            Some(pair) => pair,
            None => bail!(DriverError::MalformedUrl(format!(
                "Invalid host '{entry}', expected host:port"
            ))),
        };

        if host.is_empty() {
            bail!(DriverError::MalformedUrl(format!(
                "Invalid host '{entry}', expected host:port"
            )));
        }

        let port = match port.parse::<u16>() {
            Ok(port) if port > 0 => port,
            _ => bail!(DriverError::MalformedUrl(format!(
                "Invalid port in host '{entry}'"
            ))),
        };

        Ok(Endpoint::new(host, port))
    }
}
