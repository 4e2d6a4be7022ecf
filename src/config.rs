use std::time::Duration;

use anyhow::Result;
use config::{Config, File};
use serde::{Deserialize, Serialize};

use crate::consistency::ConsistencyLevel;
use crate::errors::CqlError;

/// Replication options for a keyspace, e.g.
/// `{"class": "SimpleStrategy", "replication_factor": 1}`.
pub type ReplicationMap = serde_json::Map<String, serde_json::Value>;

/// Port specification: a single port shared by every host, or a
/// comma-separated list paired with the host list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortSpec {
    Single(u16),
    List(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Comma-separated host list.
    pub host: String,
    pub port: Option<PortSpec>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub keyspace: String,
    pub table_prefix: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub page_size: i32,
    pub consistency: ConsistencyLevel,
    pub default_replication: Option<ReplicationMap>,
    /// Route reads through the primary link once a write has happened.
    pub sticky: bool,
}

impl ConnectionConfig {
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
    pub const DEFAULT_PAGE_SIZE: i32 = 500;
    pub const DEFAULT_PORT: u16 = 9042;
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(12);
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Expand the comma-separated host/port lists into per-node descriptors.
    ///
    /// Every node shares the connection's credentials, timeouts and page
    /// size; distributing load across the nodes is the transport's job.
    pub fn nodes(&self) -> Result<Vec<NodeConfig>, CqlError> {
        let hosts: Vec<&str> = self
            .host
            .split(',')
            .map(str::trim)
            .filter(|host| !host.is_empty())
            .collect();

        if hosts.is_empty() {
            return Err(CqlError::ConfigError(
                "database hostname is not set".to_string(),
            ));
        }

        let ports = self.resolve_ports(hosts.len())?;

        Ok(hosts
            .into_iter()
            .zip(ports)
            .map(|(host, port)| NodeConfig {
                host: host.to_string(),
                port,
                username: self.username.clone(),
                password: self.password.clone(),
                timeout: self.timeout,
                connect_timeout: self.connect_timeout,
                request_timeout: self.request_timeout,
                page_size: self.page_size,
            })
            .collect())
    }

    fn resolve_ports(&self, host_count: usize) -> Result<Vec<u16>, CqlError> {
        match &self.port {
            None => Ok(vec![Self::DEFAULT_PORT; host_count]),
            Some(PortSpec::Single(port)) => Ok(vec![*port; host_count]),
            Some(PortSpec::List(list)) => {
                let ports = list
                    .split(',')
                    .map(str::trim)
                    .map(|port| {
                        port.parse::<u16>().map_err(|_| {
                            CqlError::ConfigError(format!("invalid port: {}", port))
                        })
                    })
                    .collect::<Result<Vec<u16>, CqlError>>()?;

                if ports.len() == 1 {
                    Ok(vec![ports[0]; host_count])
                } else if ports.len() == host_count {
                    Ok(ports)
                } else {
                    Err(CqlError::ConfigError(format!(
                        "port list has {} entries for {} hosts",
                        ports.len(),
                        host_count
                    )))
                }
            }
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: None,
            username: None,
            password: None,
            keyspace: String::new(),
            table_prefix: String::new(),
            timeout: Self::DEFAULT_TIMEOUT,
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
            request_timeout: Self::DEFAULT_REQUEST_TIMEOUT,
            page_size: Self::DEFAULT_PAGE_SIZE,
            consistency: ConsistencyLevel::LocalOne,
            default_replication: None,
            sticky: false,
        }
    }
}

/// A single resolved node descriptor handed to the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub page_size: i32,
}

pub fn load_config(path: &str) -> Result<ConnectionConfig> {
    let config = Config::builder()
        .add_source(File::with_name(path))
        .add_source(config::Environment::with_prefix("CQLKIT"))
        .build()?;

    Ok(config.try_deserialize()?)
}
