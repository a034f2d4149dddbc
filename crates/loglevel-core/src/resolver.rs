//! Resolution of a pid to a live management connection.

use thiserror::Error;
use tracing::debug;

use crate::CORE_TARGET;
use crate::locator::{DiscoveryError, ProcessDiscovery};
use crate::management::{ConnectError, ManagementConnection, ManagementConnector};

/// Why a pid could not be turned into a connection.
///
/// Every variant ends the current command.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The process exists but advertises no management agent.
    #[error(
        "process {pid} does not advertise a management agent; restart it with the agent attached (-javaagent:<agent.jar>)"
    )]
    NoAgent { pid: u32 },
    /// The process could not be found or has gone away.
    #[error("process {pid} was not found or has exited")]
    ProcessNotFound { pid: u32 },
    /// The address was malformed or the transport failed.
    #[error("failed to connect to {address}: {message}")]
    ConnectionError { address: String, message: String },
}

/// Turns pids into connections using discovery and a connector.
pub struct EndpointResolver<'a> {
    discovery: &'a dyn ProcessDiscovery,
    connector: &'a dyn ManagementConnector,
}

impl<'a> EndpointResolver<'a> {
    /// Creates a resolver over the given collaborators.
    #[must_use]
    pub fn new(discovery: &'a dyn ProcessDiscovery, connector: &'a dyn ManagementConnector) -> Self {
        Self {
            discovery,
            connector,
        }
    }

    /// Looks up the agent advertised by `pid` and connects to it.
    pub fn resolve(&self, pid: u32) -> Result<Box<dyn ManagementConnection>, ResolveError> {
        let address = match self.discovery.advertised_management_address(pid) {
            Ok(Some(address)) => address,
            Ok(None) => return Err(ResolveError::NoAgent { pid }),
            Err(DiscoveryError::NoSuchProcess { .. }) => {
                return Err(ResolveError::ProcessNotFound { pid });
            }
            Err(error) => {
                return Err(ResolveError::ConnectionError {
                    address: format!("pid {pid}"),
                    message: error.to_string(),
                });
            }
        };
        debug!(target: CORE_TARGET, pid, %address, "resolved management address");
        self.connect_address(pid, &address)
    }

    /// Connects to an explicitly configured `address` on behalf of `pid`,
    /// bypassing discovery.
    pub fn connect_address(
        &self,
        pid: u32,
        address: &str,
    ) -> Result<Box<dyn ManagementConnection>, ResolveError> {
        self.connector.connect(address).map_err(|error| match error {
            ConnectError::Unreachable { .. } => ResolveError::ProcessNotFound { pid },
            ConnectError::InvalidAddress { address, reason } => ResolveError::ConnectionError {
                address,
                message: reason,
            },
            ConnectError::Handshake { address, message } => {
                ResolveError::ConnectionError { address, message }
            }
        })
    }
}
