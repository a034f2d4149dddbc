//! Request/response access to a target process's management surface.
//!
//! The rest of the crate talks to a target through [`ManagementConnection`]
//! only: read an attribute of a registry, or invoke an operation on it. The
//! concrete transport lives in [`http`], which speaks the JSON protocol of the
//! HTTP management agent. Tests substitute recording doubles at the same seam.

pub mod http;

use serde_json::Value;
use thiserror::Error;

pub use http::{HttpConnection, HttpConnector};

/// A live connection to one target process.
///
/// Connections are owned by a single invocation and closed when dropped.
pub trait ManagementConnection {
    /// Reads `attribute` from the registry identified by `registry`.
    fn get_attribute(&mut self, registry: &str, attribute: &str)
    -> Result<Value, ManagementError>;

    /// Invokes `operation` on the registry identified by `registry`.
    fn invoke(
        &mut self,
        registry: &str,
        operation: &str,
        arguments: &[Value],
    ) -> Result<Value, ManagementError>;
}

/// Opens management connections for advertised addresses.
pub trait ManagementConnector {
    /// Connects to the agent listening at `address`.
    fn connect(&self, address: &str) -> Result<Box<dyn ManagementConnection>, ConnectError>;
}

/// Failures reported by a single management request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ManagementError {
    /// The target has no registry under the requested identifier.
    #[error("registry {registry} is not registered in the target")]
    RegistryMissing { registry: String },
    /// The target refused an argument.
    #[error("{message}")]
    Rejected { message: String },
    /// The target raised some other error.
    #[error("{error_type}: {message}")]
    Remote { error_type: String, message: String },
    /// The request never completed.
    #[error("transport failure: {message}")]
    Transport { message: String },
    /// The response could not be decoded.
    #[error("unexpected agent response: {message}")]
    Protocol { message: String },
}

/// Failures establishing a connection.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConnectError {
    /// The address is not a usable agent URL.
    #[error("invalid agent address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },
    /// Nothing is listening at the address.
    #[error("agent at {address} is unreachable: {message}")]
    Unreachable { address: String, message: String },
    /// Something answered but did not complete the handshake.
    #[error("agent at {address} failed the handshake: {message}")]
    Handshake { address: String, message: String },
}
