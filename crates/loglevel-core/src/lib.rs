//! Logger-registry bridging and dispatch for the `loglevel` tool.
//!
//! The crate discovers local JVM processes from their performance-data files,
//! resolves a pid to a management connection, and reads or rewrites logger
//! levels across the native and bridged logging registries of the target.
//! Terminal IO, argument parsing, and rendering belong to the CLI crate; this
//! crate hands records to a [`RecordSink`] and reports failures as typed errors.

pub mod agent;
pub mod dispatch;
pub mod locator;
pub mod management;
pub mod perfdata;
pub mod record;
pub mod registry;
pub mod resolver;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use dispatch::{DispatchError, LevelOperationDispatcher, NamePattern};
pub use locator::{
    DiscoveryError, PerfDataDiscovery, ProcessDescriptor, ProcessDiscovery, ProcessLocator,
};
pub use management::{
    ConnectError, HttpConnector, ManagementConnection, ManagementConnector, ManagementError,
};
pub use record::{ChangeOutcome, LoggerRecord, RecordSink};
pub use registry::{
    InvalidRegistryId, LevelChange, LevelValue, LoggerName, LoggerRegistry, LoggerTypeSelector,
    LoggerTypeTag, RegistryError, RegistryIds, RegistrySet,
};
pub use resolver::{EndpointResolver, ResolveError};

/// Tracing target for diagnostics emitted by this crate.
pub const CORE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::core");
