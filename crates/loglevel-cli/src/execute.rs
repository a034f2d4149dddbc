//! Runs a parsed invocation against the core library.

use loglevel_config::Config;
use loglevel_core::{
    EndpointResolver, LevelOperationDispatcher, ManagementConnection, ManagementConnector,
    ProcessDiscovery, ProcessLocator, RecordSink, RegistryIds,
};
use tracing::debug;

use crate::AppError;
use crate::CLI_TARGET;
use crate::command::{CommandInvocation, LoggerQuery};

/// The discovery and transport implementations a command runs against.
pub(crate) struct Collaborators<'a> {
    pub(crate) discovery: &'a dyn ProcessDiscovery,
    pub(crate) connector: &'a dyn ManagementConnector,
}

/// Executes `invocation`, streaming records into `sink`.
///
/// At most one connection is opened; it is dropped before returning on every
/// path.
pub(crate) fn execute(
    invocation: CommandInvocation,
    config: &Config,
    collaborators: &Collaborators<'_>,
    sink: &mut dyn RecordSink,
) -> Result<(), AppError> {
    let ids = RegistryIds::new(config.native_registry(), config.bridged_registry())?;
    let dispatcher = LevelOperationDispatcher::new(ids);
    debug!(target: CLI_TARGET, command = invocation.name(), "executing command");

    match invocation {
        CommandInvocation::Jobs => {
            let locator = ProcessLocator::new(collaborators.discovery, config.self_name());
            dispatcher.list_jvms(&locator, sink)?;
        }
        CommandInvocation::List(query) => {
            let mut connection = connect(&query, config, collaborators)?;
            dispatcher.show_levels(connection.as_mut(), query.selector, &query.pattern, sink)?;
        }
        CommandInvocation::Parent(query) => {
            let mut connection = connect(&query, config, collaborators)?;
            dispatcher.show_parents(connection.as_mut(), query.selector, &query.pattern, sink)?;
        }
        CommandInvocation::Set { query, change } => {
            let mut connection = connect(&query, config, collaborators)?;
            dispatcher.set_levels(
                connection.as_mut(),
                query.selector,
                &query.pattern,
                &change,
                sink,
            )?;
        }
    }
    Ok(())
}

fn connect(
    query: &LoggerQuery,
    config: &Config,
    collaborators: &Collaborators<'_>,
) -> Result<Box<dyn ManagementConnection>, AppError> {
    let resolver = EndpointResolver::new(collaborators.discovery, collaborators.connector);
    let connection = match config.agent_url() {
        Some(address) => {
            debug!(target: CLI_TARGET, pid = query.pid, %address, "using configured agent url");
            resolver.connect_address(query.pid, address)
        }
        None => resolver.resolve(query.pid),
    }?;
    Ok(connection)
}
