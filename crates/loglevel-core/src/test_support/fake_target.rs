//! In-memory stand-ins for a target process and its discovery.
//!
//! [`FakeTarget`] models the logging registries of a target the way the
//! standard logging management surface behaves: unknown loggers read as
//! `null`, loggers without an explicit level read as `""`, a `null` level
//! clears the explicit level, and level names outside the registry's
//! vocabulary are refused.

use std::collections::HashMap;

use serde_json::{Value, json};

use crate::locator::{DiscoveryError, ProcessDiscovery};
use crate::management::{ManagementConnection, ManagementError};

const NATIVE_LEVELS: &[&str] = &[
    "OFF", "SEVERE", "WARNING", "INFO", "CONFIG", "FINE", "FINER", "FINEST", "ALL",
];
const BRIDGED_LEVELS: &[&str] = &["OFF", "FATAL", "ERROR", "WARN", "INFO", "DEBUG", "TRACE", "ALL"];

#[derive(Debug, Clone)]
struct FakeLogger {
    name: String,
    level: Option<String>,
    parent: String,
}

/// One logging registry inside a [`FakeTarget`].
#[derive(Debug, Clone)]
pub struct FakeRegistry {
    id: String,
    vocabulary: &'static [&'static str],
    loggers: Vec<FakeLogger>,
}

impl FakeRegistry {
    /// A registry accepting the native facility's level names.
    #[must_use]
    pub fn native(id: &str) -> Self {
        Self::with_vocabulary(id, NATIVE_LEVELS)
    }

    /// A registry accepting the bridged facility's level names.
    #[must_use]
    pub fn bridged(id: &str) -> Self {
        Self::with_vocabulary(id, BRIDGED_LEVELS)
    }

    fn with_vocabulary(id: &str, vocabulary: &'static [&'static str]) -> Self {
        Self {
            id: id.to_owned(),
            vocabulary,
            loggers: Vec::new(),
        }
    }

    /// Adds a logger, in enumeration order. The root logger is named `""`.
    #[must_use]
    pub fn logger(mut self, name: &str, level: Option<&str>, parent: &str) -> Self {
        self.loggers.push(FakeLogger {
            name: name.to_owned(),
            level: level.map(str::to_owned),
            parent: parent.to_owned(),
        });
        self
    }

    /// Registry identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    fn find(&self, name: &str) -> Option<&FakeLogger> {
        self.loggers.iter().find(|logger| logger.name == name)
    }

    fn find_mut(&mut self, name: &str) -> Option<&mut FakeLogger> {
        self.loggers.iter_mut().find(|logger| logger.name == name)
    }

    fn read(&self, attribute: &str) -> Result<Value, ManagementError> {
        match attribute {
            "LoggerNames" => Ok(json!(
                self.loggers
                    .iter()
                    .map(|logger| logger.name.as_str())
                    .collect::<Vec<_>>()
            )),
            other => Err(remote(
                "javax.management.AttributeNotFoundException",
                format!("No such attribute: {other}"),
            )),
        }
    }

    fn invoke(&mut self, operation: &str, arguments: &[Value]) -> Result<Value, ManagementError> {
        let name = arguments.first().and_then(Value::as_str).ok_or_else(|| {
            remote(
                "java.lang.IllegalArgumentException",
                format!("{operation} expects a logger name"),
            )
        })?;
        match operation {
            "getLoggerLevel" => Ok(self
                .find(name)
                .map_or(Value::Null, |logger| json!(logger.level.as_deref().unwrap_or("")))),
            "getParentLoggerName" => Ok(self
                .find(name)
                .map_or(Value::Null, |logger| json!(logger.parent))),
            "setLoggerLevel" => {
                let level = match arguments.get(1) {
                    None | Some(Value::Null) => None,
                    Some(Value::String(level)) if self.vocabulary.contains(&level.as_str()) => {
                        Some(level.clone())
                    }
                    Some(other) => {
                        let shown = other.as_str().map_or_else(|| other.to_string(), str::to_owned);
                        return Err(ManagementError::Rejected {
                            message: format!("Bad level \"{shown}\""),
                        });
                    }
                };
                let logger = self.find_mut(name).ok_or_else(|| ManagementError::Rejected {
                    message: format!("Logger {name} does not exist"),
                })?;
                logger.level = level;
                Ok(Value::Null)
            }
            other => Err(remote(
                "javax.management.ReflectionException",
                format!("No such operation: {other}"),
            )),
        }
    }
}

fn remote(error_type: &str, message: String) -> ManagementError {
    ManagementError::Remote {
        error_type: error_type.to_owned(),
        message,
    }
}

/// The management surface of one simulated target process.
#[derive(Debug, Clone, Default)]
pub struct FakeTarget {
    registries: Vec<FakeRegistry>,
}

impl FakeTarget {
    /// A target with no registries.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `registry` with the target.
    #[must_use]
    pub fn with_registry(mut self, registry: FakeRegistry) -> Self {
        self.registries.push(registry);
        self
    }

    /// Explicit level of `logger` in `registry`; `None` when unset or unknown.
    #[must_use]
    pub fn level_of(&self, registry: &str, logger: &str) -> Option<String> {
        self.registries
            .iter()
            .find(|candidate| candidate.id == registry)
            .and_then(|candidate| candidate.find(logger))
            .and_then(|logger| logger.level.clone())
    }

    fn registry(&self, id: &str) -> Result<&FakeRegistry, ManagementError> {
        self.registries
            .iter()
            .find(|registry| registry.id == id)
            .ok_or_else(|| missing(id))
    }

    fn registry_mut(&mut self, id: &str) -> Result<&mut FakeRegistry, ManagementError> {
        self.registries
            .iter_mut()
            .find(|registry| registry.id == id)
            .ok_or_else(|| missing(id))
    }
}

fn missing(id: &str) -> ManagementError {
    ManagementError::RegistryMissing {
        registry: id.to_owned(),
    }
}

impl ManagementConnection for FakeTarget {
    fn get_attribute(
        &mut self,
        registry: &str,
        attribute: &str,
    ) -> Result<Value, ManagementError> {
        self.registry(registry)?.read(attribute)
    }

    fn invoke(
        &mut self,
        registry: &str,
        operation: &str,
        arguments: &[Value],
    ) -> Result<Value, ManagementError> {
        self.registry_mut(registry)?.invoke(operation, arguments)
    }
}

/// A management request observed by [`RecordingConnection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// An attribute read.
    Read { registry: String, attribute: String },
    /// An operation invocation.
    Invoke {
        registry: String,
        operation: String,
        arguments: Vec<Value>,
    },
}

impl Call {
    /// Logger name passed as the first argument, if any.
    #[must_use]
    pub fn logger(&self) -> Option<&str> {
        match self {
            Self::Read { .. } => None,
            Self::Invoke { arguments, .. } => arguments.first().and_then(Value::as_str),
        }
    }

    /// Operation or attribute name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Read { attribute, .. } => attribute,
            Self::Invoke { operation, .. } => operation,
        }
    }
}

/// A [`FakeTarget`] connection that records every request.
#[derive(Debug, Default)]
pub struct RecordingConnection {
    target: FakeTarget,
    calls: Vec<Call>,
}

impl RecordingConnection {
    /// Wraps `target`.
    #[must_use]
    pub fn new(target: FakeTarget) -> Self {
        Self {
            target,
            calls: Vec::new(),
        }
    }

    /// Requests seen so far, in order.
    #[must_use]
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// Forgets the recorded requests.
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// The wrapped target.
    #[must_use]
    pub fn target(&self) -> &FakeTarget {
        &self.target
    }
}

impl ManagementConnection for RecordingConnection {
    fn get_attribute(
        &mut self,
        registry: &str,
        attribute: &str,
    ) -> Result<Value, ManagementError> {
        self.calls.push(Call::Read {
            registry: registry.to_owned(),
            attribute: attribute.to_owned(),
        });
        self.target.get_attribute(registry, attribute)
    }

    fn invoke(
        &mut self,
        registry: &str,
        operation: &str,
        arguments: &[Value],
    ) -> Result<Value, ManagementError> {
        self.calls.push(Call::Invoke {
            registry: registry.to_owned(),
            operation: operation.to_owned(),
            arguments: arguments.to_vec(),
        });
        self.target.invoke(registry, operation, arguments)
    }
}

#[derive(Debug, Clone)]
enum Advertisement {
    Address(Option<String>),
    Vanished,
}

/// Discovery over a fixed process table.
#[derive(Debug, Clone, Default)]
pub struct StaticDiscovery {
    processes: Vec<(u32, String)>,
    advertisements: HashMap<u32, Advertisement>,
}

impl StaticDiscovery {
    /// An empty process table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a live process advertising `address`.
    #[must_use]
    pub fn process(mut self, pid: u32, command_line: &str, address: Option<&str>) -> Self {
        self.processes.push((pid, command_line.to_owned()));
        self.advertisements.insert(
            pid,
            Advertisement::Address(address.map(str::to_owned)),
        );
        self
    }

    /// Adds a process that exits before its agent can be looked up.
    #[must_use]
    pub fn vanished(mut self, pid: u32, command_line: &str) -> Self {
        self.processes.push((pid, command_line.to_owned()));
        self.advertisements.insert(pid, Advertisement::Vanished);
        self
    }
}

impl ProcessDiscovery for StaticDiscovery {
    fn active_local_processes(&self) -> Vec<(u32, String)> {
        self.processes.clone()
    }

    fn advertised_management_address(&self, pid: u32) -> Result<Option<String>, DiscoveryError> {
        match self.advertisements.get(&pid) {
            Some(Advertisement::Address(address)) => Ok(address.clone()),
            Some(Advertisement::Vanished) | None => Err(DiscoveryError::NoSuchProcess { pid }),
        }
    }
}
