//! Access to one logging subsystem's management surface.
//!
//! Both subsystems expose the same surface (a `LoggerNames` attribute plus
//! level and parent operations) under different registry identifiers, so a
//! single [`LoggerRegistry`] parametrised by [`LoggerTypeTag`] and identifier
//! serves both.

mod set;

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

use crate::management::{ManagementConnection, ManagementError};

pub use set::{InvalidRegistryId, LoggerTypeSelector, RegistryIds, RegistrySet};

const LOGGER_NAMES: &str = "LoggerNames";
const GET_LEVEL: &str = "getLoggerLevel";
const SET_LEVEL: &str = "setLoggerLevel";
const GET_PARENT: &str = "getParentLoggerName";

const ROOT_DISPLAY: &str = "root";
const NOT_DEFINED: &str = "not defined";
const CLEAR_TOKEN: &str = "null";

/// Display tag distinguishing the logging subsystems in output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoggerTypeTag {
    /// The platform's own logging facility.
    Native,
    /// The secondary facility bridged onto the same management surface.
    Bridged,
}

impl LoggerTypeTag {
    /// Short label printed ahead of each record.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Native => "(J)",
            Self::Bridged => "(4)",
        }
    }
}

impl fmt::Display for LoggerTypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A logger name in registry form; the root logger is the empty name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct LoggerName(String);

impl LoggerName {
    /// The root logger.
    #[must_use]
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Wraps a name exactly as the registry reported it.
    #[must_use]
    pub fn from_registry(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Interprets a name typed by the operator, where `root` means the root
    /// logger.
    #[must_use]
    pub fn from_operator(name: &str) -> Self {
        if name == ROOT_DISPLAY {
            Self::root()
        } else {
            Self(name.to_owned())
        }
    }

    /// Returns true for the root logger.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The name as passed to the registry.
    #[must_use]
    pub fn as_registry_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LoggerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str(ROOT_DISPLAY)
        } else {
            f.write_str(&self.0)
        }
    }
}

impl Serialize for LoggerName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A logger's explicit level, or its absence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LevelValue {
    /// An explicitly assigned level.
    Defined(String),
    /// No explicit level; the logger inherits from its parent.
    NotDefined,
}

impl LevelValue {
    /// Normalises a registry response: `null` and blank strings are
    /// [`LevelValue::NotDefined`].
    #[must_use]
    pub fn from_registry(value: &Value) -> Self {
        match value.as_str().map(str::trim) {
            Some(level) if !level.is_empty() => Self::Defined(level.to_owned()),
            _ => Self::NotDefined,
        }
    }
}

impl fmt::Display for LevelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Defined(level) => f.write_str(level),
            Self::NotDefined => f.write_str(NOT_DEFINED),
        }
    }
}

/// A requested level change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelChange {
    /// Assign an explicit level.
    Set(String),
    /// Remove the explicit level so the logger inherits again.
    Clear,
}

impl LevelChange {
    /// Interprets the operator's level token; `null` clears.
    #[must_use]
    pub fn from_operator(token: &str) -> Self {
        if token == CLEAR_TOKEN {
            Self::Clear
        } else {
            Self::Set(token.to_owned())
        }
    }

    fn to_argument(&self) -> Value {
        match self {
            Self::Set(level) => Value::String(level.clone()),
            Self::Clear => Value::Null,
        }
    }
}

impl fmt::Display for LevelChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Set(level) => f.write_str(level),
            Self::Clear => f.write_str(CLEAR_TOKEN),
        }
    }
}

/// Failures of a registry primitive.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The subsystem is not present in the target.
    #[error("registry {registry} is not present in the target")]
    Absent { registry: String },
    /// The subsystem refused the requested level for one logger.
    #[error("level rejected for {logger}: {message}")]
    LevelRejected { logger: String, message: String },
    /// Any other failure talking to the registry.
    #[error("registry {registry} failed: {source}")]
    Failed {
        registry: String,
        #[source]
        source: ManagementError,
    },
}

/// Handle to one logging registry inside a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerRegistry {
    tag: LoggerTypeTag,
    registry_id: String,
}

impl LoggerRegistry {
    /// Creates a handle for the registry published under `registry_id`.
    #[must_use]
    pub fn new(tag: LoggerTypeTag, registry_id: impl Into<String>) -> Self {
        Self {
            tag,
            registry_id: registry_id.into(),
        }
    }

    /// Display tag of this registry.
    #[must_use]
    pub const fn tag(&self) -> LoggerTypeTag {
        self.tag
    }

    /// Identifier the registry is published under.
    #[must_use]
    pub fn registry_id(&self) -> &str {
        &self.registry_id
    }

    /// Lists every logger the registry knows, in its own order.
    pub fn logger_names(
        &self,
        connection: &mut dyn ManagementConnection,
    ) -> Result<Vec<LoggerName>, RegistryError> {
        let value = connection
            .get_attribute(&self.registry_id, LOGGER_NAMES)
            .map_err(|error| self.classify(error))?;
        let Value::Array(names) = value else {
            return Err(self.malformed(LOGGER_NAMES, &value));
        };
        names
            .into_iter()
            .map(|name| match name {
                Value::String(name) => Ok(LoggerName::from_registry(name)),
                other => Err(self.malformed(LOGGER_NAMES, &other)),
            })
            .collect()
    }

    /// Reads the explicit level of `logger`.
    pub fn level(
        &self,
        connection: &mut dyn ManagementConnection,
        logger: &LoggerName,
    ) -> Result<LevelValue, RegistryError> {
        let value = connection
            .invoke(&self.registry_id, GET_LEVEL, &[name_argument(logger)])
            .map_err(|error| self.classify(error))?;
        Ok(LevelValue::from_registry(&value))
    }

    /// Reads the name of `logger`'s parent; the root logger is returned as
    /// [`LoggerName::root`].
    pub fn parent_name(
        &self,
        connection: &mut dyn ManagementConnection,
        logger: &LoggerName,
    ) -> Result<LoggerName, RegistryError> {
        let value = connection
            .invoke(&self.registry_id, GET_PARENT, &[name_argument(logger)])
            .map_err(|error| self.classify(error))?;
        match value {
            Value::String(parent) => Ok(LoggerName::from_registry(parent)),
            Value::Null => Ok(LoggerName::root()),
            other => Err(self.malformed(GET_PARENT, &other)),
        }
    }

    /// Applies `change` to `logger`.
    ///
    /// A level the subsystem does not accept is reported as
    /// [`RegistryError::LevelRejected`].
    pub fn set_level(
        &self,
        connection: &mut dyn ManagementConnection,
        logger: &LoggerName,
        change: &LevelChange,
    ) -> Result<(), RegistryError> {
        connection
            .invoke(
                &self.registry_id,
                SET_LEVEL,
                &[name_argument(logger), change.to_argument()],
            )
            .map(drop)
            .map_err(|error| match error {
                ManagementError::Rejected { message } => RegistryError::LevelRejected {
                    logger: logger.to_string(),
                    message,
                },
                other => self.classify(other),
            })
    }

    fn classify(&self, error: ManagementError) -> RegistryError {
        match error {
            ManagementError::RegistryMissing { .. } => RegistryError::Absent {
                registry: self.registry_id.clone(),
            },
            source => RegistryError::Failed {
                registry: self.registry_id.clone(),
                source,
            },
        }
    }

    fn malformed(&self, what: &str, value: &Value) -> RegistryError {
        RegistryError::Failed {
            registry: self.registry_id.clone(),
            source: ManagementError::Protocol {
                message: format!("unexpected {what} value {value}"),
            },
        }
    }
}

fn name_argument(logger: &LoggerName) -> Value {
    Value::String(logger.as_registry_str().to_owned())
}
