//! Pattern-filtered bulk reads and writes across the selected registries.
//!
//! Every operation follows the same loop: build the [`RegistrySet`] for the
//! selector, then for each registry pick the matching loggers and act on
//! them. A registry that is not present in the target is skipped and the
//! loop moves on; other registry failures abort the operation. Per-logger
//! level rejections during `set` are reported as records instead.

use std::io;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::CORE_TARGET;
use crate::locator::ProcessLocator;
use crate::management::ManagementConnection;
use crate::record::{ChangeOutcome, LoggerRecord, RecordSink};
use crate::registry::{
    LevelChange, LoggerName, LoggerRegistry, LoggerTypeSelector, RegistryError, RegistryIds,
    RegistrySet,
};

const ROOT_PATTERN: &str = "root";

/// Errors that abort a dispatcher operation.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The name pattern is not a valid regular expression.
    #[error("invalid logger pattern {pattern:?}: {reason}")]
    Pattern { pattern: String, reason: String },
    /// A registry failed in a way that is not per-logger.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// The record sink could not accept output.
    #[error("failed to write output: {0}")]
    Sink(#[from] io::Error),
}

/// Which loggers an operation addresses.
#[derive(Debug, Clone)]
pub enum NamePattern {
    /// Only the root logger, looked up directly.
    Root,
    /// Every logger whose whole name matches.
    Matching(Regex),
}

impl NamePattern {
    /// Compiles an operator pattern. The literal `root` selects the root
    /// logger alone; anything else must match the entire logger name.
    pub fn compile(pattern: &str) -> Result<Self, DispatchError> {
        if pattern == ROOT_PATTERN {
            return Ok(Self::Root);
        }
        let invalid = |error: regex::Error| DispatchError::Pattern {
            pattern: pattern.to_owned(),
            reason: summarise_regex_error(&error),
        };
        // Validated on its own first: an unbalanced group would otherwise
        // close the anchoring group and escape the anchors.
        Regex::new(pattern).map_err(invalid)?;
        Regex::new(&format!("^(?:{pattern})$"))
            .map(Self::Matching)
            .map_err(invalid)
    }

    /// Returns true when `name` is selected.
    #[must_use]
    pub fn matches(&self, name: &LoggerName) -> bool {
        match self {
            Self::Root => name.is_root(),
            Self::Matching(regex) => regex.is_match(name.as_registry_str()),
        }
    }
}

/// Regex syntax errors render over several lines; keep the final reason.
fn summarise_regex_error(error: &regex::Error) -> String {
    let rendered = error.to_string();
    rendered
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.strip_prefix("error: ").unwrap_or(line).to_owned())
        .unwrap_or(rendered)
}

/// Runs the level operations against one connection.
#[derive(Debug, Clone)]
pub struct LevelOperationDispatcher {
    ids: RegistryIds,
}

impl LevelOperationDispatcher {
    /// Creates a dispatcher addressing registries by `ids`.
    #[must_use]
    pub fn new(ids: RegistryIds) -> Self {
        Self { ids }
    }

    /// Emits the explicit level of each matching logger.
    pub fn show_levels(
        &self,
        connection: &mut dyn ManagementConnection,
        selector: LoggerTypeSelector,
        pattern: &str,
        sink: &mut dyn RecordSink,
    ) -> Result<(), DispatchError> {
        let pattern = NamePattern::compile(pattern)?;
        self.for_each_registry(selector, |registry| {
            for logger in matching_loggers(registry, connection, &pattern)? {
                let level = registry.level(connection, &logger)?;
                sink.emit(LoggerRecord::Level {
                    tag: registry.tag(),
                    logger,
                    level,
                })?;
            }
            Ok(())
        })?;
        sink.finish()?;
        Ok(())
    }

    /// Emits the parent of each matching logger with the parent's level.
    pub fn show_parents(
        &self,
        connection: &mut dyn ManagementConnection,
        selector: LoggerTypeSelector,
        pattern: &str,
        sink: &mut dyn RecordSink,
    ) -> Result<(), DispatchError> {
        let pattern = NamePattern::compile(pattern)?;
        self.for_each_registry(selector, |registry| {
            for logger in matching_loggers(registry, connection, &pattern)? {
                let parent = registry.parent_name(connection, &logger)?;
                let parent_level = registry.level(connection, &parent)?;
                sink.emit(LoggerRecord::Parent {
                    tag: registry.tag(),
                    logger,
                    parent,
                    parent_level,
                })?;
            }
            Ok(())
        })?;
        sink.finish()?;
        Ok(())
    }

    /// Applies `change` to each matching logger, reporting the level before
    /// and the level re-read afterwards.
    pub fn set_levels(
        &self,
        connection: &mut dyn ManagementConnection,
        selector: LoggerTypeSelector,
        pattern: &str,
        change: &LevelChange,
        sink: &mut dyn RecordSink,
    ) -> Result<(), DispatchError> {
        let pattern = NamePattern::compile(pattern)?;
        self.for_each_registry(selector, |registry| {
            for logger in matching_loggers(registry, connection, &pattern)? {
                let before = registry.level(connection, &logger)?;
                let written = registry.set_level(connection, &logger, change);
                let after = registry.level(connection, &logger)?;
                let outcome = match written {
                    Ok(()) => {
                        debug!(
                            target: CORE_TARGET,
                            tag = %registry.tag(),
                            logger = %logger,
                            before = %before,
                            after = %after,
                            "level changed"
                        );
                        ChangeOutcome::Applied { after }
                    }
                    Err(RegistryError::LevelRejected { message, .. }) => {
                        warn!(
                            target: CORE_TARGET,
                            tag = %registry.tag(),
                            logger = %logger,
                            requested = %change,
                            reason = %message,
                            "level rejected"
                        );
                        ChangeOutcome::Rejected {
                            reason: message,
                            in_effect: after,
                        }
                    }
                    Err(other) => return Err(other.into()),
                };
                sink.emit(LoggerRecord::Change {
                    tag: registry.tag(),
                    logger,
                    before,
                    outcome,
                })?;
            }
            Ok(())
        })?;
        sink.finish()?;
        Ok(())
    }

    /// Emits one record per local process.
    pub fn list_jvms(
        &self,
        locator: &ProcessLocator<'_>,
        sink: &mut dyn RecordSink,
    ) -> Result<(), DispatchError> {
        for process in locator.list_processes() {
            sink.emit(LoggerRecord::Process(process))?;
        }
        sink.finish()?;
        Ok(())
    }

    fn for_each_registry<F>(
        &self,
        selector: LoggerTypeSelector,
        mut visit: F,
    ) -> Result<(), DispatchError>
    where
        F: FnMut(&LoggerRegistry) -> Result<(), DispatchError>,
    {
        for registry in RegistrySet::build(selector, &self.ids).iter() {
            match visit(registry) {
                Err(DispatchError::Registry(RegistryError::Absent { registry: id })) => {
                    debug!(
                        target: CORE_TARGET,
                        registry = %id,
                        tag = %registry.tag(),
                        "registry absent; skipping"
                    );
                }
                other => other?,
            }
        }
        Ok(())
    }
}

fn matching_loggers(
    registry: &LoggerRegistry,
    connection: &mut dyn ManagementConnection,
    pattern: &NamePattern,
) -> Result<Vec<LoggerName>, RegistryError> {
    if matches!(pattern, NamePattern::Root) {
        return Ok(vec![LoggerName::root()]);
    }
    Ok(registry
        .logger_names(connection)?
        .into_iter()
        .filter(|name| pattern.matches(name))
        .collect())
}
