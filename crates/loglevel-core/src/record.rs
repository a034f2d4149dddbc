//! Records streamed from the dispatcher to a renderer.

use std::io;

use serde::Serialize;

use crate::locator::ProcessDescriptor;
use crate::registry::{LevelValue, LoggerName, LoggerTypeTag};

/// One line of command output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoggerRecord {
    /// A logger and its explicit level.
    Level {
        tag: LoggerTypeTag,
        logger: LoggerName,
        level: LevelValue,
    },
    /// A logger, its parent and the parent's explicit level.
    Parent {
        tag: LoggerTypeTag,
        logger: LoggerName,
        parent: LoggerName,
        parent_level: LevelValue,
    },
    /// The result of changing one logger's level.
    Change {
        tag: LoggerTypeTag,
        logger: LoggerName,
        before: LevelValue,
        outcome: ChangeOutcome,
    },
    /// A local process.
    Process(ProcessDescriptor),
}

/// What a level change left behind, as re-read from the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ChangeOutcome {
    /// The registry accepted the change.
    Applied { after: LevelValue },
    /// The registry refused the level; `in_effect` is what remains.
    Rejected { reason: String, in_effect: LevelValue },
}

/// Consumer of records, typically a terminal renderer.
pub trait RecordSink {
    /// Accepts the next record.
    fn emit(&mut self, record: LoggerRecord) -> io::Result<()>;

    /// Called once after the last record of a command.
    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl RecordSink for Vec<LoggerRecord> {
    fn emit(&mut self, record: LoggerRecord) -> io::Result<()> {
        self.push(record);
        Ok(())
    }
}
