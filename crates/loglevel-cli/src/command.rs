//! Command modelling for parsed CLI arguments.
//!
//! Turns the loosely shaped positional arguments accepted by clap into typed
//! invocations: a numeric pid, an optional logger type, the pattern and, for
//! `set`, the level change.

use loglevel_core::{LevelChange, LoggerTypeSelector};

use crate::AppError;
use crate::cli::CliCommand;

/// Addressing shared by the logger commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LoggerQuery {
    pub(crate) pid: u32,
    pub(crate) selector: LoggerTypeSelector,
    pub(crate) pattern: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CommandInvocation {
    Jobs,
    List(LoggerQuery),
    Parent(LoggerQuery),
    Set {
        query: LoggerQuery,
        change: LevelChange,
    },
}

impl CommandInvocation {
    /// Short name used in diagnostics.
    pub(crate) const fn name(&self) -> &'static str {
        match self {
            Self::Jobs => "jobs",
            Self::List(_) => "list",
            Self::Parent(_) => "parent",
            Self::Set { .. } => "set",
        }
    }
}

impl TryFrom<CliCommand> for CommandInvocation {
    type Error = AppError;

    fn try_from(command: CliCommand) -> Result<Self, Self::Error> {
        match command {
            CliCommand::Jobs => Ok(Self::Jobs),
            CliCommand::List { pid, arguments } => {
                let (query, _) = LoggerQuery::parse(&pid, &arguments, 1)?;
                Ok(Self::List(query))
            }
            CliCommand::Parent { pid, arguments } => {
                let (query, _) = LoggerQuery::parse(&pid, &arguments, 1)?;
                Ok(Self::Parent(query))
            }
            CliCommand::Set { pid, arguments } => {
                let (query, rest) = LoggerQuery::parse(&pid, &arguments, 2)?;
                let level = rest.last().ok_or(AppError::MissingLevel)?;
                Ok(Self::Set {
                    query,
                    change: LevelChange::from_operator(level),
                })
            }
        }
    }
}

impl LoggerQuery {
    /// Parses `pid` and `arguments`, where `required` is the argument count
    /// without a logger type. Returns the query and the arguments after the
    /// pattern.
    fn parse<'a>(
        pid: &str,
        arguments: &'a [String],
        required: usize,
    ) -> Result<(Self, &'a [String]), AppError> {
        let pid = parse_pid(pid)?;
        let (selector, remaining) = match arguments {
            [token, rest @ ..] if rest.len() >= required => {
                let selector = LoggerTypeSelector::from_token(token).ok_or_else(|| {
                    AppError::InvalidLoggerType {
                        token: token.clone(),
                    }
                })?;
                (selector, rest)
            }
            all => (LoggerTypeSelector::Unspecified, all),
        };
        let (pattern, rest) = remaining.split_first().ok_or(AppError::MissingPattern)?;
        Ok((
            Self {
                pid,
                selector,
                pattern: pattern.clone(),
            },
            rest,
        ))
    }
}

fn parse_pid(argument: &str) -> Result<u32, AppError> {
    argument
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|pid| *pid > 0)
        .ok_or_else(|| AppError::InvalidPid {
            argument: argument.to_owned(),
        })
}
