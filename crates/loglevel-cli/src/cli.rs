//! CLI argument definitions for `loglevel`.
//!
//! Shared by the runtime parser and the build script that renders the manual
//! page, so this module depends on nothing but `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// How records are written to stdout.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// One line per record.
    #[default]
    Human,
    /// One JSON object per record per line.
    Json,
}

/// Inspect and change logger levels of running JVMs without restarting them.
#[derive(Parser, Debug)]
#[command(
    name = "loglevel",
    version,
    disable_help_subcommand = true,
    arg_required_else_help = true,
    after_help = "Logger types: j or J selects the native facility, 4 the bridged one; \
                  omit to address both.\nThe pattern must match whole logger names; \
                  `root` selects the root logger.\nThe level `null` clears an explicit level."
)]
pub(crate) struct Cli {
    /// Controls how records are rendered.
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub(crate) output: OutputFormat,
    /// The operation to perform.
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

/// Operations offered by the tool.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub(crate) enum CliCommand {
    /// Lists local JVMs; `*` marks those without a management agent.
    #[command(visible_alias = "j")]
    Jobs,
    /// Shows the explicit level of every matching logger.
    #[command(visible_alias = "l")]
    List {
        /// Target process id.
        #[arg(value_name = "PID")]
        pid: String,
        /// Optional logger type followed by the name pattern.
        #[arg(
            value_name = "[TYPE] PATTERN",
            num_args = 1..=2,
            required = true,
            allow_hyphen_values = true
        )]
        arguments: Vec<String>,
    },
    /// Shows the parent of every matching logger and the parent's level.
    #[command(visible_alias = "p")]
    Parent {
        /// Target process id.
        #[arg(value_name = "PID")]
        pid: String,
        /// Optional logger type followed by the name pattern.
        #[arg(
            value_name = "[TYPE] PATTERN",
            num_args = 1..=2,
            required = true,
            allow_hyphen_values = true
        )]
        arguments: Vec<String>,
    },
    /// Sets the level of every matching logger.
    #[command(visible_alias = "s")]
    Set {
        /// Target process id.
        #[arg(value_name = "PID")]
        pid: String,
        /// Optional logger type, the name pattern, then the level.
        #[arg(
            value_name = "[TYPE] PATTERN LEVEL",
            num_args = 2..=3,
            required = true,
            allow_hyphen_values = true
        )]
        arguments: Vec<String>,
    },
}
