//! Command-line runtime for the `loglevel` tool.
//!
//! The module owns argument parsing, configuration bootstrapping, diagnostics
//! setup and rendering of the records produced by `loglevel-core`. It can be
//! driven from the binary entrypoint or from tests where the configuration
//! loader and IO streams are substituted.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use loglevel_core::{HttpConnector, PerfDataDiscovery};

mod cli;
mod command;
mod config;
mod errors;
mod execute;
mod output;
mod telemetry;

use cli::Cli;
use command::CommandInvocation;
use config::{ConfigArgumentSplit, split_config_arguments};
pub(crate) use config::{ConfigLoader, OrthoConfigLoader};
pub(crate) use errors::AppError;
use execute::{Collaborators, execute};

/// Tracing target for diagnostics emitted by the CLI.
pub(crate) const CLI_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::cli");

const HELP_ALIASES: &[&str] = &["-?", "-help"];
const OUTPUT_FLAG: &str = "--output";

/// Bundles the IO streams provided to the CLI runtime.
pub(crate) struct IoStreams<'a, W: Write, E: Write> {
    pub(crate) stdout: &'a mut W,
    pub(crate) stderr: &'a mut E,
}

impl<'a, W: Write, E: Write> IoStreams<'a, W, E> {
    pub(crate) fn new(stdout: &'a mut W, stderr: &'a mut E) -> Self {
        Self { stdout, stderr }
    }
}

struct CliRunner<'a, W: Write, E: Write, L: ConfigLoader> {
    io: &'a mut IoStreams<'a, W, E>,
    loader: &'a L,
}

impl<'a, W, E, L> CliRunner<'a, W, E, L>
where
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    fn new(io: &'a mut IoStreams<'a, W, E>, loader: &'a L) -> Self {
        Self { io, loader }
    }

    fn run<I>(&mut self, args: I) -> ExitCode
    where
        I: IntoIterator<Item = OsString>,
    {
        let args: Vec<OsString> = args.into_iter().collect();
        let split = split_config_arguments(&args);
        let cli_arguments = normalise_arguments(prepare_cli_arguments(&args, &split));

        let cli = match Cli::try_parse_from(cli_arguments) {
            Ok(cli) => cli,
            Err(error) if is_informational(error.kind()) => {
                return match write!(self.io.stdout, "{}", error.render()) {
                    Ok(()) => ExitCode::SUCCESS,
                    Err(_) => ExitCode::FAILURE,
                };
            }
            Err(error) => return self.fail(&AppError::CliUsage(error)),
        };

        match self.dispatch(cli, &split) {
            Ok(()) => ExitCode::SUCCESS,
            Err(error) => self.fail(&error),
        }
    }

    fn dispatch(&mut self, cli: Cli, split: &ConfigArgumentSplit) -> Result<(), AppError> {
        let output_format = cli.output;
        let invocation = CommandInvocation::try_from(cli.command)?;
        let config = self.loader.load(&split.config_arguments)?;
        telemetry::initialise(&config)?;

        let discovery = PerfDataDiscovery::new(
            config.perfdata_root().into_std_path_buf(),
            config.agent_marker(),
        );
        let connector = HttpConnector::new(config.connect_timeout());
        let collaborators = Collaborators {
            discovery: &discovery,
            connector: &connector,
        };
        let mut sink = output::sink_for(output_format, &mut *self.io.stdout);
        execute(invocation, &config, &collaborators, sink.as_mut())
    }

    fn fail(&mut self, error: &AppError) -> ExitCode {
        let _ = writeln!(self.io.stderr, "{error}");
        ExitCode::FAILURE
    }
}

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let mut io = IoStreams::new(stdout, stderr);
    run_with_loader(args, &mut io, &OrthoConfigLoader)
}

/// Runs the CLI with a custom configuration loader.
#[must_use]
pub(crate) fn run_with_loader<'a, I, W, E, L>(
    args: I,
    io: &'a mut IoStreams<'a, W, E>,
    loader: &'a L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    CliRunner::new(io, loader).run(args)
}

fn prepare_cli_arguments(args: &[OsString], split: &ConfigArgumentSplit) -> Vec<OsString> {
    let mut cli_arguments: Vec<OsString> = Vec::new();
    if let Some(first) = args.first() {
        cli_arguments.push(first.clone());
    }
    if split.command_start < args.len() {
        cli_arguments.extend(args[split.command_start..].iter().cloned());
    }
    cli_arguments
}

/// Maps the legacy help spellings onto `--help` and lower-cases the command
/// word. Tokens after the command word are left untouched.
fn normalise_arguments(mut arguments: Vec<OsString>) -> Vec<OsString> {
    let mut index = 1;
    while index < arguments.len() {
        let Some(token) = arguments[index].to_str() else {
            break;
        };
        if HELP_ALIASES.contains(&token) {
            arguments[index] = OsString::from("--help");
        } else if token == OUTPUT_FLAG {
            index += 1;
        } else if !token.starts_with('-') {
            let command = token.to_ascii_lowercase();
            arguments[index] = OsString::from(command);
            break;
        }
        index += 1;
    }
    arguments
}

const fn is_informational(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
    )
}
