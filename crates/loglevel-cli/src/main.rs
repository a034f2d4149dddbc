//! CLI entrypoint for the `loglevel` tool.
//!
//! Delegates to [`loglevel_cli::run`], which loads configuration, parses the
//! command line and writes records for the addressed JVM to stdout.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    loglevel_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
