//! Rendering of command records on stdout.
//!
//! Both writers implement [`RecordSink`], so the dispatcher streams records
//! into them as they are produced.

mod human;
mod json;

use std::io::Write;

use loglevel_core::RecordSink;

pub(crate) use crate::cli::OutputFormat;
pub(crate) use human::HumanWriter;
pub(crate) use json::JsonLinesWriter;

/// Builds the sink for `format` over `out`.
pub(crate) fn sink_for<'a, W: Write>(
    format: OutputFormat,
    out: &'a mut W,
) -> Box<dyn RecordSink + 'a> {
    match format {
        OutputFormat::Human => Box::new(HumanWriter::new(out)),
        OutputFormat::Json => Box::new(JsonLinesWriter::new(out)),
    }
}
