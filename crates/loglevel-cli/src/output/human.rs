//! Line-oriented human output.

use std::io::{self, Write};

use loglevel_core::{ChangeOutcome, LoggerRecord, RecordSink};

const UNREACHABLE_MARKER: &str = "*";
const UNREACHABLE_LEGEND: &str = "* no management agent advertised";

pub(crate) struct HumanWriter<'a, W: Write> {
    out: &'a mut W,
    unreachable_listed: bool,
}

impl<'a, W: Write> HumanWriter<'a, W> {
    pub(crate) fn new(out: &'a mut W) -> Self {
        Self {
            out,
            unreachable_listed: false,
        }
    }
}

impl<W: Write> RecordSink for HumanWriter<'_, W> {
    fn emit(&mut self, record: LoggerRecord) -> io::Result<()> {
        match record {
            LoggerRecord::Level { tag, logger, level } => {
                writeln!(self.out, "{tag} {logger} : {level}")
            }
            LoggerRecord::Parent {
                tag,
                logger,
                parent,
                parent_level,
            } => writeln!(self.out, "{tag} {logger} : parent {parent} : {parent_level}"),
            LoggerRecord::Change {
                tag,
                logger,
                before,
                outcome,
            } => match outcome {
                ChangeOutcome::Applied { after } => {
                    writeln!(self.out, "{tag} {logger} : {before} -> {after}")
                }
                ChangeOutcome::Rejected { reason, in_effect } => writeln!(
                    self.out,
                    "{tag} {logger} : {before} -> rejected ({reason}), level remains {in_effect}"
                ),
            },
            LoggerRecord::Process(process) => {
                if process.reachable {
                    writeln!(self.out, "{} {}", process.pid, process.command_line)
                } else {
                    self.unreachable_listed = true;
                    writeln!(
                        self.out,
                        "{UNREACHABLE_MARKER} {} {}",
                        process.pid, process.command_line
                    )
                }
            }
        }
    }

    fn finish(&mut self) -> io::Result<()> {
        if self.unreachable_listed {
            writeln!(self.out, "{UNREACHABLE_LEGEND}")?;
        }
        self.out.flush()
    }
}
