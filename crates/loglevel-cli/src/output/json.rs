//! JSON-lines output: one serialised record per line.

use std::io::{self, Write};

use loglevel_core::{LoggerRecord, RecordSink};

pub(crate) struct JsonLinesWriter<'a, W: Write> {
    out: &'a mut W,
}

impl<'a, W: Write> JsonLinesWriter<'a, W> {
    pub(crate) fn new(out: &'a mut W) -> Self {
        Self { out }
    }
}

impl<W: Write> RecordSink for JsonLinesWriter<'_, W> {
    fn emit(&mut self, record: LoggerRecord) -> io::Result<()> {
        serde_json::to_writer(&mut *self.out, &record)?;
        self.out.write_all(b"\n")
    }

    fn finish(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loglevel_core::{LevelValue, LoggerName, LoggerTypeTag};

    #[test]
    fn writes_one_object_per_line() {
        let mut buffer = Vec::new();
        let mut writer = JsonLinesWriter::new(&mut buffer);
        for level in ["INFO", "FINE"] {
            writer
                .emit(LoggerRecord::Level {
                    tag: LoggerTypeTag::Native,
                    logger: LoggerName::from_registry("a"),
                    level: LevelValue::Defined(level.to_owned()),
                })
                .expect("emit");
        }
        writer.finish().expect("finish");

        let text = String::from_utf8(buffer).expect("utf8");
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["level"], "FINE");
        assert_eq!(lines[0]["tag"], "native");
    }
}
