//! Bridge from the managed node's free-text diagnostic stream into the
//! harness's structured reporting channels.

use std::io::{Result as IoResult, Write};

use eyre::eyre;
use meshtest_primitives::report::Reporter;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Severity {
    Info,
    Error,
    Fatal,
}

/// Classifies one trimmed diagnostic line by substring match. Pure; the
/// caller decides which reporting channel each severity lands on.
pub fn classify(line: &str) -> Severity {
    let line = line.trim();
    if line.contains("[ERROR]") {
        Severity::Error
    } else if line.contains("[FATAL]") {
        Severity::Fatal
    } else {
        Severity::Info
    }
}

/// `io::Write` adapter handed to the node as its diagnostic sink. Lines are
/// reassembled across writes, classified, and routed: Info becomes an
/// informational event, Error a non-fatal failure, Fatal a crash. Nothing is
/// retained beyond immediate reporting.
#[derive(Debug)]
pub struct ClassifyingWriter {
    reporter: Reporter,
    buffer: Vec<u8>,
}

impl ClassifyingWriter {
    pub fn new(reporter: Reporter) -> Self {
        Self {
            reporter,
            buffer: Vec::new(),
        }
    }

    fn dispatch(&self, raw: &[u8]) {
        let line = String::from_utf8_lossy(raw);
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            return;
        }

        match classify(line) {
            Severity::Info => self.reporter.record_message(line),
            Severity::Error => self.reporter.record_failure(eyre!("{line}")),
            Severity::Fatal => self.reporter.record_crash(eyre!("{line}")),
        }
    }
}

impl Write for ClassifyingWriter {
    fn write(&mut self, buf: &[u8]) -> IoResult<usize> {
        self.buffer.extend_from_slice(buf);

        while let Some(newline) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            self.dispatch(&line);
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}

impl Drop for ClassifyingWriter {
    fn drop(&mut self) {
        if !self.buffer.is_empty() {
            let rest = core::mem::take(&mut self.buffer);
            self.dispatch(&rest);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_follows_the_substring_table() {
        assert_eq!(classify("2024/01/01 [INFO] joined"), Severity::Info);
        assert_eq!(classify("  [ERROR] partition detected  "), Severity::Error);
        assert_eq!(classify("[FATAL] cannot bind"), Severity::Fatal);
        assert_eq!(classify("plain chatter"), Severity::Info);
    }

    #[test]
    fn lines_route_to_the_matching_channel() {
        let reporter = Reporter::new();
        let mut writer = ClassifyingWriter::new(reporter.clone());

        writeln!(writer, "[INFO] node up").unwrap();
        writeln!(writer, "[ERROR] checksum mismatch").unwrap();
        writeln!(writer, "[FATAL] out of memory").unwrap();

        assert_eq!(reporter.messages(), vec!["[INFO] node up".to_owned()]);
        assert_eq!(reporter.failures(), vec!["[ERROR] checksum mismatch".to_owned()]);
        assert_eq!(reporter.crash().as_deref(), Some("[FATAL] out of memory"));
    }

    #[test]
    fn partial_lines_are_reassembled_across_writes() {
        let reporter = Reporter::new();
        let mut writer = ClassifyingWriter::new(reporter.clone());

        writer.write_all(b"[ERROR] split ").unwrap();
        writer.write_all(b"across writes\nnext").unwrap();

        assert_eq!(
            reporter.failures(),
            vec!["[ERROR] split across writes".to_owned()],
            "the split line must arrive as one failure"
        );
        assert!(
            reporter.messages().is_empty(),
            "the trailing partial line must stay buffered"
        );

        drop(writer);
        assert_eq!(
            reporter.messages(),
            vec!["next".to_owned()],
            "dropping the writer flushes the remainder"
        );
    }

    #[test]
    fn blank_lines_are_ignored() {
        let reporter = Reporter::new();
        let mut writer = ClassifyingWriter::new(reporter.clone());

        writer.write_all(b"\n\r\n\n").unwrap();

        assert!(reporter.messages().is_empty(), "blank lines carry no event");
        assert!(reporter.outcome().is_ok(), "blank lines must not fail a run");
    }
}
