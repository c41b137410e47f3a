//! Program input and output.
//!
//! `display` writes one line to an [`OutputSink`]; `input` reads one line
//! from an [`InputSource`]. Hosts pick the implementation: [`StdIo`] for a
//! terminal, [`CapturedIo`] for tests and embedding.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Receives the lines a program displays.
pub trait OutputSink {
    fn write_line(&mut self, line: &str) -> io::Result<()>;
}

/// Supplies lines for `input`. `Ok(None)` means the input is exhausted.
pub trait InputSource {
    fn read_line(&mut self) -> io::Result<Option<String>>;
}

/// Both halves of a program's I/O.
pub trait Io: OutputSink + InputSource {}

impl<T: OutputSink + InputSource> Io for T {}

// ══════════════════════════════════════════════════════════════════════════════
// Standard streams
// ══════════════════════════════════════════════════════════════════════════════

/// Terminal I/O over stdin and stdout.
#[derive(Debug, Default)]
pub struct StdIo;

impl OutputSink for StdIo {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{line}")?;
        out.flush()
    }
}

impl InputSource for StdIo {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Captured streams
// ══════════════════════════════════════════════════════════════════════════════

/// In-memory I/O: queued input lines and a captured output buffer.
#[derive(Debug, Clone, Default)]
pub struct CapturedIo {
    input: VecDeque<String>,
    output: Vec<String>,
}

impl CapturedIo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the lines `input` will return, in order.
    pub fn with_input<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            input: lines.into_iter().map(Into::into).collect(),
            output: Vec::new(),
        }
    }

    /// Lines displayed so far.
    pub fn output(&self) -> &[String] {
        &self.output
    }

    /// Displayed lines joined with newlines.
    pub fn output_text(&self) -> String {
        self.output.join("\n")
    }
}

impl OutputSink for CapturedIo {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.output.push(line.to_string());
        Ok(())
    }
}

impl InputSource for CapturedIo {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        Ok(self.input.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captured_io_round() {
        let mut io = CapturedIo::with_input(["first", "second"]);
        assert_eq!(io.read_line().unwrap().as_deref(), Some("first"));
        io.write_line("hello").unwrap();
        io.write_line("world").unwrap();
        assert_eq!(io.read_line().unwrap().as_deref(), Some("second"));
        assert_eq!(io.read_line().unwrap(), None);
        assert_eq!(io.output(), ["hello", "world"]);
        assert_eq!(io.output_text(), "hello\nworld");
    }
}
