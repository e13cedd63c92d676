//! Terminal output.
//!
//! Handles colored and plain output; verbose-only lines are dropped unless
//! verbose mode is on.

use std::io::{self, Stdout, Write};

/// Color of a console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Plain,
    Heading,
    Success,
    Warning,
    Error,
    Detail,
}

impl Style {
    fn ansi(self) -> Option<&'static str> {
        match self {
            Style::Plain => None,
            Style::Heading => Some("\x1b[0;34m"),
            Style::Success => Some("\x1b[0;32m"),
            Style::Warning => Some("\x1b[1;33m"),
            Style::Error => Some("\x1b[0;31m"),
            Style::Detail => Some("\x1b[0;36m"),
        }
    }
}

const RESET: &str = "\x1b[0m";

/// Output handler for the comparison run.
pub struct Console<W: Write = Stdout> {
    out: W,
    color: bool,
    verbose: bool,
}

impl Console<Stdout> {
    /// Console on stdout.
    pub fn stdout(color: bool, verbose: bool) -> Self {
        Self::new(io::stdout(), color, verbose)
    }
}

impl<W: Write> Console<W> {
    pub fn new(out: W, color: bool, verbose: bool) -> Self {
        Self { out, color, verbose }
    }

    /// Wrap `text` in the escape codes for `style` when color is enabled.
    pub fn paint(&self, style: Style, text: &str) -> String {
        match style.ansi() {
            Some(code) if self.color => format!("{code}{text}{RESET}"),
            _ => text.to_string(),
        }
    }

    /// Print a line in the given style.
    pub fn styled(&mut self, style: Style, msg: &str) {
        let line = self.paint(style, msg);
        let _ = writeln!(self.out, "{line}");
    }

    pub fn println(&mut self, msg: &str) {
        self.styled(Style::Plain, msg);
    }

    pub fn blank(&mut self) {
        self.println("");
    }

    pub fn heading(&mut self, msg: &str) {
        self.styled(Style::Heading, msg);
    }

    pub fn success(&mut self, msg: &str) {
        self.styled(Style::Success, msg);
    }

    pub fn warn(&mut self, msg: &str) {
        self.styled(Style::Warning, msg);
    }

    pub fn error(&mut self, msg: &str) {
        self.styled(Style::Error, msg);
    }

    /// Print only in verbose mode.
    pub fn detail(&mut self, msg: &str) {
        if self.verbose {
            self.styled(Style::Detail, msg);
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_console_has_no_escape_codes() {
        let mut console = Console::new(Vec::new(), false, false);
        console.success("✓ help: Identical");
        console.error("✗ managers: Missing in candidate run");

        let text = String::from_utf8(console.into_inner()).unwrap();
        assert_eq!(text, "✓ help: Identical\n✗ managers: Missing in candidate run\n");
    }

    #[test]
    fn colored_console_wraps_lines() {
        let mut console = Console::new(Vec::new(), true, false);
        console.warn("≠ version: Output differs");

        let text = String::from_utf8(console.into_inner()).unwrap();
        assert_eq!(text, "\x1b[1;33m≠ version: Output differs\x1b[0m\n");
    }

    #[test]
    fn detail_requires_verbose() {
        let mut quiet = Console::new(Vec::new(), false, false);
        quiet.detail("Running: plonk status");
        assert!(quiet.into_inner().is_empty());

        let mut verbose = Console::new(Vec::new(), false, true);
        verbose.detail("Running: plonk status");
        assert_eq!(verbose.into_inner(), b"Running: plonk status\n");
    }
}
