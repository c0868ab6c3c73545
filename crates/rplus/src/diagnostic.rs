//! Rich diagnostic error messages, in the style of a compiler's own
//! diagnostics: a source snippet, a caret underline, notes and help.
//!
//! Tokens and AST nodes carry 1-based `(line, column)` rather than byte
//! offsets, so spans here are positions, not ranges — an underline always
//! covers one reported point plus an optional width.

use std::fmt;

/// A position in the source: 1-based line and column, matching
/// `ast::Pos`/`Token`'s own coordinates rather than a byte span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub column: usize,
    pub width: usize,
}

impl Span {
    pub fn new(line: usize, column: usize) -> Self {
        Self {
            line,
            column,
            width: 1,
        }
    }

    pub fn with_width(line: usize, column: usize, width: usize) -> Self {
        Self {
            line,
            column,
            width: width.max(1),
        }
    }
}

/// A label attached to a span with a message.
#[derive(Debug, Clone)]
pub struct Label {
    pub span: Span,
    pub message: String,
    pub is_primary: bool,
}

impl Label {
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            is_primary: true,
        }
    }

    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            is_primary: false,
        }
    }
}

/// A rich diagnostic error with source context.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub message: String,
    pub source: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
    pub help: Vec<String>,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: String::new(),
            labels: Vec::new(),
            notes: Vec::new(),
            help: Vec::new(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::primary(span, message));
        self
    }

    pub fn with_secondary_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::secondary(span, message));
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help.push(help.into());
        self
    }

    /// Build a diagnostic straight from an `Error`: a parse/compile error
    /// underlines its line with no column detail (the AST/token line is
    /// all the error carries); a runtime error has no source line at all,
    /// since it is reported against a PC, not a position.
    pub fn from_error(err: &crate::error::Error, source: &str) -> Self {
        let diag = Diagnostic::new(err.to_string()).with_source(source);
        match err.line() {
            Some(line) => diag.with_label(Span::new(line, 1), "here"),
            None => diag,
        }
    }

    fn get_line(&self, line_num: usize) -> &str {
        self.source.lines().nth(line_num - 1).unwrap_or("")
    }

    fn line_number_width(&self) -> usize {
        let max_line = self.source.lines().count();
        max_line.to_string().len().max(1)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error: {}", self.message)?;

        if self.source.is_empty() || self.labels.is_empty() {
            for note in &self.notes {
                writeln!(f, "  = note: {}", note)?;
            }
            for help in &self.help {
                writeln!(f, "  = help: {}", help)?;
            }
            return Ok(());
        }

        let width = self.line_number_width();

        let mut labels_by_line: std::collections::BTreeMap<usize, Vec<&Label>> =
            std::collections::BTreeMap::new();
        for label in &self.labels {
            labels_by_line.entry(label.span.line).or_default().push(label);
        }

        writeln!(f, "{:width$} |", "", width = width)?;

        for (&line_num, labels) in &labels_by_line {
            let line_content = self.get_line(line_num);
            writeln!(f, "{:width$} | {}", line_num, line_content, width = width)?;

            for label in labels {
                let underline_start = label.span.column.saturating_sub(1);
                let underline_char = if label.is_primary { '^' } else { '-' };

                write!(f, "{:width$} | ", "", width = width)?;
                write!(f, "{:underline_start$}", "")?;
                for _ in 0..label.span.width {
                    write!(f, "{}", underline_char)?;
                }
                if !label.message.is_empty() {
                    write!(f, " {}", label.message)?;
                }
                writeln!(f)?;
            }
        }

        writeln!(f, "{:width$} |", "", width = width)?;

        for note in &self.notes {
            writeln!(f, "  = note: {}", note)?;
        }
        for help in &self.help {
            writeln!(f, "  = help: {}", help)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn simple_diagnostic_renders_caret_and_notes() {
        let diag = Diagnostic::new("type mismatch")
            .with_source("x = 1 + \"a\"")
            .with_label(Span::with_width(1, 5, 5), "expected number, found string")
            .with_note("+ requires matching operand types")
            .with_help("convert one side to match the other");

        let output = diag.to_string();
        assert!(output.contains("error: type mismatch"));
        assert!(output.contains("x = 1 + \"a\""));
        assert!(output.contains("^^^^^"));
        assert!(output.contains("note:"));
        assert!(output.contains("help:"));
    }

    #[test]
    fn from_error_uses_the_line_for_parse_and_compile_errors() {
        let err = Error::parse("Invalid assignment target", 3);
        let diag = Diagnostic::from_error(&err, "a\nb\n1 = 2\n");
        let output = diag.to_string();
        assert!(output.contains("1 = 2"));
    }

    #[test]
    fn from_error_has_no_label_for_runtime_errors() {
        let err = Error::runtime("Division by zero", 12);
        let diag = Diagnostic::from_error(&err, "1/0;");
        assert!(diag.labels.is_empty());
    }
}
