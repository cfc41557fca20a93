//! The single error type carried by every fallible path in the engine

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

/// Numeric error codes, kept stable so hosts can dispatch on them.
pub mod codes {
    pub const UNTERMINATED_KEYWORD: u16 = 1;
    pub const UNTERMINATED_FUNCTION: u16 = 2;
    pub const UNFINISHED_ENCLOSED: u16 = 4;
    pub const UNTERMINATED_CLOSE: u16 = 5;
    pub const UNMATCHING_CLOSE: u16 = 6;
    pub const UNCLOSED_CONSTRUCT: u16 = 7;
    pub const UNDEFINED_FUNCTION: u16 = 8;
    pub const AUTOCLOSED_BUILTIN: u16 = 10;
    pub const UNKNOWN_BUILTIN: u16 = 11;
    pub const MISSING_COLLECTION_VAR: u16 = 21;
    pub const UNKNOWN_COLLECTION: u16 = 22;
    pub const BAD_LOOP_COUNT: u16 = 23;
    pub const MISSING_FUNCTION_NAME: u16 = 24;
    pub const EMPTY_CONDITION_RHS: u16 = 25;
    pub const UNKNOWN_OPERATOR: u16 = 26;
    pub const DEPTH_EXCEEDED: u16 = 27;
    pub const RESOURCE_NOT_FOUND: u16 = 30;
}

/// Which family of failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed markup: unterminated tags, mismatched close tags, unfinished
    /// quoted arguments, constructs left open at end of input.
    Syntax,
    /// Well-formed markup that cannot be executed: undefined functions,
    /// unknown builtins or operators, missing or malformed arguments.
    Semantic,
    /// Template, layout or block bytes could not be loaded.
    Resource,
}

/// Line/column snapshot taken when position tracking is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// 1-based line number.
    pub line: u64,
    /// 1-based column within the line.
    pub column: u64,
    /// Byte offset into the source buffer.
    pub offset: usize,
}

/// Error value propagated strictly upward through the render recursion.
///
/// A render call either completes fully or fails with one of these; there is
/// no local recovery and no partial output.
#[derive(Error, Debug, Clone)]
#[error("{} error {}: {}{}", kind_name(.kind), .code, .message, position_suffix(.position))]
pub struct EngineError {
    kind: ErrorKind,
    code: u16,
    message: String,
    position: Option<Position>,
}

impl EngineError {
    pub fn syntax(code: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, code, message)
    }

    pub fn semantic(code: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Semantic, code, message)
    }

    pub fn resource(code: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Resource, code, message)
    }

    fn new(kind: ErrorKind, code: u16, message: impl Into<String>) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
            position: None,
        }
    }

    /// Attach a position snapshot (a no-op when tracking is off).
    pub fn at(mut self, position: Option<Position>) -> Self {
        self.position = position;
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn position(&self) -> Option<Position> {
        self.position
    }

    /// Format the error with source context using ariadne.
    ///
    /// Falls back to the plain `Display` text when no position snapshot is
    /// available (position tracking off) or the snapshot does not fit the
    /// given source.
    pub fn format(&self, source: &str, filename: &str) -> String {
        let Some(position) = self.position else {
            return format!("Error: {self}");
        };
        if source.is_empty() || position.offset >= source.len() {
            return format!("Error: {self}");
        }
        let mut end = position.offset + 1;
        while end < source.len() && !source.is_char_boundary(end) {
            end += 1;
        }
        let span = position.offset..end;

        let mut buf = Vec::new();
        let written = Report::build(ReportKind::Error, filename, span.start)
            .with_message(&self.message)
            .with_label(
                Label::new((filename, span))
                    .with_message(format!("{} error {}", kind_name(&self.kind), self.code))
                    .with_color(Color::Red),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);
        if written.is_err() {
            return format!("Error: {self}");
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}

fn kind_name(kind: &ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Syntax => "syntax",
        ErrorKind::Semantic => "semantic",
        ErrorKind::Resource => "resource",
    }
}

fn position_suffix(position: &Option<Position>) -> String {
    match position {
        Some(p) => format!(" on line {}:{}", p.line, p.column),
        None => String::new(),
    }
}
