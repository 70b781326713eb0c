//! Error types for loading and parsing documents.
//!
//! Every failure carries an [`ErrorKind`] (what went wrong), a message, and
//! the [`SourceLocation`] of the byte where the first failing production
//! stopped. The parser never recovers: the first error aborts the whole
//! document and is returned unchanged to the caller.

use std::fmt;

/// The category of a load or parse failure.
///
/// The absence of an error ("no error") is represented by `Option::None`
/// wherever an outcome is recorded, e.g. [`Document::error`].
///
/// [`Document::error`]: crate::Document::error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A buffer for the file contents could not be allocated.
    MemoryAllocation,
    /// The file could not be opened or read completely.
    BadFile,
    /// The file exists but contains no bytes.
    EmptyFile,
    /// Input ended before a production was complete.
    IncompleteDocument,
    /// A lexical or structural rule was violated.
    Parse,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MemoryAllocation => write!(f, "memory allocation failed"),
            Self::BadFile => write!(f, "bad file"),
            Self::EmptyFile => write!(f, "empty file"),
            Self::IncompleteDocument => write!(f, "incomplete document"),
            Self::Parse => write!(f, "parse error"),
        }
    }
}

/// Source location within the input buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number (in bytes).
    pub column: u32,
    /// 0-based byte offset from the start of the input.
    pub byte_offset: usize,
}

impl SourceLocation {
    /// Computes the line and column of `offset` within `input`.
    ///
    /// Offsets past the end of `input` are clamped to its length.
    #[must_use]
    pub fn from_offset(input: &[u8], offset: usize) -> Self {
        let offset = offset.min(input.len());
        let before = &input[..offset];
        let line_start = before
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |p| p + 1);
        let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
        Self {
            line: u32::try_from(line).unwrap_or(u32::MAX),
            column: u32::try_from(offset - line_start + 1).unwrap_or(u32::MAX),
            byte_offset: offset,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The error type returned when loading or parsing fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// The failure category.
    pub kind: ErrorKind,
    /// Human-readable description of the failure.
    pub message: String,
    /// Where in the input the failure was detected. Loader errors that occur
    /// before any byte is scanned use the default location.
    pub location: SourceLocation,
}

impl ParseError {
    /// Creates an error with no meaningful source location.
    pub(crate) fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            location: SourceLocation::default(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ErrorKind::IncompleteDocument | ErrorKind::Parse => {
                write!(f, "{} at {}: {}", self.kind, self.location, self.message)
            }
            _ => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for ParseError {}
