//! File loading, BOM sniffing and transcoding.
//!
//! The parser never touches the file system. This module reads a whole file
//! into one contiguous buffer, maps I/O failures onto the error taxonomy,
//! and turns UTF-16 input into UTF-8 bytes via `encoding_rs` before parsing.
//!
//! # Encoding Detection Strategy
//!
//! 1. Check for a Byte Order Mark (BOM) at the start of the input.
//! 2. A UTF-8 BOM is stripped; a UTF-16 BOM selects transcoding.
//! 3. Without a BOM the bytes are parsed as they are. There is no
//!    declaration sniffing since the XML declaration is not parsed.

use std::borrow::Cow;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{ErrorKind, ParseError};

/// An error that occurs during encoding detection or transcoding.
#[derive(Debug, Clone)]
pub struct EncodingError {
    /// A human-readable description of the encoding error.
    pub message: String,
}

impl EncodingError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "encoding error: {}", self.message)
    }
}

impl std::error::Error for EncodingError {}

impl From<EncodingError> for ParseError {
    fn from(err: EncodingError) -> Self {
        ParseError::new(ErrorKind::Parse, err.to_string())
    }
}

/// Reads the whole file at `path` into memory.
///
/// # Errors
///
/// - `BadFile` if the file cannot be opened, is not a regular file, or
///   fewer bytes than its size could be read.
/// - `EmptyFile` if the file has length zero.
/// - `MemoryAllocation` if a buffer of the file's size cannot be reserved.
pub fn read_file(path: &Path) -> Result<Vec<u8>, ParseError> {
    let bad_file = |err: std::io::Error| {
        ParseError::new(ErrorKind::BadFile, format!("{}: {err}", path.display()))
    };

    let mut file = File::open(path).map_err(bad_file)?;
    let metadata = file.metadata().map_err(bad_file)?;
    if !metadata.is_file() {
        return Err(ParseError::new(
            ErrorKind::BadFile,
            format!("{}: not a regular file", path.display()),
        ));
    }
    if metadata.len() == 0 {
        return Err(ParseError::new(
            ErrorKind::EmptyFile,
            format!("{}: file is empty", path.display()),
        ));
    }

    let len = usize::try_from(metadata.len()).map_err(|_| {
        ParseError::new(
            ErrorKind::MemoryAllocation,
            format!("{}: file too large to load", path.display()),
        )
    })?;
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|e| {
        ParseError::new(
            ErrorKind::MemoryAllocation,
            format!("{}: cannot allocate {len} bytes: {e}", path.display()),
        )
    })?;

    let read = (&mut file)
        .take(metadata.len())
        .read_to_end(&mut buf)
        .map_err(bad_file)?;
    if read != len {
        return Err(ParseError::new(
            ErrorKind::BadFile,
            format!("{}: short read ({read} of {len} bytes)", path.display()),
        ));
    }

    tracing::debug!(path = %path.display(), bytes = len, "read file");
    Ok(buf)
}

/// Detects the encoding of a byte stream by inspecting the Byte Order Mark.
///
/// Returns a tuple of (encoding name, number of BOM bytes to skip). The
/// encoding name is an IANA charset name suitable for passing to
/// `encoding_rs`.
///
/// - `EF BB BF` -> UTF-8
/// - `FE FF`    -> UTF-16 BE
/// - `FF FE`    -> UTF-16 LE
/// - No BOM     -> UTF-8
///
/// # Examples
///
/// ```
/// use xdoc::encoding::detect_encoding;
///
/// let (enc, skip) = detect_encoding(b"\xEF\xBB\xBF<a/>");
/// assert_eq!(enc, "UTF-8");
/// assert_eq!(skip, 3);
///
/// let (enc, skip) = detect_encoding(b"<a/>");
/// assert_eq!(enc, "UTF-8");
/// assert_eq!(skip, 0);
/// ```
#[must_use]
pub fn detect_encoding(bytes: &[u8]) -> (&'static str, usize) {
    if bytes.starts_with(b"\xEF\xBB\xBF") {
        ("UTF-8", 3)
    } else if bytes.starts_with(b"\xFE\xFF") {
        ("UTF-16BE", 2)
    } else if bytes.starts_with(b"\xFF\xFE") {
        ("UTF-16LE", 2)
    } else {
        ("UTF-8", 0)
    }
}

/// Transcodes a byte slice from the named encoding into a UTF-8 `String`.
///
/// # Errors
///
/// Returns `EncodingError` if the encoding name is not recognized or if
/// the input contains malformed byte sequences.
///
/// # Examples
///
/// ```
/// use xdoc::encoding::transcode;
///
/// let result = transcode(b"<\x00a\x00/\x00>\x00", "UTF-16LE").unwrap();
/// assert_eq!(result, "<a/>");
/// ```
pub fn transcode(bytes: &[u8], encoding_name: &str) -> Result<String, EncodingError> {
    let encoding = encoding_rs::Encoding::for_label(encoding_name.as_bytes())
        .ok_or_else(|| EncodingError::new(format!("unsupported encoding: {encoding_name}")))?;

    let (result, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        return Err(EncodingError::new(format!(
            "malformed byte sequence for encoding {encoding_name}"
        )));
    }
    Ok(result.into_owned())
}

/// Prepares raw file bytes for the parser.
///
/// A UTF-8 BOM is stripped (borrowing the input); UTF-16 input is
/// transcoded to UTF-8. Anything else is returned unchanged, and invalid
/// UTF-8 is left for the parser to report.
///
/// # Errors
///
/// Returns `EncodingError` if UTF-16 input is malformed.
pub fn decode_to_utf8(bytes: &[u8]) -> Result<Cow<'_, [u8]>, EncodingError> {
    let (encoding, skip) = detect_encoding(bytes);
    let content = &bytes[skip..];
    if encoding == "UTF-8" {
        return Ok(Cow::Borrowed(content));
    }
    let text = transcode(content, encoding)?;
    tracing::debug!(encoding, bytes = text.len(), "transcoded to UTF-8");
    Ok(Cow::Owned(text.into_bytes()))
}
