//! Element parser.
//!
//! A hand-rolled recursive descent parser over one immutable byte buffer.
//! It accepts a single root element with attributes, nested elements,
//! comments and text, and builds a [`Document`]. The first error aborts the
//! parse; no partial tree is ever returned.
//!
//! Not supported: entity references (text is stored verbatim), CDATA
//! sections, namespaces, DTDs and processing instructions. The XML
//! declaration is not recognised either.

pub(crate) mod input;
mod xml;

use crate::error::ParseError;
use crate::tree::Document;

use input::DEFAULT_MAX_DEPTH;

/// Parse options controlling parser behavior.
///
/// Use the builder pattern to configure options:
///
/// ```
/// use xdoc::parser::ParseOptions;
///
/// let opts = ParseOptions::default()
///     .load_comments(true)
///     .max_depth(64);
/// ```
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// If true, comments become `Comment` nodes; otherwise they are skipped.
    pub load_comments: bool,
    /// Maximum element nesting depth (default: 256).
    pub max_depth: u32,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            load_comments: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParseOptions {
    /// Enables or disables keeping comments as nodes.
    #[must_use]
    pub fn load_comments(mut self, yes: bool) -> Self {
        self.load_comments = yes;
        self
    }

    /// Sets the maximum element nesting depth.
    #[must_use]
    pub fn max_depth(mut self, max: u32) -> Self {
        self.max_depth = max;
        self
    }
}

/// Parses a byte buffer with default options.
///
/// # Errors
///
/// Returns `ParseError` if the input is not a well-formed element.
pub fn parse_bytes(input: &[u8]) -> Result<Document, ParseError> {
    parse_bytes_with_options(input, &ParseOptions::default())
}

/// Parses a byte buffer with the given options.
///
/// # Errors
///
/// Returns `ParseError` with kind `IncompleteDocument` if the buffer ends
/// inside a production (including an empty buffer), or `Parse` if a rule is
/// violated.
pub fn parse_bytes_with_options(
    input: &[u8],
    options: &ParseOptions,
) -> Result<Document, ParseError> {
    let parser = xml::XmlParser::new(input, options);
    match parser.parse() {
        Ok(doc) => {
            tracing::debug!(
                bytes = input.len(),
                nodes = doc.node_count(),
                attributes = doc.attribute_count(),
                "parsed document"
            );
            Ok(doc)
        }
        Err(err) => {
            tracing::debug!(bytes = input.len(), error = %err, "parse failed");
            Err(err)
        }
    }
}

/// Parses a string with default options.
///
/// # Errors
///
/// Returns `ParseError` if the input is not a well-formed element.
pub fn parse_str(input: &str) -> Result<Document, ParseError> {
    parse_bytes(input.as_bytes())
}
