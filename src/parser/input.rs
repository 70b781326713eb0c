//! Low-level input handling for the XML parser.
//!
//! [`ParserInput`] owns the cursor over the raw byte buffer and the lexical
//! primitives the productions in [`super::xml`] are built from: peeking,
//! advancing, literal matching, whitespace skipping, Name scanning with
//! UTF-8 decoding, and quoted values.
//!
//! Every primitive distinguishes two failure modes. Running off the end of
//! the buffer is [`ErrorKind::IncompleteDocument`]; any other violated rule
//! is [`ErrorKind::Parse`]. Errors carry the location of the cursor at the
//! moment the rule failed.

use crate::error::{ErrorKind, ParseError, SourceLocation};

/// Default maximum element nesting depth.
pub(crate) const DEFAULT_MAX_DEPTH: u32 = 256;

// -------------------------------------------------------------------------
// XML Name character classes (XML 1.0 §2.3)
// -------------------------------------------------------------------------

/// Returns `true` if `c` is a valid `NameStartChar` per XML 1.0 §2.3 `[4]`.
pub(crate) fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z' |
        '\u{C0}'..='\u{D6}' | '\u{D8}'..='\u{F6}' | '\u{F8}'..='\u{2FF}' |
        '\u{370}'..='\u{37D}' | '\u{37F}'..='\u{1FFF}' |
        '\u{200C}'..='\u{200D}' | '\u{2070}'..='\u{218F}' |
        '\u{2C00}'..='\u{2FEF}' | '\u{3001}'..='\u{D7FF}' |
        '\u{F900}'..='\u{FDCF}' | '\u{FDF0}'..='\u{FFFD}' |
        '\u{10000}'..='\u{EFFFF}'
    )
}

/// Returns `true` if `c` is a valid `NameChar` per XML 1.0 §2.3 `[4a]`.
pub(crate) fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}' |
            '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}'
        )
}

/// `S ::= (#x20 | #x9 | #xD | #xA)+`
pub(crate) fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

// -------------------------------------------------------------------------
// ParserInput
// -------------------------------------------------------------------------

/// Cursor state over one immutable input buffer.
pub(crate) struct ParserInput<'a> {
    /// The input bytes.
    input: &'a [u8],

    /// Current byte offset in `input`.
    pos: usize,

    /// Current element nesting depth.
    depth: u32,

    /// Maximum allowed nesting depth.
    max_depth: u32,
}

impl<'a> ParserInput<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Sets the maximum nesting depth.
    pub fn set_max_depth(&mut self, max: u32) {
        self.max_depth = max;
    }

    // -- Depth tracking --

    /// Increments the nesting depth. Returns an error if the limit is exceeded.
    pub fn increment_depth(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(self.fatal(format!(
                "maximum nesting depth exceeded ({})",
                self.max_depth
            )));
        }
        Ok(())
    }

    /// Decrements the nesting depth (saturating at 0).
    pub fn decrement_depth(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    // -- Position queries --

    /// Returns the current source location.
    pub fn location(&self) -> SourceLocation {
        SourceLocation::from_offset(self.input, self.pos)
    }

    /// Returns `true` if all input has been consumed.
    pub fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Returns the current byte offset.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Returns the raw input bytes from `start` to `end`.
    pub fn slice(&self, start: usize, end: usize) -> &'a [u8] {
        &self.input[start..end]
    }

    // -- Peek / advance --

    /// Returns the byte at the current position without consuming it.
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Advances the position by `count` bytes, stopping at the end.
    pub fn advance(&mut self, count: usize) {
        self.pos = (self.pos + count).min(self.input.len());
    }

    /// Returns `true` if the remaining input starts with `s`.
    pub fn looking_at(&self, s: &[u8]) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    /// Returns true if the remaining input is a strict prefix of `s`, i.e.
    /// the buffer ends part way through the literal.
    pub fn looking_at_truncated(&self, s: &[u8]) -> bool {
        let rest = &self.input[self.pos.min(self.input.len())..];
        rest.len() < s.len() && s.starts_with(rest)
    }

    /// Consumes the next byte and checks it is `expected`.
    pub fn expect_byte(&mut self, expected: u8) -> Result<(), ParseError> {
        match self.peek() {
            None => Err(self.incomplete(format!(
                "expected '{}', found end of input",
                expected as char
            ))),
            Some(b) if b == expected => {
                self.advance(1);
                Ok(())
            }
            Some(b) => Err(self.fatal(format!(
                "expected '{}', found '{}'",
                expected as char,
                b.escape_ascii()
            ))),
        }
    }

    /// Skips whitespace. Returns `true` if any was consumed.
    pub fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    /// Returns the offset of the next occurrence of `needle` at or after the
    /// cursor, without moving.
    pub fn find(&self, needle: &[u8]) -> Option<usize> {
        self.input[self.pos..]
            .windows(needle.len())
            .position(|window| window == needle)
            .map(|offset| self.pos + offset)
    }

    /// Returns the offset of the next `byte` at or after the cursor.
    pub fn find_byte(&self, byte: u8) -> Option<usize> {
        self.input[self.pos..]
            .iter()
            .position(|&b| b == byte)
            .map(|offset| self.pos + offset)
    }

    // -- UTF-8 --

    /// Decodes the code point starting at the cursor without consuming it.
    ///
    /// Returns the character and its encoded length. Overlong forms,
    /// surrogates and bad continuation bytes are parse errors; a sequence
    /// cut off by the end of the buffer is an incomplete document.
    pub fn peek_char(&self) -> Result<(char, usize), ParseError> {
        let end = (self.pos + 4).min(self.input.len());
        let window = &self.input[self.pos..end];
        let valid = match std::str::from_utf8(window) {
            Ok(s) => s,
            Err(e) if e.valid_up_to() > 0 => {
                // The first character decoded; a later one in the window did not.
                std::str::from_utf8(&window[..e.valid_up_to()]).unwrap_or_default()
            }
            Err(e) if e.error_len().is_none() => {
                return Err(self.incomplete("truncated UTF-8 sequence"));
            }
            Err(_) => {
                return Err(self.fatal(format!(
                    "invalid UTF-8 sequence starting with byte 0x{:02X}",
                    window.first().copied().unwrap_or_default()
                )));
            }
        };
        match valid.chars().next() {
            Some(c) => Ok((c, c.len_utf8())),
            None => Err(self.incomplete("unexpected end of input")),
        }
    }

    // -- Name parsing (XML 1.0 §2.3) --

    /// Parses a `Name`: one `NameStartChar` followed by any number of
    /// `NameChar`s. Returns the byte range of the name.
    ///
    /// ASCII bytes are classified directly; anything else is decoded as one
    /// UTF-8 code point and consumed only if it belongs to the class.
    pub fn parse_name(&mut self) -> Result<(usize, usize), ParseError> {
        let start = self.pos;
        match self.peek() {
            None => return Err(self.incomplete("expected a name, found end of input")),
            Some(b) if b.is_ascii() => {
                if !is_name_start_char(b as char) {
                    return Err(self.fatal(format!(
                        "invalid name start character '{}'",
                        b.escape_ascii()
                    )));
                }
                self.pos += 1;
            }
            Some(_) => {
                let (c, len) = self.peek_char()?;
                if !is_name_start_char(c) {
                    return Err(
                        self.fatal(format!("invalid name start character U+{:04X}", c as u32))
                    );
                }
                self.pos += len;
            }
        }

        while let Some(b) = self.peek() {
            if b.is_ascii() {
                if !is_name_char(b as char) {
                    break;
                }
                self.pos += 1;
            } else {
                let (c, len) = self.peek_char()?;
                if !is_name_char(c) {
                    break;
                }
                self.pos += len;
            }
        }
        Ok((start, self.pos))
    }

    /// Parses a quoted value and returns the byte range between the quotes.
    ///
    /// The value ends at the next occurrence of the opening quote; nothing
    /// inside is unescaped.
    pub fn parse_quoted_value(&mut self) -> Result<(usize, usize), ParseError> {
        let quote = match self.peek() {
            None => return Err(self.incomplete("expected a quoted value, found end of input")),
            Some(q @ (b'"' | b'\'')) => q,
            Some(b) => {
                return Err(self.fatal(format!(
                    "expected '\"' or '\\'' to open a value, found '{}'",
                    b.escape_ascii()
                )));
            }
        };
        self.advance(1);
        let start = self.pos;
        let Some(end) = self.find_byte(quote) else {
            self.pos = self.input.len();
            return Err(self.incomplete("unterminated quoted value"));
        };
        self.pos = end + 1;
        Ok((start, end))
    }

    // -- Errors --

    /// Creates a `Parse` error at the current position.
    pub fn fatal(&self, message: impl Into<String>) -> ParseError {
        self.error(ErrorKind::Parse, message)
    }

    /// Creates an `IncompleteDocument` error at the current position.
    pub fn incomplete(&self, message: impl Into<String>) -> ParseError {
        self.error(ErrorKind::IncompleteDocument, message)
    }

    fn error(&self, kind: ErrorKind, message: impl Into<String>) -> ParseError {
        ParseError {
            kind,
            message: message.into(),
            location: self.location(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_peek_and_advance() {
        let mut input = ParserInput::new(b"abc");
        assert_eq!(input.peek(), Some(b'a'));
        input.advance(1);
        assert_eq!(input.peek(), Some(b'b'));
        input.advance(10);
        assert!(input.at_end());
        assert_eq!(input.peek(), None);
    }

    #[test]
    fn test_location_tracks_lines() {
        let mut input = ParserInput::new(b"a\nbc");
        input.advance(3);
        let loc = input.location();
        assert_eq!(loc.line, 2);
        assert_eq!(loc.column, 2);
        assert_eq!(loc.byte_offset, 3);
    }

    #[test]
    fn test_skip_whitespace() {
        let mut input = ParserInput::new(b" \t\r\n x");
        assert!(input.skip_whitespace());
        assert_eq!(input.peek(), Some(b'x'));
        assert!(!input.skip_whitespace());
    }

    #[test]
    fn test_expect_byte() {
        let mut input = ParserInput::new(b"<a");
        assert!(input.expect_byte(b'<').is_ok());
        let err = input.expect_byte(b'>').unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);
        input.advance(1);
        let err = input.expect_byte(b'>').unwrap_err();
        assert_eq!(err.kind, ErrorKind::IncompleteDocument);
    }

    #[test]
    fn test_looking_at_and_find() {
        let input = ParserInput::new(b"<!-- x -->");
        assert!(input.looking_at(b"<!--"));
        assert!(!input.looking_at(b"<a"));
        assert_eq!(input.find(b"-->"), Some(7));
        assert_eq!(input.find_byte(b'x'), Some(5));
        assert_eq!(input.find(b"]]>"), None);
    }

    #[test]
    fn test_looking_at_truncated() {
        let mut input = ParserInput::new(b"<a><!-");
        assert!(!input.looking_at_truncated(b"<!--"));
        input.advance(3);
        assert!(input.looking_at_truncated(b"<!--"));
        assert!(!input.looking_at(b"<!--"));

        let input = ParserInput::new(b"<!--");
        assert!(!input.looking_at_truncated(b"<!--"));
        let input = ParserInput::new(b"<b");
        assert!(!input.looking_at_truncated(b"<!--"));
    }

    #[test]
    fn test_parse_name_ascii() {
        let mut input = ParserInput::new(b"ns:item-2.x rest");
        let (start, end) = input.parse_name().unwrap();
        assert_eq!(input.slice(start, end), b"ns:item-2.x");
        assert_eq!(input.peek(), Some(b' '));
    }

    #[test]
    fn test_parse_name_unicode() {
        let text = "élément>";
        let mut input = ParserInput::new(text.as_bytes());
        let (start, end) = input.parse_name().unwrap();
        assert_eq!(input.slice(start, end), "élément".as_bytes());
        assert_eq!(input.peek(), Some(b'>'));
    }

    #[test]
    fn test_parse_name_four_byte_chars() {
        let text = "\u{10000}a\u{EFFFF}=";
        let mut input = ParserInput::new(text.as_bytes());
        let (start, end) = input.parse_name().unwrap();
        assert_eq!(input.slice(start, end), "\u{10000}a\u{EFFFF}".as_bytes());
        assert_eq!(end - start, 9);
        assert_eq!(input.peek(), Some(b'='));
    }

    #[test]
    fn test_parse_name_char_only_ranges() {
        let text = "a\u{300}\u{36F}\u{203F}\u{2040}\u{B7}>";
        let mut input = ParserInput::new(text.as_bytes());
        let (start, end) = input.parse_name().unwrap();
        assert_eq!(input.slice(start, end), text[..text.len() - 1].as_bytes());

        for start_char in ["\u{300}", "\u{36F}", "\u{203F}", "\u{2040}", "\u{B7}"] {
            let mut input = ParserInput::new(start_char.as_bytes());
            let err = input.parse_name().unwrap_err();
            assert_eq!(err.kind, ErrorKind::Parse, "{start_char:?}");
        }
    }

    #[test]
    fn test_parse_name_latin1_range_start() {
        // U+00C0..U+00D6 are valid name start characters.
        let mut input = ParserInput::new("Àb".as_bytes());
        assert!(input.parse_name().is_ok());
        assert!(input.at_end());
    }

    #[test]
    fn test_parse_name_rejects_digit_start() {
        let mut input = ParserInput::new(b"1abc");
        let err = input.parse_name().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);
        assert_eq!(input.pos(), 0);
    }

    #[test]
    fn test_parse_name_stops_at_non_name_char() {
        // U+00D7 (multiplication sign) is not a NameChar.
        let mut input = ParserInput::new("a×".as_bytes());
        let (start, end) = input.parse_name().unwrap();
        assert_eq!((start, end), (0, 1));
        assert_eq!(input.pos(), 1);
    }

    #[test]
    fn test_parse_name_invalid_utf8() {
        let mut input = ParserInput::new(b"a\xFFb");
        let err = input.parse_name().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);

        // Overlong encoding of '/'.
        let mut input = ParserInput::new(b"\xC0\xAF");
        assert_eq!(input.parse_name().unwrap_err().kind, ErrorKind::Parse);
    }

    #[test]
    fn test_parse_name_truncated_utf8() {
        let mut input = ParserInput::new(b"a\xC3");
        let err = input.parse_name().unwrap_err();
        assert_eq!(err.kind, ErrorKind::IncompleteDocument);
    }

    #[test]
    fn test_parse_name_at_end() {
        let mut input = ParserInput::new(b"");
        let err = input.parse_name().unwrap_err();
        assert_eq!(err.kind, ErrorKind::IncompleteDocument);
    }

    #[test]
    fn test_peek_char_does_not_consume() {
        let input = ParserInput::new("€x".as_bytes());
        let (c, len) = input.peek_char().unwrap();
        assert_eq!(c, '€');
        assert_eq!(len, 3);
        assert_eq!(input.pos(), 0);
    }

    #[test]
    fn test_peek_char_with_invalid_tail() {
        // A valid first character followed by garbage still decodes.
        let input = ParserInput::new(b"\xC3\xA9\xFF");
        assert_eq!(input.peek_char().unwrap(), ('é', 2));
    }

    #[test]
    fn test_parse_quoted_value() {
        let mut input = ParserInput::new(b"\"it's\" 'say \"hi\"'");
        let (start, end) = input.parse_quoted_value().unwrap();
        assert_eq!(input.slice(start, end), b"it's");
        input.skip_whitespace();
        let (start, end) = input.parse_quoted_value().unwrap();
        assert_eq!(input.slice(start, end), b"say \"hi\"");
        assert!(input.at_end());
    }

    #[test]
    fn test_parse_quoted_value_errors() {
        let mut input = ParserInput::new(b"value");
        assert_eq!(
            input.parse_quoted_value().unwrap_err().kind,
            ErrorKind::Parse
        );

        let mut input = ParserInput::new(b"\"never closed");
        assert_eq!(
            input.parse_quoted_value().unwrap_err().kind,
            ErrorKind::IncompleteDocument
        );
    }

    #[test]
    fn test_depth_limit() {
        let mut input = ParserInput::new(b"");
        input.set_max_depth(2);
        assert!(input.increment_depth().is_ok());
        assert!(input.increment_depth().is_ok());
        let err = input.increment_depth().unwrap_err();
        assert!(err.message.contains("nesting depth"));
        input.decrement_depth();
        input.decrement_depth();
        input.decrement_depth();
        input.decrement_depth();
        assert!(input.increment_depth().is_ok());
    }

    #[test]
    fn test_name_char_tables() {
        assert!(is_name_start_char('_'));
        assert!(is_name_start_char(':'));
        assert!(!is_name_start_char('-'));
        assert!(is_name_char('-'));
        assert!(is_name_char('\u{B7}'));
        assert!(!is_name_start_char('\u{D7}'));
        assert!(!is_name_char(' '));
    }
}
