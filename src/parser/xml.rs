//! Recursive descent productions for the element grammar.
//!
//! The parser makes one left-to-right pass over the buffer. Every production
//! returns `Result`, and the first failure aborts the whole document: there
//! is no recovery and no partial tree.
//!
//! ```text
//! document  ::= S? element
//! element   ::= '<' Name (S Attribute)* S? ('/>' | '>' content '</' Name S? '>')
//! Attribute ::= Name S? '=' S? ('"' [^"]* '"' | "'" [^']* "'")
//! content   ::= (S | element | Comment | Text)*
//! Comment   ::= '<!--' .* '-->'
//! Text      ::= [^<]+
//! ```

use crate::error::ParseError;
use crate::tree::{Document, NodeId};

use super::input::ParserInput;
use super::ParseOptions;

/// The element parser. Builds into its own `Document`.
pub(crate) struct XmlParser<'a> {
    /// Cursor and lexical primitives.
    input: ParserInput<'a>,
    /// The document being built.
    doc: Document,
    /// Keep comments as nodes instead of discarding them.
    load_comments: bool,
}

impl<'a> XmlParser<'a> {
    pub fn new(input: &'a [u8], options: &ParseOptions) -> Self {
        let mut pi = ParserInput::new(input);
        pi.set_max_depth(options.max_depth);

        Self {
            input: pi,
            doc: Document::new(),
            load_comments: options.load_comments,
        }
    }

    /// Main parse entry point. Parses exactly one root element and installs
    /// it as the document root. Anything after the root is ignored.
    pub fn parse(mut self) -> Result<Document, ParseError> {
        self.parse_prolog();
        self.input.skip_whitespace();
        if self.input.at_end() {
            return Err(self.input.incomplete("no root element found"));
        }

        let element = self.doc.create_element(String::new());
        self.parse_element(element)?;
        self.doc.set_root(element);
        Ok(self.doc)
    }


    /// Prolog handling. Nothing is consumed, so an `<?xml ...?>`
    /// declaration fails the root element parse.
    fn parse_prolog(&mut self) {}

    // --- Elements ---

    /// Parses one element into `element`, which must be empty.
    fn parse_element(&mut self, element: NodeId) -> Result<(), ParseError> {
        self.input.expect_byte(b'<')?;
        self.input.increment_depth()?;

        let (name_start, name_end) = self.input.parse_name()?;
        let name = self.input.slice(name_start, name_end);
        self.doc
            .set_name(element, String::from_utf8_lossy(name).into_owned());

        self.input.skip_whitespace();
        self.parse_attributes(element)?;

        if self.input.peek() == Some(b'/') {
            self.input.advance(1);
            self.input.expect_byte(b'>')?;
        } else {
            self.input.expect_byte(b'>')?;
            self.parse_content(element, name)?;
        }

        self.input.decrement_depth();
        Ok(())
    }

    /// Parses the attribute list of a start tag, stopping before `>` or `/`.
    fn parse_attributes(&mut self, element: NodeId) -> Result<(), ParseError> {
        loop {
            match self.input.peek() {
                None => {
                    return Err(self.input.incomplete("unexpected end of input in start tag"));
                }
                Some(b'>' | b'/') => return Ok(()),
                Some(_) => {}
            }

            let (key_start, key_end) = self.input.parse_name()?;
            self.input.skip_whitespace();
            self.input.expect_byte(b'=')?;
            self.input.skip_whitespace();
            let (value_start, value_end) = self.input.parse_quoted_value()?;

            let key = String::from_utf8_lossy(self.input.slice(key_start, key_end));
            // Duplicate keys keep the first value.
            if let Ok(attr) = self.doc.add_attribute(element, key.into_owned()) {
                let value = self.input.slice(value_start, value_end);
                self.doc
                    .set_attribute_value(attr, String::from_utf8_lossy(value).into_owned());
            }

            let separated = self.input.skip_whitespace();
            if !separated && !matches!(self.input.peek(), None | Some(b'>' | b'/')) {
                return Err(self
                    .input
                    .fatal("whitespace required between attributes"));
            }
        }
    }

    /// Parses element content up to and including the matching close tag.
    fn parse_content(&mut self, element: NodeId, open_name: &[u8]) -> Result<(), ParseError> {
        loop {
            let run_start = self.input.pos();
            self.input.skip_whitespace();

            match self.input.peek() {
                None => {
                    return Err(self.input.incomplete(format!(
                        "unexpected end of input in content of <{}>",
                        String::from_utf8_lossy(open_name)
                    )));
                }
                Some(b'<') => {
                    if self.input.looking_at(b"</") {
                        return self.parse_close_tag(open_name);
                    } else if self.input.looking_at(b"<!--") {
                        self.parse_comment(element)?;
                    } else if self.input.looking_at_truncated(b"<!--") {
                        return Err(self.input.incomplete("unexpected end of input in comment"));
                    } else {
                        let child = self.doc.add_child_element(element, String::new());
                        self.parse_element(child)?;
                    }
                }
                Some(_) => self.parse_text(element, run_start)?,
            }
        }
    }

    /// Parses `'</' Name S? '>'`; the name must equal the open tag's name.
    fn parse_close_tag(&mut self, open_name: &[u8]) -> Result<(), ParseError> {
        self.input.advance(2);
        let (start, end) = self.input.parse_name()?;
        let close_name = self.input.slice(start, end);
        if close_name != open_name {
            return Err(self.input.fatal(format!(
                "mismatched closing tag: expected </{}>, found </{}>",
                String::from_utf8_lossy(open_name),
                String::from_utf8_lossy(close_name)
            )));
        }
        self.input.skip_whitespace();
        self.input.expect_byte(b'>')
    }

    // --- Character data ---

    /// Parses `<!-- ... -->`. The comment becomes a node only when comments
    /// are being kept.
    fn parse_comment(&mut self, parent: NodeId) -> Result<(), ParseError> {
        self.input.advance(4);
        let start = self.input.pos();
        let Some(end) = self.input.find(b"-->") else {
            return Err(self.input.incomplete("unterminated comment"));
        };
        let content = self.input.slice(start, end);
        self.input.advance(end + 3 - start);

        if self.load_comments {
            self.doc
                .add_child_comment(parent, String::from_utf8_lossy(content).into_owned());
        }
        Ok(())
    }

    /// Parses a text run from `start` up to the next `<`, stored verbatim.
    fn parse_text(&mut self, parent: NodeId, start: usize) -> Result<(), ParseError> {
        let Some(end) = self.input.find_byte(b'<') else {
            return Err(self.input.incomplete("unterminated text content"));
        };
        let content = self.input.slice(start, end);
        self.input.advance(end - self.input.pos());
        self.doc
            .add_child_text(parent, String::from_utf8_lossy(content).into_owned());
        Ok(())
    }
}
