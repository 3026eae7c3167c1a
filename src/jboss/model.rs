//! Detyped management model text.
//!
//! The administrative CLI prints operation results in the server's textual
//! model syntax:
//!
//! ```text
//! {
//!     "outcome" => "success",
//!     "result" => {
//!         "content" => [{"hash" => bytes {
//!             0x5e, 0x1b, 0x0f, ...
//!         }}],
//!         "enabled" => true,
//!         "name" => "hello.war"
//!     }
//! }
//! ```
//!
//! This module parses that syntax into a [`ModelNode`] tree so fields can be
//! looked up by name instead of scraped.

use crate::error::ModelParseError;

/// Key under which the server reports deployment content hashes.
const HASH_KEY: &str = "hash";

/// Deepest nesting of objects, lists and properties the parser accepts.
const MAX_DEPTH: usize = 128;

/// A parsed management model value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelNode {
    /// `undefined`.
    Undefined,
    /// `true` / `false`.
    Boolean(bool),
    /// Integer, long (`42L`), or big decimal, kept as written without suffix.
    Number(String),
    /// Quoted string.
    String(String),
    /// `bytes { 0x.., ... }`.
    Bytes(Vec<u8>),
    /// `expression "${...}"`.
    Expression(String),
    /// Bare type name such as `STRING` or `OBJECT`.
    Type(String),
    /// `[a, b, ...]`.
    List(Vec<ModelNode>),
    /// `{"k" => v, ...}`, in document order.
    Object(Vec<(String, ModelNode)>),
    /// `("k" => v)`.
    Property(String, Box<ModelNode>),
}

impl ModelNode {
    /// Parses a complete model value.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a single well-formed value.
    pub fn parse(text: &str) -> Result<Self, ModelParseError> {
        let mut parser = Parser::new(text, 0);
        let node = parser.parse_value()?;
        parser.skip_whitespace();
        if parser.pos < text.len() {
            return Err(parser.error("trailing characters after value"));
        }
        Ok(node)
    }

    /// Looks up a key in an object (or the key of a property).
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Object(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            Self::Property(k, v) if k == key => Some(v),
            _ => None,
        }
    }

    /// Returns the string value, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the byte value, if this is a bytes literal.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the `outcome` field of an operation response.
    #[must_use]
    pub fn outcome(&self) -> Option<&str> {
        self.get("outcome").and_then(Self::as_str)
    }

    /// Finds the first bytes value stored under `key`, depth first.
    #[must_use]
    pub fn find_keyed_bytes(&self, key: &str) -> Option<&[u8]> {
        match self {
            Self::Object(entries) => entries.iter().find_map(|(k, v)| {
                if k == key {
                    if let Some(bytes) = v.as_bytes() {
                        return Some(bytes);
                    }
                }
                v.find_keyed_bytes(key)
            }),
            Self::Property(k, v) => {
                if k == key {
                    if let Some(bytes) = v.as_bytes() {
                        return Some(bytes);
                    }
                }
                v.find_keyed_bytes(key)
            }
            Self::List(items) => items.iter().find_map(|item| item.find_keyed_bytes(key)),
            _ => None,
        }
    }

    /// Finds the first bytes value anywhere, in document order.
    #[must_use]
    pub fn first_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            Self::Object(entries) => entries.iter().find_map(|(_, v)| v.first_bytes()),
            Self::Property(_, v) => v.first_bytes(),
            Self::List(items) => items.iter().find_map(Self::first_bytes),
            _ => None,
        }
    }
}

/// Extracts the deployment content checksum from CLI output as lowercase hex.
///
/// Prefers a `hash` field of a well-formed response, then any bytes value.
/// If the output is not a single model value, the first `bytes {...}` literal
/// in the text is used. Returns `None` when nothing usable is found.
#[must_use]
pub fn checksum_from_output(output: &str) -> Option<String> {
    if let Ok(node) = ModelNode::parse(output) {
        return node
            .find_keyed_bytes(HASH_KEY)
            .or_else(|| node.first_bytes())
            .map(hex::encode);
    }

    scan_bytes_literal(output).map(hex::encode)
}

/// Parses the first well-formed `bytes {...}` literal found in free text.
fn scan_bytes_literal(text: &str) -> Option<Vec<u8>> {
    text.match_indices("bytes").find_map(|(idx, word)| {
        let mut parser = Parser::new(text, idx + word.len());
        parser.parse_bytes_body().ok()
    })
}

/// Recursive-descent parser over model text.
struct Parser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    const fn new(input: &'a str, pos: usize) -> Self {
        Self {
            input,
            pos,
            depth: 0,
        }
    }

    fn error(&self, message: &str) -> ModelParseError {
        ModelParseError {
            offset: self.pos,
            message: message.to_string(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: u8) -> Result<(), ModelParseError> {
        self.skip_whitespace();
        if self.peek() == Some(expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", char::from(expected))))
        }
    }

    fn expect_arrow(&mut self) -> Result<(), ModelParseError> {
        self.skip_whitespace();
        if self.input[self.pos..].starts_with("=>") {
            self.pos += 2;
            Ok(())
        } else {
            Err(self.error("expected '=>'"))
        }
    }

    /// Consumes bytes while `pred` holds and returns them.
    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        &self.input[start..self.pos]
    }

    fn parse_value(&mut self) -> Result<ModelNode, ModelParseError> {
        self.skip_whitespace();
        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some(open @ (b'{' | b'[' | b'(')) => {
                if self.depth >= MAX_DEPTH {
                    return Err(self.error("nesting too deep"));
                }
                self.depth += 1;
                let node = match open {
                    b'{' => self.parse_object(),
                    b'[' => self.parse_list(),
                    _ => self.parse_property(),
                };
                self.depth -= 1;
                node
            }
            Some(b'"') => self.parse_string().map(ModelNode::String),
            Some(b'-' | b'0'..=b'9') => self.parse_number(),
            Some(b) if b.is_ascii_alphabetic() => self.parse_word(),
            Some(_) => Err(self.error("unexpected character")),
        }
    }

    fn parse_object(&mut self) -> Result<ModelNode, ModelParseError> {
        self.expect(b'{')?;
        let mut entries = Vec::new();

        self.skip_whitespace();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(ModelNode::Object(entries));
        }

        loop {
            self.skip_whitespace();
            let key = self.parse_string()?;
            self.expect_arrow()?;
            let value = self.parse_value()?;
            entries.push((key, value));

            self.skip_whitespace();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(ModelNode::Object(entries));
                }
                _ => return Err(self.error("expected ',' or '}'")),
            }
        }
    }

    fn parse_list(&mut self) -> Result<ModelNode, ModelParseError> {
        self.expect(b'[')?;
        let mut items = Vec::new();

        self.skip_whitespace();
        if self.peek() == Some(b']') {
            self.pos += 1;
            return Ok(ModelNode::List(items));
        }

        loop {
            items.push(self.parse_value()?);

            self.skip_whitespace();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b']') => {
                    self.pos += 1;
                    return Ok(ModelNode::List(items));
                }
                _ => return Err(self.error("expected ',' or ']'")),
            }
        }
    }

    fn parse_property(&mut self) -> Result<ModelNode, ModelParseError> {
        self.expect(b'(')?;
        self.skip_whitespace();
        let key = self.parse_string()?;
        self.expect_arrow()?;
        let value = self.parse_value()?;
        self.expect(b')')?;
        Ok(ModelNode::Property(key, Box::new(value)))
    }

    fn parse_string(&mut self) -> Result<String, ModelParseError> {
        if self.peek() != Some(b'"') {
            return Err(self.error("expected string"));
        }
        self.pos += 1;

        let mut value = String::new();
        let mut escaped = false;
        for (offset, c) in self.input[self.pos..].char_indices() {
            if escaped {
                value.push(c);
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                self.pos += offset + 1;
                return Ok(value);
            } else {
                value.push(c);
            }
        }

        self.pos = self.input.len();
        Err(self.error("unterminated string"))
    }

    fn parse_number(&mut self) -> Result<ModelNode, ModelParseError> {
        let digits = self.take_while(|b| b.is_ascii_digit() || matches!(b, b'-' | b'+' | b'.' | b'e' | b'E'));
        if !digits.bytes().any(|b| b.is_ascii_digit()) {
            return Err(self.error("expected number"));
        }
        if self.peek() == Some(b'L') {
            self.pos += 1;
        }
        Ok(ModelNode::Number(digits.to_string()))
    }

    fn parse_word(&mut self) -> Result<ModelNode, ModelParseError> {
        let word = self.take_while(|b| b.is_ascii_alphanumeric() || b == b'_');
        match word {
            "undefined" => Ok(ModelNode::Undefined),
            "true" => Ok(ModelNode::Boolean(true)),
            "false" => Ok(ModelNode::Boolean(false)),
            "bytes" => self.parse_bytes_body().map(ModelNode::Bytes),
            "expression" => {
                self.skip_whitespace();
                self.parse_string().map(ModelNode::Expression)
            }
            "big" => {
                // big decimal 1.5 / big integer 7
                self.skip_whitespace();
                self.take_while(|b| b.is_ascii_alphabetic());
                self.skip_whitespace();
                self.parse_number()
            }
            other => Ok(ModelNode::Type(other.to_string())),
        }
    }

    /// Parses `{ 0x.., 0x.. }` following the `bytes` keyword.
    fn parse_bytes_body(&mut self) -> Result<Vec<u8>, ModelParseError> {
        self.expect(b'{')?;
        let mut bytes = Vec::new();

        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(bytes);
                }
                Some(b',') => self.pos += 1,
                Some(_) => {
                    let token = self.take_while(|b| b.is_ascii_alphanumeric());
                    let digits = token
                        .strip_prefix("0x")
                        .or_else(|| token.strip_prefix("0X"))
                        .unwrap_or(token);
                    if digits.is_empty() || digits.len() > 2 {
                        return Err(self.error("expected hex byte"));
                    }
                    let byte = u8::from_str_radix(digits, 16)
                        .map_err(|_| self.error("invalid hex byte"))?;
                    bytes.push(byte);
                }
                None => return Err(self.error("unterminated bytes literal")),
            }
        }
    }
}
