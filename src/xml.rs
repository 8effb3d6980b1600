// Copyright 2025 Cowboy AI, LLC.

//! Scoped XML codec for robot description documents
//!
//! Reads and writes element trees in the slice of XML that URDF actually
//! uses: elements, attributes, comments, processing instructions and
//! entity references. Text content is skipped on input and never written
//! on output. Serialization is deterministic, so a document that parses
//! and serializes twice produces identical bytes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::element::UrdfElement;

/// Parse failure with document position.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("XML parse error at line {line}, column {column}: {message}")]
pub struct XmlError {
    /// What went wrong.
    pub message: String,
    /// 1-based line of the failure.
    pub line: usize,
    /// 1-based column of the failure.
    pub column: usize,
}

/// Parse a complete document into its root element.
pub(crate) fn parse(input: &str) -> Result<UrdfElement, XmlError> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let mut parser = Parser::new(input);
    parser.skip_misc()?;
    if parser.peek().is_none() {
        return Err(parser.error("no root element"));
    }
    let root = parser.parse_element()?;
    parser.skip_misc()?;
    if parser.peek().is_some() {
        return Err(parser.error("content after the root element"));
    }
    Ok(root)
}

/// Serialize an element tree with a declaration line, two-space
/// indentation and one element per line.
pub(crate) fn serialize(root: &UrdfElement) -> String {
    let mut out = String::from("<?xml version=\"1.0\"?>\n");
    write_element(&mut out, root, 0);
    out
}

fn write_element(out: &mut String, element: &UrdfElement, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
    out.push('<');
    out.push_str(element.tag());
    for (key, value) in element.attributes() {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        push_escaped(out, value);
        out.push('"');
    }
    if element.children().is_empty() {
        out.push_str(" />\n");
    } else {
        out.push_str(">\n");
        for child in element.children() {
            write_element(out, child, depth + 1);
        }
        for _ in 0..depth {
            out.push_str("  ");
        }
        out.push_str("</");
        out.push_str(element.tag());
        out.push_str(">\n");
    }
}

fn push_escaped(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn error(&self, message: impl Into<String>) -> XmlError {
        XmlError {
            message: message.into(),
            line: self.line,
            column: self.column,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        if byte == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(byte)
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, byte: u8) -> Result<(), XmlError> {
        if self.eat(byte) {
            Ok(())
        } else {
            Err(self.error(format!("expected `{}`", byte as char)))
        }
    }

    fn starts_with(&self, prefix: &[u8]) -> bool {
        self.input[self.pos..].starts_with(prefix)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            self.bump();
        }
    }

    fn skip_past(&mut self, terminator: &[u8], context: &str) -> Result<(), XmlError> {
        while self.pos < self.input.len() {
            if self.starts_with(terminator) {
                for _ in 0..terminator.len() {
                    self.bump();
                }
                return Ok(());
            }
            self.bump();
        }
        Err(self.error(format!("unterminated {context}")))
    }

    /// Whitespace, comments, processing instructions and doctype
    /// declarations outside the root element.
    fn skip_misc(&mut self) -> Result<(), XmlError> {
        loop {
            self.skip_whitespace();
            if self.starts_with(b"<!--") {
                self.skip_past(b"-->", "comment")?;
            } else if self.starts_with(b"<!DOCTYPE") {
                self.skip_past(b">", "doctype declaration")?;
            } else if self.starts_with(b"<?") {
                self.skip_past(b"?>", "processing instruction")?;
            } else {
                return Ok(());
            }
        }
    }

    fn is_name_byte(byte: u8) -> bool {
        byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'-' | b'.' | b':') || byte >= 0x80
    }

    fn parse_name(&mut self) -> Result<String, XmlError> {
        let start = self.pos;
        while let Some(byte) = self.peek() {
            if Self::is_name_byte(byte) {
                self.bump();
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(self.error("expected a name"));
        }
        Ok(String::from_utf8_lossy(&self.input[start..self.pos]).into_owned())
    }

    fn parse_element(&mut self) -> Result<UrdfElement, XmlError> {
        self.expect(b'<')?;
        let tag = self.parse_name()?;
        let mut element = UrdfElement::new(&tag);

        // Attribute list up to `>` or `/>`.
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(self.error(format!("unexpected end of input in <{tag}>"))),
                Some(b'>') => {
                    self.bump();
                    break;
                }
                Some(b'/') => {
                    self.bump();
                    self.expect(b'>')?;
                    return Ok(element);
                }
                Some(_) => {
                    let key = self.parse_name()?;
                    self.skip_whitespace();
                    self.expect(b'=')?;
                    self.skip_whitespace();
                    let value = self.parse_attribute_value()?;
                    if element.attribute(&key).is_some() {
                        return Err(self.error(format!("duplicate attribute `{key}` in <{tag}>")));
                    }
                    element.set_attribute(key, value);
                }
            }
        }

        // Children and ignored text until the matching end tag.
        loop {
            match self.peek() {
                None => return Err(self.error(format!("missing </{tag}>"))),
                Some(b'<') => {
                    if self.starts_with(b"</") {
                        self.bump();
                        self.bump();
                        let closing = self.parse_name()?;
                        if closing != tag {
                            return Err(self.error(format!(
                                "mismatched end tag: expected </{tag}>, found </{closing}>"
                            )));
                        }
                        self.skip_whitespace();
                        self.expect(b'>')?;
                        return Ok(element);
                    } else if self.starts_with(b"<!--") {
                        self.skip_past(b"-->", "comment")?;
                    } else if self.starts_with(b"<![CDATA[") {
                        self.skip_past(b"]]>", "CDATA section")?;
                    } else if self.starts_with(b"<?") {
                        self.skip_past(b"?>", "processing instruction")?;
                    } else {
                        let child = self.parse_element()?;
                        element.children_mut().push(child);
                    }
                }
                Some(_) => {
                    // Text content is not part of the model.
                    self.bump();
                }
            }
        }
    }

    fn parse_attribute_value(&mut self) -> Result<String, XmlError> {
        let quote = match self.peek() {
            Some(q @ (b'"' | b'\'')) => {
                self.bump();
                q
            }
            _ => return Err(self.error("expected a quoted attribute value")),
        };
        let mut value = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated attribute value")),
                Some(byte) if byte == quote => {
                    self.bump();
                    return Ok(value);
                }
                Some(b'&') => value.push(self.parse_entity()?),
                Some(byte) if byte < 0x80 => {
                    self.bump();
                    value.push(byte as char);
                }
                Some(_) => {
                    // Multi-byte UTF-8 sequence, copied whole.
                    let start = self.pos;
                    self.bump();
                    while matches!(self.peek(), Some(byte) if (0x80..0xC0).contains(&byte)) {
                        self.bump();
                    }
                    value.push_str(&String::from_utf8_lossy(&self.input[start..self.pos]));
                }
            }
        }
    }

    fn parse_entity(&mut self) -> Result<char, XmlError> {
        self.expect(b'&')?;
        let start = self.pos;
        while let Some(byte) = self.peek() {
            if byte == b';' || byte == b'&' || byte == b'<' || self.pos - start > 8 {
                break;
            }
            self.bump();
        }
        let body = String::from_utf8_lossy(&self.input[start..self.pos]).into_owned();
        if !self.eat(b';') {
            return Err(self.error(format!("malformed entity `&{body}`")));
        }
        match body.as_str() {
            "amp" => Ok('&'),
            "lt" => Ok('<'),
            "gt" => Ok('>'),
            "quot" => Ok('"'),
            "apos" => Ok('\''),
            _ => {
                let code = body
                    .strip_prefix("#x")
                    .or_else(|| body.strip_prefix("#X"))
                    .map(|hex| u32::from_str_radix(hex, 16))
                    .or_else(|| body.strip_prefix('#').map(str::parse::<u32>));
                match code {
                    Some(Ok(code)) => char::from_u32(code)
                        .ok_or_else(|| self.error(format!("invalid character reference `&{body};`"))),
                    _ => Err(self.error(format!("unknown entity `&{body};`"))),
                }
            }
        }
    }
}
