//! SGF collection parser
//!
//! Parses the structure of an SGF collection and keeps the root node
//! properties of each top-level game tree. Move nodes and variations are
//! validated for bracket balance and then discarded; ingestion only needs
//! game metadata.
//!
//! # Grammar
//! ```text
//! Collection = GameTree { GameTree }
//! GameTree   = "(" Sequence { GameTree } ")"
//! Sequence   = Node { Node }
//! Node       = ";" { Property }
//! Property   = PropIdent PropValue { PropValue }
//! PropValue  = "[" text "]"          -- "\" escapes the next byte
//! ```
//!
//! Variations are tracked with a depth counter rather than recursion so a
//! deeply nested file cannot overflow the worker's stack.
//!
//! Values are kept as raw bytes and decoded on lookup using the charset
//! named by the root `CA` property (UTF-8 when absent or unknown). A value
//! that is not valid in that charset is an error, never a lossy string.

use super::date::{DateError, FuzzyDate};
use crate::extract::{GameTreeInfo, RecordParser};
use encoding_rs::{Encoding, UTF_8};
use std::borrow::Cow;

/// Errors from SGF parsing and property lookup
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SgfError {
    /// Input contained no game tree
    #[error("empty collection")]
    EmptyCollection,

    /// Input ended inside a tree or property value
    #[error("unexpected end of input at byte {offset}")]
    UnexpectedEof { offset: usize },

    /// A byte that cannot appear at this position
    #[error("unexpected {found:?} at byte {offset}")]
    UnexpectedChar { found: char, offset: usize },

    /// Root node lacks a required property
    #[error("missing property {0}")]
    MissingProperty(&'static str),

    /// `DT` value could not be read as a date
    #[error(transparent)]
    InvalidDate(#[from] DateError),

    /// Property bytes are not valid in the game's charset
    #[error("property {ident} is not valid {encoding}")]
    InvalidText {
        ident: String,
        encoding: &'static str,
    },
}

type RawProperty = (String, Vec<Vec<u8>>);

/// Root-node metadata of one game tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SgfGameTree {
    properties: Vec<RawProperty>,
}

impl SgfGameTree {
    /// First value of a root property, decoded with the game's charset
    pub fn property(&self, ident: &str) -> Result<Option<Cow<'_, str>>, SgfError> {
        let Some(raw) = self.raw(ident) else {
            return Ok(None);
        };

        let encoding = self.encoding();
        encoding
            .decode_without_bom_handling_and_without_replacement(raw)
            .map(Some)
            .ok_or_else(|| SgfError::InvalidText {
                ident: ident.to_string(),
                encoding: encoding.name(),
            })
    }

    /// Charset named by `CA`
    pub fn encoding(&self) -> &'static Encoding {
        self.raw("CA")
            .and_then(Encoding::for_label)
            .unwrap_or(UTF_8)
    }

    fn raw(&self, ident: &str) -> Option<&[u8]> {
        self.properties
            .iter()
            .find(|(id, _)| id == ident)
            .and_then(|(_, values)| values.first())
            .map(Vec::as_slice)
    }

    fn required(&self, ident: &'static str) -> Result<String, SgfError> {
        let value = self.property(ident)?.ok_or(SgfError::MissingProperty(ident))?;
        let value = value.trim();
        if value.is_empty() {
            return Err(SgfError::MissingProperty(ident));
        }
        Ok(value.to_string())
    }
}

impl GameTreeInfo for SgfGameTree {
    type Error = SgfError;

    fn start_date(&self) -> Result<FuzzyDate, SgfError> {
        Ok(FuzzyDate::parse(&self.required("DT")?)?)
    }

    fn black_player_name(&self) -> Result<String, SgfError> {
        self.required("PB")
    }

    fn white_player_name(&self) -> Result<String, SgfError> {
        self.required("PW")
    }

    /// `"B"` or `"W"` for a decided game, otherwise the raw `RE` text
    /// (`"0"` for a draw, `"Void"`, `"?"`, or empty)
    fn winner_color(&self) -> Result<String, SgfError> {
        let result = self.property("RE")?.ok_or(SgfError::MissingProperty("RE"))?;
        let result = result.trim();

        let color = if result.starts_with("B+") {
            "B"
        } else if result.starts_with("W+") {
            "W"
        } else {
            result
        };
        Ok(color.to_string())
    }
}

/// Parser for SGF game records
#[derive(Debug, Clone, Copy, Default)]
pub struct SgfParser;

impl RecordParser for SgfParser {
    type Tree = SgfGameTree;
    type Error = SgfError;

    fn parse(&self, data: &[u8]) -> Result<Vec<SgfGameTree>, SgfError> {
        parse_collection(data)
    }
}

/// Parse every top-level game tree in `data`
pub fn parse_collection(data: &[u8]) -> Result<Vec<SgfGameTree>, SgfError> {
    let mut cursor = Cursor { data, pos: 0 };
    let mut trees = Vec::new();

    loop {
        cursor.skip_ws();
        match cursor.peek() {
            Some(b'(') => trees.push(cursor.game_tree()?),
            Some(found) => {
                return Err(SgfError::UnexpectedChar {
                    found: found as char,
                    offset: cursor.pos,
                })
            }
            None => break,
        }
    }

    if trees.is_empty() {
        return Err(SgfError::EmptyCollection);
    }
    Ok(trees)
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl Cursor<'_> {
    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn bump(&mut self) -> Result<u8, SgfError> {
        let byte = self.peek().ok_or(SgfError::UnexpectedEof { offset: self.pos })?;
        self.pos += 1;
        Ok(byte)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, wanted: u8) -> Result<(), SgfError> {
        let offset = self.pos;
        match self.bump()? {
            b if b == wanted => Ok(()),
            found => Err(SgfError::UnexpectedChar {
                found: found as char,
                offset,
            }),
        }
    }

    fn game_tree(&mut self) -> Result<SgfGameTree, SgfError> {
        self.expect(b'(')?;
        self.skip_ws();
        let root = self.node()?;

        let mut depth = 1usize;
        while depth > 0 {
            self.skip_ws();
            match self.peek() {
                Some(b';') => {
                    self.node()?;
                }
                Some(b'(') => {
                    self.pos += 1;
                    depth += 1;
                    // A variation must open with a node
                    self.skip_ws();
                    if self.peek() != Some(b';') {
                        let offset = self.pos;
                        return Err(match self.peek() {
                            Some(found) => SgfError::UnexpectedChar {
                                found: found as char,
                                offset,
                            },
                            None => SgfError::UnexpectedEof { offset },
                        });
                    }
                }
                Some(b')') => {
                    self.pos += 1;
                    depth -= 1;
                }
                Some(found) => {
                    return Err(SgfError::UnexpectedChar {
                        found: found as char,
                        offset: self.pos,
                    })
                }
                None => return Err(SgfError::UnexpectedEof { offset: self.pos }),
            }
        }

        Ok(SgfGameTree { properties: root })
    }

    fn node(&mut self) -> Result<Vec<RawProperty>, SgfError> {
        self.expect(b';')?;
        let mut properties = Vec::new();

        loop {
            self.skip_ws();
            match self.peek() {
                Some(b) if b.is_ascii_alphabetic() => properties.push(self.property()?),
                _ => break,
            }
        }
        Ok(properties)
    }

    fn property(&mut self) -> Result<RawProperty, SgfError> {
        let mut ident = String::new();
        while let Some(b) = self.peek().filter(u8::is_ascii_alphabetic) {
            // FF[3] allowed lowercase letters inside identifiers
            if b.is_ascii_uppercase() {
                ident.push(b as char);
            }
            self.pos += 1;
        }

        let mut values = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() != Some(b'[') {
                break;
            }
            values.push(self.value()?);
        }

        if values.is_empty() {
            let offset = self.pos;
            return Err(match self.peek() {
                Some(found) => SgfError::UnexpectedChar {
                    found: found as char,
                    offset,
                },
                None => SgfError::UnexpectedEof { offset },
            });
        }
        Ok((ident, values))
    }

    fn value(&mut self) -> Result<Vec<u8>, SgfError> {
        self.expect(b'[')?;
        let mut text = Vec::new();

        loop {
            match self.bump()? {
                b']' => break,
                b'\\' => match self.bump()? {
                    // Soft line break
                    b'\n' => {
                        if self.peek() == Some(b'\r') {
                            self.pos += 1;
                        }
                    }
                    b'\r' => {
                        if self.peek() == Some(b'\n') {
                            self.pos += 1;
                        }
                    }
                    escaped => text.push(escaped),
                },
                b => text.push(b),
            }
        }

        Ok(text)
    }
}
