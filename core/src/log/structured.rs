//! Nested table grammar used by fully resolved missions.
//!
//! ```text
//! debriefing =
//! {
//!     ["triggers_state"] = { [1] = true, },
//!     ["events"] =
//!     {
//!         [1] =
//!         {
//!             ["type"] = "dead",
//!             ["initiatorMissionID"] = "42",
//!         }, -- end of [1]
//!     }, -- end of ["events"]
//! } -- end of debriefing
//! ```
//!
//! A document is a sequence of `name = value` assignments. Tables accept
//! `[int] =`, `["string"] =`, `ident =` and positional entries separated by
//! `,` or `;`. `nil` values are dropped. `--` starts a line comment.

use super::table::{Key, Table, Value};
use crate::error::GrammarError;

/// Deepest table nesting accepted before the input is rejected.
const MAX_DEPTH: usize = 256;

type ParseResult<T> = Result<T, GrammarError>;

pub fn parse_structured(input: &str) -> ParseResult<Table> {
    Parser::new(input).document()
}

struct Parser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            depth: 0,
        }
    }

    fn document(&mut self) -> ParseResult<Table> {
        let mut root = Table::new();
        loop {
            self.skip_trivia();
            if self.at_end() {
                return Ok(root);
            }
            if self.eat(b',') || self.eat(b';') {
                continue;
            }

            let name = self
                .identifier()
                .ok_or_else(|| self.error("expected top-level assignment"))?;
            self.skip_trivia();
            self.expect(b'=')?;
            if let Some(value) = self.value()? {
                root.insert(Key::Name(name.to_string()), value);
            }
        }
    }

    fn value(&mut self) -> ParseResult<Option<Value>> {
        self.skip_trivia();
        match self.peek() {
            None => Err(self.error("unexpected end of input, expected a value")),
            Some(b'{') => self.table().map(|t| Some(Value::Table(t))),
            Some(b'"' | b'\'') => self.string().map(|s| Some(Value::Str(s))),
            Some(b'-' | b'+' | b'.' | b'0'..=b'9') => self.number().map(Some),
            Some(c) if is_ident_start(c) => {
                let start = self.pos;
                let word = self.identifier().unwrap_or_default();
                match word {
                    "true" => Ok(Some(Value::Bool(true))),
                    "false" => Ok(Some(Value::Bool(false))),
                    "nil" => Ok(None),
                    other => Err(GrammarError::new(
                        start,
                        format!("unexpected identifier '{other}' in value position"),
                    )),
                }
            }
            Some(c) => Err(self.error(format!("unexpected character '{}'", c as char))),
        }
    }

    fn table(&mut self) -> ParseResult<Table> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(self.error("tables nested too deeply"));
        }
        self.expect(b'{')?;

        let mut table = Table::new();
        let mut next_index: i64 = 1;

        loop {
            self.skip_trivia();
            if self.eat(b'}') {
                break;
            }

            let key = self.entry_key()?;
            let value = self.value()?;
            match (key, value) {
                (Some(key), Some(value)) => table.insert(key, value),
                (Some(_), None) => {}
                (None, value) => {
                    if let Some(value) = value {
                        table.insert(Key::Index(next_index), value);
                    }
                    next_index += 1;
                }
            }

            self.skip_trivia();
            if self.eat(b',') || self.eat(b';') {
                continue;
            }
            if self.eat(b'}') {
                break;
            }
            return Err(self.error("expected ',' or '}' after table entry"));
        }

        self.depth -= 1;
        Ok(table)
    }

    /// Parse an explicit `[key] =` or `ident =` prefix. Returns `None` for positional entries.
    fn entry_key(&mut self) -> ParseResult<Option<Key>> {
        match self.peek() {
            Some(b'[') => {
                self.pos += 1;
                self.skip_trivia();
                let key = match self.peek() {
                    Some(b'"' | b'\'') => Key::Name(self.string()?),
                    Some(b'-' | b'+' | b'0'..=b'9') => {
                        let start = self.pos;
                        match self.number()? {
                            Value::Int(i) => Key::Index(i),
                            _ => return Err(GrammarError::new(start, "non-integer numeric key")),
                        }
                    }
                    _ => return Err(self.error("expected string or integer key")),
                };
                self.skip_trivia();
                self.expect(b']')?;
                self.skip_trivia();
                self.expect(b'=')?;
                Ok(Some(key))
            }
            Some(c) if is_ident_start(c) => {
                let start = self.pos;
                let name = self.identifier().unwrap_or_default();
                self.skip_trivia();
                if self.peek() == Some(b'=') && self.peek_at(1) != Some(b'=') {
                    self.pos += 1;
                    Ok(Some(Key::Name(name.to_string())))
                } else {
                    // Positional `true`/`false`/`nil`, re-read as a value.
                    self.pos = start;
                    Ok(None)
                }
            }
            _ => Ok(None),
        }
    }

    fn string(&mut self) -> ParseResult<String> {
        let open = self.pos;
        let quote = self.bytes[self.pos];
        self.pos += 1;

        let mut out = String::new();
        let mut run_start = self.pos;
        while let Some(c) = self.peek() {
            match c {
                _ if c == quote => {
                    out.push_str(&self.src[run_start..self.pos]);
                    self.pos += 1;
                    return Ok(out);
                }
                b'\n' => break,
                b'\\' => {
                    out.push_str(&self.src[run_start..self.pos]);
                    self.pos += 1;
                    self.escape(&mut out)?;
                    run_start = self.pos;
                }
                _ => self.pos += 1,
            }
        }

        Err(GrammarError::new(open, "unterminated string"))
    }

    fn escape(&mut self, out: &mut String) -> ParseResult<()> {
        let Some(c) = self.peek() else {
            return Err(self.error("unterminated escape sequence"));
        };
        self.pos += 1;
        match c {
            b'n' | b'\n' => out.push('\n'),
            b't' => out.push('\t'),
            b'r' => out.push('\r'),
            b'0'..=b'9' => {
                let mut code = u32::from(c - b'0');
                for _ in 0..2 {
                    match self.peek() {
                        Some(d @ b'0'..=b'9') => {
                            code = code * 10 + u32::from(d - b'0');
                            self.pos += 1;
                        }
                        _ => break,
                    }
                }
                let ch = u8::try_from(code)
                    .map(char::from)
                    .map_err(|_| self.error("decimal escape out of range"))?;
                out.push(ch);
            }
            _ if c.is_ascii() => out.push(c as char),
            _ => {
                // Escaped multi-byte character: keep it verbatim.
                self.pos -= 1;
                let ch = self.src[self.pos..].chars().next().unwrap_or('\u{FFFD}');
                self.pos += ch.len_utf8();
                out.push(ch);
            }
        }
        Ok(())
    }

    fn number(&mut self) -> ParseResult<Value> {
        let start = self.pos;
        if matches!(self.peek(), Some(b'-' | b'+')) {
            self.pos += 1;
        }
        let mut is_float = false;
        let mut digits = 0;
        while let Some(c) = self.peek() {
            match c {
                b'0'..=b'9' => digits += 1,
                b'.' => is_float = true,
                b'e' | b'E' => {
                    is_float = true;
                    if matches!(self.peek_at(1), Some(b'-' | b'+')) {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
            self.pos += 1;
        }

        if digits == 0 {
            return Err(GrammarError::new(start, "malformed number"));
        }

        let text = &self.src[start..self.pos];
        if !is_float && let Ok(i) = text.parse::<i64>() {
            return Ok(Value::Int(i));
        }
        text.parse::<f64>()
            .map(Value::Float)
            .map_err(|_| GrammarError::new(start, format!("malformed number '{text}'")))
    }

    fn identifier(&mut self) -> Option<&'a str> {
        let src = self.src;
        let start = self.pos;
        if !self.peek().is_some_and(is_ident_start) {
            return None;
        }
        while self.peek().is_some_and(is_ident_continue) {
            self.pos += 1;
        }
        Some(&src[start..self.pos])
    }

    fn skip_trivia(&mut self) {
        loop {
            while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
                self.pos += 1;
            }
            if self.bytes[self.pos..].starts_with(b"--") {
                match memchr::memchr(b'\n', &self.bytes[self.pos..]) {
                    Some(offset) => self.pos += offset + 1,
                    None => self.pos = self.bytes.len(),
                }
            } else {
                return;
            }
        }
    }

    fn expect(&mut self, byte: u8) -> ParseResult<()> {
        if self.eat(byte) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", byte as char)))
        }
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn error(&self, reason: impl Into<String>) -> GrammarError {
        GrammarError::new(self.pos, reason)
    }
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_ident_continue(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}
