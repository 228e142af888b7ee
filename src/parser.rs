//! Recovering JSON text parser
//!
//! Turns UTF-8 text into a [`Value`] tree. Unlike `serde_json::from_str` it
//! does not stop at the first problem: each error is recorded with its line
//! and column, the broken member is skipped up to the next `,` or closing
//! bracket, and parsing carries on. Callers get whatever could be recovered
//! plus the ordered error list.

use crate::error::{Error, ParseError, Result};
use crate::value::{JsonList, JsonMap, Value};

/// Deepest container nesting accepted, matching `serde_json`'s limit
pub const MAX_DEPTH: usize = 128;

/// Result of parsing a document: a best-effort tree plus positioned errors
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// Recovered value, `None` when nothing usable was found
    pub value: Option<Value>,
    /// Errors in source order
    pub errors: Vec<ParseError>,
}

impl ParsedDocument {
    /// Check if the document parsed without errors
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty() && self.value.is_some()
    }

    /// Convert into a strict result: any error fails the whole document
    pub fn into_result(self) -> Result<Value> {
        match self.value {
            Some(value) if self.errors.is_empty() => Ok(value),
            _ => Err(Error::Parse {
                errors: if self.errors.is_empty() {
                    vec![ParseError::new("Empty document", 0, 0)]
                } else {
                    self.errors
                },
            }),
        }
    }
}

/// Parse a JSON document, recovering from errors where possible
pub fn parse_document(text: &str) -> ParsedDocument {
    let mut parser = Parser::new(text);
    parser.skip_ws();
    if parser.peek() == Some('\u{feff}') {
        parser.bump();
        parser.skip_ws();
    }

    if parser.peek().is_none() {
        parser.error("Empty document");
        return parser.finish(None);
    }

    let value = parser.parse_value();
    parser.skip_ws();
    if value.is_some() {
        if let Some(c) = parser.peek() {
            parser.error(format!("Unexpected trailing character '{c}'"));
        }
    }
    parser.finish(value)
}

/// Parse a JSON document strictly
pub fn parse_strict(text: &str) -> Result<Value> {
    parse_document(text).into_result()
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    depth: usize,
    errors: Vec<ParseError>,
}

impl Parser {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            depth: 0,
            errors: Vec::new(),
        }
    }

    fn finish(self, value: Option<Value>) -> ParsedDocument {
        ParsedDocument {
            value,
            errors: self.errors,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t' | '\n' | '\r')) {
            self.bump();
        }
    }

    fn error(&mut self, message: impl Into<String>) {
        let err = ParseError::new(message, self.line, self.column);
        self.errors.push(err);
    }

    // ------------------------------------------------------------------------
    // Values
    // ------------------------------------------------------------------------

    fn parse_value(&mut self) -> Option<Value> {
        self.skip_ws();
        match self.peek() {
            // Left unconsumed so the caller's recovery skips the whole subtree.
            Some('{' | '[') if self.depth == MAX_DEPTH => {
                self.error(format!("Nesting too deep, limit is {MAX_DEPTH}"));
                None
            }
            Some('{') => {
                self.bump();
                self.depth += 1;
                let map = self.parse_object();
                self.depth -= 1;
                Some(Value::Map(map))
            }
            Some('[') => {
                self.bump();
                self.depth += 1;
                let list = self.parse_array();
                self.depth -= 1;
                Some(Value::List(list))
            }
            Some('"') => self.parse_string().map(Value::String),
            Some(c) if c == '-' || c.is_ascii_digit() => self.parse_number(),
            Some('t') => self.parse_literal("true", Value::Bool(true)),
            Some('f') => self.parse_literal("false", Value::Bool(false)),
            Some('n') => self.parse_literal("null", Value::Null),
            Some(c) => {
                self.error(format!("Expected a value, found '{c}'"));
                None
            }
            None => {
                self.error("Unexpected end of input, expected a value");
                None
            }
        }
    }

    fn parse_object(&mut self) -> JsonMap {
        let map = JsonMap::new();
        self.skip_ws();
        if self.eat('}') {
            return map;
        }

        loop {
            self.skip_ws();
            let recovering = match self.parse_member() {
                Some((key, value)) => {
                    map.insert_fresh(key, value);
                    false
                }
                None => {
                    self.recover('}');
                    true
                }
            };
            if !self.separator('}', recovering) {
                return map;
            }
        }
    }

    fn parse_member(&mut self) -> Option<(String, Value)> {
        match self.peek() {
            Some('"') => {}
            Some(c) => {
                self.error(format!("Expected a string key, found '{c}'"));
                return None;
            }
            None => {
                self.error("Unexpected end of input, expected '}'");
                return None;
            }
        }
        let key = self.parse_string()?;
        self.skip_ws();
        if !self.eat(':') {
            self.error(format!("Expected ':' after key \"{key}\""));
            return None;
        }
        let value = self.parse_value()?;
        Some((key, value))
    }

    fn parse_array(&mut self) -> JsonList {
        let list = JsonList::new();
        self.skip_ws();
        if self.eat(']') {
            return list;
        }

        loop {
            let recovering = match self.parse_value() {
                Some(value) => {
                    list.push_fresh(value);
                    false
                }
                None => {
                    self.recover(']');
                    true
                }
            };
            if !self.separator(']', recovering) {
                return list;
            }
        }
    }

    /// Consume the separator after a container element.
    ///
    /// Returns `true` when another element follows. While recovering, the
    /// error that triggered recovery has already been reported, so no second
    /// error is recorded for the same spot.
    fn separator(&mut self, closer: char, recovering: bool) -> bool {
        self.skip_ws();
        match self.peek() {
            Some(',') => {
                self.bump();
                true
            }
            Some(c) if c == closer => {
                self.bump();
                false
            }
            Some('}' | ']') => {
                // Closer of an enclosing container; leave it for the caller.
                if !recovering {
                    self.error(format!("Expected ',' or '{closer}'"));
                }
                false
            }
            Some(c) => {
                if !recovering {
                    self.error(format!("Expected ',' or '{closer}', found '{c}'"));
                }
                self.recover(closer);
                self.separator(closer, true)
            }
            None => {
                if !recovering {
                    self.error(format!("Unexpected end of input, expected '{closer}'"));
                }
                false
            }
        }
    }

    /// Skip to the next `,` or closing bracket at the current nesting level
    fn recover(&mut self, closer: char) {
        let mut depth = 0usize;
        while let Some(c) = self.peek() {
            match c {
                '"' => {
                    self.skip_string_raw();
                    continue;
                }
                '{' | '[' => depth += 1,
                '}' | ']' if depth == 0 => return,
                '}' | ']' => depth -= 1,
                ',' if depth == 0 => return,
                c if c == closer && depth == 0 => return,
                _ => {}
            }
            self.bump();
        }
    }

    fn skip_string_raw(&mut self) {
        self.bump();
        while let Some(c) = self.bump() {
            match c {
                '\\' => {
                    self.bump();
                }
                '"' => return,
                _ => {}
            }
        }
    }

    // ------------------------------------------------------------------------
    // Scalars
    // ------------------------------------------------------------------------

    fn parse_string(&mut self) -> Option<String> {
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None => {
                    self.error("Unterminated string");
                    return None;
                }
                Some('"') => return Some(out),
                Some('\\') => {
                    let c = self.parse_escape()?;
                    out.push(c);
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn parse_escape(&mut self) -> Option<char> {
        match self.bump() {
            Some('"') => Some('"'),
            Some('\\') => Some('\\'),
            Some('/') => Some('/'),
            Some('b') => Some('\u{0008}'),
            Some('f') => Some('\u{000c}'),
            Some('n') => Some('\n'),
            Some('r') => Some('\r'),
            Some('t') => Some('\t'),
            Some('u') => {
                let high = self.parse_hex4()?;
                if (0xD800..0xDC00).contains(&high) {
                    if self.peek() == Some('\\') && self.chars.get(self.pos + 1) == Some(&'u') {
                        self.bump();
                        self.bump();
                        let low = self.parse_hex4()?;
                        if !(0xDC00..0xE000).contains(&low) {
                            return Some('\u{fffd}');
                        }
                        let combined = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                        return Some(char::from_u32(combined).unwrap_or('\u{fffd}'));
                    }
                    return Some('\u{fffd}');
                }
                Some(char::from_u32(high).unwrap_or('\u{fffd}'))
            }
            Some(c) => {
                self.error(format!("Invalid escape sequence '\\{c}'"));
                None
            }
            None => {
                self.error("Unterminated string");
                None
            }
        }
    }

    fn parse_hex4(&mut self) -> Option<u32> {
        let mut code = 0u32;
        for _ in 0..4 {
            match self.peek().and_then(|c| c.to_digit(16)) {
                Some(digit) => {
                    self.bump();
                    code = code * 16 + digit;
                }
                None => {
                    self.error("Invalid unicode escape");
                    return None;
                }
            }
        }
        Some(code)
    }

    fn parse_number(&mut self) -> Option<Value> {
        let (line, column) = (self.line, self.column);
        let mut lexeme = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E') {
                lexeme.push(c);
                self.bump();
            } else {
                break;
            }
        }
        match serde_json::from_str::<serde_json::Number>(&lexeme) {
            Ok(n) => Some(Value::Number(n)),
            // Valid but beyond f64: clamp to the largest finite value.
            Err(e) if e.to_string().starts_with("number out of range") => {
                let sign = if lexeme.starts_with('-') { -1.0 } else { 1.0 };
                serde_json::Number::from_f64(f64::MAX * sign).map(Value::Number)
            }
            Err(_) => {
                self.errors
                    .push(ParseError::new(format!("Invalid number '{lexeme}'"), line, column));
                None
            }
        }
    }

    fn parse_literal(&mut self, word: &str, value: Value) -> Option<Value> {
        let (line, column) = (self.line, self.column);
        for expected in word.chars() {
            if self.peek() == Some(expected) {
                self.bump();
            } else {
                self.errors
                    .push(ParseError::new(format!("Invalid literal, expected '{word}'"), line, column));
                return None;
            }
        }
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_valid_document() {
        let doc = parse_document(r#"{"name": "string", "tags": ["a", 1, 2.5, true, null]}"#);
        assert!(doc.is_ok());

        let map = doc.value.unwrap().as_map().cloned().unwrap();
        assert_eq!(map.keys(), vec!["name", "tags"]);
        let tags = map.get("tags").unwrap();
        assert_eq!(tags.as_list().unwrap().len(), 5);
    }

    #[test]
    fn test_parse_keeps_key_order() {
        let doc = parse_document(r#"{"z": 1, "a": 2, "m": 3}"#);
        let map = doc.value.unwrap().as_map().cloned().unwrap();
        assert_eq!(map.keys(), vec!["z", "a", "m"]);
    }

    #[test]
    fn test_missing_value_recovers_siblings() {
        let doc = parse_document(r#"{"id": "int", "name": }"#);
        assert_eq!(doc.errors.len(), 1);
        let err = &doc.errors[0];
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 23);

        let map = doc.value.unwrap().as_map().cloned().unwrap();
        assert_eq!(map.keys(), vec!["id"]);
    }

    #[test]
    fn test_only_broken_member() {
        let doc = parse_document(r#"{"name": }"#);
        assert_eq!(doc.errors.len(), 1);
        assert_eq!(doc.errors[0].column, 10);
        assert!(doc.value.unwrap().as_map().unwrap().is_empty());
    }

    #[test]
    fn test_error_positions_track_lines() {
        let doc = parse_document("{\n  \"a\": 1,\n  \"b\": ?\n}");
        assert_eq!(doc.errors.len(), 1);
        assert_eq!(doc.errors[0].line, 3);
        assert_eq!(doc.errors[0].column, 8);
    }

    #[test]
    fn test_unterminated_object() {
        let doc = parse_document(r#"{"a": "string""#);
        assert_eq!(doc.errors.len(), 1);
        let map = doc.value.unwrap().as_map().cloned().unwrap();
        assert_eq!(map.get("a").unwrap().as_str(), Some("string"));
    }

    #[test]
    fn test_nested_recovery_stops_at_enclosing_closer() {
        let doc = parse_document(r#"{"a": [1, }"#);
        assert_eq!(doc.errors.len(), 1);
        let map = doc.value.unwrap().as_map().cloned().unwrap();
        assert_eq!(map.get("a").unwrap().as_list().unwrap().len(), 1);
    }

    #[test]
    fn test_trailing_characters() {
        let doc = parse_document("[1, 2] x");
        assert_eq!(doc.errors.len(), 1);
        assert!(doc.value.is_some());
    }

    #[test]
    fn test_empty_document() {
        let doc = parse_document("   ");
        assert!(doc.value.is_none());
        assert_eq!(doc.errors.len(), 1);
        assert!(parse_strict("").is_err());
    }

    #[test]
    fn test_string_escapes() {
        let doc = parse_document(r#"["a\"b", "é", "😀", "tab\tend"]"#);
        assert!(doc.is_ok());
        let items = doc.value.unwrap().as_list().unwrap().items();
        assert_eq!(items[0].as_str(), Some("a\"b"));
        assert_eq!(items[1].as_str(), Some("é"));
        assert_eq!(items[2].as_str(), Some("😀"));
        assert_eq!(items[3].as_str(), Some("tab\tend"));
    }

    #[test]
    fn test_invalid_number() {
        let doc = parse_document(r#"{"a": 01, "b": 2}"#);
        assert_eq!(doc.errors.len(), 1);
        let map = doc.value.unwrap().as_map().cloned().unwrap();
        assert_eq!(map.keys(), vec!["b"]);
    }

    #[test]
    fn test_deep_nesting_is_cut_off() {
        let text = "[".repeat(100_000) + &"]".repeat(100_000);
        let doc = parse_document(&text);

        assert_eq!(doc.errors.len(), 1);
        assert!(doc.errors[0].message.contains("too deep"));
        assert_eq!(doc.errors[0].column, MAX_DEPTH + 1);

        let mut depth = 0;
        let mut current = doc.value;
        while let Some(Value::List(list)) = current {
            depth += 1;
            current = list.get(0);
        }
        assert_eq!(depth, MAX_DEPTH);
    }

    #[test]
    fn test_deep_nesting_keeps_siblings() {
        let deep = "[".repeat(300) + &"]".repeat(300);
        let doc = parse_document(&format!(r#"{{"deep": {deep}, "after": 1}}"#));

        assert_eq!(doc.errors.len(), 1);
        let map = doc.value.unwrap().as_map().cloned().unwrap();
        assert_eq!(map.keys(), vec!["deep", "after"]);
    }

    #[test]
    fn test_out_of_range_number_clamps() {
        let doc = parse_document("[1e400, -1e400, 1e-400]");
        assert!(doc.is_ok());
        let items = doc.value.unwrap().as_list().unwrap().items();
        let floats: Vec<f64> = items
            .iter()
            .map(|item| match item {
                Value::Number(n) => n.as_f64().unwrap(),
                other => panic!("unexpected value: {other:?}"),
            })
            .collect();
        assert_eq!(floats, vec![f64::MAX, -f64::MAX, 0.0]);
    }

    #[test]
    fn test_parse_strict_reports_errors() {
        let err = parse_strict(r#"{"name": }"#).unwrap_err();
        match err {
            Error::Parse { errors } => assert_eq!(errors.len(), 1),
            other => panic!("unexpected error: {other}"),
        }
    }
}
