//! Raw key ↔ identifier mapping
//!
//! Document keys are arbitrary strings. Properties and enum codes need
//! identifier-safe names, and within one struct (or one enum) two distinct
//! keys must never end up with the same name. [`NameMap`] keeps both
//! directions so the raw key used for storage is always recoverable.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static ILLEGAL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]").expect("identifier regex is valid"));

/// Words that cannot be used as bare identifiers
const RESERVED_WORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "crate",
    "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl",
    "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub",
    "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true", "try", "type",
    "typeof", "union", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

/// Check if a word is reserved
pub fn is_reserved(word: &str) -> bool {
    RESERVED_WORDS.contains(&word)
}

fn sanitize(raw: &str) -> String {
    let mut name = ILLEGAL_CHARS.replace_all(raw, "_").into_owned();
    if name.is_empty() {
        return "_".to_string();
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

/// Convert a raw key into an identifier-safe name.
///
/// Deterministic and independent of any other key; collisions are handled
/// by [`NameMap`].
pub fn to_identifier(raw: &str) -> String {
    let mut name = sanitize(raw);
    if is_reserved(&name) {
        name.push('_');
    }
    name
}

/// Convert an enum literal into its accessor code
pub fn to_enum_code(literal: &str) -> String {
    sanitize(literal).to_uppercase()
}

/// Derive disambiguated codes for an ordered list of enum literals
pub fn enum_codes<S: AsRef<str>>(literals: &[S]) -> Vec<String> {
    let mut taken = NameMap::new();
    literals
        .iter()
        .map(|lit| taken.insert_with(lit.as_ref(), to_enum_code))
        .collect()
}

/// Bidirectional raw key ↔ property name mapping for one struct
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameMap {
    by_raw: IndexMap<String, String>,
    by_name: HashMap<String, String>,
}

impl NameMap {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mapping for keys in order
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map = Self::new();
        for key in keys {
            map.insert(key.as_ref());
        }
        map
    }

    /// Register a raw key and return its property name.
    ///
    /// Registering the same key again returns the name it already has.
    pub fn insert(&mut self, raw: &str) -> String {
        self.insert_with(raw, to_identifier)
    }

    fn insert_with(&mut self, raw: &str, derive: fn(&str) -> String) -> String {
        if let Some(existing) = self.by_raw.get(raw) {
            return existing.clone();
        }
        let base = derive(raw);
        let mut candidate = base.clone();
        let mut suffix = 2;
        while self.by_name.contains_key(&candidate) {
            candidate = format!("{base}_{suffix}");
            suffix += 1;
        }
        self.by_raw.insert(raw.to_string(), candidate.clone());
        self.by_name.insert(candidate.clone(), raw.to_string());
        candidate
    }

    /// Property name for a raw key
    pub fn property_name(&self, raw: &str) -> Option<&str> {
        self.by_raw.get(raw).map(String::as_str)
    }

    /// Raw key for a property name
    pub fn raw_key(&self, property: &str) -> Option<&str> {
        self.by_name.get(property).map(String::as_str)
    }

    /// Number of mapped keys
    pub fn len(&self) -> usize {
        self.by_raw.len()
    }

    /// Check if no key was mapped
    pub fn is_empty(&self) -> bool {
        self.by_raw.is_empty()
    }

    /// `(raw key, property name)` pairs in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.by_raw.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case("name", "name" ; "plain key")]
    #[test_case("first-name", "first_name" ; "dash")]
    #[test_case("unit price", "unit_price" ; "space")]
    #[test_case("2fa", "_2fa" ; "leading digit")]
    #[test_case("", "_" ; "empty key")]
    #[test_case("type", "type_" ; "reserved word")]
    #[test_case("Self", "Self_" ; "reserved type word")]
    #[test_case("café", "caf_" ; "non ascii")]
    #[test_case("@id", "_id" ; "symbol prefix")]
    fn test_to_identifier(raw: &str, expected: &str) {
        assert_eq!(to_identifier(raw), expected);
    }

    #[test]
    fn test_collisions_get_suffixes() {
        let map = NameMap::from_keys(["a-b", "a b", "a_b", "a.b"]);
        assert_eq!(map.property_name("a-b"), Some("a_b"));
        assert_eq!(map.property_name("a b"), Some("a_b_2"));
        assert_eq!(map.property_name("a_b"), Some("a_b_3"));
        assert_eq!(map.property_name("a.b"), Some("a_b_4"));
    }

    #[test]
    fn test_suffix_skips_taken_names() {
        let map = NameMap::from_keys(["x_2", "x", "x!"]);
        assert_eq!(map.property_name("x_2"), Some("x_2"));
        assert_eq!(map.property_name("x"), Some("x"));
        assert_eq!(map.property_name("x!"), Some("x_3"));
    }

    #[test]
    fn test_bidirectional() {
        let map = NameMap::from_keys(["first name", "first_name", "type"]);
        for (raw, name) in map.iter() {
            assert_eq!(map.raw_key(name), Some(raw));
            assert_eq!(map.property_name(raw), Some(name));
        }
        assert_eq!(map.len(), 3);
        assert_eq!(map.raw_key("type_"), Some("type"));
        assert_eq!(map.raw_key("missing"), None);
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut map = NameMap::new();
        assert_eq!(map.insert("a-b"), "a_b");
        assert_eq!(map.insert("a-b"), "a_b");
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_enum_codes() {
        assert_eq!(to_enum_code("dark red"), "DARK_RED");
        assert_eq!(
            enum_codes(&["red", "RED", "in-stock", "2x"]),
            vec!["RED", "RED_2", "IN_STOCK", "_2X"]
        );
    }
}
