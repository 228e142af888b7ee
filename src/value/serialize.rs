//! Canonical JSON text rendering of value trees

use super::node::Value;
use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

/// Indent width used when indentation is requested without a width
pub const DEFAULT_INDENT: usize = 2;

/// Render a value tree as JSON text.
///
/// `None` produces the compact form without whitespace, `Some(n)` puts every
/// element on its own line indented by `n` spaces per nesting level.
pub fn serialize(value: &Value, indent: Option<usize>) -> Result<String> {
    let json = value.to_serde();
    match indent {
        None => Ok(serde_json::to_string(&json)?),
        Some(width) => {
            let indent = " ".repeat(width);
            let mut buf = Vec::new();
            let formatter = PrettyFormatter::with_indent(indent.as_bytes());
            let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
            json.serialize(&mut serializer)?;
            String::from_utf8(buf)
                .map_err(|e| Error::Other(format!("Serializer produced invalid UTF-8: {e}")))
        }
    }
}

/// Compact rendering
pub fn to_compact(value: &Value) -> Result<String> {
    serialize(value, None)
}

/// Indented rendering, `DEFAULT_INDENT` spaces when `indent` is `None`
pub fn to_pretty(value: &Value, indent: Option<usize>) -> Result<String> {
    serialize(value, Some(indent.unwrap_or(DEFAULT_INDENT)))
}
