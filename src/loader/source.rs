//! Source units consumed by an inference pass

use crate::error::{Error, Result, ResultExt};
use crate::types::SourceKind;
use std::path::PathBuf;

/// Where the bytes of a source come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ByteSource {
    /// In-memory contents
    Bytes(Vec<u8>),
    /// File read when the pass reaches this source
    File(PathBuf),
}

impl ByteSource {
    /// Read the raw bytes
    pub fn read(&self) -> Result<Vec<u8>> {
        match self {
            ByteSource::Bytes(bytes) => Ok(bytes.clone()),
            ByteSource::File(path) => std::fs::read(path).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::FileNotFound {
                        path: path.display().to_string(),
                    }
                } else {
                    Error::Io(e)
                }
            }),
        }
    }
}

/// A named document to infer types from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    /// Dotted logical name, also the root type name
    pub name: String,
    pub kind: SourceKind,
    pub source: ByteSource,
}

impl SourceUnit {
    /// Create a source unit
    pub fn new(name: impl Into<String>, kind: SourceKind, source: ByteSource) -> Self {
        Self {
            name: name.into(),
            kind,
            source,
        }
    }

    /// In-memory JSchema source
    pub fn jschema(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name, SourceKind::JSchema, ByteSource::Bytes(text.into().into_bytes()))
    }

    /// In-memory plain JSON source
    pub fn json(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name, SourceKind::Json, ByteSource::Bytes(text.into().into_bytes()))
    }

    /// File-backed source
    pub fn file(name: impl Into<String>, kind: SourceKind, path: impl Into<PathBuf>) -> Self {
        Self::new(name, kind, ByteSource::File(path.into()))
    }

    /// Read the source as UTF-8 text
    pub fn read_text(&self) -> Result<String> {
        let bytes = self.source.read()?;
        String::from_utf8(bytes)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
            .with_context(|| format!("Source '{}' is not valid UTF-8", self.name))
    }
}
