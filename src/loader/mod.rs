//! Source loader module
//!
//! Turns a directory of schema files into the source units an inference
//! pass consumes.
//!
//! # Overview
//!
//! The loader module provides:
//! - `SourceUnit` - Logical name, kind and lazily read bytes
//! - `discover_sources` - Sorted directory walk with extension filtering
//! - Dotted name mapping with rejection of namespace-less names

mod discovery;
mod source;

pub use discovery::{classify, discover_sources, logical_name};
pub use source::{ByteSource, SourceUnit};

#[cfg(test)]
mod tests;
