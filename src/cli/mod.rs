//! CLI module
//!
//! Command-line interface for inspecting inferred types.
//!
//! # Commands
//!
//! - `types` - List the types inferred from a schema directory
//! - `describe` - Show the reflective model of one type
//! - `format` - Re-serialize a JSON document, compact or indented
//! - `fetch` - GET or POST a URL and parse the response as a type

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
