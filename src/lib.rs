// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # jschema-types
//!
//! Infers named struct, enum and list types from JSON sample documents and
//! the annotated JSchema dialect, and exposes every inferred type as a
//! reflective model: typed properties, constructors and convenience methods
//! for parsing, serializing and navigating instances.
//!
//! ## Features
//!
//! - **Type Inference**: Nested maps become dotted struct types, `__enum`
//!   maps become enums, root lists become list wrappers
//! - **Typedef Scopes**: `__typedefs` aliases visible to a struct and its descendants
//! - **Name Mapping**: Raw keys map to identifier-safe property names and back
//! - **Reflective Models**: Serializable property and method descriptors
//! - **Value Model**: Ordered maps and lists with parent links and auto-vivification
//! - **Fetching**: `get`/`post` over a pluggable HTTP transport
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use jschema_types::{SourceUnit, TypeLoader, Runtime, Result};
//!
//! fn main() -> Result<()> {
//!     let loader = TypeLoader::default();
//!     let registry = loader.rebuild(&[SourceUnit::jschema(
//!         "acme.Widget",
//!         r#"{"name": "string", "tags": ["string"]}"#,
//!     )])?;
//!
//!     let runtime = Runtime::new(registry);
//!     let widget = runtime.parse("acme.Widget", r#"{"name": "bolt"}"#)?;
//!     println!("{}", jschema_types::value::to_compact(&widget)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! text ──► parser ──► Value ──► (json → jschema) ──► TypeInferrer ──► TypeRegistry
//!                                                                       │
//!                                   ┌───────────────────────────────────┤
//!                                   ▼                                   ▼
//!                            ModelGenerator                          Runtime
//!                          (TypeModel descriptors)       (parse/get/post, properties,
//!                                                          parent, descendents)
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the crate
pub mod error;

/// Common types and type aliases
pub mod types;

/// Loader configuration
pub mod config;

/// In-memory JSON value trees
pub mod value;

/// Recovering JSON text parser
pub mod parser;

/// Raw key to identifier mapping
pub mod naming;

/// Type inference and the type registry
pub mod schema;

/// Reflective models of inferred types
pub mod reflect;

/// HTTP transport for fetch methods
pub mod http;

/// Source units and directory discovery
pub mod loader;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::LoaderConfig;
pub use loader::{discover_sources, SourceUnit};
pub use reflect::{ModelGenerator, Runtime, TypeModel};
pub use schema::{InferredType, TypeLoader, TypeRegistry};
pub use value::{JsonList, JsonMap, Value};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
