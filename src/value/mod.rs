//! Value model module
//!
//! In-memory tree for parsed JSON documents.
//!
//! # Features
//!
//! - **Shared Nodes**: Maps and lists are reference-counted handles with identity
//! - **Parent Links**: Every container knows its parent through a weak reference
//! - **Type Binding**: Containers carry the inferred type they were bound to
//! - **Auto-vivification**: Unset fields can be created on read and stay attached
//! - **Descendant Walks**: Lazy, restartable depth-first iteration over maps
//! - **Serialization**: Compact or indented canonical JSON text

mod node;
mod serialize;

pub use node::{Descendants, JsonList, JsonMap, TypeRef, Value};
pub use serialize::{serialize, to_compact, to_pretty, DEFAULT_INDENT};
