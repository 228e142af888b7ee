//! Reflective model module
//!
//! Turns inferred types into descriptor sets a host type system can expose,
//! and executes the operations those descriptors name.
//!
//! # Features
//!
//! - **Properties**: Typed, writable struct fields that auto-vivify on read
//! - **Enum Accessors**: Static, read-only values, one per literal
//! - **Production Methods**: `parse`, `parse(url)`, `get`, `post`
//! - **Instance Methods**: `write`, `prettyPrint`, `asJson`, `parent`, `descendents`
//! - **Serializable Descriptors**: Models render as JSON for hosts and the CLI

mod descriptors;
mod model;
mod runtime;

pub use descriptors::{
    MethodDescriptor, MethodKind, ParameterDescriptor, PropertyDescriptor, TypeModel,
    GENERIC_MAP, MAP_SEQUENCE,
};
pub use model::ModelGenerator;
pub use runtime::{stringify_args, Runtime};
