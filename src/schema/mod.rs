//! Schema inference module
//!
//! Derives named types from JSchema and plain JSON sample documents.
//!
//! # Features
//!
//! - **Struct Inference**: Nested maps become dotted struct types
//! - **Enums**: Maps carrying the enum marker become enum types
//! - **List Wrappers**: Root lists become wrapper types around `<root>.Element`
//! - **Typedef Scopes**: Lexically scoped aliases, inner shadows outer
//! - **JSON Samples**: Plain JSON is converted to JSchema before inference
//! - **Registry Lifecycle**: One exclusive build, atomic publish

mod convert;
mod inference;
mod registry;
mod types;

pub use convert::{json_to_jschema, JSchemaConverter};
pub use inference::{infer_types, TypeInferrer, ELEMENT_SEGMENT};
pub use registry::{BuildGuard, TypeLoader, TypeRegistry};
pub use types::{
    namespace_of, Diagnostic, EnumType, EnumValue, FieldDescriptor, FieldType, InferredType,
    ListWrapperType, PrimitiveKind, StructType, TypeKind,
};
