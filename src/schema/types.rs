//! Inferred type definitions

use crate::error::ParseError;
use crate::types::AutoCreate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ============================================================================
// Primitive Kinds
// ============================================================================

/// Scalar classification of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    String,
    Integer,
    Number,
    Boolean,
    BigInteger,
    BigDecimal,
    Date,
    Uri,
    /// Untyped JSON value
    Any,
}

impl PrimitiveKind {
    /// Look up a JSchema scalar type name
    pub fn from_type_name(name: &str) -> Option<Self> {
        let kind = match name.to_ascii_lowercase().as_str() {
            "string" => PrimitiveKind::String,
            "int" | "integer" => PrimitiveKind::Integer,
            "number" | "decimal" => PrimitiveKind::Number,
            "boolean" | "bool" => PrimitiveKind::Boolean,
            "biginteger" => PrimitiveKind::BigInteger,
            "bigdecimal" => PrimitiveKind::BigDecimal,
            "date" => PrimitiveKind::Date,
            "uri" => PrimitiveKind::Uri,
            "object" | "*" | "any" => PrimitiveKind::Any,
            _ => return None,
        };
        Some(kind)
    }

    /// Canonical type name
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveKind::String => "string",
            PrimitiveKind::Integer => "integer",
            PrimitiveKind::Number => "number",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::BigInteger => "biginteger",
            PrimitiveKind::BigDecimal => "bigdecimal",
            PrimitiveKind::Date => "date",
            PrimitiveKind::Uri => "uri",
            PrimitiveKind::Any => "any",
        }
    }
}

impl std::fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Field Types
// ============================================================================

/// Resolved type of a struct field or list element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldType {
    /// Scalar value
    Primitive { primitive: PrimitiveKind },
    /// Reference to a registered type by full name
    Named { name: String },
    /// Nested list `depth` levels deep around `element`
    List {
        depth: usize,
        element: Box<FieldType>,
    },
    /// String-keyed map whose values share one type
    MapOf { value: Box<FieldType> },
}

impl FieldType {
    /// Create a primitive field type
    pub fn primitive(kind: PrimitiveKind) -> Self {
        FieldType::Primitive { primitive: kind }
    }

    /// Create a named field type
    pub fn named(name: impl Into<String>) -> Self {
        FieldType::Named { name: name.into() }
    }

    /// The untyped field type
    pub fn any() -> Self {
        Self::primitive(PrimitiveKind::Any)
    }

    /// Wrap `element` in `depth` list levels
    pub fn list(depth: usize, element: FieldType) -> Self {
        FieldType::List {
            depth,
            element: Box::new(element),
        }
    }

    /// Map-of type with the given value type
    pub fn map_of(value: FieldType) -> Self {
        FieldType::MapOf {
            value: Box::new(value),
        }
    }

    /// Name of the referenced type, if any
    pub fn named_type(&self) -> Option<&str> {
        match self {
            FieldType::Named { name } => Some(name),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::Primitive { primitive } => write!(f, "{primitive}"),
            FieldType::Named { name } => f.write_str(name),
            FieldType::List { depth, element } => {
                for _ in 0..*depth {
                    f.write_str("list<")?;
                }
                write!(f, "{element}")?;
                for _ in 0..*depth {
                    f.write_str(">")?;
                }
                Ok(())
            }
            FieldType::MapOf { value } => write!(f, "map<string, {value}>"),
        }
    }
}

/// One field of a struct type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Key used in documents
    pub raw_key: String,
    /// Identifier-safe name
    pub property_name: String,
    /// Resolved type
    pub field_type: FieldType,
    /// What to create when the field is read while unset
    #[serde(default)]
    pub auto_create: AutoCreate,
}

// ============================================================================
// Type Kinds
// ============================================================================

/// Struct shape: ordered fields plus the typedefs visible to it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructType {
    pub fields: Vec<FieldDescriptor>,
    /// Alias → fully qualified type (or primitive) name, inner shadows outer
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub typedefs: IndexMap<String, String>,
}

impl StructType {
    /// Find a field by raw document key
    pub fn field(&self, raw_key: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.raw_key == raw_key)
    }

    /// Find a field by property name
    pub fn field_by_property(&self, property: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.property_name == property)
    }

    /// Check if `type_name` is the target of one of this struct's typedefs
    pub fn is_typedef_target(&self, type_name: &str) -> bool {
        self.typedefs.values().any(|t| t == type_name)
    }
}

/// A single enumerated literal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    /// Accessor name
    pub code: String,
    /// Literal as it appears in documents
    pub literal: String,
}

/// Enum shape
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumType {
    pub values: Vec<EnumValue>,
}

impl EnumType {
    /// Find a value by code
    pub fn by_code(&self, code: &str) -> Option<&EnumValue> {
        self.values.iter().find(|v| v.code == code)
    }
}

/// List wrapper shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListWrapperType {
    /// Array levels unwrapped to reach the element
    pub wrap_depth: usize,
    pub element: FieldType,
}

/// Shape of an inferred type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeKind {
    Struct(StructType),
    Enum(EnumType),
    ListWrapper(ListWrapperType),
}

impl TypeKind {
    /// Short name of the kind
    pub fn label(&self) -> &'static str {
        match self {
            TypeKind::Struct(_) => "struct",
            TypeKind::Enum(_) => "enum",
            TypeKind::ListWrapper(_) => "list_wrapper",
        }
    }
}

// ============================================================================
// Diagnostics
// ============================================================================

/// A problem recorded while producing a type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Source text could not be fully parsed
    Parse(ParseError),
    /// Source could not be read
    Io { error: ParseError },
    /// This type replaced one registered earlier under the same name
    NameCollision {
        name: String,
        previous_source: Option<String>,
    },
    /// A field references a type that does not exist
    UnresolvedType { field: String, type_name: String },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::Parse(err) => write!(f, "parse error: {err}"),
            Diagnostic::Io { error } => write!(f, "io error: {error}"),
            Diagnostic::NameCollision {
                name,
                previous_source,
            } => match previous_source {
                Some(source) => write!(f, "type '{name}' replaces the one from '{source}'"),
                None => write!(f, "type '{name}' replaces an earlier definition"),
            },
            Diagnostic::UnresolvedType { field, type_name } => {
                write!(f, "field '{field}' references unknown type '{type_name}'")
            }
        }
    }
}

// ============================================================================
// Inferred Type
// ============================================================================

/// A named type produced by inference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferredType {
    /// Dotted full name
    pub name: String,
    #[serde(flatten)]
    pub kind: TypeKind,
    /// Logical name of the source that produced this type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Full names of the types nested directly under this one
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inner_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl InferredType {
    /// Create a type with no source and no diagnostics
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            source: None,
            inner_types: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Create an empty struct type
    pub fn empty_struct(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Struct(StructType::default()))
    }

    /// Everything before the last dot
    pub fn namespace(&self) -> Option<&str> {
        namespace_of(&self.name)
    }

    /// Last dotted segment
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    pub fn as_struct(&self) -> Option<&StructType> {
        match &self.kind {
            TypeKind::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumType> {
        match &self.kind {
            TypeKind::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_list_wrapper(&self) -> Option<&ListWrapperType> {
        match &self.kind {
            TypeKind::ListWrapper(l) => Some(l),
            _ => None,
        }
    }

    pub fn is_struct(&self) -> bool {
        matches!(self.kind, TypeKind::Struct(_))
    }
}

/// Namespace part of a dotted name
pub fn namespace_of(name: &str) -> Option<&str> {
    name.rfind('.').map(|idx| &name[..idx])
}
