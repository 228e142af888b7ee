//! Descriptor types handed to a host reflection system

use crate::types::AutoCreate;
use serde::{Deserialize, Serialize};

/// Declared type of a generic, untyped map
pub const GENERIC_MAP: &str = "map";

/// Declared type of a lazy sequence of generic maps
pub const MAP_SEQUENCE: &str = "iterable<map>";

/// A readable (and maybe writable) property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    /// Identifier-safe name
    pub name: String,
    /// Document key (field) or literal (enum value) behind the property
    pub raw_key: String,
    /// Declared type
    pub type_name: String,
    pub writable: bool,
    #[serde(rename = "static")]
    pub is_static: bool,
    /// What a read creates when the field is unset
    #[serde(default)]
    pub auto_create: AutoCreate,
}

/// A method parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    pub type_name: String,
    /// Default value, rendered as text; `None` means the argument is required
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl ParameterDescriptor {
    /// Create a required parameter
    pub fn required(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            default: None,
        }
    }

    /// Create a parameter with a default value
    pub fn optional(
        name: impl Into<String>,
        type_name: impl Into<String>,
        default: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            default: Some(default.into()),
        }
    }

    /// Check if the argument may be omitted
    pub fn is_optional(&self) -> bool {
        self.default.is_some()
    }
}

/// What a method does when called
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    /// Parse text and bind it to the type
    Parse,
    /// Fetch a URL and parse the body
    ParseUrl,
    /// HTTP GET and parse the body
    Get,
    /// HTTP POST and parse the body
    Post,
    /// Compact serialization
    Write,
    /// Indented serialization
    PrettyPrint,
    /// Untyped view of the instance
    AsJson,
    /// Nearest typed ancestor
    Parent,
    /// All descendant maps
    Descendents,
}

impl MethodKind {
    /// Name the host exposes the method under
    pub fn method_name(&self) -> &'static str {
        match self {
            MethodKind::Parse | MethodKind::ParseUrl => "parse",
            MethodKind::Get => "get",
            MethodKind::Post => "post",
            MethodKind::Write => "write",
            MethodKind::PrettyPrint => "prettyPrint",
            MethodKind::AsJson => "asJson",
            MethodKind::Parent => "parent",
            MethodKind::Descendents => "descendents",
        }
    }

    /// Check if the method produces a new instance
    pub fn is_production(&self) -> bool {
        matches!(
            self,
            MethodKind::Parse | MethodKind::ParseUrl | MethodKind::Get | MethodKind::Post
        )
    }
}

/// A callable method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    pub kind: MethodKind,
    pub parameters: Vec<ParameterDescriptor>,
    pub return_type: String,
    #[serde(rename = "static")]
    pub is_static: bool,
}

impl MethodDescriptor {
    /// Create a method named after its kind
    pub fn new(
        kind: MethodKind,
        parameters: Vec<ParameterDescriptor>,
        return_type: impl Into<String>,
        is_static: bool,
    ) -> Self {
        Self {
            name: kind.method_name().to_string(),
            kind,
            parameters,
            return_type: return_type.into(),
            is_static,
        }
    }

    /// Human readable signature, e.g. `prettyPrint(indent: int = 2) -> string`
    pub fn signature(&self) -> String {
        let params = self
            .parameters
            .iter()
            .map(|p| match &p.default {
                Some(default) => format!("{}: {} = {}", p.name, p.type_name, default),
                None => format!("{}: {}", p.name, p.type_name),
            })
            .collect::<Vec<_>>()
            .join(", ");
        let prefix = if self.is_static { "static " } else { "" };
        format!("{prefix}{}({params}) -> {}", self.name, self.return_type)
    }
}

/// Everything a host needs to expose one inferred type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeModel {
    pub type_name: String,
    /// `struct`, `enum` or `list_wrapper`
    pub kind: String,
    pub has_default_constructor: bool,
    pub properties: Vec<PropertyDescriptor>,
    pub methods: Vec<MethodDescriptor>,
}

impl TypeModel {
    /// Find a property by name
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Find the first method of a kind
    pub fn method(&self, kind: MethodKind) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.kind == kind)
    }

    /// All methods exposed under `name`
    pub fn methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MethodDescriptor> {
        self.methods.iter().filter(move |m| m.name == name)
    }
}
