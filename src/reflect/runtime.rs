//! Executes the operations described by a [`TypeModel`](super::TypeModel)
//!
//! Instances are plain value trees; binding attaches the inferred types of
//! one registry snapshot to every map and list the type graph reaches.

use crate::error::{Error, Result};
use crate::http::HttpTransport;
use crate::parser::parse_strict;
use crate::schema::{EnumValue, FieldDescriptor, FieldType, InferredType, TypeKind, TypeRegistry};
use crate::types::{StringMap, ValueMap};
use crate::value::{to_compact, to_pretty, Descendants, JsonMap, TypeRef, Value};
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Runs model operations against one registry snapshot
#[derive(Debug, Clone)]
pub struct Runtime {
    registry: Arc<TypeRegistry>,
}

impl Runtime {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self { registry }
    }

    /// Registry snapshot this runtime binds against
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    // ========================================================================
    // Construction
    // ========================================================================

    /// Default constructor: an empty map typed as the struct `type_name`
    pub fn new_instance(&self, type_name: &str) -> Result<JsonMap> {
        let ty = self.registry.require(type_name)?;
        if !ty.is_struct() {
            return Err(Error::type_mismatch(type_name, "a struct type"));
        }
        Ok(JsonMap::with_type(ty))
    }

    /// Parse `text` and bind the result to `type_name`
    pub fn parse(&self, type_name: &str, text: &str) -> Result<Value> {
        let ty = self.registry.require(type_name)?;
        let value = parse_strict(text)?;
        match (&ty.kind, &value) {
            (TypeKind::Struct(_), Value::Map(_)) | (TypeKind::ListWrapper(_), Value::List(_)) => {
                self.bind(&value, &ty);
                Ok(value)
            }
            (TypeKind::Struct(_), _) => Err(Error::type_mismatch(type_name, "a JSON object")),
            (TypeKind::ListWrapper(_), _) => Err(Error::type_mismatch(type_name, "a JSON array")),
            (TypeKind::Enum(_), _) => Err(Error::type_mismatch(
                type_name,
                "a struct or list wrapper type",
            )),
        }
    }

    /// Fetch `url` and parse the body as `type_name`
    pub async fn parse_url(
        &self,
        transport: &dyn HttpTransport,
        type_name: &str,
        url: &str,
    ) -> Result<Value> {
        self.get(transport, type_name, url, None).await
    }

    /// HTTP GET with `args` as query parameters, parsed as `type_name`
    pub async fn get(
        &self,
        transport: &dyn HttpTransport,
        type_name: &str,
        url: &str,
        args: Option<&ValueMap>,
    ) -> Result<Value> {
        self.registry.require(type_name)?;
        let url = Url::parse(url)?;
        let args = stringify_args(args);
        debug!("GET {} as {}", url, type_name);
        let body = transport.get_text(url.as_str(), &args).await?;
        self.parse(type_name, &body)
    }

    /// HTTP POST with `args` form-encoded, parsed as `type_name`
    pub async fn post(
        &self,
        transport: &dyn HttpTransport,
        type_name: &str,
        url: &str,
        args: Option<&ValueMap>,
    ) -> Result<Value> {
        self.registry.require(type_name)?;
        let url = Url::parse(url)?;
        let args = stringify_args(args);
        debug!("POST {} as {}", url, type_name);
        let body = transport.post_form(url.as_str(), &args).await?;
        self.parse(type_name, &body)
    }

    // ========================================================================
    // Instance methods
    // ========================================================================

    /// Compact serialization
    pub fn write(&self, instance: &JsonMap) -> Result<String> {
        to_compact(&Value::Map(instance.clone()))
    }

    /// Indented serialization, 2 spaces per level unless `indent` is given
    pub fn pretty_print(&self, instance: &JsonMap, indent: Option<usize>) -> Result<String> {
        to_pretty(&Value::Map(instance.clone()), indent)
    }

    /// Untyped view of the same node
    pub fn as_json(&self, instance: &JsonMap) -> JsonMap {
        instance.clone()
    }

    /// Nearest ancestor map bound to a struct type, else the nearest map
    pub fn parent(&self, instance: &JsonMap) -> Option<JsonMap> {
        let mut fallback = None;
        let mut current = instance.parent();
        while let Some(node) = current {
            if let Value::Map(map) = &node {
                if map.is_struct_typed() {
                    return Some(map.clone());
                }
                if fallback.is_none() {
                    fallback = Some(map.clone());
                }
            }
            current = node.parent();
        }
        fallback
    }

    /// All descendant maps, depth first in document order
    pub fn descendents(&self, instance: &JsonMap) -> Descendants {
        instance.descendants()
    }

    // ========================================================================
    // Properties
    // ========================================================================

    /// Read a property, creating the default container when it is unset
    pub fn get_property(&self, instance: &JsonMap, property: &str) -> Result<Option<Value>> {
        let ty = self.struct_of(instance)?;
        let field = field_of(&ty, property)?;
        let attached = field
            .field_type
            .named_type()
            .and_then(|name| self.registry.get(name));
        Ok(instance.get_or_create(&field.raw_key, field.auto_create, attached))
    }

    /// Write a property, binding the value to the field's type
    pub fn set_property(
        &self,
        instance: &JsonMap,
        property: &str,
        value: Value,
    ) -> Result<Option<Value>> {
        let ty = self.struct_of(instance)?;
        let field = field_of(&ty, property)?;
        self.bind_field(&value, &field.field_type);
        instance.put(field.raw_key, value)
    }

    /// Static enum accessor
    pub fn enum_value(&self, type_name: &str, code: &str) -> Result<EnumValue> {
        let ty = self.registry.require(type_name)?;
        let en = ty
            .as_enum()
            .ok_or_else(|| Error::type_mismatch(type_name, "an enum type"))?;
        en.by_code(code)
            .cloned()
            .ok_or_else(|| Error::unknown_property(type_name, code))
    }

    /// Enum accessors are read-only; this always fails
    pub fn set_enum_value(&self, type_name: &str, code: &str) -> Result<()> {
        self.enum_value(type_name, code)?;
        Err(Error::ReadOnlyProperty {
            type_name: type_name.to_string(),
            property: code.to_string(),
        })
    }

    // ========================================================================
    // Binding
    // ========================================================================

    /// Attach `ty` to `value` and the types of its fields to its children
    pub fn bind(&self, value: &Value, ty: &TypeRef) {
        match (&ty.kind, value) {
            (TypeKind::Struct(st), Value::Map(map)) => {
                map.set_type(Some(ty.clone()));
                for field in &st.fields {
                    if let Some(child) = map.get(&field.raw_key) {
                        self.bind_field(&child, &field.field_type);
                    }
                }
            }
            (TypeKind::ListWrapper(wrapper), Value::List(list)) => {
                list.set_type(Some(ty.clone()));
                let element = list_level(wrapper.wrap_depth, &wrapper.element);
                for item in list.items() {
                    self.bind_field(&item, &element);
                }
            }
            _ => {}
        }
    }

    fn bind_field(&self, value: &Value, field_type: &FieldType) {
        match field_type {
            FieldType::Named { name } => {
                if let Some(ty) = self.registry.get(name) {
                    self.bind(value, &ty);
                }
            }
            FieldType::List { depth, element } => {
                if let Value::List(list) = value {
                    let inner = list_level(*depth, element);
                    for item in list.items() {
                        self.bind_field(&item, &inner);
                    }
                }
            }
            FieldType::MapOf { value: inner } => {
                if let Value::Map(map) = value {
                    for (_, child) in map.entries() {
                        self.bind_field(&child, inner);
                    }
                }
            }
            FieldType::Primitive { .. } => {}
        }
    }

    fn struct_of(&self, instance: &JsonMap) -> Result<TypeRef> {
        match instance.ty() {
            Some(ty) if ty.is_struct() => Ok(ty),
            Some(ty) => Err(Error::type_mismatch(&ty.name, "a struct type")),
            None => Err(Error::type_mismatch("map", "an instance bound to a struct type")),
        }
    }
}

fn field_of(ty: &InferredType, property: &str) -> Result<FieldDescriptor> {
    ty.as_struct()
        .and_then(|st| st.field_by_property(property))
        .cloned()
        .ok_or_else(|| Error::unknown_property(&ty.name, property))
}

/// Type of the items one level inside a `depth`-deep list
fn list_level(depth: usize, element: &FieldType) -> FieldType {
    if depth > 1 {
        FieldType::list(depth - 1, element.clone())
    } else {
        element.clone()
    }
}

/// Render argument values as strings; strings stay unquoted
pub fn stringify_args(args: Option<&ValueMap>) -> StringMap {
    args.map(|args| {
        args.iter()
            .map(|(key, value)| {
                let text = match value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (key.clone(), text)
            })
            .collect()
    })
    .unwrap_or_default()
}
