//! Type inference over value trees
//!
//! [`TypeInferrer`] walks parsed documents and collects named types. Nested
//! maps become struct types named after their path (`Root.address`), lists
//! are transparent except at the document root where they produce a list
//! wrapper, and the typedefs marker opens a lexical alias scope.
//!
//! Field types are derived when the owning struct is registered; references
//! to other types are resolved in [`TypeInferrer::finish`] once every source
//! has been seen.

use super::registry::TypeRegistry;
use super::types::{
    namespace_of, Diagnostic, EnumType, EnumValue, FieldDescriptor, FieldType, InferredType,
    ListWrapperType, PrimitiveKind, StructType, TypeKind,
};
use crate::config::SchemaMarkers;
use crate::error::ParseError;
use crate::naming::{enum_codes, NameMap};
use crate::types::AutoCreate;
use crate::value::{JsonMap, Value};
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Name segment used for the element type of a root list
pub const ELEMENT_SEGMENT: &str = "Element";

type Scope = IndexMap<String, String>;

/// Collects inferred types across one or more sources
#[derive(Debug)]
pub struct TypeInferrer {
    markers: SchemaMarkers,
    types: IndexMap<String, InferredType>,
    files: IndexMap<String, Vec<String>>,
    scopes: Vec<Scope>,
    source: Option<String>,
}

impl Default for TypeInferrer {
    fn default() -> Self {
        Self::new(SchemaMarkers::default())
    }
}

impl TypeInferrer {
    /// Create an inferrer recognising the given marker keys
    pub fn new(markers: SchemaMarkers) -> Self {
        Self {
            markers,
            types: IndexMap::new(),
            files: IndexMap::new(),
            scopes: Vec::new(),
            source: None,
        }
    }

    /// Infer every type of one source document.
    ///
    /// `value` is whatever the parser recovered; `errors` are attached to
    /// the root type, which is created empty if the document produced none.
    pub fn infer_source(&mut self, source: &str, value: Option<&Value>, errors: Vec<ParseError>) {
        debug!("Inferring types from source '{}'", source);
        self.source = Some(source.to_string());
        self.files.entry(source.to_string()).or_default();

        if let Some(value) = value {
            self.infer_root(value, source);
        }
        if !self.types.contains_key(source) {
            self.register(InferredType::empty_struct(source));
        }
        if let Some(root) = self.types.get_mut(source) {
            root.diagnostics
                .extend(errors.into_iter().map(Diagnostic::Parse));
        }
        self.source = None;
    }

    /// Record a source that could not be read at all
    pub fn add_unreadable(&mut self, source: &str, message: impl Into<String>) {
        let message = message.into();
        warn!("Unable to read source '{}': {}", source, message);
        self.source = Some(source.to_string());
        self.files.entry(source.to_string()).or_default();

        let mut ty = InferredType::empty_struct(source);
        ty.diagnostics.push(Diagnostic::Io {
            error: ParseError::new(message, 0, 0),
        });
        self.register(ty);
        self.source = None;
    }

    /// Infer types for a root value under `root_name`
    pub fn infer_root(&mut self, value: &Value, root_name: &str) {
        if !matches!(value, Value::List(_)) {
            self.infer_value(value, root_name);
            return;
        }

        let mut depth = 0;
        let mut innermost = value.clone();
        while let Some(first) = first_item(&innermost) {
            depth += 1;
            innermost = first;
        }

        let element_name = format!("{root_name}.{ELEMENT_SEGMENT}");
        let element = if matches!(innermost, Value::List(_)) {
            FieldType::any()
        } else {
            self.infer_value(&innermost, &element_name);
            let scope = self.flattened_scope();
            self.field_type(&innermost, &element_name, &scope)
        };

        self.register(InferredType::new(
            root_name,
            TypeKind::ListWrapper(ListWrapperType {
                wrap_depth: depth,
                element,
            }),
        ));
    }

    // ------------------------------------------------------------------------
    // Tree walk
    // ------------------------------------------------------------------------

    fn infer_value(&mut self, value: &Value, name: &str) {
        match value {
            Value::Map(map) => self.infer_map(map, name),
            Value::List(_) => {
                let mut current = value.clone();
                while let Some(first) = first_item(&current) {
                    current = first;
                }
                if let Value::Map(map) = &current {
                    self.infer_map(map, name);
                }
            }
            _ => {}
        }
    }

    fn infer_map(&mut self, map: &JsonMap, name: &str) {
        if let Some(literals) = map.get(&self.markers.enum_marker) {
            self.register_enum(name, &literals);
        } else if let Some(inner) = map.get(&self.markers.map_of_marker) {
            self.infer_value(&inner, name);
        } else {
            self.infer_struct(map, name);
        }
    }

    fn register_enum(&mut self, name: &str, literals: &Value) {
        let literals: Vec<String> = match literals {
            Value::List(list) => list.items().iter().map(literal_text).collect(),
            Value::Map(_) => Vec::new(),
            other => vec![literal_text(other)],
        };
        let values = enum_codes(&literals)
            .into_iter()
            .zip(literals)
            .map(|(code, literal)| EnumValue { code, literal })
            .collect();
        self.register(InferredType::new(name, TypeKind::Enum(EnumType { values })));
    }

    fn infer_struct(&mut self, map: &JsonMap, name: &str) {
        let mut segments = NameMap::new();
        let mut scope = Scope::new();
        let mut nested_defs = Vec::new();

        if let Some(Value::Map(defs)) = map.get(&self.markers.typedefs_marker) {
            for (alias, def) in defs.entries() {
                match def {
                    Value::String(target) => {
                        scope.insert(alias, target);
                    }
                    Value::Map(_) | Value::List(_) => {
                        let type_name = format!("{name}.{}", segments.insert(&alias));
                        scope.insert(alias, type_name.clone());
                        nested_defs.push((type_name, def));
                    }
                    _ => {}
                }
            }
        }

        self.scopes.push(scope);
        for (type_name, def) in &nested_defs {
            self.infer_value(def, type_name);
        }

        let mut properties = NameMap::new();
        let mut pending = Vec::new();
        for (key, value) in map.entries() {
            if key == self.markers.typedefs_marker {
                continue;
            }
            let property = properties.insert(&key);
            let child = format!("{name}.{}", segments.insert(&key));
            self.infer_value(&value, &child);
            pending.push((key, property, child, value));
        }

        let typedefs = self.flattened_scope();
        let fields = pending
            .into_iter()
            .map(|(raw_key, property_name, child, value)| FieldDescriptor {
                field_type: self.field_type(&value, &child, &typedefs),
                raw_key,
                property_name,
                auto_create: AutoCreate::None,
            })
            .collect();
        self.scopes.pop();

        self.register(InferredType::new(
            name,
            TypeKind::Struct(StructType { fields, typedefs }),
        ));
    }

    // ------------------------------------------------------------------------
    // Field typing
    // ------------------------------------------------------------------------

    /// Type of a sample value stored under `child` (its would-be type name)
    fn field_type(&self, value: &Value, child: &str, typedefs: &Scope) -> FieldType {
        match value {
            Value::String(s) => type_from_name(s, typedefs),
            Value::Number(n) => {
                if n.is_i64() || n.is_u64() {
                    FieldType::primitive(PrimitiveKind::Integer)
                } else {
                    FieldType::primitive(PrimitiveKind::Number)
                }
            }
            Value::Bool(_) => FieldType::primitive(PrimitiveKind::Boolean),
            Value::Null => FieldType::any(),
            Value::Map(map) => {
                if map.contains_key(&self.markers.enum_marker) {
                    FieldType::named(child)
                } else if let Some(inner) = map.get(&self.markers.map_of_marker) {
                    FieldType::map_of(self.field_type(&inner, child, typedefs))
                } else {
                    FieldType::named(child)
                }
            }
            Value::List(_) => {
                let mut depth = 0;
                let mut current = value.clone();
                while let Value::List(list) = &current {
                    depth += 1;
                    let Some(first) = list.get(0) else {
                        return FieldType::list(depth, FieldType::any());
                    };
                    current = first;
                }
                FieldType::list(depth, self.field_type(&current, child, typedefs))
            }
        }
    }

    fn flattened_scope(&self) -> Scope {
        let mut flat = Scope::new();
        for scope in &self.scopes {
            for (alias, target) in scope {
                flat.insert(alias.clone(), target.clone());
            }
        }
        flat
    }

    // ------------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------------

    fn register(&mut self, mut ty: InferredType) {
        ty.source = self.source.clone();
        if let Some(previous) = self.types.shift_remove(&ty.name) {
            warn!(
                "Type '{}' from {:?} replaces the definition from {:?}",
                ty.name, ty.source, previous.source
            );
            ty.diagnostics.push(Diagnostic::NameCollision {
                name: ty.name.clone(),
                previous_source: previous.source.clone(),
            });
            if let Some(source) = &previous.source {
                if let Some(names) = self.files.get_mut(source) {
                    names.retain(|n| n != &ty.name);
                }
            }
        }
        if let Some(source) = &self.source {
            self.files
                .entry(source.clone())
                .or_default()
                .push(ty.name.clone());
        }
        self.types.insert(ty.name.clone(), ty);
    }

    // ------------------------------------------------------------------------
    // Finishing pass
    // ------------------------------------------------------------------------

    /// Link inner types, resolve references and compute auto-create policies
    pub fn finish(self, generation: u64) -> TypeRegistry {
        let TypeInferrer {
            mut types, files, ..
        } = self;

        let names: Vec<String> = types.keys().cloned().collect();
        for name in &names {
            if let Some(outer) = namespace_of(name) {
                if let Some(outer_ty) = types.get_mut(outer) {
                    outer_ty.inner_types.push(name.clone());
                }
            }
        }

        let kinds: HashMap<String, KindTag> = types
            .iter()
            .map(|(name, ty)| (name.clone(), KindTag::of(&ty.kind)))
            .collect();

        for ty in types.values_mut() {
            let owner = ty.name.clone();
            let mut diagnostics = Vec::new();
            match &mut ty.kind {
                TypeKind::Struct(st) => {
                    for field in &mut st.fields {
                        resolve_field_type(
                            &mut field.field_type,
                            &owner,
                            &field.raw_key,
                            &kinds,
                            &mut diagnostics,
                        );
                        field.auto_create = auto_create_for(&field.field_type, &kinds);
                    }
                }
                TypeKind::ListWrapper(wrapper) => {
                    resolve_field_type(
                        &mut wrapper.element,
                        &owner,
                        ELEMENT_SEGMENT,
                        &kinds,
                        &mut diagnostics,
                    );
                }
                TypeKind::Enum(_) => {}
            }
            ty.diagnostics.extend(diagnostics);
        }

        TypeRegistry::new(types, files, generation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KindTag {
    Struct,
    Enum,
    ListWrapper,
}

impl KindTag {
    fn of(kind: &TypeKind) -> Self {
        match kind {
            TypeKind::Struct(_) => KindTag::Struct,
            TypeKind::Enum(_) => KindTag::Enum,
            TypeKind::ListWrapper(_) => KindTag::ListWrapper,
        }
    }
}

fn first_item(value: &Value) -> Option<Value> {
    value.as_list().and_then(|list| list.get(0))
}

fn literal_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_serde().to_string(),
    }
}

/// Type of a type-name string, following typedef aliases
fn type_from_name(name: &str, typedefs: &Scope) -> FieldType {
    let mut current = name;
    let mut hops = 0;
    while let Some(target) = typedefs.get(current) {
        if target == current || hops > typedefs.len() {
            break;
        }
        current = target;
        hops += 1;
    }
    match PrimitiveKind::from_type_name(current) {
        Some(kind) => FieldType::primitive(kind),
        None => FieldType::named(current),
    }
}

/// Resolve `name` as seen from the type `owner`: exact match first, then
/// relative to each enclosing namespace, innermost first
fn resolve_name(name: &str, owner: &str, kinds: &HashMap<String, KindTag>) -> Option<String> {
    if kinds.contains_key(name) {
        return Some(name.to_string());
    }
    let mut scope = Some(owner);
    while let Some(ns) = scope {
        let candidate = format!("{ns}.{name}");
        if kinds.contains_key(&candidate) {
            return Some(candidate);
        }
        scope = namespace_of(ns);
    }
    None
}

fn resolve_field_type(
    field_type: &mut FieldType,
    owner: &str,
    field: &str,
    kinds: &HashMap<String, KindTag>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match field_type {
        FieldType::Primitive { .. } => {}
        FieldType::Named { name } => match resolve_name(name, owner, kinds) {
            Some(resolved) => *name = resolved,
            None => {
                diagnostics.push(Diagnostic::UnresolvedType {
                    field: field.to_string(),
                    type_name: name.clone(),
                });
                *field_type = FieldType::any();
            }
        },
        FieldType::List { element, .. } => {
            resolve_field_type(element, owner, field, kinds, diagnostics);
        }
        FieldType::MapOf { value } => {
            resolve_field_type(value, owner, field, kinds, diagnostics);
        }
    }
}

fn auto_create_for(field_type: &FieldType, kinds: &HashMap<String, KindTag>) -> AutoCreate {
    match field_type {
        FieldType::Primitive { .. } => AutoCreate::None,
        FieldType::List { .. } => AutoCreate::EmptyList,
        FieldType::MapOf { .. } => AutoCreate::EmptyMap,
        FieldType::Named { name } => match kinds.get(name) {
            Some(KindTag::Struct) => AutoCreate::EmptyMap,
            Some(KindTag::ListWrapper) => AutoCreate::EmptyList,
            Some(KindTag::Enum) | None => AutoCreate::None,
        },
    }
}

/// Infer a registry from a single document (convenience function)
pub fn infer_types(value: &Value, root_name: &str) -> TypeRegistry {
    let mut inferrer = TypeInferrer::default();
    inferrer.infer_source(root_name, Some(value), Vec::new());
    inferrer.finish(0)
}
