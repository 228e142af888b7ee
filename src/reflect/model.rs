//! Builds descriptor sets from inferred types

use super::descriptors::{
    MethodDescriptor, MethodKind, ParameterDescriptor, PropertyDescriptor, TypeModel, GENERIC_MAP,
    MAP_SEQUENCE,
};
use crate::error::Result;
use crate::schema::{FieldType, InferredType, TypeKind, TypeRegistry};
use crate::types::AutoCreate;
use crate::value::DEFAULT_INDENT;

/// Generates [`TypeModel`]s for the types of one registry snapshot
#[derive(Debug, Clone, Copy)]
pub struct ModelGenerator<'a> {
    registry: &'a TypeRegistry,
}

impl<'a> ModelGenerator<'a> {
    pub fn new(registry: &'a TypeRegistry) -> Self {
        Self { registry }
    }

    /// Model of the type named `name`
    pub fn model_for(&self, name: &str) -> Result<TypeModel> {
        let ty = self.registry.require(name)?;
        Ok(self.model(&ty))
    }

    /// Models of every registered type, in registration order
    pub fn models(&self) -> Vec<TypeModel> {
        self.registry.types().map(|ty| self.model(ty)).collect()
    }

    /// Model of a single type
    pub fn model(&self, ty: &InferredType) -> TypeModel {
        let (properties, methods) = match &ty.kind {
            TypeKind::Struct(st) => {
                let properties = st
                    .fields
                    .iter()
                    .map(|field| PropertyDescriptor {
                        name: field.property_name.clone(),
                        raw_key: field.raw_key.clone(),
                        type_name: field.field_type.to_string(),
                        writable: true,
                        is_static: false,
                        auto_create: field.auto_create,
                    })
                    .collect();
                let mut methods = production_methods(&ty.name);
                methods.extend(self.instance_methods(ty));
                (properties, methods)
            }
            TypeKind::Enum(en) => {
                let properties = en
                    .values
                    .iter()
                    .map(|value| PropertyDescriptor {
                        name: value.code.clone(),
                        raw_key: value.literal.clone(),
                        type_name: ty.name.clone(),
                        writable: false,
                        is_static: true,
                        auto_create: AutoCreate::None,
                    })
                    .collect();
                (properties, Vec::new())
            }
            TypeKind::ListWrapper(wrapper) => {
                let produced = FieldType::list(wrapper.wrap_depth, wrapper.element.clone());
                (Vec::new(), production_methods(&produced.to_string()))
            }
        };

        TypeModel {
            type_name: ty.name.clone(),
            kind: ty.kind.label().to_string(),
            has_default_constructor: ty.is_struct(),
            properties,
            methods,
        }
    }

    fn instance_methods(&self, ty: &InferredType) -> Vec<MethodDescriptor> {
        vec![
            MethodDescriptor::new(MethodKind::Write, Vec::new(), "string", false),
            MethodDescriptor::new(
                MethodKind::PrettyPrint,
                vec![ParameterDescriptor::optional(
                    "indent",
                    "int",
                    DEFAULT_INDENT.to_string(),
                )],
                "string",
                false,
            ),
            MethodDescriptor::new(MethodKind::AsJson, Vec::new(), GENERIC_MAP, false),
            MethodDescriptor::new(MethodKind::Parent, Vec::new(), self.parent_type(ty), false),
            MethodDescriptor::new(MethodKind::Descendents, Vec::new(), MAP_SEQUENCE, false),
        ]
    }

    /// Declared type of `parent()`: the enclosing struct unless this type is
    /// one of its typedefs
    pub fn parent_type(&self, ty: &InferredType) -> String {
        ty.namespace()
            .and_then(|ns| self.registry.get(ns))
            .filter(|outer| {
                outer
                    .as_struct()
                    .is_some_and(|st| !st.is_typedef_target(&ty.name))
            })
            .map_or_else(|| GENERIC_MAP.to_string(), |outer| outer.name.clone())
    }
}

/// Static methods producing instances of `produced`
fn production_methods(produced: &str) -> Vec<MethodDescriptor> {
    let args = || ParameterDescriptor::optional("args", "map<string, object>", "null");
    vec![
        MethodDescriptor::new(
            MethodKind::Parse,
            vec![ParameterDescriptor::required("content", "string")],
            produced,
            true,
        ),
        MethodDescriptor::new(
            MethodKind::ParseUrl,
            vec![ParameterDescriptor::required("content", "url")],
            produced,
            true,
        ),
        MethodDescriptor::new(
            MethodKind::Get,
            vec![ParameterDescriptor::required("url", "string"), args()],
            produced,
            true,
        ),
        MethodDescriptor::new(
            MethodKind::Post,
            vec![ParameterDescriptor::required("url", "string"), args()],
            produced,
            true,
        ),
    ]
}
