//! Value tree nodes
//!
//! Maps and lists are shared handles (`Rc`) so a node keeps its identity
//! while it is reachable from several places: the document root, a typed
//! property read, a descendant walk. Each container remembers its parent
//! through a `Weak` reference and may carry the inferred type it was bound to.

use crate::error::{Error, Result};
use crate::schema::{InferredType, TypeKind};
use crate::types::AutoCreate;
use indexmap::IndexMap;
use serde_json::Number;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::Arc;

/// Shared reference to an inferred type attached to a container
pub type TypeRef = Arc<InferredType>;

// ============================================================================
// Value
// ============================================================================

/// A node of a parsed JSON document
#[derive(Debug, Clone)]
pub enum Value {
    /// Ordered key/value mapping
    Map(JsonMap),
    /// Ordered sequence
    List(JsonList),
    /// String scalar
    String(String),
    /// Number scalar
    Number(Number),
    /// Boolean scalar
    Bool(bool),
    /// Null scalar
    Null,
}

impl Value {
    /// Get the map handle if this is a map
    pub fn as_map(&self) -> Option<&JsonMap> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Get the list handle if this is a list
    pub fn as_list(&self) -> Option<&JsonList> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Get the string contents if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Check if this is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the node kind, used in messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Map(_) => "map",
            Value::List(_) => "list",
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::Bool(_) => "boolean",
            Value::Null => "null",
        }
    }

    /// Parent container of a map or list; scalars have none
    pub fn parent(&self) -> Option<Value> {
        match self {
            Value::Map(m) => m.parent(),
            Value::List(l) => l.parent(),
            _ => None,
        }
    }

    /// Type attached to a map or list
    pub fn ty(&self) -> Option<TypeRef> {
        match self {
            Value::Map(m) => m.ty(),
            Value::List(l) => l.ty(),
            _ => None,
        }
    }

    /// Check if both values are the same container node
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Map(a), Value::Map(b)) => a.ptr_eq(b),
            (Value::List(a), Value::List(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// All descendant maps of this node, depth first in document order
    pub fn descendants(&self) -> Descendants {
        match self {
            Value::Map(m) => m.descendants(),
            Value::List(l) => l.descendants(),
            _ => Descendants::empty(),
        }
    }

    /// Build a value tree from a serde_json value
    pub fn from_serde(value: &serde_json::Value) -> Value {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.clone()),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                let list = JsonList::new();
                for item in items {
                    list.push_fresh(Value::from_serde(item));
                }
                Value::List(list)
            }
            serde_json::Value::Object(map) => {
                let out = JsonMap::new();
                for (key, val) in map {
                    out.insert_fresh(key.clone(), Value::from_serde(val));
                }
                Value::Map(out)
            }
        }
    }

    /// Convert to an untyped serde_json value (key order preserved)
    pub fn to_serde(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Value::Number(n.clone()),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::List(l) => {
                serde_json::Value::Array(l.items().iter().map(Value::to_serde).collect())
            }
            Value::Map(m) => {
                let mut out = serde_json::Map::new();
                for (key, val) in m.entries() {
                    out.insert(key, val.to_serde());
                }
                serde_json::Value::Object(out)
            }
        }
    }
}

/// Structural equality: same keys per map, same list order, same scalars
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Map(a), Value::Map(b)) => {
                if a.ptr_eq(b) {
                    return true;
                }
                let a = a.node.entries.borrow();
                let b = b.node.entries.borrow();
                a.len() == b.len()
                    && a.iter().all(|(k, v)| b.get(k).is_some_and(|other| v == other))
            }
            (Value::List(a), Value::List(b)) => {
                if a.ptr_eq(b) {
                    return true;
                }
                *a.node.items.borrow() == *b.node.items.borrow()
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Null, Value::Null) => true,
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<JsonMap> for Value {
    fn from(m: JsonMap) -> Self {
        Value::Map(m)
    }
}

impl From<JsonList> for Value {
    fn from(l: JsonList) -> Self {
        Value::List(l)
    }
}

// ============================================================================
// Parent links
// ============================================================================

#[derive(Clone, Default)]
enum ParentRef {
    #[default]
    Root,
    Map(Weak<MapNode>),
    List(Weak<ListNode>),
}

impl ParentRef {
    fn upgrade(&self) -> Option<Value> {
        match self {
            ParentRef::Root => None,
            ParentRef::Map(weak) => weak.upgrade().map(|node| Value::Map(JsonMap { node })),
            ParentRef::List(weak) => weak.upgrade().map(|node| Value::List(JsonList { node })),
        }
    }
}

/// Point `child` at its new container
fn adopt(child: &Value, parent: ParentRef) {
    match child {
        Value::Map(m) => *m.node.parent.borrow_mut() = parent,
        Value::List(l) => *l.node.parent.borrow_mut() = parent,
        _ => {}
    }
}

/// Detach `child` from its container if it still points at `container`
fn orphan(child: &Value, container: &Value) {
    if child.parent().is_some_and(|p| p.ptr_eq(container)) {
        adopt(child, ParentRef::Root);
    }
}

/// Reject inserting `child` into `container` when `child` is `container`
/// or one of its ancestors
fn check_acyclic(container: &Value, child: &Value) -> Result<()> {
    if !matches!(child, Value::Map(_) | Value::List(_)) {
        return Ok(());
    }
    let mut current = Some(container.clone());
    while let Some(node) = current {
        if node.ptr_eq(child) {
            return Err(Error::CyclicInsert);
        }
        current = node.parent();
    }
    Ok(())
}

// ============================================================================
// JsonMap
// ============================================================================

struct MapNode {
    entries: RefCell<IndexMap<String, Value>>,
    parent: RefCell<ParentRef>,
    ty: RefCell<Option<TypeRef>>,
}

/// Shared handle to an ordered map node
#[derive(Clone)]
pub struct JsonMap {
    node: Rc<MapNode>,
}

impl Default for JsonMap {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonMap {
    /// Create an empty, untyped map
    pub fn new() -> Self {
        Self {
            node: Rc::new(MapNode {
                entries: RefCell::new(IndexMap::new()),
                parent: RefCell::new(ParentRef::Root),
                ty: RefCell::new(None),
            }),
        }
    }

    /// Create an empty map bound to `ty`
    pub fn with_type(ty: TypeRef) -> Self {
        let map = Self::new();
        map.set_type(Some(ty));
        map
    }

    fn parent_ref(&self) -> ParentRef {
        ParentRef::Map(Rc::downgrade(&self.node))
    }

    /// Get the value stored under a raw key
    pub fn get(&self, key: &str) -> Option<Value> {
        self.node.entries.borrow().get(key).cloned()
    }

    /// Store a value under a raw key, returning the previous value
    pub fn put(&self, key: impl Into<String>, value: Value) -> Result<Option<Value>> {
        check_acyclic(&Value::Map(self.clone()), &value)?;
        Ok(self.insert_fresh(key.into(), value))
    }

    /// Insert a node known not to create a cycle (freshly built subtrees)
    pub(crate) fn insert_fresh(&self, key: String, value: Value) -> Option<Value> {
        adopt(&value, self.parent_ref());
        let previous = self.node.entries.borrow_mut().insert(key, value.clone());
        if let Some(old) = &previous {
            if !old.ptr_eq(&value) {
                orphan(old, &Value::Map(self.clone()));
            }
        }
        previous
    }

    /// Remove a raw key, returning its value
    pub fn remove(&self, key: &str) -> Option<Value> {
        let removed = self.node.entries.borrow_mut().shift_remove(key);
        if let Some(old) = &removed {
            orphan(old, &Value::Map(self.clone()));
        }
        removed
    }

    /// Check if a raw key is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.node.entries.borrow().contains_key(key)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.node.entries.borrow().len()
    }

    /// Check if the map has no entries
    pub fn is_empty(&self) -> bool {
        self.node.entries.borrow().is_empty()
    }

    /// Raw keys in document order
    pub fn keys(&self) -> Vec<String> {
        self.node.entries.borrow().keys().cloned().collect()
    }

    /// Snapshot of the entries in document order
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.node
            .entries
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Read a key, creating and attaching a default container when it is
    /// unset (absent or null) and the policy asks for one.
    ///
    /// The created container is stored in this map, so a second read
    /// returns the same node.
    pub fn get_or_create(
        &self,
        key: &str,
        policy: AutoCreate,
        ty: Option<TypeRef>,
    ) -> Option<Value> {
        match self.get(key) {
            Some(value) if !value.is_null() => return Some(value),
            existing if policy == AutoCreate::None => return existing,
            _ => {}
        }
        let created = match policy {
            AutoCreate::EmptyMap => Value::Map(JsonMap::new()),
            AutoCreate::EmptyList => Value::List(JsonList::new()),
            AutoCreate::None => return None,
        };
        match &created {
            Value::Map(m) => m.set_type(ty),
            Value::List(l) => l.set_type(ty),
            _ => {}
        }
        self.insert_fresh(key.to_string(), created.clone());
        Some(created)
    }

    /// Parent container, `None` at the document root
    pub fn parent(&self) -> Option<Value> {
        self.node.parent.borrow().upgrade()
    }

    /// Type this map was bound to
    pub fn ty(&self) -> Option<TypeRef> {
        self.node.ty.borrow().clone()
    }

    /// Bind (or unbind) this map to a type
    pub fn set_type(&self, ty: Option<TypeRef>) {
        *self.node.ty.borrow_mut() = ty;
    }

    /// Name of the bound type
    pub fn type_name(&self) -> Option<String> {
        self.node.ty.borrow().as_ref().map(|t| t.name.clone())
    }

    /// Check if this map is bound to a struct type
    pub fn is_struct_typed(&self) -> bool {
        self.node
            .ty
            .borrow()
            .as_ref()
            .is_some_and(|t| matches!(t.kind, TypeKind::Struct(_)))
    }

    /// Check if both handles point at the same node
    pub fn ptr_eq(&self, other: &JsonMap) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }

    /// All descendant maps, depth first in document order
    pub fn descendants(&self) -> Descendants {
        Descendants::from_children(self.node.entries.borrow().values().cloned().collect())
    }
}

impl std::fmt::Debug for JsonMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonMap")
            .field("type", &self.type_name())
            .field("entries", &*self.node.entries.borrow())
            .finish()
    }
}

// ============================================================================
// JsonList
// ============================================================================

struct ListNode {
    items: RefCell<Vec<Value>>,
    parent: RefCell<ParentRef>,
    ty: RefCell<Option<TypeRef>>,
}

/// Shared handle to a list node
#[derive(Clone)]
pub struct JsonList {
    node: Rc<ListNode>,
}

impl Default for JsonList {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonList {
    /// Create an empty, untyped list
    pub fn new() -> Self {
        Self {
            node: Rc::new(ListNode {
                items: RefCell::new(Vec::new()),
                parent: RefCell::new(ParentRef::Root),
                ty: RefCell::new(None),
            }),
        }
    }

    /// Create an empty list bound to `ty`
    pub fn with_type(ty: TypeRef) -> Self {
        let list = Self::new();
        list.set_type(Some(ty));
        list
    }

    fn parent_ref(&self) -> ParentRef {
        ParentRef::List(Rc::downgrade(&self.node))
    }

    /// Get the item at `index`
    pub fn get(&self, index: usize) -> Option<Value> {
        self.node.items.borrow().get(index).cloned()
    }

    /// Append an item
    pub fn push(&self, value: Value) -> Result<()> {
        check_acyclic(&Value::List(self.clone()), &value)?;
        self.push_fresh(value);
        Ok(())
    }

    pub(crate) fn push_fresh(&self, value: Value) {
        adopt(&value, self.parent_ref());
        self.node.items.borrow_mut().push(value);
    }

    /// Replace the item at `index`, returning the previous item
    pub fn set(&self, index: usize, value: Value) -> Result<Value> {
        let len = self.len();
        if index >= len {
            return Err(Error::IndexOutOfBounds { index, len });
        }
        check_acyclic(&Value::List(self.clone()), &value)?;
        adopt(&value, self.parent_ref());
        let previous = std::mem::replace(&mut self.node.items.borrow_mut()[index], value.clone());
        if !previous.ptr_eq(&value) {
            orphan(&previous, &Value::List(self.clone()));
        }
        Ok(previous)
    }

    /// Remove the item at `index`
    pub fn remove(&self, index: usize) -> Result<Value> {
        let len = self.len();
        if index >= len {
            return Err(Error::IndexOutOfBounds { index, len });
        }
        let removed = self.node.items.borrow_mut().remove(index);
        orphan(&removed, &Value::List(self.clone()));
        Ok(removed)
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.node.items.borrow().len()
    }

    /// Check if the list has no items
    pub fn is_empty(&self) -> bool {
        self.node.items.borrow().is_empty()
    }

    /// Snapshot of the items
    pub fn items(&self) -> Vec<Value> {
        self.node.items.borrow().clone()
    }

    /// Parent container, `None` at the document root
    pub fn parent(&self) -> Option<Value> {
        self.node.parent.borrow().upgrade()
    }

    /// Type this list was bound to
    pub fn ty(&self) -> Option<TypeRef> {
        self.node.ty.borrow().clone()
    }

    /// Bind (or unbind) this list to a type
    pub fn set_type(&self, ty: Option<TypeRef>) {
        *self.node.ty.borrow_mut() = ty;
    }

    /// Check if both handles point at the same node
    pub fn ptr_eq(&self, other: &JsonList) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }

    /// All descendant maps, depth first in document order
    pub fn descendants(&self) -> Descendants {
        Descendants::from_children(self.items())
    }
}

impl std::fmt::Debug for JsonList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonList")
            .field("type", &self.ty().map(|t| t.name.clone()))
            .field("items", &*self.node.items.borrow())
            .finish()
    }
}

// ============================================================================
// Descendant walk
// ============================================================================

/// Lazy depth-first walk over descendant maps.
///
/// Children are expanded only when their parent is visited. Cloning the
/// iterator (or asking the node again) restarts the walk.
#[derive(Debug, Clone)]
pub struct Descendants {
    stack: Vec<Value>,
}

impl Descendants {
    fn empty() -> Self {
        Self { stack: Vec::new() }
    }

    fn from_children(mut children: Vec<Value>) -> Self {
        children.reverse();
        Self { stack: children }
    }
}

impl Iterator for Descendants {
    type Item = JsonMap;

    fn next(&mut self) -> Option<JsonMap> {
        while let Some(value) = self.stack.pop() {
            match value {
                Value::Map(map) => {
                    let children: Vec<Value> =
                        map.node.entries.borrow().values().cloned().collect();
                    self.stack.extend(children.into_iter().rev());
                    return Some(map);
                }
                Value::List(list) => {
                    self.stack.extend(list.items().into_iter().rev());
                }
                _ => {}
            }
        }
        None
    }
}
