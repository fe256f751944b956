//! Interface database model
//!
//! A [`Database`] is a set of uniquely named [`Interface`]s. Each interface
//! owns its members, so a member always belongs to exactly one interface.
//! All node types carry [`Annotations`] which the filter pass inspects.

use crate::types::IdlType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Extended attributes (`[Callback, EventTarget, JSName=foo]`); flag
/// attributes map to an empty string.
pub type ExtAttrs = BTreeMap<String, String>;

/// Annotations grouped by namespace, e.g. `WebKit: { via: "Element" }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Annotations(BTreeMap<String, BTreeMap<String, String>>);

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create annotations carrying the given namespaces with no keys
    pub fn with_namespaces<I, S>(namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut annotations = Self::new();
        for namespace in namespaces {
            annotations.0.entry(namespace.into()).or_default();
        }
        annotations
    }

    pub fn contains(&self, namespace: &str) -> bool {
        self.0.contains_key(namespace)
    }

    pub fn has_key(&self, namespace: &str, key: &str) -> bool {
        self.0
            .get(namespace)
            .map(|entries| entries.contains_key(key))
            .unwrap_or(false)
    }

    pub fn get(&self, namespace: &str, key: &str) -> Option<&str> {
        self.0.get(namespace)?.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, namespace: &str, key: &str, value: &str) {
        self.0
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Access to the annotations of any database node
pub trait Annotated {
    fn annotations(&self) -> &Annotations;
}

/// Parent interface reference (`interface Element : Node`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentInterface {
    #[serde(rename = "type")]
    pub ty: IdlType,
    #[serde(default)]
    pub annotations: Annotations,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constant {
    pub id: String,
    #[serde(rename = "type")]
    pub ty: IdlType,
    pub value: String,
    #[serde(default)]
    pub annotations: Annotations,
    #[serde(default)]
    pub ext_attrs: ExtAttrs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: String,
    #[serde(rename = "type")]
    pub ty: IdlType,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub annotations: Annotations,
    #[serde(default)]
    pub ext_attrs: ExtAttrs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    pub id: String,
    #[serde(rename = "type")]
    pub ty: IdlType,
    #[serde(default)]
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub id: String,
    /// Return type
    #[serde(rename = "type")]
    pub ty: IdlType,
    #[serde(default)]
    pub arguments: Vec<Argument>,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub annotations: Annotations,
    #[serde(default)]
    pub ext_attrs: ExtAttrs,
}

impl Operation {
    /// Return type followed by every argument type
    pub fn referenced_types(&self) -> impl Iterator<Item = &IdlType> {
        std::iter::once(&self.ty).chain(self.arguments.iter().map(|arg| &arg.ty))
    }

    pub fn referenced_types_mut(&mut self) -> impl Iterator<Item = &mut IdlType> {
        std::iter::once(&mut self.ty).chain(self.arguments.iter_mut().map(|arg| &mut arg.ty))
    }
}

/// An interface definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    pub id: String,
    #[serde(default)]
    pub parents: Vec<ParentInterface>,
    #[serde(default)]
    pub constants: Vec<Constant>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub operations: Vec<Operation>,
    #[serde(default)]
    pub annotations: Annotations,
    #[serde(default)]
    pub ext_attrs: ExtAttrs,
}

impl Interface {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parents: Vec::new(),
            constants: Vec::new(),
            attributes: Vec::new(),
            operations: Vec::new(),
            annotations: Annotations::new(),
            ext_attrs: ExtAttrs::new(),
        }
    }

    pub fn parent_names(&self) -> impl Iterator<Item = &str> {
        self.parents.iter().map(|parent| parent.ty.base_name())
    }

    pub fn has_ext_attr(&self, name: &str) -> bool {
        self.ext_attrs.contains_key(name)
    }

    /// A callback interface is a named function type: marked `[Callback]`
    /// and declaring exactly one operation.
    pub fn is_callback(&self) -> bool {
        self.has_ext_attr("Callback") && self.operations.len() == 1
    }

    pub fn member_count(&self) -> usize {
        self.constants.len() + self.attributes.len() + self.operations.len()
    }

    /// All type references made by members and parents
    pub fn referenced_types(&self) -> Vec<&IdlType> {
        let mut types: Vec<&IdlType> = Vec::new();
        types.extend(self.parents.iter().map(|p| &p.ty));
        types.extend(self.constants.iter().map(|c| &c.ty));
        types.extend(self.attributes.iter().map(|a| &a.ty));
        for operation in &self.operations {
            types.extend(operation.referenced_types());
        }
        types
    }

    pub(crate) fn referenced_types_mut(&mut self) -> Vec<&mut IdlType> {
        let mut types: Vec<&mut IdlType> = Vec::new();
        types.extend(self.parents.iter_mut().map(|p| &mut p.ty));
        types.extend(self.constants.iter_mut().map(|c| &mut c.ty));
        types.extend(self.attributes.iter_mut().map(|a| &mut a.ty));
        for operation in &mut self.operations {
            types.extend(operation.referenced_types_mut());
        }
        types
    }
}

macro_rules! impl_annotated {
    ($($node:ty),* $(,)?) => {
        $(
            impl Annotated for $node {
                fn annotations(&self) -> &Annotations {
                    &self.annotations
                }
            }
        )*
    };
}

impl_annotated!(Interface, ParentInterface, Constant, Attribute, Operation);

/// The interface database
///
/// Interfaces are keyed by id; the key always equals `Interface::id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Database {
    interfaces: BTreeMap<String, Interface>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a database from interfaces; a later interface replaces an
    /// earlier one with the same id.
    pub fn from_interfaces<I>(interfaces: I) -> Self
    where
        I: IntoIterator<Item = Interface>,
    {
        let mut database = Self::new();
        for interface in interfaces {
            database.insert(interface);
        }
        database
    }

    /// Insert an interface, returning the one it replaced
    pub fn insert(&mut self, interface: Interface) -> Option<Interface> {
        self.interfaces.insert(interface.id.clone(), interface)
    }

    pub fn remove(&mut self, id: &str) -> Option<Interface> {
        self.interfaces.remove(id)
    }

    pub fn has_interface(&self, id: &str) -> bool {
        self.interfaces.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Interface> {
        self.interfaces.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Interface> {
        self.interfaces.get_mut(id)
    }

    /// Interfaces in name order
    pub fn interfaces(&self) -> impl Iterator<Item = &Interface> {
        self.interfaces.values()
    }

    pub fn interfaces_mut(&mut self) -> impl Iterator<Item = &mut Interface> {
        self.interfaces.values_mut()
    }

    pub fn interface_names(&self) -> impl Iterator<Item = &str> {
        self.interfaces.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }

    pub fn into_interfaces(self) -> impl Iterator<Item = Interface> {
        self.interfaces.into_values()
    }

    pub(crate) fn into_map(self) -> BTreeMap<String, Interface> {
        self.interfaces
    }

    pub(crate) fn from_map(interfaces: BTreeMap<String, Interface>) -> Self {
        Self { interfaces }
    }
}
