//! Type registry bound to one database and rename map

use crate::builtins::dart_primitive;
use crate::{Result, TypeError};
use idl_database::{Database, IdlType, Interface, RenameMap};
use tracing::trace;

/// What a resolved type refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Primitive,
    Interface,
    Callback,
    Sequence,
}

/// A resolved type reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    /// Textual IDL form of the reference, after renaming
    pub idl_type: String,
    /// Type name in generated Dart code
    pub dart_type: String,
    pub kind: TypeKind,
    pub nullable: bool,
}

/// Read-only type resolver for one backend run
#[derive(Debug)]
pub struct TypeRegistry<'db> {
    database: &'db Database,
    renames: &'db RenameMap,
}

impl<'db> TypeRegistry<'db> {
    pub fn new(database: &'db Database, renames: &'db RenameMap) -> Self {
        Self { database, renames }
    }

    pub fn database(&self) -> &'db Database {
        self.database
    }

    pub fn renames(&self) -> &'db RenameMap {
        self.renames
    }

    pub fn interface(&self, name: &str) -> Option<&'db Interface> {
        self.database.get(name)
    }

    /// The pre-rename name of a type, used for native bindings
    pub fn canonical_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.renames.canonical(name)
    }

    pub fn resolve(&self, ty: &IdlType) -> Result<TypeInfo> {
        trace!("Resolving {}", ty);
        match ty {
            IdlType::Named(name) => self.resolve_named(name),
            IdlType::Nullable(inner) => {
                let mut info = self.resolve(inner)?;
                info.idl_type = ty.to_string();
                info.nullable = true;
                Ok(info)
            }
            IdlType::Sequence(inner) | IdlType::Array(inner) => {
                let element = self.resolve(inner)?;
                Ok(TypeInfo {
                    idl_type: ty.to_string(),
                    dart_type: format!("List<{}>", element.dart_type),
                    kind: TypeKind::Sequence,
                    nullable: false,
                })
            }
        }
    }

    pub fn dart_type(&self, ty: &IdlType) -> Result<String> {
        self.resolve(ty).map(|info| info.dart_type)
    }

    fn resolve_named(&self, name: &str) -> Result<TypeInfo> {
        if let Some(dart) = dart_primitive(name) {
            return Ok(TypeInfo {
                idl_type: name.to_string(),
                dart_type: dart.to_string(),
                kind: TypeKind::Primitive,
                nullable: false,
            });
        }

        let interface = self.database.get(name).ok_or_else(|| TypeError::unknown(name))?;
        let kind = if interface.is_callback() {
            TypeKind::Callback
        } else {
            TypeKind::Interface
        };
        Ok(TypeInfo {
            idl_type: name.to_string(),
            dart_type: interface.id.clone(),
            kind,
            nullable: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use idl_database::{Annotations, ExtAttrs, Operation};

    fn sample_database() -> Database {
        let mut callback = Interface::new("VoidCallback");
        callback.ext_attrs.insert("Callback".to_string(), String::new());
        callback.operations.push(Operation {
            id: "handleEvent".to_string(),
            ty: IdlType::named("void"),
            arguments: Vec::new(),
            is_static: false,
            annotations: Annotations::new(),
            ext_attrs: ExtAttrs::new(),
        });
        Database::from_interfaces([Interface::new("Window"), Interface::new("Node"), callback])
    }

    #[test]
    fn test_resolve_primitive_and_interface() {
        let database = sample_database();
        let renames = RenameMap::from_pairs([("DOMWindow", "Window")]).unwrap();
        let registry = TypeRegistry::new(&database, &renames);

        let long = registry.resolve(&IdlType::named("unsigned long")).unwrap();
        assert_eq!(long.dart_type, "int");
        assert_eq!(long.kind, TypeKind::Primitive);

        let window = registry.resolve(&IdlType::named("Window")).unwrap();
        assert_eq!(window.kind, TypeKind::Interface);
        assert_eq!(registry.canonical_name("Window"), "DOMWindow");
    }

    #[test]
    fn test_resolve_composite_types() {
        let database = sample_database();
        let renames = RenameMap::new();
        let registry = TypeRegistry::new(&database, &renames);

        let nodes: IdlType = "sequence<Node>?".parse().unwrap();
        let info = registry.resolve(&nodes).unwrap();
        assert_eq!(info.dart_type, "List<Node>");
        assert_eq!(info.kind, TypeKind::Sequence);
        assert!(info.nullable);
        assert_eq!(info.idl_type, "sequence<Node>?");

        let callback = registry.resolve(&IdlType::named("VoidCallback")).unwrap();
        assert_eq!(callback.kind, TypeKind::Callback);
    }

    #[test]
    fn test_unknown_type() {
        let database = sample_database();
        let renames = RenameMap::new();
        let registry = TypeRegistry::new(&database, &renames);

        let err = registry.dart_type(&IdlType::named("DOMWindow")).unwrap_err();
        assert_eq!(err, TypeError::unknown("DOMWindow"));
    }
}
