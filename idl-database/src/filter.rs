//! Annotation based filtering and unresolved type pruning

use crate::model::{Annotated, Annotations, Database, Interface};
use crate::primitives::is_primitive;
use crate::types::IdlType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Annotation key marking a node as moved into another interface
pub const DISPLACED_KEY: &str = "via";
/// Annotation key marking a node as suppressed for a family
pub const SUPPRESSED_KEY: &str = "suppressed";

/// Declarative predicate over node annotations
///
/// A node passes when it is neither displaced for an `exclude_displaced`
/// namespace nor suppressed for an `exclude_suppressed` namespace, and it
/// either carries one of `or_annotations` or carries all of a non-empty
/// `and_annotations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    pub or_annotations: Vec<String>,
    pub and_annotations: Vec<String>,
    pub exclude_displaced: Vec<String>,
    pub exclude_suppressed: Vec<String>,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self::webkit_dart()
    }
}

impl FilterCriteria {
    /// Criteria that match nothing
    pub fn empty() -> Self {
        Self {
            or_annotations: Vec::new(),
            and_annotations: Vec::new(),
            exclude_displaced: Vec::new(),
            exclude_suppressed: Vec::new(),
        }
    }

    /// Everything WebKit or Dart annotated, minus what WebKit displaced and
    /// what either family suppressed
    pub fn webkit_dart() -> Self {
        Self {
            or_annotations: vec!["WebKit".to_string(), "Dart".to_string()],
            and_annotations: Vec::new(),
            exclude_displaced: vec!["WebKit".to_string()],
            exclude_suppressed: vec!["WebKit".to_string(), "Dart".to_string()],
        }
    }

    pub fn accepts(&self, annotations: &Annotations) -> bool {
        if self.exclude_displaced.iter().any(|ns| annotations.has_key(ns, DISPLACED_KEY)) {
            return false;
        }
        if self.exclude_suppressed.iter().any(|ns| annotations.has_key(ns, SUPPRESSED_KEY)) {
            return false;
        }
        if self.or_annotations.iter().any(|ns| annotations.contains(ns)) {
            return true;
        }
        !self.and_annotations.is_empty() && self.and_annotations.iter().all(|ns| annotations.contains(ns))
    }

    fn keep<T: Annotated>(&self, nodes: &mut Vec<T>) {
        nodes.retain(|node| self.accepts(node.annotations()));
    }
}

impl Database {
    /// Remove interfaces rejected by `criteria` and filter the members and
    /// parents of the rest, then prune members left with unresolved types.
    ///
    /// Parent references to interfaces removed here are kept, so that the
    /// nearest surviving ancestor can still be found through the unfiltered
    /// database.
    pub fn filter(self, criteria: &FilterCriteria) -> Self {
        let mut interfaces = self.into_map();
        interfaces.retain(|id, interface| {
            let accepted = criteria.accepts(&interface.annotations);
            if !accepted {
                debug!("Filtering out interface {}", id);
            }
            accepted
        });
        for interface in interfaces.values_mut() {
            criteria.keep(&mut interface.constants);
            criteria.keep(&mut interface.attributes);
            criteria.keep(&mut interface.operations);
            criteria.keep(&mut interface.parents);
        }

        let database = Database::from_map(interfaces);
        let known: BTreeSet<String> = database.interface_names().map(str::to_string).collect();
        database.prune(&known, None)
    }

    /// Drop members and parents whose type, or any argument type, is
    /// neither a primitive nor an interface of this database
    pub fn prune_unresolved_members(self) -> Self {
        let known: BTreeSet<String> = self.interface_names().map(str::to_string).collect();
        self.prune(&known, Some(&known))
    }

    /// `parents` is `None` when parent references are left alone
    fn prune(mut self, members: &BTreeSet<String>, parents: Option<&BTreeSet<String>>) -> Self {
        let resolves = |ty: &IdlType| is_primitive(ty.base_name()) || members.contains(ty.base_name());

        for interface in self.interfaces_mut() {
            let Interface {
                id,
                parents: parent_refs,
                constants,
                attributes,
                operations,
                ..
            } = interface;

            if let Some(parents) = parents {
                parent_refs.retain(|parent| {
                    let keep = parents.contains(parent.ty.base_name());
                    if !keep {
                        debug!("Dropping parent {} of {}: unresolved", parent.ty, id);
                    }
                    keep
                });
            }
            constants.retain(|constant| {
                let keep = resolves(&constant.ty);
                if !keep {
                    debug!("Dropping {}.{}: unresolved type {}", id, constant.id, constant.ty);
                }
                keep
            });
            attributes.retain(|attribute| {
                let keep = resolves(&attribute.ty);
                if !keep {
                    debug!("Dropping {}.{}: unresolved type {}", id, attribute.id, attribute.ty);
                }
                keep
            });
            operations.retain(|operation| {
                let keep = operation.referenced_types().all(|ty| resolves(ty));
                if !keep {
                    debug!("Dropping {}.{}(): unresolved signature type", id, operation.id);
                }
                keep
            });
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Argument, Attribute, ExtAttrs, Operation, ParentInterface};

    fn annotated(namespaces: &[&str]) -> Annotations {
        Annotations::with_namespaces(namespaces.iter().copied())
    }

    fn attribute(id: &str, ty: &str, annotations: Annotations) -> Attribute {
        Attribute {
            id: id.to_string(),
            ty: ty.parse().unwrap(),
            readonly: false,
            is_static: false,
            annotations,
            ext_attrs: ExtAttrs::new(),
        }
    }

    fn sample_database() -> Database {
        let mut node = Interface::new("Node");
        node.annotations = annotated(&["WebKit"]);
        node.attributes.push(attribute("nodeName", "DOMString", annotated(&["WebKit"])));
        node.attributes.push(attribute("internal", "DOMString", annotated(&["FremontCut"])));

        let mut displaced = annotated(&["WebKit"]);
        displaced.insert("WebKit", DISPLACED_KEY, "Element");
        node.attributes.push(attribute("moved", "DOMString", displaced));

        let mut element = Interface::new("Element");
        element.annotations = annotated(&["WebKit", "Dart"]);
        element.parents.push(ParentInterface {
            ty: IdlType::named("Node"),
            annotations: annotated(&["WebKit"]),
        });

        let mut suppressed = Interface::new("Legacy");
        suppressed.annotations = annotated(&["WebKit"]);
        suppressed.annotations.insert("Dart", SUPPRESSED_KEY, "");

        let gecko_only = Interface::new("MozThing");

        Database::from_interfaces([node, element, suppressed, gecko_only])
    }

    #[test]
    fn test_accepts_rules() {
        let criteria = FilterCriteria::webkit_dart();
        assert!(criteria.accepts(&annotated(&["Dart"])));
        assert!(!criteria.accepts(&annotated(&["Gecko"])));

        let mut suppressed = annotated(&["WebKit"]);
        suppressed.insert("WebKit", SUPPRESSED_KEY, "");
        assert!(!criteria.accepts(&suppressed));

        let and_only = FilterCriteria {
            and_annotations: vec!["WebKit".to_string(), "FremontCut".to_string()],
            ..FilterCriteria::empty()
        };
        assert!(and_only.accepts(&annotated(&["WebKit", "FremontCut"])));
        assert!(!and_only.accepts(&annotated(&["WebKit"])));
        assert!(!FilterCriteria::empty().accepts(&annotated(&["WebKit"])));
    }

    #[test]
    fn test_filter_drops_interfaces_and_members() {
        let filtered = sample_database().filter(&FilterCriteria::webkit_dart());

        assert_eq!(filtered.interface_names().collect::<Vec<_>>(), vec!["Element", "Node"]);
        let node = filtered.get("Node").unwrap();
        assert_eq!(node.attributes.len(), 1);
        assert_eq!(node.attributes[0].id, "nodeName");
        assert_eq!(filtered.get("Element").unwrap().parents.len(), 1);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let criteria = FilterCriteria::webkit_dart();
        let once = sample_database().filter(&criteria);
        let twice = once.clone().filter(&criteria);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_prune_unresolved_members() {
        let mut window = Interface::new("Window");
        window.attributes.push(attribute("document", "Document", Annotations::new()));
        window.attributes.push(attribute("name", "DOMString", Annotations::new()));
        window.attributes.push(attribute("frames", "sequence<Window>", Annotations::new()));
        window.operations.push(Operation {
            id: "postMessage".to_string(),
            ty: IdlType::named("void"),
            arguments: vec![Argument {
                id: "port".to_string(),
                ty: IdlType::named("MessagePort"),
                optional: true,
            }],
            is_static: false,
            annotations: Annotations::new(),
            ext_attrs: ExtAttrs::new(),
        });

        let pruned = Database::from_interfaces([window]).prune_unresolved_members();
        let window = pruned.get("Window").unwrap();
        let names: Vec<_> = window.attributes.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(names, vec!["name", "frames"]);
        assert!(window.operations.is_empty());
    }

    #[test]
    fn test_prune_unresolved_parents() {
        let mut orphan = Interface::new("X");
        for parent in ["Missing", "Node"] {
            orphan.parents.push(ParentInterface {
                ty: IdlType::named(parent),
                annotations: annotated(&["WebKit"]),
            });
        }
        let pruned = Database::from_interfaces([orphan, Interface::new("Node")]).prune_unresolved_members();
        assert_eq!(pruned.get("X").unwrap().parent_names().collect::<Vec<_>>(), vec!["Node"]);

        // nothing unresolved is left for a strict rename to trip over
        let map = crate::rename::RenameMap::from_pairs([("X", "X"), ("Node", "Node")]).unwrap();
        assert!(pruned.rename(&map, true).is_ok());
    }

    #[test]
    fn test_filter_keeps_parents_that_were_filtered_out() {
        let filtered = sample_database().filter(&FilterCriteria::webkit_dart());
        let mut with_legacy_parent = sample_database();
        with_legacy_parent.get_mut("Element").unwrap().parents.push(ParentInterface {
            ty: IdlType::named("Legacy"),
            annotations: annotated(&["WebKit"]),
        });
        let refiltered = with_legacy_parent.filter(&FilterCriteria::webkit_dart());

        assert!(!refiltered.has_interface("Legacy"));
        let parents: Vec<_> = refiltered.get("Element").unwrap().parent_names().collect();
        assert!(parents.contains(&"Legacy"));
        assert_eq!(filtered.get("Element").unwrap().parents.len() + 1, parents.len());

        let twice = refiltered.clone().filter(&FilterCriteria::webkit_dart());
        assert_eq!(twice, refiltered);
    }
}
