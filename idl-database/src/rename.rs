//! Type renaming
//!
//! A [`RenameMap`] maps canonical IDL names to backend specific names. The
//! map refuses chains (a target that is also a source), so applying it a
//! second time never renames anything again.

use crate::error::RenameError;
use crate::model::{Annotations, Database, Interface, ParentInterface};
use crate::primitives::is_primitive;
use crate::types::IdlType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

/// Canonical name of the event target interface
pub const EVENT_TARGET: &str = "EventTarget";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameEntry {
    pub from: String,
    pub to: String,
}

/// Ordered canonical-to-target name mapping
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RenameEntry>", into = "Vec<RenameEntry>")]
pub struct RenameMap {
    entries: Vec<RenameEntry>,
    forward: HashMap<String, usize>,
    reverse: HashMap<String, usize>,
}

impl RenameMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, A, B>(pairs: I) -> Result<Self, RenameError>
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<String>,
        B: Into<String>,
    {
        let mut map = Self::new();
        for (from, to) in pairs {
            map.insert(from, to)?;
        }
        Ok(map)
    }

    /// Append an entry. Identity entries are accepted and never rename.
    pub fn insert(&mut self, from: impl Into<String>, to: impl Into<String>) -> Result<(), RenameError> {
        let (from, to) = (from.into(), to.into());
        if self.forward.contains_key(&from) {
            return Err(RenameError::invalid_map(&from, &to, "source is already mapped"));
        }
        if from != to {
            if self.forward.contains_key(&to) {
                return Err(RenameError::invalid_map(&from, &to, "target is itself renamed"));
            }
            if self.reverse.contains_key(&from) {
                return Err(RenameError::invalid_map(&from, &to, "source is the target of another entry"));
            }
        }

        let index = self.entries.len();
        self.forward.insert(from.clone(), index);
        self.reverse.entry(to.clone()).or_insert(index);
        self.entries.push(RenameEntry { from, to });
        Ok(())
    }

    pub fn get(&self, from: &str) -> Option<&str> {
        self.forward.get(from).map(|&i| self.entries[i].to.as_str())
    }

    /// The renamed form of `name`, or `name` itself when unmapped
    pub fn rename<'a>(&'a self, name: &'a str) -> &'a str {
        self.get(name).unwrap_or(name)
    }

    /// The canonical name `name` was renamed from, or `name` itself
    pub fn canonical<'a>(&'a self, name: &'a str) -> &'a str {
        self.reverse
            .get(name)
            .map(|&i| self.entries[i].from.as_str())
            .unwrap_or(name)
    }

    pub fn is_source(&self, name: &str) -> bool {
        self.forward.contains_key(name)
    }

    pub fn is_target(&self, name: &str) -> bool {
        self.reverse.contains_key(name)
    }

    pub fn entries(&self) -> &[RenameEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TryFrom<Vec<RenameEntry>> for RenameMap {
    type Error = RenameError;

    fn try_from(entries: Vec<RenameEntry>) -> Result<Self, Self::Error> {
        RenameMap::from_pairs(entries.into_iter().map(|e| (e.from, e.to)))
    }
}

impl From<RenameMap> for Vec<RenameEntry> {
    fn from(map: RenameMap) -> Self {
        map.entries
    }
}

impl Database {
    /// Rename interfaces and every type reference according to `map`.
    ///
    /// When an interface is renamed onto a name that already exists, its
    /// members are merged into the existing interface. With `strict`, a referenced non-primitive
    /// name the map does not know about (neither source nor target) fails.
    pub fn rename(self, map: &RenameMap, strict: bool) -> Result<Self, RenameError> {
        let mut interfaces = self.into_map();

        for entry in map.entries() {
            if entry.from == entry.to {
                continue;
            }
            if let Some(mut interface) = interfaces.remove(&entry.from) {
                if let Some(existing) = interfaces.get_mut(&entry.to) {
                    info!("Merging interface {} into existing {}", entry.from, entry.to);
                    merge_members(existing, interface);
                    continue;
                }
                info!("Renaming interface {} to {}", entry.from, entry.to);
                interface.id = entry.to.clone();
                interfaces.insert(entry.to.clone(), interface);
            }
        }

        for interface in interfaces.values_mut() {
            let owner = interface.id.clone();
            for ty in interface.referenced_types_mut() {
                rename_reference(ty, map, strict, &owner)?;
            }
        }

        Ok(Database::from_interfaces(interfaces.into_values()))
    }

    /// Give every `[EventTarget]` interface the event target interface as
    /// parent. Runs after renaming, so the renamed name is used.
    pub fn fix_event_targets(mut self, map: &RenameMap) -> Self {
        let target = map.rename(EVENT_TARGET).to_string();
        for interface in self.interfaces_mut() {
            if !interface.has_ext_attr(EVENT_TARGET) || interface.id == target {
                continue;
            }
            if interface.parent_names().any(|name| name == target) {
                continue;
            }
            interface.parents.push(ParentInterface {
                ty: IdlType::named(target.as_str()),
                annotations: Annotations::with_namespaces(["WebKit"]),
            });
        }
        self
    }
}

/// Operations and constants are appended; attributes only when `into` has
/// none of the same name
fn merge_members(into: &mut Interface, other: Interface) {
    into.operations.extend(other.operations);
    for attribute in other.attributes {
        if !into.attributes.iter().any(|existing| existing.id == attribute.id) {
            into.attributes.push(attribute);
        }
    }
    into.constants.extend(other.constants);
}

fn rename_reference(ty: &mut IdlType, map: &RenameMap, strict: bool, owner: &str) -> Result<(), RenameError> {
    let name = ty.base_name_mut();
    if is_primitive(name.as_str()) {
        return Ok(());
    }
    if let Some(target) = map.get(name.as_str()) {
        *name = target.to_string();
    } else if strict && !map.is_target(name.as_str()) {
        return Err(RenameError::Unmapped {
            type_name: name.clone(),
            interface: owner.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Attribute, ExtAttrs, Interface};

    fn attribute(id: &str, ty: &str) -> Attribute {
        Attribute {
            id: id.to_string(),
            ty: ty.parse().unwrap(),
            readonly: true,
            is_static: false,
            annotations: Annotations::new(),
            ext_attrs: ExtAttrs::new(),
        }
    }

    fn sample_database() -> Database {
        let mut window = Interface::new("DOMWindow");
        window.attributes.push(attribute("self", "DOMWindow"));
        window.attributes.push(attribute("frames", "sequence<DOMWindow>?"));
        window.attributes.push(attribute("name", "DOMString"));

        let mut event = Interface::new("Event");
        event.attributes.push(attribute("view", "DOMWindow"));

        Database::from_interfaces([window, event])
    }

    fn sample_map() -> RenameMap {
        RenameMap::from_pairs([("DOMWindow", "Window"), ("Event", "Event")]).unwrap()
    }

    #[test]
    fn test_map_rejects_chains() {
        let mut map = RenameMap::from_pairs([("DOMWindow", "Window")]).unwrap();
        assert!(map.insert("Window", "Win").is_err());
        assert!(map.insert("Frame", "DOMWindow").is_err());
        assert!(map.insert("DOMWindow", "Other").is_err());
        assert!(map.insert("DOMApplicationCache", "ApplicationCache").is_ok());
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_map_lookups() {
        let map = sample_map();
        assert_eq!(map.rename("DOMWindow"), "Window");
        assert_eq!(map.rename("Node"), "Node");
        assert_eq!(map.canonical("Window"), "DOMWindow");
        assert_eq!(map.canonical("Node"), "Node");
    }

    #[test]
    fn test_rename_interfaces_and_references() {
        let renamed = sample_database().rename(&sample_map(), false).unwrap();

        assert_eq!(renamed.interface_names().collect::<Vec<_>>(), vec!["Event", "Window"]);
        let window = renamed.get("Window").unwrap();
        assert_eq!(window.id, "Window");
        assert_eq!(window.attributes[0].ty.to_string(), "Window");
        assert_eq!(window.attributes[1].ty.to_string(), "sequence<Window>?");
        assert_eq!(renamed.get("Event").unwrap().attributes[0].ty.to_string(), "Window");
    }

    #[test]
    fn test_rename_is_idempotent() {
        let map = sample_map();
        let once = sample_database().rename(&map, true).unwrap();
        let twice = once.clone().rename(&map, true).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_strict_rename_rejects_unmapped_reference() {
        let mut database = sample_database();
        database.get_mut("Event").unwrap().attributes.push(attribute("target", "EventTarget"));

        match database.clone().rename(&sample_map(), true) {
            Err(RenameError::Unmapped { type_name, interface }) => {
                assert_eq!(type_name, "EventTarget");
                assert_eq!(interface, "Event");
            }
            other => panic!("expected unmapped error, got {:?}", other),
        }

        let lenient = database.rename(&sample_map(), false).unwrap();
        let event = lenient.get("Event").unwrap();
        assert_eq!(event.attributes[1].ty.to_string(), "EventTarget");
    }

    #[test]
    fn test_rename_onto_existing_interface_merges_members() {
        let mut renamed_away = Interface::new("DOMWindow");
        renamed_away.attributes.push(attribute("fromDom", "DOMString"));
        renamed_away.attributes.push(attribute("marker", "long"));
        let mut existing = Interface::new("Window");
        existing.attributes.push(attribute("marker", "DOMString"));
        let database = Database::from_interfaces([renamed_away, existing]);

        let renamed = database.rename(&sample_map(), false).unwrap();
        assert_eq!(renamed.len(), 1);
        let window = renamed.get("Window").unwrap();
        let names: Vec<_> = window.attributes.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(names, vec!["marker", "fromDom"]);
        // the existing declaration wins for a shared name
        assert_eq!(window.attributes[0].ty.to_string(), "DOMString");
    }

    #[test]
    fn test_fix_event_targets_uses_renamed_parent() {
        let mut node = Interface::new("Node");
        node.ext_attrs.insert(EVENT_TARGET.to_string(), String::new());
        let database = Database::from_interfaces([node, Interface::new("DOMEventTarget")]);
        let map = RenameMap::from_pairs([("EventTarget", "DOMEventTarget")]).unwrap();

        let fixed = database.fix_event_targets(&map);
        let node = fixed.get("Node").unwrap();
        assert_eq!(node.parent_names().collect::<Vec<_>>(), vec!["DOMEventTarget"]);

        // a second pass adds nothing
        let again = fixed.clone().fix_event_targets(&map);
        assert_eq!(again, fixed);
    }
}
