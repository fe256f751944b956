//! Member signatures shared by the generators

use idl_database::{Attribute, Interface, Operation};
use idl_types::{TypeError, TypeRegistry};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub ty: String,
    pub name: String,
}

/// All overloads of one operation folded into a single signature.
///
/// Arguments past the shortest overload become optional. Where overloads
/// disagree on a type, `Object` is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedOperation {
    pub name: String,
    pub return_type: String,
    pub required: Vec<Param>,
    pub optional: Vec<Param>,
    pub is_static: bool,
}

impl MergedOperation {
    pub fn parameters(&self) -> String {
        let required = self.required.iter().map(|p| format!("{} {}", p.ty, p.name));
        let mut params: Vec<String> = required.collect();
        if !self.optional.is_empty() {
            let optional: Vec<String> = self.optional.iter().map(|p| format!("{} {}", p.ty, p.name)).collect();
            params.push(format!("[{}]", optional.join(", ")));
        }
        params.join(", ")
    }

    pub fn signature(&self) -> String {
        format!(
            "{}{} {}({})",
            static_prefix(self.is_static),
            self.return_type,
            self.name,
            self.parameters()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Member {
    Constant { ty: String, name: String, value: String },
    Getter { ty: String, name: String, is_static: bool },
    Setter { ty: String, name: String, is_static: bool },
    Method(MergedOperation),
}

impl Member {
    pub fn name(&self) -> &str {
        match self {
            Member::Constant { name, .. } | Member::Getter { name, .. } | Member::Setter { name, .. } => name,
            Member::Method(operation) => &operation.name,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Member::Constant { .. })
    }

    /// Declaration without the trailing `;` or body
    pub fn declaration(&self) -> String {
        match self {
            Member::Constant { ty, name, value } => format!("static final {} {} = {}", ty, name, value),
            Member::Getter { ty, name, is_static } => format!("{}{} get {}", static_prefix(*is_static), ty, name),
            Member::Setter { ty, name, is_static } => {
                format!("{}void set {}({} value)", static_prefix(*is_static), name, ty)
            }
            Member::Method(operation) => operation.signature(),
        }
    }
}

fn static_prefix(is_static: bool) -> &'static str {
    if is_static {
        "static "
    } else {
        ""
    }
}

/// One line per member: two spaces, the declaration, then `body(member)`
pub fn render_members<'m, I, F>(members: I, body: F) -> String
where
    I: IntoIterator<Item = &'m Member>,
    F: Fn(&Member) -> String,
{
    members
        .into_iter()
        .map(|member| format!("  {}{}\n", member.declaration(), body(member)))
        .collect()
}

/// Members of `interface` in declaration order: constants, attributes, then
/// merged operations
pub fn collect_members(types: &TypeRegistry, interface: &Interface) -> Result<Vec<Member>, TypeError> {
    let mut members = Vec::new();

    for constant in &interface.constants {
        members.push(Member::Constant {
            ty: types.dart_type(&constant.ty)?,
            name: constant.id.clone(),
            value: constant.value.clone(),
        });
    }

    for attribute in &interface.attributes {
        push_attribute(types, attribute, &mut members)?;
    }

    for operation in merge_operations(types, &interface.operations)? {
        members.push(Member::Method(operation));
    }
    Ok(members)
}

/// Members an implementation class must add itself: those of every parent
/// after the first, transitively, that `interface` does not declare
pub fn collect_secondary_members(types: &TypeRegistry, interface: &Interface) -> Result<Vec<Member>, TypeError> {
    let mut attributes: BTreeSet<String> = interface.attributes.iter().map(|a| a.id.clone()).collect();
    let mut operations: BTreeSet<String> = interface.operations.iter().map(|o| o.id.clone()).collect();
    let mut members = Vec::new();

    for parent in secondary_parents(types, interface) {
        for attribute in &parent.attributes {
            if attributes.insert(attribute.id.clone()) {
                push_attribute(types, attribute, &mut members)?;
            }
        }

        let inherited: Vec<Operation> = parent
            .operations
            .iter()
            .filter(|operation| !operations.contains(&operation.id))
            .cloned()
            .collect();
        for operation in merge_operations(types, &inherited)? {
            operations.insert(operation.name.clone());
            members.push(Member::Method(operation));
        }
    }
    Ok(members)
}

/// Own members followed by the secondary parent members
pub fn collect_implementation_members(types: &TypeRegistry, interface: &Interface) -> Result<Vec<Member>, TypeError> {
    let mut members = collect_members(types, interface)?;
    members.extend(collect_secondary_members(types, interface)?);
    Ok(members)
}

/// Parents after the first and all of their ancestors, depth first
fn secondary_parents<'db>(types: &TypeRegistry<'db>, interface: &Interface) -> Vec<&'db Interface> {
    let mut result: Vec<&'db Interface> = Vec::new();
    let mut pending: Vec<&str> = interface.parent_names().skip(1).collect();
    pending.reverse();
    let mut visited: BTreeSet<String> = BTreeSet::new();

    while let Some(name) = pending.pop() {
        if !visited.insert(name.to_string()) {
            continue;
        }
        let Some(parent) = types.interface(name) else {
            continue;
        };
        result.push(parent);
        let mut grandparents: Vec<&str> = parent.parent_names().collect();
        grandparents.reverse();
        pending.extend(grandparents);
    }
    result
}

fn push_attribute(types: &TypeRegistry, attribute: &Attribute, members: &mut Vec<Member>) -> Result<(), TypeError> {
    let ty = types.dart_type(&attribute.ty)?;
    members.push(Member::Getter {
        ty: ty.clone(),
        name: attribute.id.clone(),
        is_static: attribute.is_static,
    });
    if !attribute.readonly {
        members.push(Member::Setter {
            ty,
            name: attribute.id.clone(),
            is_static: attribute.is_static,
        });
    }
    Ok(())
}

/// Group overloads by name, keeping the order of first appearance
pub fn merge_operations(types: &TypeRegistry, operations: &[Operation]) -> Result<Vec<MergedOperation>, TypeError> {
    let mut groups: Vec<(&str, Vec<&Operation>)> = Vec::new();
    for operation in operations {
        match groups.iter_mut().find(|(name, _)| *name == operation.id) {
            Some((_, overloads)) => overloads.push(operation),
            None => groups.push((operation.id.as_str(), vec![operation])),
        }
    }

    groups
        .into_iter()
        .map(|(name, overloads)| merge_group(types, name, &overloads))
        .collect()
}

fn merge_group(types: &TypeRegistry, name: &str, overloads: &[&Operation]) -> Result<MergedOperation, TypeError> {
    let shortest = overloads
        .iter()
        .map(|op| op.arguments.iter().take_while(|arg| !arg.optional).count())
        .min()
        .unwrap_or(0);
    let longest = overloads
        .iter()
        .max_by_key(|op| op.arguments.len())
        .map(|op| op.arguments.as_slice())
        .unwrap_or(&[]);

    let mut required = Vec::new();
    let mut optional = Vec::new();
    for (index, argument) in longest.iter().enumerate() {
        let mut ty: Option<String> = None;
        for overload in overloads {
            if let Some(arg) = overload.arguments.get(index) {
                let dart = types.dart_type(&arg.ty)?;
                ty = match ty {
                    Some(seen) if seen != dart => Some("Object".to_string()),
                    _ => Some(dart),
                };
            }
        }
        let param = Param {
            ty: ty.unwrap_or_else(|| "Object".to_string()),
            name: argument.id.clone(),
        };
        if index < shortest {
            required.push(param);
        } else {
            optional.push(param);
        }
    }

    let mut return_type: Option<String> = None;
    for overload in overloads {
        let dart = types.dart_type(&overload.ty)?;
        return_type = match return_type {
            Some(seen) if seen != dart => Some("Object".to_string()),
            _ => Some(dart),
        };
    }

    Ok(MergedOperation {
        name: name.to_string(),
        return_type: return_type.unwrap_or_else(|| "void".to_string()),
        required,
        optional,
        is_static: overloads.iter().all(|op| op.is_static),
    })
}
