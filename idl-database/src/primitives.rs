//! Built-in IDL type names
//!
//! These names resolve without a matching interface in the database.

/// IDL primitive and built-in type names
pub const PRIMITIVE_TYPES: &[&str] = &[
    "void",
    "any",
    "object",
    "boolean",
    "byte",
    "octet",
    "short",
    "unsigned short",
    "long",
    "unsigned long",
    "long long",
    "unsigned long long",
    "float",
    "double",
    "DOMString",
    "DOMTimeStamp",
    "Date",
];

/// Check whether a type name is a built-in
pub fn is_primitive(name: &str) -> bool {
    PRIMITIVE_TYPES.contains(&name)
}
