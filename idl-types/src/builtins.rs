//! Built-in type mappings

/// Dart type for an IDL primitive
pub fn dart_primitive(name: &str) -> Option<&'static str> {
    let dart = match name {
        "void" => "void",
        "any" | "object" => "Object",
        "boolean" => "bool",
        "byte" | "octet" | "short" | "unsigned short" | "long" | "unsigned long" | "long long"
        | "unsigned long long" => "int",
        "float" | "double" => "num",
        "DOMString" => "String",
        "DOMTimeStamp" => "int",
        "Date" => "Date",
        _ => return None,
    };
    Some(dart)
}
