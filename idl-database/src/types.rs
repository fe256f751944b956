//! IDL type references
//!
//! Types are stored structurally but serialized in their textual IDL form
//! (`Node`, `sequence<Node>`, `Node?`, `long[]`), which keeps the persisted
//! database readable.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A reference to a type from a member, argument or parent declaration
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum IdlType {
    Named(String),
    Sequence(Box<IdlType>),
    Nullable(Box<IdlType>),
    Array(Box<IdlType>),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid IDL type `{0}`")]
pub struct IdlTypeError(pub String);

impl IdlType {
    pub fn named(name: impl Into<String>) -> Self {
        IdlType::Named(name.into())
    }

    pub fn sequence(inner: IdlType) -> Self {
        IdlType::Sequence(Box::new(inner))
    }

    pub fn nullable(inner: IdlType) -> Self {
        IdlType::Nullable(Box::new(inner))
    }

    /// The innermost named type, e.g. `Node` for `sequence<Node>?`
    pub fn base_name(&self) -> &str {
        match self {
            IdlType::Named(name) => name,
            IdlType::Sequence(inner) | IdlType::Nullable(inner) | IdlType::Array(inner) => {
                inner.base_name()
            }
        }
    }

    /// Mutable access to the innermost name, used by the rename pass.
    pub fn base_name_mut(&mut self) -> &mut String {
        match self {
            IdlType::Named(name) => name,
            IdlType::Sequence(inner) | IdlType::Nullable(inner) | IdlType::Array(inner) => {
                inner.base_name_mut()
            }
        }
    }
}

impl fmt::Display for IdlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdlType::Named(name) => write!(f, "{}", name),
            IdlType::Sequence(inner) => write!(f, "sequence<{}>", inner),
            IdlType::Nullable(inner) => write!(f, "{}?", inner),
            IdlType::Array(inner) => write!(f, "{}[]", inner),
        }
    }
}

impl FromStr for IdlType {
    type Err = IdlTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if let Some(inner) = text.strip_suffix('?') {
            return Ok(IdlType::nullable(inner.parse()?));
        }
        if let Some(inner) = text.strip_suffix("[]") {
            return Ok(IdlType::Array(Box::new(inner.parse()?)));
        }
        if let Some(inner) = text.strip_prefix("sequence<").and_then(|rest| rest.strip_suffix('>')) {
            return Ok(IdlType::sequence(inner.parse()?));
        }

        // "unsigned long long" is a single primitive name
        let valid = !text.is_empty()
            && text.chars().all(|c| c.is_alphanumeric() || c == '_' || c == ' ')
            && !text.starts_with(|c: char| c.is_ascii_digit());
        if valid {
            Ok(IdlType::Named(text.split_whitespace().collect::<Vec<_>>().join(" ")))
        } else {
            Err(IdlTypeError(s.to_string()))
        }
    }
}

impl TryFrom<String> for IdlType {
    type Error = IdlTypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<IdlType> for String {
    fn from(value: IdlType) -> Self {
        value.to_string()
    }
}
