//! IDL type registry
//!
//! A [`TypeRegistry`] answers "what is this type name" for one backend run.
//! It is bound to exactly one database and the rename map that produced it,
//! so two backends that rename differently each get their own registry.

pub mod builtins;
pub mod registry;

// Re-export core types
pub use registry::{TypeInfo, TypeKind, TypeRegistry};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TypeError>;

/// Type resolution errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown type {name}")]
    UnknownType { name: String },
}

impl TypeError {
    pub fn unknown(name: impl Into<String>) -> Self {
        Self::UnknownType { name: name.into() }
    }
}
