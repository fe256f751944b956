//! IDL interface database
//!
//! This crate holds the in-memory interface database that every binding
//! generator reads from. It covers loading the database from its persisted
//! JSON form (fresh or from a cache snapshot) and the destructive passes that
//! shape it for a generation run: pruning members with unresolved types,
//! annotation based filtering, type renaming and event target fixups.
//!
//! Every pass takes the database by value and hands back the transformed
//! database, so a caller that wants to keep the original must clone first.

pub mod error;
pub mod filter;
pub mod load;
pub mod model;
pub mod primitives;
pub mod rename;
pub mod types;

// Re-export core types
pub use error::{LoadError, RenameError};
pub use filter::{FilterCriteria, DISPLACED_KEY, SUPPRESSED_KEY};
pub use load::{CACHE_FILE_NAME, CACHE_FORMAT_VERSION};
pub use model::{
    Annotated, Annotations, Argument, Attribute, Constant, Database, ExtAttrs, Interface, Operation,
    ParentInterface,
};
pub use primitives::is_primitive;
pub use rename::{RenameEntry, RenameMap, EVENT_TARGET};
pub use types::{IdlType, IdlTypeError};
