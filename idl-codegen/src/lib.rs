//! IDL binding generator
//!
//! This crate drives one interface database through a set of backend
//! generators ("systems"), each producing a different flavour of Dart
//! bindings. The pipeline loads and shapes the database once, composes an
//! immutable [`GenerationConfig`] per generator and buffers every emitted
//! file until a single terminal flush.

pub mod backend;
pub mod compose;
pub mod config;
pub mod dummy;
pub mod frog;
pub mod html;
pub mod interfaces;
pub mod members;
pub mod output;
pub mod pipeline;
pub mod template;

// Re-export main types
pub use backend::{build_systems, Backend, System};
pub use compose::{ConfigurationComposer, GenerationConfig, Role};
pub use config::{ConfigError, FlushPolicy, GeneratorConfig, TargetConfig};
pub use interfaces::{InterfaceListing, InterfacesSystem};
pub use output::OutputBuffer;
pub use pipeline::{BackendSummary, GenerationPipeline, GenerationReport, PipelineStage, StageTiming};
pub use template::{Holes, TemplateLoader};

use idl_database::{LoadError, RenameError};
use idl_types::TypeError;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, CodegenError>;

/// Convenience: run the whole pipeline for a comma separated backend list
pub fn generate(config: GeneratorConfig, systems: &str) -> Result<GenerationReport> {
    let backends = Backend::parse_list(systems)?;
    GenerationPipeline::new(config).run(&backends)
}

/// Failures raised while a single generator runs
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("template {name} not found (searched {})", .searched.join(", "))]
    TemplateNotFound { name: String, searched: Vec<String> },

    #[error("template {template} uses unknown condition {flag}")]
    UnknownCondition { template: String, flag: String },

    #[error("template {template}: unbalanced condition block at line {line}")]
    UnbalancedBlock { template: String, line: usize },

    #[error("template {template}: no value for ${hole}")]
    UnboundHole { template: String, hole: String },

    #[error("conflicting output for {path:?}")]
    ConflictingOutput { path: PathBuf },

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error("I/O error for {path:?}: {error}")]
    Io { path: PathBuf, error: std::io::Error },
}

/// Top level generator errors
#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    #[error("unsupported backend: {id}")]
    UnsupportedBackend { id: String },

    #[error("failed to load database: {0}")]
    Load(#[from] LoadError),

    #[error("rename failed: {0}")]
    Rename(#[from] RenameError),

    #[error("backend {backend} failed: {source}")]
    Generation {
        backend: Backend,
        #[source]
        source: GenerationError,
    },

    #[error("backend {backend} failed: {source}; flushing completed backends also failed: {flush}")]
    GenerationNotFlushed {
        backend: Backend,
        #[source]
        source: GenerationError,
        flush: Box<CodegenError>,
    },

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error for {path:?}: {error}")]
    Io { path: PathBuf, error: std::io::Error },
}

impl CodegenError {
    pub fn generation(backend: Backend, source: GenerationError) -> Self {
        Self::Generation { backend, source }
    }
}
