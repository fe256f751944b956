//! Buffered output shared by every backend of a run

use crate::{CodegenError, GenerationError};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// Pending generated files, keyed by destination path
///
/// Writes are additive only: a path can be emitted again with identical
/// content, but never replaced. The buffer is written to disk by
/// [`OutputBuffer::flush`], which consumes it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OutputBuffer {
    files: BTreeMap<PathBuf, String>,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Result<(), GenerationError> {
        let (path, content) = (path.into(), content.into());
        match self.files.get(&path) {
            Some(existing) if *existing == content => Ok(()),
            Some(_) => Err(GenerationError::ConflictingOutput { path }),
            None => {
                debug!("Buffered {}", path.display());
                self.files.insert(path, content);
                Ok(())
            }
        }
    }

    /// Move every file of `staged` into this buffer. Nothing is moved when
    /// any file conflicts.
    pub fn absorb(&mut self, staged: OutputBuffer) -> Result<(), GenerationError> {
        for (path, content) in &staged.files {
            if self.files.get(path).is_some_and(|existing| existing != content) {
                return Err(GenerationError::ConflictingOutput { path: path.clone() });
            }
        }
        self.files.extend(staged.files);
        Ok(())
    }

    pub fn get(&self, path: &Path) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Write every pending file, creating parent directories as needed
    pub fn flush(self) -> Result<Vec<PathBuf>, CodegenError> {
        let mut written = Vec::with_capacity(self.files.len());
        for (path, content) in self.files {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|error| CodegenError::Io {
                    path: parent.to_path_buf(),
                    error,
                })?;
            }
            fs::write(&path, content).map_err(|error| CodegenError::Io {
                path: path.clone(),
                error,
            })?;
            written.push(path);
        }
        info!("Flushed {} files", written.len());
        Ok(written)
    }
}

/// `target` relative to the directory `base`, with `/` separators
pub fn relative_path(base: &Path, target: &Path) -> String {
    let base: Vec<Component> = base.components().collect();
    let target: Vec<Component> = target.components().collect();
    let common = base.iter().zip(&target).take_while(|(a, b)| a == b).count();

    let mut parts: Vec<String> = Vec::new();
    parts.extend(std::iter::repeat("..".to_string()).take(base.len() - common));
    parts.extend(
        target[common..]
            .iter()
            .map(|component| component.as_os_str().to_string_lossy().into_owned()),
    );
    parts.join("/")
}

/// `#source(...)` lines for a library manifest living in `library_dir`
pub fn source_directives<'a>(library_dir: &Path, files: impl IntoIterator<Item = &'a PathBuf>) -> String {
    files
        .into_iter()
        .map(|file| format!("#source('{}');\n", relative_path(library_dir, file)))
        .collect()
}
