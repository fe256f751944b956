//! Loading the database from disk
//!
//! The persisted database is a directory of `*.json` files, each holding one
//! interface or a list of interfaces. Files are read in name order. Next to
//! the sources a [`CACHE_FILE_NAME`] snapshot can be stored; it records a
//! SHA-256 fingerprint of the sources so that a snapshot taken before the
//! sources changed is rejected instead of silently used.

use crate::error::LoadError;
use crate::model::{Database, Interface};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name of the cache snapshot inside the database directory
pub const CACHE_FILE_NAME: &str = "cache.json";

/// Bumped whenever the snapshot layout changes
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// On-disk shape of an interface source file
#[derive(Deserialize)]
#[serde(untagged)]
enum SourceFile {
    One(Interface),
    Many(Vec<Interface>),
}

#[derive(Serialize, Deserialize)]
struct CacheSnapshot {
    format_version: u32,
    fingerprint: String,
    interfaces: Vec<Interface>,
}

impl Database {
    /// Load the database from `source`, either by reading the interface
    /// files or, with `use_cache`, from a snapshot that is current.
    pub fn load(source: impl AsRef<Path>, use_cache: bool) -> Result<Self, LoadError> {
        let source = source.as_ref();
        if !source.is_dir() {
            return Err(LoadError::MissingSource {
                path: source.to_path_buf(),
            });
        }

        let database = if use_cache {
            Self::load_from_cache(source)?
        } else {
            Self::load_sources(source)?
        };
        info!("Loaded {} interfaces from {}", database.len(), source.display());
        Ok(database)
    }

    /// Parse every interface file in `dir`
    pub fn load_sources(dir: &Path) -> Result<Self, LoadError> {
        let mut database = Database::new();
        for path in source_files(dir)? {
            let content = fs::read_to_string(&path).map_err(|e| LoadError::io(&path, e))?;
            let parsed: SourceFile = serde_json::from_str(&content).map_err(|error| LoadError::Malformed {
                path: path.clone(),
                error,
            })?;
            let interfaces = match parsed {
                SourceFile::One(interface) => vec![interface],
                SourceFile::Many(interfaces) => interfaces,
            };

            debug!("{}: {} interfaces", path.display(), interfaces.len());
            for interface in interfaces {
                if database.has_interface(&interface.id) {
                    return Err(LoadError::DuplicateInterface {
                        name: interface.id,
                        path,
                    });
                }
                database.insert(interface);
            }
        }
        Ok(database)
    }

    /// Read the snapshot in `dir`, rejecting it when the sources moved on
    pub fn load_from_cache(dir: &Path) -> Result<Self, LoadError> {
        let cache_path = dir.join(CACHE_FILE_NAME);
        if !cache_path.is_file() {
            return Err(LoadError::CacheMissing { path: cache_path });
        }

        let content = fs::read_to_string(&cache_path).map_err(|e| LoadError::io(&cache_path, e))?;
        let snapshot: CacheSnapshot = serde_json::from_str(&content).map_err(|error| LoadError::Malformed {
            path: cache_path.clone(),
            error,
        })?;

        if snapshot.format_version != CACHE_FORMAT_VERSION {
            return Err(LoadError::stale(
                cache_path,
                format!(
                    "format version {} does not match {}",
                    snapshot.format_version, CACHE_FORMAT_VERSION
                ),
            ));
        }
        let current = fingerprint(&source_files(dir)?)?;
        if snapshot.fingerprint != current {
            return Err(LoadError::stale(cache_path, "interface sources changed since the snapshot was taken"));
        }

        debug!("Using database cache {}", cache_path.display());
        Ok(Database::from_interfaces(snapshot.interfaces))
    }

    /// Write a snapshot of this database into `dir`, fingerprinted against
    /// the sources currently in `dir`.
    pub fn save_cache(&self, dir: &Path) -> Result<PathBuf, LoadError> {
        let cache_path = dir.join(CACHE_FILE_NAME);
        let snapshot = CacheSnapshot {
            format_version: CACHE_FORMAT_VERSION,
            fingerprint: fingerprint(&source_files(dir)?)?,
            interfaces: self.interfaces().cloned().collect(),
        };
        let content = serde_json::to_string(&snapshot).map_err(|error| LoadError::Serialize {
            path: cache_path.clone(),
            error,
        })?;
        fs::write(&cache_path, content).map_err(|e| LoadError::io(&cache_path, e))?;

        info!("Wrote database cache {}", cache_path.display());
        Ok(cache_path)
    }
}

/// Interface files in `dir`, sorted, excluding the snapshot
fn source_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let entries = fs::read_dir(dir).map_err(|e| LoadError::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| LoadError::io(dir, e))?.path();
        let is_json = path.extension().map(|ext| ext == "json").unwrap_or(false);
        let is_cache = path.file_name().map(|name| name == CACHE_FILE_NAME).unwrap_or(false);
        if path.is_file() && is_json && !is_cache {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn fingerprint(files: &[PathBuf]) -> Result<String, LoadError> {
    let mut hasher = Sha256::new();
    for path in files {
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let content = fs::read(path).map_err(|e| LoadError::io(path, e))?;
        hasher.update(name.as_bytes());
        hasher.update([0u8]);
        hasher.update(&content);
        hasher.update([0u8]);
    }
    Ok(hex::encode(hasher.finalize()))
}
