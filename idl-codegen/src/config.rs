//! Generator configuration and settings

use crate::backend::Backend;
use idl_database::{FilterCriteria, RenameMap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

/// What happens to buffered output when a backend fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlushPolicy {
    /// Discard everything
    #[default]
    Abort,
    /// Flush the output of the backends that completed before the failure
    FlushCompleted,
}

/// Main generator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub database_dir: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_dir: Option<PathBuf>,
    pub output_dir: PathBuf,
    /// Hand written `<Interface>.dart` files that replace generated ones
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auxiliary_dir: Option<PathBuf>,
    pub use_database_cache: bool,
    pub strict_renames: bool,
    pub flush_policy: FlushPolicy,
    pub filter: FilterCriteria,
    pub renames: RenameMap,
    pub target_configs: BTreeMap<String, TargetConfig>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            database_dir: PathBuf::from("idl/database"),
            template_dir: None,
            output_dir: PathBuf::from("generated"),
            auxiliary_dir: None,
            use_database_cache: false,
            strict_renames: false,
            flush_policy: FlushPolicy::Abort,
            filter: FilterCriteria::default(),
            renames: RenameMap::new(),
            target_configs: BTreeMap::new(),
        }
    }
}

/// Per-backend overrides, keyed by backend id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Searched before the backend's default template paths
    pub template_paths: Vec<String>,
    /// Override the default condition flags
    pub conditions: BTreeMap<String, bool>,
    /// Replaces the backend's default directory under the output root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_subdir: Option<String>,
}

impl GeneratorConfig {
    /// Load configuration from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e,
        })
    }

    /// Save configuration to TOML file
    pub fn to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize { error: e })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                error: e,
            })?;
        }

        std::fs::write(path, content).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e,
        })
    }

    /// Get backend-specific configuration
    pub fn target_config(&self, backend: Backend) -> TargetConfig {
        self.target_configs.get(backend.id()).cloned().unwrap_or_default()
    }

    pub fn set_target_config(&mut self, backend: Backend, config: TargetConfig) {
        self.target_configs.insert(backend.id().to_string(), config);
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (id, target) in &self.target_configs {
            if id.parse::<Backend>().is_err() {
                return Err(ConfigError::Invalid {
                    field: format!("target_configs.{}", id),
                    message: format!("unknown backend, expected one of {}", backend_ids()),
                });
            }
            for path in &target.template_paths {
                if !is_relative_inside(Path::new(path)) {
                    return Err(ConfigError::Invalid {
                        field: format!("target_configs.{}.template_paths", id),
                        message: format!("{} must be a relative path without '..'", path),
                    });
                }
            }
            if let Some(subdir) = &target.output_subdir {
                if subdir.is_empty() || !is_relative_inside(Path::new(subdir)) {
                    return Err(ConfigError::Invalid {
                        field: format!("target_configs.{}.output_subdir", id),
                        message: format!("{:?} must be a non-empty relative path without '..'", subdir),
                    });
                }
            }
        }

        // a hand-built map is checked again for rename chains
        let pairs = self.renames.entries().iter().map(|e| (e.from.as_str(), e.to.as_str()));
        RenameMap::from_pairs(pairs).map_err(|e| ConfigError::Invalid {
            field: "renames".to_string(),
            message: e.to_string(),
        })?;

        Ok(())
    }
}

fn is_relative_inside(path: &Path) -> bool {
    path.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

fn backend_ids() -> String {
    Backend::ALL.iter().map(|b| b.id()).collect::<Vec<_>>().join(", ")
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error for {path:?}: {error}")]
    Io { path: PathBuf, error: std::io::Error },

    #[error("Parse error for {path:?}: {error}")]
    Parse { path: PathBuf, error: toml::de::Error },

    #[error("Serialization error: {error}")]
    Serialize { error: toml::ser::Error },

    #[error("Invalid configuration for {field}: {message}")]
    Invalid { field: String, message: String },
}

/// Predefined configurations
pub mod presets {
    use super::*;
    use idl_database::RenameError;

    /// Everything annotated for WebKit or Dart that neither family suppressed
    pub fn default_filter() -> FilterCriteria {
        FilterCriteria::webkit_dart()
    }

    /// W3C interface names mapped to the names WebKit uses for them
    pub fn webkit_renames() -> Result<RenameMap, RenameError> {
        RenameMap::from_pairs([
            ("ApplicationCache", "DOMApplicationCache"),
            ("BarProp", "BarInfo"),
            ("DedicatedWorkerGlobalScope", "DedicatedWorkerContext"),
            ("FormData", "DOMFormData"),
            ("Selection", "DOMSelection"),
            ("SharedWorkerGlobalScope", "SharedWorkerContext"),
            ("Window", "DOMWindow"),
            ("WorkerGlobalScope", "WorkerContext"),
        ])
    }

    /// Frog output with an extra override directory searched first
    pub fn frog_overrides() -> TargetConfig {
        TargetConfig {
            template_paths: vec!["overrides/frog".to_string()],
            ..TargetConfig::default()
        }
    }

    /// A complete configuration for the WebKit IDL
    pub fn webkit() -> Result<GeneratorConfig, RenameError> {
        let mut config = GeneratorConfig {
            filter: default_filter(),
            renames: webkit_renames()?,
            ..GeneratorConfig::default()
        };
        config.set_target_config(Backend::Frog, frog_overrides());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = GeneratorConfig::default();
        assert_eq!(config.flush_policy, FlushPolicy::Abort);
        assert!(!config.use_database_cache);
        assert!(config.renames.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_target_config() {
        let mut config = GeneratorConfig::default();
        config.set_target_config(Backend::Frog, presets::frog_overrides());

        assert_eq!(config.target_config(Backend::Frog).template_paths, vec!["overrides/frog"]);
        assert_eq!(config.target_config(Backend::Dummy), TargetConfig::default());
    }

    #[test]
    fn test_config_validation() {
        let mut config = GeneratorConfig::default();
        config.target_configs.insert("bogus".to_string(), TargetConfig::default());
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));

        let mut config = GeneratorConfig::default();
        config.set_target_config(
            Backend::Dummy,
            TargetConfig {
                output_subdir: Some("../elsewhere".to_string()),
                ..TargetConfig::default()
            },
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_file_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("idlgen.toml");

        let mut config = presets::webkit().unwrap();
        config.flush_policy = FlushPolicy::FlushCompleted;
        config.auxiliary_dir = Some(PathBuf::from("src/auxiliary"));

        config.to_file(&config_path).unwrap();
        let loaded = GeneratorConfig::from_file(&config_path).unwrap();

        assert_eq!(loaded, config);
        assert_eq!(loaded.renames.rename("Window"), "DOMWindow");
        assert_eq!(loaded.renames.rename("BarProp"), "BarInfo");
    }

    #[test]
    fn test_rename_chain_in_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("idlgen.toml");
        std::fs::write(
            &config_path,
            r#"
[[renames]]
from = "DOMWindow"
to = "Window"

[[renames]]
from = "Window"
to = "Win"
"#,
        )
        .unwrap();

        assert!(matches!(
            GeneratorConfig::from_file(&config_path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("idlgen.toml");
        std::fs::write(
            &config_path,
            r#"
database_dir = "idl"
flush_policy = "flush-completed"

[target_configs.htmldartium]
output_subdir = "dartium"
conditions = { DARTIUM = true }
"#,
        )
        .unwrap();

        let config = GeneratorConfig::from_file(&config_path).unwrap();
        assert_eq!(config.database_dir, PathBuf::from("idl"));
        assert_eq!(config.flush_policy, FlushPolicy::FlushCompleted);
        assert_eq!(config.filter, FilterCriteria::webkit_dart());
        let target = config.target_config(Backend::HtmlDartium);
        assert_eq!(target.output_subdir.as_deref(), Some("dartium"));
        assert!(config.validate().is_ok());
    }
}
