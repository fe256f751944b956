//! Per-generator configuration composition

use crate::backend::Backend;
use crate::config::TargetConfig;
use crate::template::{Holes, TemplateLoader};
use crate::GenerationError;
use idl_database::{Database, Interface, RenameMap};
use idl_types::TypeRegistry;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::debug;

/// The part a generator plays inside its backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    DomInterfaces,
    DummyImplementation,
    FrogImplementation,
    HtmlInterfaces,
    HtmlFrogImplementation,
    HtmlNativeImplementation,
}

impl Role {
    /// Default template search chain, most specific first
    pub fn template_paths(self) -> &'static [&'static str] {
        match self {
            Role::DomInterfaces => &["dom/interface", "dom", ""],
            Role::DummyImplementation => &["dom/dummy", "dom", ""],
            Role::FrogImplementation => &["dom/frog", "dom", ""],
            Role::HtmlInterfaces => &["html/interface", "html/impl", "html", ""],
            Role::HtmlFrogImplementation => &["html/frog", "html/impl", "html", ""],
            Role::HtmlNativeImplementation => &["dom/native", "html/dartium", "html/impl", ""],
        }
    }

    /// Default condition flags; html interfaces take theirs from the backend
    pub fn conditions(self, backend: Backend) -> BTreeMap<String, bool> {
        let (dartium, frog) = match self {
            Role::DomInterfaces | Role::DummyImplementation => (false, false),
            Role::FrogImplementation | Role::HtmlFrogImplementation => (false, true),
            Role::HtmlNativeImplementation => (true, false),
            Role::HtmlInterfaces => (backend == Backend::HtmlDartium, backend == Backend::HtmlFrog),
        };
        BTreeMap::from([("DARTIUM".to_string(), dartium), ("FROG".to_string(), frog)])
    }
}

/// Immutable configuration of one generator
#[derive(Debug)]
pub struct GenerationConfig<'db> {
    backend: Backend,
    role: Role,
    templates: TemplateLoader,
    output_dir: PathBuf,
    superset: &'db Database,
    types: Rc<TypeRegistry<'db>>,
    renames: Option<&'db RenameMap>,
}

impl<'db> GenerationConfig<'db> {
    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn templates(&self) -> &TemplateLoader {
        &self.templates
    }

    pub fn template_paths(&self) -> &[String] {
        self.templates.paths()
    }

    pub fn conditions(&self) -> &BTreeMap<String, bool> {
        self.templates.conditions()
    }

    /// Value of a condition flag; unset flags read as false
    pub fn condition(&self, flag: &str) -> bool {
        self.conditions().get(flag).copied().unwrap_or(false)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn database(&self) -> &'db Database {
        self.types.database()
    }

    /// The pruned database before filtering and renaming
    pub fn superset(&self) -> &'db Database {
        self.superset
    }

    pub fn types(&self) -> &TypeRegistry<'db> {
        &self.types
    }

    pub fn shared_types(&self) -> Rc<TypeRegistry<'db>> {
        Rc::clone(&self.types)
    }

    pub fn renames(&self) -> Option<&'db RenameMap> {
        self.renames
    }

    pub fn render(&self, template: &str, holes: &Holes) -> Result<String, GenerationError> {
        self.templates.render(template, holes)
    }

    /// Parents of `interface` that are part of the output.
    ///
    /// A parent that was filtered out is replaced by its nearest ancestors
    /// that survived, found by walking the superset database.
    pub fn surviving_parents(&self, interface: &Interface) -> Vec<String> {
        let database = self.database();
        let registry = self.types();
        let mut result: Vec<String> = Vec::new();
        let mut visited = BTreeSet::new();
        let mut pending: VecDeque<String> = interface.parent_names().map(str::to_string).collect();

        while let Some(name) = pending.pop_front() {
            if !visited.insert(name.clone()) {
                continue;
            }
            if database.has_interface(&name) {
                if !result.contains(&name) {
                    result.push(name);
                }
                continue;
            }
            let canonical = registry.canonical_name(&name);
            if let Some(filtered) = self.superset.get(canonical) {
                debug!("Parent {} of {} was filtered, walking up", name, interface.id);
                pending.extend(
                    filtered
                        .parent_names()
                        .map(|parent| registry.renames().rename(parent).to_string()),
                );
            }
        }
        result
    }
}

/// Builds generation configurations for one run
///
/// The composer only packages its inputs; it never interprets condition
/// flags and keeps no state between calls.
#[derive(Debug)]
pub struct ConfigurationComposer<'db> {
    template_dir: Option<PathBuf>,
    superset: &'db Database,
    targets: BTreeMap<String, TargetConfig>,
}

impl<'db> ConfigurationComposer<'db> {
    pub fn new(
        template_dir: Option<PathBuf>,
        superset: &'db Database,
        targets: BTreeMap<String, TargetConfig>,
    ) -> Self {
        Self {
            template_dir,
            superset,
            targets,
        }
    }

    /// Package explicit inputs into a configuration
    #[allow(clippy::too_many_arguments)]
    pub fn compose(
        &self,
        backend: Backend,
        role: Role,
        template_paths: Vec<String>,
        conditions: BTreeMap<String, bool>,
        types: Rc<TypeRegistry<'db>>,
        output_dir: PathBuf,
        renames: Option<&'db RenameMap>,
    ) -> GenerationConfig<'db> {
        GenerationConfig {
            backend,
            role,
            templates: TemplateLoader::new(self.template_dir.clone(), template_paths, conditions),
            output_dir,
            superset: self.superset,
            types,
            renames,
        }
    }

    /// Compose the configuration of `role` from its defaults and the
    /// backend's target overrides
    pub fn compose_role(
        &self,
        backend: Backend,
        role: Role,
        types: Rc<TypeRegistry<'db>>,
        output_root: &Path,
        renames: Option<&'db RenameMap>,
    ) -> GenerationConfig<'db> {
        let target = self.targets.get(backend.id());

        let mut template_paths: Vec<String> = Vec::new();
        if let Some(target) = target {
            template_paths.extend(target.template_paths.iter().cloned());
        }
        template_paths.extend(role.template_paths().iter().map(|path| path.to_string()));

        let mut conditions = role.conditions(backend);
        if let Some(target) = target {
            conditions.extend(target.conditions.iter().map(|(flag, value)| (flag.clone(), *value)));
        }

        let subdir = target
            .and_then(|target| target.output_subdir.as_deref())
            .unwrap_or_else(|| backend.default_output_subdir());
        let output_dir = output_root.join(subdir);

        debug!(
            "Composed {:?} for {}: templates [{}]",
            role,
            backend,
            template_paths.join(", ")
        );
        self.compose(backend, role, template_paths, conditions, types, output_dir, renames)
    }
}
