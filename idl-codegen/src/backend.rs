//! Backend selection and generator construction

use crate::compose::{ConfigurationComposer, Role};
use crate::dummy::DummySystem;
use crate::frog::FrogSystem;
use crate::html::{HtmlFrogImplementation, HtmlInterfacesSystem, NativeImplementation};
use crate::interfaces::InterfacesSystem;
use crate::output::OutputBuffer;
use crate::{CodegenError, GenerationError};
use idl_database::{Database, Interface, RenameMap};
use idl_types::TypeRegistry;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::str::FromStr;
use tracing::debug;

/// The backends a run can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Backend {
    /// Interfaces only
    Interface,
    /// Interfaces plus a throwing dummy implementation
    Dummy,
    /// Interfaces plus a JIT target implementation
    Frog,
    /// Html interfaces over a JIT target implementation
    HtmlFrog,
    /// Html interfaces over a native implementation
    HtmlDartium,
}

impl Backend {
    pub const ALL: [Backend; 5] = [
        Backend::Interface,
        Backend::Dummy,
        Backend::Frog,
        Backend::HtmlFrog,
        Backend::HtmlDartium,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Backend::Interface => "interface",
            Backend::Dummy => "dummy",
            Backend::Frog => "frog",
            Backend::HtmlFrog => "htmlfrog",
            Backend::HtmlDartium => "htmldartium",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Backend::Interface => "Dart interfaces only",
            Backend::Dummy => "interfaces and a dummy implementation",
            Backend::Frog => "interfaces and a frog implementation",
            Backend::HtmlFrog => "html interfaces over a frog implementation",
            Backend::HtmlDartium => "html interfaces over a native dartium implementation",
        }
    }

    pub fn is_html(self) -> bool {
        matches!(self, Backend::HtmlFrog | Backend::HtmlDartium)
    }

    /// Directory under the output root used unless a target overrides it
    pub fn default_output_subdir(self) -> &'static str {
        if self.is_html() {
            "html"
        } else {
            "dom"
        }
    }

    /// Resolve a comma separated list; any unknown id fails the whole list
    pub fn parse_list(list: &str) -> Result<Vec<Backend>, CodegenError> {
        list.split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::parse::<Backend>)
            .collect()
    }
}

impl FromStr for Backend {
    type Err = CodegenError;

    fn from_str(id: &str) -> Result<Self, Self::Err> {
        Backend::ALL
            .into_iter()
            .find(|backend| backend.id() == id)
            .ok_or_else(|| CodegenError::UnsupportedBackend { id: id.to_string() })
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A generator bound to one generation configuration
///
/// The driver calls `process_interface` (or `process_callback` for
/// callback interfaces) once per interface in pre-order, then `finish`.
pub trait System {
    fn name(&self) -> &str;

    fn process_interface(&mut self, interface: &Interface, out: &mut OutputBuffer) -> Result<(), GenerationError>;

    /// Callback interfaces are skipped unless a generator overrides this
    fn process_callback(&mut self, _interface: &Interface, _out: &mut OutputBuffer) -> Result<(), GenerationError> {
        Ok(())
    }

    fn finish(&mut self, out: &mut OutputBuffer) -> Result<(), GenerationError>;

    /// Every file this generator emitted so far
    fn file_paths(&self) -> Vec<PathBuf>;
}

/// Build the generators of `backend`, in the order they must run
pub fn build_systems<'db>(
    backend: Backend,
    composer: &ConfigurationComposer<'db>,
    database: &'db Database,
    renames: &'db RenameMap,
    output_root: &Path,
) -> Vec<Box<dyn System + 'db>> {
    // one registry per backend
    let types = Rc::new(TypeRegistry::new(database, renames));
    let compose = |role: Role| composer.compose_role(backend, role, Rc::clone(&types), output_root, Some(renames));

    match backend {
        Backend::Interface => {
            vec![Box::new(InterfacesSystem::new(compose(Role::DomInterfaces)))]
        }
        Backend::Dummy | Backend::Frog => {
            let interfaces = InterfacesSystem::new(compose(Role::DomInterfaces));
            let listing = interfaces.listing();
            let implementation: Box<dyn System + 'db> = if backend == Backend::Dummy {
                Box::new(DummySystem::new(compose(Role::DummyImplementation), listing))
            } else {
                Box::new(FrogSystem::new(compose(Role::FrogImplementation), listing))
            };
            vec![Box::new(interfaces), implementation]
        }
        Backend::HtmlFrog | Backend::HtmlDartium => {
            let html_config = compose(Role::HtmlInterfaces);
            let implementation: Box<dyn System + 'db> = if html_config.condition("DARTIUM") {
                Box::new(NativeImplementation::new(compose(Role::HtmlNativeImplementation)))
            } else {
                Box::new(HtmlFrogImplementation::new(compose(Role::HtmlFrogImplementation)))
            };
            debug!("{} wraps implementation {}", backend, implementation.name());
            vec![Box::new(HtmlInterfacesSystem::new(html_config, implementation))]
        }
    }
}
