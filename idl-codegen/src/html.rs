//! Html bindings: interfaces generator wrapping an implementation generator
//!
//! [`HtmlInterfacesSystem`] owns the implementation it wraps. Every
//! interface is forwarded to the implementation, and the html library
//! manifest lists every file the implementation reports through
//! [`System::file_paths`].

use crate::backend::System;
use crate::compose::GenerationConfig;
use crate::frog::frog_body;
use crate::interfaces::{interface_path, render_callback, render_interface};
use crate::members::{collect_implementation_members, render_members, Member};
use crate::output::{source_directives, OutputBuffer};
use crate::template::Holes;
use crate::GenerationError;
use idl_database::Interface;
use std::path::PathBuf;
use tracing::{debug, info};

pub struct HtmlInterfacesSystem<'db> {
    name: String,
    config: GenerationConfig<'db>,
    implementation: Box<dyn System + 'db>,
    files: Vec<PathBuf>,
}

impl<'db> HtmlInterfacesSystem<'db> {
    pub fn new(config: GenerationConfig<'db>, implementation: Box<dyn System + 'db>) -> Self {
        Self {
            name: format!("html({})", implementation.name()),
            config,
            implementation,
            files: Vec::new(),
        }
    }

    pub fn implementation(&self) -> &dyn System {
        self.implementation.as_ref()
    }

    pub fn library_path(&self) -> PathBuf {
        let file = if self.config.condition("DARTIUM") {
            "html_dartium.dart"
        } else {
            "html_frog.dart"
        };
        self.config.output_dir().join(file)
    }

    fn emit(&mut self, interface: &Interface, content: String, out: &mut OutputBuffer) -> Result<(), GenerationError> {
        let path = interface_path(&self.config, &interface.id);
        out.emit(path.clone(), content)?;
        self.files.push(path);
        Ok(())
    }
}

impl System for HtmlInterfacesSystem<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    fn process_interface(&mut self, interface: &Interface, out: &mut OutputBuffer) -> Result<(), GenerationError> {
        let content = render_interface(&self.config, interface)?;
        self.emit(interface, content, out)?;
        self.implementation.process_interface(interface, out)
    }

    fn process_callback(&mut self, interface: &Interface, out: &mut OutputBuffer) -> Result<(), GenerationError> {
        if let Some(content) = render_callback(&self.config, interface)? {
            self.emit(interface, content, out)?;
        }
        self.implementation.process_callback(interface, out)
    }

    fn finish(&mut self, out: &mut OutputBuffer) -> Result<(), GenerationError> {
        self.implementation.finish(out)?;

        let implementation_files = self.implementation.file_paths();
        let library = self.library_path();
        let library_dir = self.config.output_dir();

        let mut sources = source_directives(library_dir, &self.files);
        sources.push_str(&source_directives(library_dir, &implementation_files));

        let mut holes = Holes::new();
        holes.insert("SOURCES", sources);
        let content = self.config.render("library.darttemplate", &holes)?;
        info!(
            "{} lists {} interface and {} implementation files",
            library.display(),
            self.files.len(),
            implementation_files.len()
        );
        out.emit(library.clone(), content)?;
        self.files.push(library);
        Ok(())
    }

    fn file_paths(&self) -> Vec<PathBuf> {
        let mut files = self.files.clone();
        files.extend(self.implementation.file_paths());
        files
    }
}

/// Shared shape of the two html implementations
struct ImplementationFiles<'db> {
    config: GenerationConfig<'db>,
    subdir: &'static str,
    files: Vec<PathBuf>,
}

impl<'db> ImplementationFiles<'db> {
    fn new(config: GenerationConfig<'db>, subdir: &'static str) -> Self {
        Self {
            config,
            subdir,
            files: Vec::new(),
        }
    }

    fn emit_class<F>(
        &mut self,
        interface: &Interface,
        extends: String,
        body: F,
        out: &mut OutputBuffer,
    ) -> Result<(), GenerationError>
    where
        F: Fn(&Member) -> String,
    {
        let types = self.config.types();
        let members = collect_implementation_members(types, interface)?;

        let mut holes = Holes::new();
        holes.insert("ID", interface.id.clone());
        holes.insert("EXTENDS", extends);
        holes.insert("NATIVE_NAME", types.canonical_name(&interface.id).to_string());
        holes.insert("MEMBERS", render_members(members.iter().filter(|m| !m.is_constant()), body));
        let content = self.config.render("impl.darttemplate", &holes)?;

        let path = self.path(&format!("{}Impl.dart", interface.id));
        out.emit(path.clone(), content)?;
        self.files.push(path);
        Ok(())
    }

    /// Runtime support shared by every class of the implementation
    fn emit_support(&mut self, out: &mut OutputBuffer) -> Result<(), GenerationError> {
        let content = self.config.render("support.darttemplate", &Holes::new())?;
        let path = self.path("_support.dart");
        out.emit(path.clone(), content)?;
        self.files.push(path);
        Ok(())
    }

    fn path(&self, file: &str) -> PathBuf {
        self.config.output_dir().join(self.subdir).join(file)
    }
}

/// Html implementation compiled by frog against native browser objects
pub struct HtmlFrogImplementation<'db> {
    inner: ImplementationFiles<'db>,
}

impl<'db> HtmlFrogImplementation<'db> {
    pub fn new(config: GenerationConfig<'db>) -> Self {
        Self {
            inner: ImplementationFiles::new(config, "frog"),
        }
    }
}

impl System for HtmlFrogImplementation<'_> {
    fn name(&self) -> &str {
        "htmlfrog-impl"
    }

    fn process_interface(&mut self, interface: &Interface, out: &mut OutputBuffer) -> Result<(), GenerationError> {
        let extends = self
            .inner
            .config
            .surviving_parents(interface)
            .first()
            .map(|parent| format!(" extends {}Impl", parent))
            .unwrap_or_default();
        self.inner.emit_class(interface, extends, frog_body, out)
    }

    fn finish(&mut self, out: &mut OutputBuffer) -> Result<(), GenerationError> {
        self.inner.emit_support(out)
    }

    fn file_paths(&self) -> Vec<PathBuf> {
        self.inner.files.clone()
    }
}

/// Html implementation bound to the native dartium entry points
pub struct NativeImplementation<'db> {
    inner: ImplementationFiles<'db>,
}

impl<'db> NativeImplementation<'db> {
    pub fn new(config: GenerationConfig<'db>) -> Self {
        Self {
            inner: ImplementationFiles::new(config, "dartium"),
        }
    }
}

impl System for NativeImplementation<'_> {
    fn name(&self) -> &str {
        "dartium-impl"
    }

    fn process_interface(&mut self, interface: &Interface, out: &mut OutputBuffer) -> Result<(), GenerationError> {
        // native entry points are named after the canonical interface
        let native = self.inner.config.types().canonical_name(&interface.id).to_string();
        debug!("Native bindings for {} as {}", interface.id, native);
        let body = move |member: &Member| match member {
            Member::Getter { name, .. } => format!(" native \"{}_{}_Getter\";", native, name),
            Member::Setter { name, .. } => format!(" native \"{}_{}_Setter\";", native, name),
            other => format!(" native \"{}_{}_Callback\";", native, other.name()),
        };
        self.inner.emit_class(interface, String::new(), body, out)
    }

    fn finish(&mut self, out: &mut OutputBuffer) -> Result<(), GenerationError> {
        self.inner.emit_support(out)
    }

    fn file_paths(&self) -> Vec<PathBuf> {
        self.inner.files.clone()
    }
}
