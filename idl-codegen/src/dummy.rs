//! Dummy implementation generator
//!
//! Emits a class per interface whose members all throw, plus the
//! `dom_dummy.dart` library listing the interface and implementation files.

use crate::backend::System;
use crate::compose::GenerationConfig;
use crate::interfaces::InterfaceListing;
use crate::members::{collect_implementation_members, render_members};
use crate::output::{source_directives, OutputBuffer};
use crate::template::Holes;
use crate::GenerationError;
use idl_database::Interface;
use std::path::PathBuf;
use tracing::debug;

pub struct DummySystem<'db> {
    config: GenerationConfig<'db>,
    interfaces: InterfaceListing,
    files: Vec<PathBuf>,
}

impl<'db> DummySystem<'db> {
    pub fn new(config: GenerationConfig<'db>, interfaces: InterfaceListing) -> Self {
        Self {
            config,
            interfaces,
            files: Vec::new(),
        }
    }

    pub fn library_path(&self) -> PathBuf {
        self.config.output_dir().join("dom_dummy.dart")
    }
}

impl System for DummySystem<'_> {
    fn name(&self) -> &str {
        "dummy"
    }

    fn process_interface(&mut self, interface: &Interface, out: &mut OutputBuffer) -> Result<(), GenerationError> {
        let members = collect_implementation_members(self.config.types(), interface)?;
        let body = |member: &crate::members::Member| {
            format!(
                " {{\n    throw new UnsupportedOperationException('{}.{}');\n  }}",
                interface.id,
                member.name()
            )
        };

        let mut holes = Holes::new();
        holes.insert("ID", interface.id.clone());
        holes.insert("MEMBERS", render_members(members.iter().filter(|m| !m.is_constant()), body));
        let content = self.config.render("impl.darttemplate", &holes)?;

        let path = self
            .config
            .output_dir()
            .join("dummy")
            .join(format!("{}Impl.dart", interface.id));
        debug!("Dummy implementation {}", path.display());
        out.emit(path.clone(), content)?;
        self.files.push(path);
        Ok(())
    }

    fn finish(&mut self, out: &mut OutputBuffer) -> Result<(), GenerationError> {
        let library = self.library_path();
        let library_dir = self.config.output_dir();
        let interface_files = self.interfaces.files();

        let mut sources = source_directives(library_dir, &interface_files);
        sources.push_str(&source_directives(library_dir, &self.files));

        let mut holes = Holes::new();
        holes.insert("SOURCES", sources);
        let content = self.config.render("library.darttemplate", &holes)?;
        out.emit(library.clone(), content)?;
        self.files.push(library);
        Ok(())
    }

    fn file_paths(&self) -> Vec<PathBuf> {
        self.files.clone()
    }
}
