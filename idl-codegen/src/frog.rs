//! Frog (JIT target) implementation generator

use crate::backend::System;
use crate::compose::GenerationConfig;
use crate::interfaces::InterfaceListing;
use crate::members::{collect_implementation_members, render_members, Member};
use crate::output::{source_directives, OutputBuffer};
use crate::template::Holes;
use crate::GenerationError;
use idl_database::Interface;
use std::path::PathBuf;

pub struct FrogSystem<'db> {
    config: GenerationConfig<'db>,
    interfaces: InterfaceListing,
    files: Vec<PathBuf>,
}

impl<'db> FrogSystem<'db> {
    pub fn new(config: GenerationConfig<'db>, interfaces: InterfaceListing) -> Self {
        Self {
            config,
            interfaces,
            files: Vec::new(),
        }
    }
}

/// Inline JavaScript body for a member of a native object
pub(crate) fn frog_body(member: &Member) -> String {
    match member {
        Member::Getter { name, .. } => format!(" native \"return this.{};\";", name),
        Member::Setter { name, .. } => format!(" native \"this.{} = value;\";", name),
        _ => " native;".to_string(),
    }
}

impl System for FrogSystem<'_> {
    fn name(&self) -> &str {
        "frog"
    }

    fn process_interface(&mut self, interface: &Interface, out: &mut OutputBuffer) -> Result<(), GenerationError> {
        let types = self.config.types();
        let members = collect_implementation_members(types, interface)?;
        let extends = self
            .config
            .surviving_parents(interface)
            .first()
            .map(|parent| format!(" extends {}Js", parent))
            .unwrap_or_default();

        let mut holes = Holes::new();
        holes.insert("ID", interface.id.clone());
        holes.insert("EXTENDS", extends);
        holes.insert("NATIVE_NAME", types.canonical_name(&interface.id).to_string());
        holes.insert("MEMBERS", render_members(members.iter().filter(|m| !m.is_constant()), frog_body));
        let content = self.config.render("impl.darttemplate", &holes)?;

        let path = self
            .config
            .output_dir()
            .join("frog")
            .join(format!("{}Js.dart", interface.id));
        out.emit(path.clone(), content)?;
        self.files.push(path);
        Ok(())
    }

    fn finish(&mut self, out: &mut OutputBuffer) -> Result<(), GenerationError> {
        let library = self.config.output_dir().join("dom_frog.dart");
        let library_dir = self.config.output_dir();

        let mut sources = source_directives(library_dir, &self.interfaces.files());
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
