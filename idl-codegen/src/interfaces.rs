//! Dart interface generator

use crate::backend::System;
use crate::compose::GenerationConfig;
use crate::members::{collect_members, merge_operations, render_members};
use crate::output::OutputBuffer;
use crate::template::Holes;
use crate::GenerationError;
use idl_database::Interface;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use tracing::debug;

/// Read-only view of the files an interfaces generator has emitted
#[derive(Debug, Clone, Default)]
pub struct InterfaceListing {
    files: Rc<RefCell<Vec<PathBuf>>>,
}

impl InterfaceListing {
    pub fn files(&self) -> Vec<PathBuf> {
        self.files.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.files.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.borrow().is_empty()
    }
}

pub struct InterfacesSystem<'db> {
    config: GenerationConfig<'db>,
    files: Rc<RefCell<Vec<PathBuf>>>,
}

impl<'db> InterfacesSystem<'db> {
    pub fn new(config: GenerationConfig<'db>) -> Self {
        Self {
            config,
            files: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn config(&self) -> &GenerationConfig<'db> {
        &self.config
    }

    pub fn listing(&self) -> InterfaceListing {
        InterfaceListing {
            files: Rc::clone(&self.files),
        }
    }

    fn emit(&mut self, interface: &Interface, content: String, out: &mut OutputBuffer) -> Result<(), GenerationError> {
        let path = interface_path(&self.config, &interface.id);
        out.emit(path.clone(), content)?;
        self.files.borrow_mut().push(path);
        Ok(())
    }
}

impl System for InterfacesSystem<'_> {
    fn name(&self) -> &str {
        "interfaces"
    }

    fn process_interface(&mut self, interface: &Interface, out: &mut OutputBuffer) -> Result<(), GenerationError> {
        debug!("Generating interface {}", interface.id);
        let content = render_interface(&self.config, interface)?;
        self.emit(interface, content, out)
    }

    fn process_callback(&mut self, interface: &Interface, out: &mut OutputBuffer) -> Result<(), GenerationError> {
        match render_callback(&self.config, interface)? {
            Some(content) => self.emit(interface, content, out),
            None => Ok(()),
        }
    }

    fn finish(&mut self, _out: &mut OutputBuffer) -> Result<(), GenerationError> {
        Ok(())
    }

    fn file_paths(&self) -> Vec<PathBuf> {
        self.files.borrow().clone()
    }
}

pub(crate) fn interface_path(config: &GenerationConfig, name: &str) -> PathBuf {
    config.output_dir().join("interface").join(format!("{}.dart", name))
}

/// ` extends A, B` over the surviving parents, or nothing
pub(crate) fn interface_extends(parents: &[String]) -> String {
    if parents.is_empty() {
        String::new()
    } else {
        format!(" extends {}", parents.join(", "))
    }
}

pub(crate) fn render_interface(config: &GenerationConfig, interface: &Interface) -> Result<String, GenerationError> {
    let types = config.types();
    let members = collect_members(types, interface)?;
    let parents = config.surviving_parents(interface);

    let mut holes = Holes::new();
    holes.insert("ID", interface.id.clone());
    holes.insert("EXTENDS", interface_extends(&parents));
    holes.insert("MEMBERS", render_members(&members, |_| ";".to_string()));
    holes.insert("NATIVE_NAME", types.canonical_name(&interface.id).to_string());
    config.render("interface.darttemplate", &holes)
}

/// Typedef for a callback interface; `None` when it declares no operation
pub(crate) fn render_callback(
    config: &GenerationConfig,
    interface: &Interface,
) -> Result<Option<String>, GenerationError> {
    let merged = merge_operations(config.types(), &interface.operations)?;
    let Some(operation) = merged.first() else {
        return Ok(None);
    };

    let mut holes = Holes::new();
    holes.insert("ID", interface.id.clone());
    holes.insert("RETURN", operation.return_type.clone());
    holes.insert("PARAMS", operation.parameters());
    config.render("callback.darttemplate", &holes).map(Some)
}
