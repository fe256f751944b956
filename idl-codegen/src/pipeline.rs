//! Generation pipeline orchestrating one run

use crate::backend::{build_systems, Backend, System};
use crate::compose::ConfigurationComposer;
use crate::config::{FlushPolicy, GeneratorConfig};
use crate::output::OutputBuffer;
use crate::{CodegenError, GenerationError, Result};
use idl_database::{Database, Interface};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Generation pipeline stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Load,
    Prune,
    Clone,
    Filter,
    Rename,
    Generate,
    Flush,
}

#[derive(Debug, Clone)]
pub struct StageTiming {
    pub stage: PipelineStage,
    pub duration: Duration,
}

#[derive(Debug, Clone)]
pub struct BackendSummary {
    pub backend: Backend,
    pub files: usize,
    pub duration: Duration,
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub stages: Vec<StageTiming>,
    pub backends: Vec<BackendSummary>,
    pub written: Vec<PathBuf>,
    pub interfaces: usize,
    pub skipped: Vec<String>,
    pub total_time: Duration,
}

impl GenerationReport {
    pub fn stage_time(&self, stage: PipelineStage) -> Option<Duration> {
        self.stages.iter().find(|t| t.stage == stage).map(|t| t.duration)
    }
}

/// Drives load, prune, clone, filter, rename, generation and the final flush
pub struct GenerationPipeline {
    config: GeneratorConfig,
}

impl GenerationPipeline {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Resolve `systems` and run them
    pub fn run_ids(&self, systems: &str) -> Result<GenerationReport> {
        let backends = Backend::parse_list(systems)?;
        self.run(&backends)
    }

    /// Run the whole pipeline for `backends`, in the given order
    pub fn run(&self, backends: &[Backend]) -> Result<GenerationReport> {
        let total_start = Instant::now();
        let mut stages = Vec::new();
        let mut timed = |stage: PipelineStage, start: Instant| {
            stages.push(StageTiming {
                stage,
                duration: start.elapsed(),
            })
        };

        // Stage 1: Load
        let start = Instant::now();
        let base = Database::load(&self.config.database_dir, self.config.use_database_cache)?;
        timed(PipelineStage::Load, start);

        // Stage 2: Prune, once on the base database
        let start = Instant::now();
        let base = base.prune_unresolved_members();
        timed(PipelineStage::Prune, start);

        // Stage 3: Clone; the base stays around as the superset
        let start = Instant::now();
        let working = base.clone();
        timed(PipelineStage::Clone, start);

        // Stage 4: Filter
        let start = Instant::now();
        let working = working.filter(&self.config.filter);
        info!("{} of {} interfaces pass the filter", working.len(), base.len());
        timed(PipelineStage::Filter, start);

        // Stage 5: Rename and fix event targets
        let start = Instant::now();
        let renames = &self.config.renames;
        let working = working
            .rename(renames, self.config.strict_renames)?
            .fix_event_targets(renames);
        timed(PipelineStage::Rename, start);

        // Stage 6: Generate
        let start = Instant::now();
        let (order, skipped) = self.generation_order(&working);
        let composer = ConfigurationComposer::new(
            self.config.template_dir.clone(),
            &base,
            self.config.target_configs.clone(),
        );

        let mut shared = OutputBuffer::new();
        let mut summaries = Vec::new();
        for &backend in backends {
            let backend_start = Instant::now();
            info!("Running backend {}", backend);
            let systems = build_systems(backend, &composer, &working, renames, &self.config.output_dir);
            let result = run_systems(systems, &order).and_then(|staged| {
                let files = staged.len();
                shared.absorb(staged).map(|()| files)
            });
            match result {
                Ok(files) => {
                    info!("Backend {} produced {} files", backend, files);
                    summaries.push(BackendSummary {
                        backend,
                        files,
                        duration: backend_start.elapsed(),
                    });
                }
                Err(source) => {
                    error!("Backend {} failed: {}", backend, source);
                    return Err(self.fail(backend, source, shared));
                }
            }
        }
        timed(PipelineStage::Generate, start);

        // Stage 7: Flush, exactly once
        let start = Instant::now();
        let written = shared.flush()?;
        timed(PipelineStage::Flush, start);

        Ok(GenerationReport {
            stages,
            backends: summaries,
            written,
            interfaces: order.len(),
            skipped,
            total_time: total_start.elapsed(),
        })
    }

    /// Apply the flush policy to the output of the backends before `backend`
    fn fail(&self, backend: Backend, source: GenerationError, completed: OutputBuffer) -> CodegenError {
        match self.config.flush_policy {
            FlushPolicy::Abort => {
                warn!("Discarding {} buffered files", completed.len());
            }
            FlushPolicy::FlushCompleted => {
                info!("Flushing {} files of completed backends", completed.len());
                if let Err(flush_error) = completed.flush() {
                    warn!("Flush after failure also failed: {}", flush_error);
                    return CodegenError::GenerationNotFlushed {
                        backend,
                        source,
                        flush: Box::new(flush_error),
                    };
                }
            }
        }
        CodegenError::generation(backend, source)
    }

    /// Interfaces in pre-order, minus those replaced by auxiliary files
    fn generation_order<'db>(&self, database: &'db Database) -> (Vec<&'db Interface>, Vec<String>) {
        let mut order = Vec::new();
        let mut skipped = Vec::new();
        for interface in preorder(database) {
            match &self.config.auxiliary_dir {
                Some(dir) if has_auxiliary_file(dir, &interface.id) => {
                    info!("Skipping {}: auxiliary file in {}", interface.id, dir.display());
                    skipped.push(interface.id.clone());
                }
                _ => order.push(interface),
            }
        }
        (order, skipped)
    }
}

fn has_auxiliary_file(dir: &Path, id: &str) -> bool {
    dir.join(format!("{}.dart", id)).is_file()
}

/// Feed every interface to every system, then finish them in order
fn run_systems(
    mut systems: Vec<Box<dyn System + '_>>,
    order: &[&Interface],
) -> std::result::Result<OutputBuffer, GenerationError> {
    let mut staged = OutputBuffer::new();
    for interface in order {
        for system in systems.iter_mut() {
            if interface.is_callback() {
                system.process_callback(interface, &mut staged)?;
            } else {
                system.process_interface(interface, &mut staged)?;
            }
        }
    }
    for system in systems.iter_mut() {
        system.finish(&mut staged)?;
    }
    Ok(staged)
}

/// Parents before children, siblings by name. Parents that are not in the
/// database are ignored; interfaces caught in an inheritance cycle follow
/// in name order.
pub fn preorder(database: &Database) -> Vec<&Interface> {
    let mut children: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    let mut roots = Vec::new();
    for interface in database.interfaces() {
        let mut has_parent = false;
        for parent in interface.parent_names() {
            if parent != interface.id && database.has_interface(parent) {
                children.entry(parent).or_default().push(&interface.id);
                has_parent = true;
            }
        }
        if !has_parent {
            roots.push(interface.id.as_str());
        }
    }
    for names in children.values_mut() {
        names.sort_unstable();
        names.dedup();
    }

    let mut visited: BTreeSet<&str> = BTreeSet::new();
    let mut order = Vec::with_capacity(database.len());
    for name in roots {
        visit(database, name, false, &children, &mut visited, &mut order);
    }
    for name in database.interface_names() {
        visit(database, name, true, &children, &mut visited, &mut order);
    }
    order
}

/// Emit `name` once all its parents are emitted (or when `force`d), then
/// descend into its children
fn visit<'db>(
    database: &'db Database,
    name: &'db str,
    force: bool,
    children: &BTreeMap<&'db str, Vec<&'db str>>,
    visited: &mut BTreeSet<&'db str>,
    order: &mut Vec<&'db Interface>,
) {
    if visited.contains(name) {
        return;
    }
    let Some(interface) = database.get(name) else {
        return;
    };
    let waiting = interface
        .parent_names()
        .any(|parent| parent != name && database.has_interface(parent) && !visited.contains(parent));
    if waiting && !force {
        return;
    }

    visited.insert(name);
    order.push(interface);
    if let Some(kids) = children.get(name) {
        for child in kids {
            visit(database, child, false, children, visited, order);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use idl_database::{Annotations, IdlType, ParentInterface};

    fn child_of(id: &str, parents: &[&str]) -> Interface {
        let mut interface = Interface::new(id);
        for parent in parents {
            interface.parents.push(ParentInterface {
                ty: IdlType::named(*parent),
                annotations: Annotations::new(),
            });
        }
        interface
    }

    fn ids(order: Vec<&Interface>) -> Vec<&str> {
        order.into_iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn test_preorder_parents_first() {
        let database = Database::from_interfaces([
            child_of("Element", &["Node"]),
            child_of("Attr", &["Node"]),
            Interface::new("Node"),
            child_of("HTMLElement", &["Element"]),
            Interface::new("Blob"),
        ]);
        assert_eq!(ids(preorder(&database)), vec!["Blob", "Node", "Attr", "Element", "HTMLElement"]);
    }

    #[test]
    fn test_preorder_multiple_parents_and_cycles() {
        let database = Database::from_interfaces([
            child_of("Both", &["A", "Z"]),
            Interface::new("A"),
            Interface::new("Z"),
            child_of("Loop1", &["Loop2"]),
            child_of("Loop2", &["Loop1"]),
        ]);
        let order = ids(preorder(&database));
        assert_eq!(order.len(), 5);
        let position = |id: &str| order.iter().position(|x| *x == id).unwrap();
        assert!(position("A") < position("Both"));
        assert!(position("Z") < position("Both"));
    }

    #[test]
    fn test_missing_database_is_a_load_error() {
        let config = GeneratorConfig {
            database_dir: PathBuf::from("/nonexistent/idl/database"),
            ..GeneratorConfig::default()
        };
        let result = GenerationPipeline::new(config).run(&[Backend::Dummy]);
        assert!(matches!(result, Err(CodegenError::Load(_))));
    }
}
