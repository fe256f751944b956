//! IDL binding generator CLI

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use idl_codegen::config::presets;
use idl_codegen::{Backend, FlushPolicy, GenerationPipeline, GeneratorConfig, PipelineStage};
use idl_database::Database;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "idlgen")]
#[command(about = "Dart binding generator for an IDL interface database")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate bindings
    Generate(GenerateArgs),

    /// Rebuild the database cache snapshot
    Cache {
        /// Database directory
        #[arg(short, long, default_value = "idl/database")]
        database: PathBuf,
    },

    /// Show available systems
    Systems,

    /// Create default configuration file
    InitConfig {
        /// Output path for configuration file
        #[arg(short, long, default_value = "idlgen.toml")]
        output: PathBuf,
    },

    /// Validate configuration file
    ValidateConfig {
        /// Configuration file path
        path: PathBuf,
    },
}

#[derive(Args)]
struct GenerateArgs {
    /// Comma separated systems to run, in order; may be empty
    #[arg(short, long, default_value = "frog,dummy,htmlfrog,htmldartium")]
    systems: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Database directory
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Directory searched for templates before the builtin ones
    #[arg(short, long)]
    templates: Option<PathBuf>,

    /// Directory of hand written interface files to skip
    #[arg(long)]
    auxiliary_dir: Option<PathBuf>,

    /// Load the database from its cache snapshot
    #[arg(long)]
    use_database_cache: bool,

    /// Fail on referenced type names the rename map does not know
    #[arg(long)]
    strict_renames: bool,

    /// Flush the output of completed systems when a later one fails
    #[arg(long)]
    flush_completed: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt().with_max_level(level).init();

    match cli.command {
        Commands::Generate(args) => handle_generate(args, cli.config),
        Commands::Cache { database } => handle_cache(database),
        Commands::Systems => handle_systems(),
        Commands::InitConfig { output } => handle_init_config(output),
        Commands::ValidateConfig { path } => handle_validate_config(path),
    }
}

fn handle_generate(args: GenerateArgs, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let backends = Backend::parse_list(&args.systems)?;

    // Load configuration
    let config = match config_path {
        Some(path) => {
            let config = GeneratorConfig::from_file(&path)?;
            config.validate()?;
            config
        }
        None => GeneratorConfig::default(),
    };
    let config = apply_overrides(config, &args);

    info!("Generating {} into {}", args.systems, config.output_dir.display());
    let report = GenerationPipeline::new(config)
        .run(&backends)
        .with_context(|| format!("generating {}", args.systems))?;

    info!("Generation successful!");
    for stage in [PipelineStage::Load, PipelineStage::Filter, PipelineStage::Generate, PipelineStage::Flush] {
        if let Some(duration) = report.stage_time(stage) {
            info!("  {:?} time: {:?}", stage, duration);
        }
    }
    for summary in &report.backends {
        info!("  {}: {} files in {:?}", summary.backend, summary.files, summary.duration);
    }
    if !report.skipped.is_empty() {
        info!("  Skipped {} interfaces with auxiliary files", report.skipped.len());
    }
    info!("  Wrote {} files for {} interfaces", report.written.len(), report.interfaces);
    info!("  Total time: {:?}", report.total_time);

    Ok(())
}

/// Command line flags win over the configuration file
fn apply_overrides(mut config: GeneratorConfig, args: &GenerateArgs) -> GeneratorConfig {
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(dir) = &args.database {
        config.database_dir = dir.clone();
    }
    if let Some(dir) = &args.templates {
        config.template_dir = Some(dir.clone());
    }
    if let Some(dir) = &args.auxiliary_dir {
        config.auxiliary_dir = Some(dir.clone());
    }
    config.use_database_cache |= args.use_database_cache;
    config.strict_renames |= args.strict_renames;
    if args.flush_completed {
        config.flush_policy = FlushPolicy::FlushCompleted;
    }
    config
}

fn handle_cache(database: PathBuf) -> anyhow::Result<()> {
    info!("Rebuilding cache for {}", database.display());

    let loaded = Database::load_sources(&database)
        .with_context(|| format!("loading {}", database.display()))?;
    let path = loaded.save_cache(&database)?;

    info!("Cached {} interfaces in {}", loaded.len(), path.display());
    Ok(())
}

fn handle_systems() -> anyhow::Result<()> {
    println!("Available systems:");
    for backend in Backend::ALL {
        println!("  {:<12} {}", backend.id(), backend.description());
    }
    Ok(())
}

fn handle_init_config(output: PathBuf) -> anyhow::Result<()> {
    info!("Creating configuration file at {}", output.display());

    let config = presets::webkit()?;
    config.to_file(&output)?;

    info!("Configuration file created successfully!");
    Ok(())
}

fn handle_validate_config(path: PathBuf) -> anyhow::Result<()> {
    info!("Validating configuration file {}", path.display());

    let config = GeneratorConfig::from_file(&path)?;
    config.validate()?;

    info!("Configuration file is valid!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate_args(argv: &[&str]) -> GenerateArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Commands::Generate(args) => args,
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_generate_defaults() {
        let args = generate_args(&["idlgen", "generate"]);
        assert_eq!(
            Backend::parse_list(&args.systems).unwrap(),
            vec![Backend::Frog, Backend::Dummy, Backend::HtmlFrog, Backend::HtmlDartium]
        );
        assert!(!args.flush_completed);

        let config = apply_overrides(GeneratorConfig::default(), &args);
        assert_eq!(config, GeneratorConfig::default());
    }

    #[test]
    fn test_flags_override_config() {
        let args = generate_args(&[
            "idlgen",
            "generate",
            "--systems",
            "frog,htmlfrog",
            "--output-dir",
            "out",
            "--use-database-cache",
            "--flush-completed",
        ]);
        let config = apply_overrides(GeneratorConfig::default(), &args);
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert!(config.use_database_cache);
        assert_eq!(config.flush_policy, FlushPolicy::FlushCompleted);
        assert_eq!(
            Backend::parse_list(&args.systems).unwrap(),
            vec![Backend::Frog, Backend::HtmlFrog]
        );
    }

    #[test]
    fn test_empty_systems_list_is_accepted() {
        let args = generate_args(&["idlgen", "generate", "--systems", ""]);
        assert!(Backend::parse_list(&args.systems).unwrap().is_empty());
    }
}
