use annotator_patcher::config::{load_for_project, load_from_path};
use annotator_patcher::patcher::POM_FILE;
use annotator_patcher::{
    detect_processors, patch_document, run, AnnotatorOutcome, PatchError, PatcherConfig,
    PomDocument, ProcessRunner, Project, ScratchDir,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::env;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "annotator-patcher")]
#[command(about = "Prepare a Maven project for a NullAway Annotator run", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Patch the POM, run the annotator, then restore the POM
    Run {
        /// Project directory or pom.xml (auto-detected if not specified)
        #[arg(short, long, env = "ANNOTATOR_PROJECT")]
        project: Option<PathBuf>,

        /// Patcher config file (defaults to annotator.toml next to the POM)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Annotator jar, run with `java -jar`
        #[arg(long)]
        annotator_jar: Option<PathBuf>,

        /// Version of the scanner processor to register
        #[arg(long)]
        processor_version: Option<String>,
    },

    /// Show the POM changes a run would make, without writing anything
    Preview {
        /// Project directory or pom.xml (auto-detected if not specified)
        #[arg(short, long, env = "ANNOTATOR_PROJECT")]
        project: Option<PathBuf>,

        /// Patcher config file (defaults to annotator.toml next to the POM)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Report Error Prone and NullAway processor paths in the POM
    Detect {
        /// Project directory or pom.xml (auto-detected if not specified)
        #[arg(short, long, env = "ANNOTATOR_PROJECT")]
        project: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            project,
            config,
            annotator_jar,
            processor_version,
        } => cmd_run(project, config, annotator_jar, processor_version),

        Commands::Preview { project, config } => cmd_preview(project, config),

        Commands::Detect { project, json } => cmd_detect(project, json),
    }
}

/// Resolve the project using multiple detection strategies
///
/// Priority order:
/// 1. Explicit --project flag or ANNOTATOR_PROJECT (directory or POM path)
/// 2. Nearest pom.xml walking up from the current directory
fn resolve_project(cli_project: Option<PathBuf>) -> Result<Project> {
    if let Some(path) = cli_project {
        let path = path
            .canonicalize()
            .with_context(|| format!("project path does not exist: {}", path.display()))?;
        let pom = if path.is_dir() {
            path.join(POM_FILE)
        } else {
            path
        };
        if !pom.is_file() {
            anyhow::bail!("No {} found at {}", POM_FILE, pom.display());
        }
        return Ok(Project::new(pom));
    }

    if let Some(pom) = auto_detect_pom() {
        println!(
            "{}",
            format!("Auto-detected project: {}", pom.display()).dimmed()
        );
        return Ok(Project::new(pom));
    }

    anyhow::bail!(
        "{}\n{}\n  {}\n  {}\n  {}",
        "Could not find a Maven project.".red(),
        "Try one of:".bold(),
        "1. cd into the project directory: cd /path/to/project && annotator-patcher run",
        "2. Specify explicitly: annotator-patcher run --project /path/to/project",
        "3. Set environment variable: export ANNOTATOR_PROJECT=/path/to/project"
    )
}

/// Walk up from the current directory looking for pom.xml
fn auto_detect_pom() -> Option<PathBuf> {
    let current = env::current_dir().ok()?;
    current
        .ancestors()
        .map(|ancestor| ancestor.join(POM_FILE))
        .find(|pom| pom.is_file())
}

/// `--config` wins; otherwise `annotator.toml` beside the POM, if any.
fn load_config(project: &Project, config: Option<PathBuf>) -> Result<PatcherConfig> {
    let config = match config {
        Some(path) => load_from_path(path)?,
        None => load_for_project(project.basedir())?,
    };
    Ok(config)
}

/// Print the hunks `patch_document` would write, in unified diff form.
fn print_pom_diff(pom: &Path, before: &str, after: &str) {
    let label = pom.display();
    println!("{}", format!("--- a/{label}").dimmed());
    println!("{}", format!("+++ b/{label}").dimmed());

    let diff = TextDiff::from_lines(before, after);
    for hunk in diff.unified_diff().context_radius(3).iter_hunks() {
        println!("{}", hunk.header().to_string().cyan());
        for change in hunk.iter_changes() {
            let line = match change.tag() {
                ChangeTag::Insert => format!("+{change}").green(),
                ChangeTag::Delete => format!("-{change}").red(),
                ChangeTag::Equal => format!(" {change}").normal(),
            };
            print!("{line}");
        }
    }
}

fn cmd_run(
    project: Option<PathBuf>,
    config: Option<PathBuf>,
    annotator_jar: Option<PathBuf>,
    processor_version: Option<String>,
) -> Result<()> {
    // 1. Resolve project and settings
    let project = resolve_project(project)?;
    let mut config = load_config(&project, config)?;
    if let Some(jar) = annotator_jar {
        config.annotator.use_jar(&jar.display().to_string());
    }
    if let Some(version) = processor_version {
        config.processor.version = version;
    }
    config.validate()?;

    println!("Project: {}", project.pom().display());
    println!("Processor: {}", config.processor.coordinates());
    println!();

    // 2. Scratch directory lives until the end of this function
    let scratch = ScratchDir::create().context("failed to create scratch directory")?;
    let runner = ProcessRunner::new(&config.annotator.command)?;

    // 3. Patch, invoke, restore
    match run(&project, &config, &scratch, &runner) {
        Ok(report) => {
            println!(
                "{} Patched {} ({} compiler argument(s) extended)",
                "✓".green(),
                report.summary.plugin,
                report.summary.rewritten_args
            );
            if report.summary.rewritten_args == 0 {
                println!(
                    "  {}",
                    "No NullAway compiler argument found; serialization flags were not added"
                        .yellow()
                );
            }
            match report.annotator {
                AnnotatorOutcome::Completed => {
                    println!("{} Annotator finished", "✓".green());
                }
                AnnotatorOutcome::Skipped { reason } => {
                    println!("{} Annotator skipped ({})", "⊘".yellow(), reason);
                }
            }
            println!("{} Restored {}", "✓".green(), project.pom().display());
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", "✗".red(), e);
            match &e {
                PatchError::RestoreFailed { path, backup, .. } => {
                    print_restore_hint(backup, path);
                }
                // `run` keeps the scratch dir only when the restore failed.
                _ if scratch.is_preserved() => {
                    print_restore_hint(&scratch.backup_path(), project.pom());
                }
                PatchError::PluginNotFound { artifact_id } => {
                    eprintln!(
                        "  {} must be declared under <build><plugins> with Error Prone and NullAway configured",
                        artifact_id
                    );
                }
                PatchError::BackupFailed { .. } => {
                    eprintln!("  Nothing was modified.");
                }
                _ => {
                    eprintln!("  Restored {}", project.pom().display());
                }
            }
            drop(scratch);
            std::process::exit(1);
        }
    }
}

fn print_restore_hint(backup: &Path, pom: &Path) {
    eprintln!("  {}", "The POM was NOT restored.".red().bold());
    eprintln!("  Copy {} over {}", backup.display(), pom.display());
}

fn cmd_preview(project: Option<PathBuf>, config: Option<PathBuf>) -> Result<()> {
    let project = resolve_project(project)?;
    let config = load_config(&project, config)?;
    let scratch = ScratchDir::create().context("failed to create scratch directory")?;

    let mut document = PomDocument::from_path(project.pom())
        .with_context(|| format!("failed to parse {}", project.pom().display()))?;
    let summary = patch_document(&mut document, &config, &scratch)?;

    println!("{}", "Preview (nothing is written)".bold());
    println!("Project: {}", project.pom().display());
    println!(
        "Compiler arguments extended: {}",
        summary.rewritten_args.to_string().cyan()
    );

    print_pom_diff(project.pom(), document.source(), &document.render());
    Ok(())
}

fn cmd_detect(project: Option<PathBuf>, json: bool) -> Result<()> {
    let project = resolve_project(project)?;
    let config = load_for_project(project.basedir())?;

    let document = PomDocument::from_path(project.pom())
        .with_context(|| format!("failed to parse {}", project.pom().display()))?;
    let detections = detect_processors(document.root(), &config.compiler.plugin_artifact_id);

    if json {
        println!("{}", serde_json::to_string_pretty(&detections)?);
        return Ok(());
    }

    if detections.is_empty() {
        println!(
            "{}",
            "No Error Prone or NullAway processor paths found.".yellow()
        );
        return Ok(());
    }

    for detection in &detections {
        println!(
            "{} Found {}: {} ({})",
            "✓".green(),
            detection.processor,
            detection.version.bold(),
            detection.site
        );
    }
    Ok(())
}
