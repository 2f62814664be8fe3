//! Annotator Patcher: prepares a Maven project for a NullAway Annotator run.
//!
//! The patcher registers the Annotator scanner on the compiler plugin's
//! annotation processor path, extends the existing NullAway compiler
//! arguments with serialization options, hands the project to the Annotator,
//! and finally restores the POM exactly as it was.
//!
//! # Architecture
//!
//! All edits operate on [`ConfigNode`], an ordered tree parsed from the POM by
//! [`PomDocument`]. Rendering the document copies the original bytes of every
//! node that was not touched, so the only diff is the injected configuration.
//!
//! # Safety
//!
//! - The POM is backed up before anything is mutated
//! - Restore runs on success, on error and on unwind ([`BackupGuard`])
//! - Atomic file writes (tempfile + fsync + rename)
//! - Scratch files live in one explicitly owned directory ([`ScratchDir`])
//!
//! # Example
//!
//! ```no_run
//! use annotator_patcher::{run, PatcherConfig, ProcessRunner, Project, ScratchDir};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PatcherConfig::default();
//! let scratch = ScratchDir::create()?;
//! let runner = ProcessRunner::new(&config.annotator.command)?;
//!
//! let report = run(&Project::from_dir("."), &config, &scratch, &runner)?;
//! println!("{:?}", report.annotator);
//! # Ok(())
//! # }
//! ```

pub mod annotator;
pub mod backup;
pub mod config;
pub mod error;
pub mod manifest;
pub mod patcher;
pub mod persist;
pub mod pom;
pub mod scratch;
pub mod xml;

// Re-exports
pub use annotator::{AnnotatorInvocation, AnnotatorRunner, InvokeError, ProcessRunner};
pub use backup::{BackupGuard, BackupRecord};
pub use config::{load_for_project, load_from_path, load_from_str, ConfigError, PatcherConfig};
pub use error::PatchError;
pub use manifest::{write_manifest, ManifestEntry};
pub use patcher::{patch_document, run, AnnotatorOutcome, PatchSummary, Project, RunReport};
pub use pom::{detect_processors, Coordinates, Detection, DetectionSite, KnownProcessor};
pub use scratch::ScratchDir;
pub use xml::{ConfigNode, PomDocument, XmlError};
