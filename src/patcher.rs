//! The patch-invoke-restore pipeline.
//!
//! backup -> locate plugin -> inject processor path -> rewrite flags ->
//! persist POM -> write manifest -> run annotator -> restore POM.
//!
//! Everything after the backup runs inside a scope whose exit restores the
//! original POM, whether the steps succeed, return an error or panic.

use crate::annotator::{AnnotatorInvocation, AnnotatorRunner};
use crate::backup::BackupGuard;
use crate::config::PatcherConfig;
use crate::error::PatchError;
use crate::manifest::{write_manifest, ManifestEntry};
use crate::persist::atomic_write;
use crate::pom::{
    inject_processor_path, locate_plugin, option_suffix, rewrite_compiler_args, Coordinates,
    CONFIGURATION,
};
use crate::scratch::ScratchDir;
use crate::xml::PomDocument;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

pub const POM_FILE: &str = "pom.xml";

/// The Maven project being patched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pom: PathBuf,
    basedir: PathBuf,
}

impl Project {
    pub fn new(pom: impl Into<PathBuf>) -> Self {
        let pom = pom.into();
        let basedir = match pom.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self { pom, basedir }
    }

    /// `<dir>/pom.xml`
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(POM_FILE))
    }

    pub fn pom(&self) -> &Path {
        &self.pom
    }

    pub fn basedir(&self) -> &Path {
        &self.basedir
    }
}

/// What the in-memory patch changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchSummary {
    pub plugin: String,
    pub processor: Coordinates,
    pub rewritten_args: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotatorOutcome {
    Completed,
    /// The annotator was not started; the POM was still restored.
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "RunReport tells whether the annotator actually ran"]
pub struct RunReport {
    pub summary: PatchSummary,
    pub annotator: AnnotatorOutcome,
}

/// Apply the processor-path injection and flag rewrite to `document`.
///
/// Runs at most once per document: neither step is idempotent.
pub fn patch_document(
    document: &mut PomDocument,
    config: &PatcherConfig,
    scratch: &ScratchDir,
) -> Result<PatchSummary, PatchError> {
    let plugin_id = &config.compiler.plugin_artifact_id;
    let plugin = locate_plugin(document.root_mut(), plugin_id)?;

    let processor = config.processor.coordinates();
    inject_processor_path(plugin, &processor);

    let suffix = option_suffix(&scratch.scanner_config(), &scratch.serialization_config());
    let configuration = plugin.ensure_child(CONFIGURATION);
    let rewritten_args = rewrite_compiler_args(configuration, &config.compiler.marker, &suffix);

    info!(
        plugin = %plugin_id,
        processor = %processor,
        rewritten_args,
        "patched compiler plugin"
    );

    Ok(PatchSummary {
        plugin: plugin_id.clone(),
        processor,
        rewritten_args,
    })
}

/// Patch the project's POM, run the annotator against it, then put the
/// original POM back.
///
/// The first failure is returned. Once the backup exists, restoring is
/// attempted on every path; if that also fails the scratch directory is
/// preserved so the backup copy is not lost.
pub fn run(
    project: &Project,
    config: &PatcherConfig,
    scratch: &ScratchDir,
    runner: &dyn AnnotatorRunner,
) -> Result<RunReport, PatchError> {
    let backup = BackupGuard::take(project.pom(), scratch)?;
    let backup_path = backup.record().backup.clone();

    let outcome = patch_and_invoke(project, config, scratch, runner);

    match (outcome, backup.restore()) {
        (Ok(report), Ok(())) => Ok(report),
        (Err(err), Ok(())) => Err(err),
        (Ok(_), Err(restore_err)) => {
            scratch.preserve();
            Err(restore_err)
        }
        (Err(err), Err(restore_err)) => {
            scratch.preserve();
            error!(
                backup = %backup_path.display(),
                "{restore_err}; copy the backup over the POM by hand"
            );
            Err(err)
        }
    }
}

fn patch_and_invoke(
    project: &Project,
    config: &PatcherConfig,
    scratch: &ScratchDir,
    runner: &dyn AnnotatorRunner,
) -> Result<RunReport, PatchError> {
    let pom = project.pom();
    let mut document = PomDocument::from_path(pom).map_err(|source| PatchError::PomParse {
        path: pom.to_path_buf(),
        source,
    })?;

    let summary = patch_document(&mut document, config, scratch)?;

    atomic_write(pom, document.render().as_bytes()).map_err(|source| {
        PatchError::ConfigPersistFailed {
            path: pom.to_path_buf(),
            source,
        }
    })?;
    info!(pom = %pom.display(), "wrote patched POM");

    let manifest = scratch.manifest_path();
    if let Err(err) = write_manifest(&manifest, &ManifestEntry::for_scratch(scratch)) {
        warn!("{err}; skipping annotator run");
        return Ok(RunReport {
            summary,
            annotator: AnnotatorOutcome::Skipped {
                reason: err.to_string(),
            },
        });
    }

    let invocation = AnnotatorInvocation::new(config, scratch, project.basedir());
    runner.run(&invocation.args())?;

    Ok(RunReport {
        summary,
        annotator: AnnotatorOutcome::Completed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_paths() {
        let project = Project::from_dir("/work/app");
        assert_eq!(project.pom(), Path::new("/work/app/pom.xml"));
        assert_eq!(project.basedir(), Path::new("/work/app"));

        let bare = Project::new("pom.xml");
        assert_eq!(bare.basedir(), Path::new("."));
    }

    #[test]
    fn test_patch_document_missing_plugin() {
        let base = tempfile::tempdir().unwrap();
        let scratch = ScratchDir::create_in(base.path()).unwrap();
        let mut document =
            PomDocument::parse("<project><build><plugins/></build></project>").unwrap();

        let err = patch_document(&mut document, &PatcherConfig::default(), &scratch).unwrap_err();

        assert!(matches!(err, PatchError::PluginNotFound { .. }));
        assert!(!document.is_modified());
    }

    #[test]
    fn test_patch_document_summary() {
        let base = tempfile::tempdir().unwrap();
        let scratch = ScratchDir::create_in(base.path()).unwrap();
        let mut document = PomDocument::parse(
            "<project><build><plugins><plugin>\
             <artifactId>maven-compiler-plugin</artifactId>\
             <configuration><compilerArgs>\
             <arg>-Xplugin:ErrorProne -XepOpt:NullAway:AnnotatedPackages=a</arg>\
             <arg>-parameters</arg>\
             </compilerArgs></configuration>\
             </plugin></plugins></build></project>",
        )
        .unwrap();

        let summary =
            patch_document(&mut document, &PatcherConfig::default(), &scratch).unwrap();

        assert_eq!(summary.plugin, "maven-compiler-plugin");
        assert_eq!(summary.rewritten_args, 1);
        assert_eq!(
            summary.processor.to_string(),
            "edu.ucr.cs.riple.annotator:annotator-scanner:1.3.8"
        );
        let rendered = document.render();
        assert!(rendered.contains("<arg>-parameters</arg>"));
        assert!(rendered.contains("-XepOpt:NullAway:SerializeFixMetadata=true</arg>"));
    }

    #[test]
    fn test_patch_document_keeps_comments() {
        let base = tempfile::tempdir().unwrap();
        let scratch = ScratchDir::create_in(base.path()).unwrap();
        let mut document = PomDocument::parse(
            "<project><build><plugins><plugin>\n\
             <artifactId>maven-compiler-plugin</artifactId>\n\
             <configuration>\n  <!-- keep me -->\n</configuration>\n\
             </plugin></plugins></build></project>",
        )
        .unwrap();

        patch_document(&mut document, &PatcherConfig::default(), &scratch).unwrap();
        assert!(document.render().contains("<!-- keep me -->"));

        let mut document = PomDocument::parse(
            "<project><build><plugins><plugin>\
             <artifactId>maven-compiler-plugin</artifactId>\
             <configuration><compilerArgs>\
             <arg><!-- c -->-XepOpt:NullAway:X</arg>\
             </compilerArgs></configuration>\
             </plugin></plugins></build></project>",
        )
        .unwrap();

        let summary =
            patch_document(&mut document, &PatcherConfig::default(), &scratch).unwrap();
        assert_eq!(summary.rewritten_args, 1);
        assert!(document
            .render()
            .contains("<arg><!-- c -->-XepOpt:NullAway:X -Xep:AnnotatorScanner:ERROR "));
    }
}
