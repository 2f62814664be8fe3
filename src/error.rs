use crate::annotator::InvokeError;
use crate::xml::XmlError;
use std::path::PathBuf;
use thiserror::Error;

/// Terminating failures of a patch-invoke-restore run.
///
/// Every variant raised after a backup exists is returned only once the
/// original POM has been put back (or restoring it has been attempted).
#[derive(Error, Debug)]
pub enum PatchError {
    #[error("plugin '{artifact_id}' is not declared in the project's build plugins")]
    PluginNotFound { artifact_id: String },

    #[error("failed to back up {}: {source}", .path.display())]
    BackupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    PomParse {
        path: PathBuf,
        #[source]
        source: XmlError,
    },

    #[error("failed to persist patched configuration to {}: {source}", .path.display())]
    ConfigPersistFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write manifest {}: {source}", .path.display())]
    ManifestWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("annotator run failed: {0}")]
    AnnotatorInvocationFailed(#[from] InvokeError),

    #[error("failed to restore {} from {}: {source}", .path.display(), .backup.display())]
    RestoreFailed {
        path: PathBuf,
        backup: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
