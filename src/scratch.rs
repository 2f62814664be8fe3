//! Process-scoped scratch directory shared by one patch-invoke-restore run.
//!
//! Layout:
//!
//! ```text
//! <tempRoot>/annotator_temp*/annotator/
//!     scanner.xml     written by the scanner during the annotator's build
//!     nullaway.xml    written by NullAway during the annotator's build
//!     paths.tsv       manifest read by the annotator
//!     pom-backup      copy of the original POM
//! ```
//!
//! The directory is removed when the value is dropped, unless
//! [`ScratchDir::preserve`] was called (a failed restore keeps the backup).

use std::cell::Cell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const SCRATCH_PREFIX: &str = "annotator_temp";
const ANNOTATOR_DIR: &str = "annotator";
const SCANNER_CONFIG: &str = "scanner.xml";
const SERIALIZATION_CONFIG: &str = "nullaway.xml";
const MANIFEST: &str = "paths.tsv";
const POM_BACKUP: &str = "pom-backup";

#[derive(Debug)]
pub struct ScratchDir {
    root: PathBuf,
    annotator_dir: PathBuf,
    keep: Cell<bool>,
}

impl ScratchDir {
    /// Create a fresh scratch directory under the system temp dir.
    pub fn create() -> io::Result<Self> {
        Self::create_in(std::env::temp_dir())
    }

    /// Create a fresh scratch directory under `base`.
    pub fn create_in(base: impl AsRef<Path>) -> io::Result<Self> {
        let root = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(base)?
            .keep();

        let scratch = Self {
            annotator_dir: root.join(ANNOTATOR_DIR),
            root,
            keep: Cell::new(false),
        };
        fs::create_dir(&scratch.annotator_dir)?;
        debug!(path = %scratch.annotator_dir.display(), "created scratch directory");

        Ok(scratch)
    }

    /// Directory passed to the annotator as its output dir.
    pub fn annotator_dir(&self) -> &Path {
        &self.annotator_dir
    }

    pub fn scanner_config(&self) -> PathBuf {
        self.annotator_dir.join(SCANNER_CONFIG)
    }

    pub fn serialization_config(&self) -> PathBuf {
        self.annotator_dir.join(SERIALIZATION_CONFIG)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.annotator_dir.join(MANIFEST)
    }

    pub fn backup_path(&self) -> PathBuf {
        self.annotator_dir.join(POM_BACKUP)
    }

    /// Keep the directory on disk after drop.
    pub fn preserve(&self) {
        self.keep.set(true);
    }

    pub fn is_preserved(&self) -> bool {
        self.keep.get()
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if self.keep.get() {
            warn!(path = %self.root.display(), "leaving scratch directory in place");
            return;
        }
        if let Err(e) = fs::remove_dir_all(&self.root) {
            warn!("Failed to remove scratch directory {}: {}", self.root.display(), e);
        }
    }
}
