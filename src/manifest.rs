//! The tab-separated manifest telling the annotator where the per-run
//! NullAway and scanner configuration files live.

use crate::error::PatchError;
use crate::scratch::ScratchDir;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// NullAway fix-serialization config (`nullaway.xml`).
    pub serialization_config: PathBuf,
    /// Annotator scanner config (`scanner.xml`).
    pub scanner_config: PathBuf,
}

impl ManifestEntry {
    pub fn for_scratch(scratch: &ScratchDir) -> Self {
        Self {
            serialization_config: scratch.serialization_config(),
            scanner_config: scratch.scanner_config(),
        }
    }

    /// `<serializationConfigPath>\t<scannerConfigPath>\n`
    pub fn to_line(&self) -> String {
        format!(
            "{}\t{}\n",
            self.serialization_config.display(),
            self.scanner_config.display()
        )
    }
}

/// Write `entry` to `path`, replacing whatever was there.
pub fn write_manifest(path: &Path, entry: &ManifestEntry) -> Result<(), PatchError> {
    fs::write(path, entry.to_line()).map_err(|source| PatchError::ManifestWriteFailed {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "wrote annotator manifest");
    Ok(())
}
