//! Backup and guaranteed restore of the host POM.
//!
//! A [`BackupGuard`] exists only between a successful backup and the single
//! restore that consumes it. Dropping a guard that was never restored (early
//! return, panic) restores the file from `Drop`, so the original POM is put
//! back on every exit path once a backup was taken.

use crate::error::PatchError;
use crate::persist::atomic_write;
use crate::scratch::ScratchDir;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use xxhash_rust::xxh3::xxh3_64;

/// The original file and where its copy lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRecord {
    pub original: PathBuf,
    pub backup: PathBuf,
}

/// Live backup of one file. Borrows the scratch dir that holds the copy, and
/// keeps it on disk if the restore from `Drop` fails.
#[derive(Debug)]
#[must_use = "dropping a BackupGuard restores the original file immediately"]
pub struct BackupGuard<'s> {
    record: BackupRecord,
    /// xxh3 of the original bytes, checked after restore.
    digest: u64,
    restored: bool,
    scratch: &'s ScratchDir,
}

impl<'s> BackupGuard<'s> {
    /// Copy `original` into the scratch directory.
    pub fn take(original: &Path, scratch: &'s ScratchDir) -> Result<Self, PatchError> {
        let backup = scratch.backup_path();
        let content = fs::read(original).map_err(|source| PatchError::BackupFailed {
            path: original.to_path_buf(),
            source,
        })?;
        fs::write(&backup, &content).map_err(|source| PatchError::BackupFailed {
            path: original.to_path_buf(),
            source,
        })?;

        info!(
            original = %original.display(),
            backup = %backup.display(),
            "backed up POM"
        );

        Ok(Self {
            record: BackupRecord {
                original: original.to_path_buf(),
                backup,
            },
            digest: xxh3_64(&content),
            restored: false,
            scratch,
        })
    }

    pub fn record(&self) -> &BackupRecord {
        &self.record
    }

    /// Copy the backup over the live file, unconditionally.
    pub fn restore(mut self) -> Result<(), PatchError> {
        self.restored = true;
        restore_file(&self.record, self.digest)
    }
}

impl Drop for BackupGuard<'_> {
    fn drop(&mut self) {
        if self.restored {
            return;
        }
        warn!(
            original = %self.record.original.display(),
            "run ended without restoring; restoring now"
        );
        if let Err(e) = restore_file(&self.record, self.digest) {
            self.scratch.preserve();
            error!("{}", e);
        }
    }
}

fn restore_file(record: &BackupRecord, digest: u64) -> Result<(), PatchError> {
    let failed = |source: io::Error| PatchError::RestoreFailed {
        path: record.original.clone(),
        backup: record.backup.clone(),
        source,
    };

    let content = fs::read(&record.backup).map_err(failed)?;
    atomic_write(&record.original, &content).map_err(failed)?;

    let restored = fs::read(&record.original).map_err(failed)?;
    if xxh3_64(&restored) != digest {
        return Err(failed(io::Error::new(
            io::ErrorKind::InvalidData,
            "restored content does not match the original",
        )));
    }

    info!(original = %record.original.display(), "restored original POM");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (tempfile::TempDir, ScratchDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let scratch = ScratchDir::create_in(dir.path()).unwrap();
        let pom = dir.path().join("pom.xml");
        fs::write(&pom, "<project>X</project>\n").unwrap();
        (dir, scratch, pom)
    }

    #[test]
    fn test_backup_then_restore_round_trips() {
        let (_dir, scratch, pom) = setup();

        let guard = BackupGuard::take(&pom, &scratch).unwrap();
        assert_eq!(
            fs::read(&guard.record().backup).unwrap(),
            b"<project>X</project>\n"
        );

        fs::write(&pom, "<project>Y</project>").unwrap();
        guard.restore().unwrap();

        assert_eq!(fs::read_to_string(&pom).unwrap(), "<project>X</project>\n");
    }

    #[test]
    fn test_drop_restores_unrestored_backup() {
        let (_dir, scratch, pom) = setup();

        {
            let _guard = BackupGuard::take(&pom, &scratch).unwrap();
            fs::write(&pom, "<project>Y</project>").unwrap();
        }

        assert_eq!(fs::read_to_string(&pom).unwrap(), "<project>X</project>\n");
    }

    #[test]
    fn test_restore_after_panic() {
        let (_dir, scratch, pom) = setup();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = BackupGuard::take(&pom, &scratch).unwrap();
            fs::write(&pom, "<project>Y</project>").unwrap();
            panic!("mutation blew up");
        }));

        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&pom).unwrap(), "<project>X</project>\n");
    }

    #[test]
    fn test_backup_of_missing_file_fails() {
        let (dir, scratch, _pom) = setup();

        let result = BackupGuard::take(&dir.path().join("absent.xml"), &scratch);

        assert!(matches!(result, Err(PatchError::BackupFailed { .. })));
        assert!(!scratch.backup_path().exists());
    }

    #[test]
    fn test_restore_with_missing_backup_fails() {
        let (_dir, scratch, pom) = setup();

        let guard = BackupGuard::take(&pom, &scratch).unwrap();
        fs::remove_file(scratch.backup_path()).unwrap();

        assert!(matches!(
            guard.restore(),
            Err(PatchError::RestoreFailed { .. })
        ));
    }

    #[test]
    fn test_failed_drop_restore_preserves_scratch() {
        let (_dir, scratch, pom) = setup();

        {
            let _guard = BackupGuard::take(&pom, &scratch).unwrap();
            fs::remove_file(scratch.backup_path()).unwrap();
        }

        assert!(scratch.is_preserved());
    }
}
