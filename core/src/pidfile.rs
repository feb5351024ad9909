//! PID record storage: the durable handle between supervisor invocations
//!
//! The record is a single process identifier as decimal text. Writes are
//! crash-safe via write-to-temp + fsync + rename. Removal tolerates a
//! concurrent removal so racing stop invocations converge on "record
//! absent". Presence of the record implies, but does not guarantee, a live
//! process; callers verify liveness before acting on the pid.

use crate::{CoreError, Result};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Accessor for the persisted PID record
#[derive(Debug, Clone)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// Create an accessor for the record at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the underlying record file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the recorded pid. Returns `Ok(None)` when no record exists.
    ///
    /// A record that exists but does not parse as a positive decimal
    /// integer surfaces a `PidRecord` error rather than being ignored.
    pub fn load(&self) -> Result<Option<u32>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CoreError::IoError(std::io::Error::new(
                    e.kind(),
                    format!("Failed to read PID record {}: {}", self.path.display(), e),
                )))
            }
        };

        let pid: u32 = contents.trim().parse().map_err(|_| {
            CoreError::PidRecord(format!(
                "{} does not contain a decimal pid (got {:?})",
                self.path.display(),
                contents.trim()
            ))
        })?;
        if pid == 0 {
            return Err(CoreError::PidRecord(format!(
                "{} contains pid 0, which is not a valid process",
                self.path.display()
            )));
        }
        Ok(Some(pid))
    }

    /// Atomically persist `pid` as decimal text.
    ///
    /// Steps:
    /// - Ensure the parent directory exists
    /// - Write the pid to a temp file in the same directory
    /// - `flush` + `sync_all` on the temp file
    /// - `rename` the temp file over the destination
    /// - Best-effort fsync of the directory to persist the rename
    pub fn store(&self, pid: u32) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    CoreError::IoError(std::io::Error::new(
                        e.kind(),
                        format!("Failed to create record dir {}: {}", parent.display(), e),
                    ))
                })?;
            }
        }

        let tmp_path = self.path.with_extension("pid.tmp");
        {
            let mut f = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)
                .map_err(|e| {
                    CoreError::IoError(std::io::Error::new(
                        e.kind(),
                        format!("Failed to open temp record {}: {}", tmp_path.display(), e),
                    ))
                })?;
            f.write_all(pid.to_string().as_bytes()).map_err(|e| {
                CoreError::IoError(std::io::Error::new(
                    e.kind(),
                    format!("Failed to write temp record {}: {}", tmp_path.display(), e),
                ))
            })?;
            f.flush().ok();
            // Best-effort durability
            let _ = f.sync_all();
        }

        fs::rename(&tmp_path, &self.path).map_err(|e| {
            CoreError::IoError(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to replace record {} with {}: {}",
                    self.path.display(),
                    tmp_path.display(),
                    e
                ),
            ))
        })?;

        // Best-effort fsync of directory to persist rename
        if let Some(parent) = self.path.parent() {
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }

        Ok(())
    }

    /// Remove the record. Returns `false` when it was already gone.
    pub fn clear(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CoreError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to remove PID record {}: {}", self.path.display(), e),
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_store_and_load() {
        let dir = tempdir().unwrap();
        let record = PidFile::new(dir.path().join("program.pid"));

        record.store(4321).expect("store ok");
        assert_eq!(record.load().expect("load ok"), Some(4321));

        // Record contents are bare decimal text
        let raw = fs::read_to_string(record.path()).unwrap();
        assert_eq!(raw.trim(), "4321");
    }

    #[test]
    fn absent_record_loads_as_none() {
        let dir = tempdir().unwrap();
        let record = PidFile::new(dir.path().join("missing.pid"));
        assert_eq!(record.load().expect("load ok"), None);
    }

    #[test]
    fn store_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let record = PidFile::new(dir.path().join("state/nested/program.pid"));
        record.store(77).expect("store ok");
        assert_eq!(record.load().unwrap(), Some(77));
    }

    #[test]
    fn overwrite_replaces_previous_pid() {
        let dir = tempdir().unwrap();
        let record = PidFile::new(dir.path().join("program.pid"));
        record.store(100).unwrap();
        record.store(200).unwrap();
        assert_eq!(record.load().unwrap(), Some(200));
    }

    #[test]
    fn corrupted_record_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("program.pid");
        fs::write(&path, "not-a-pid\n").unwrap();

        let err = PidFile::new(&path).load().unwrap_err();
        assert!(matches!(err, CoreError::PidRecord(_)));
        assert!(err.to_string().contains("not-a-pid"));
    }

    #[test]
    fn zero_pid_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("program.pid");
        fs::write(&path, "0").unwrap();

        let err = PidFile::new(&path).load().unwrap_err();
        assert!(matches!(err, CoreError::PidRecord(_)));
    }

    #[test]
    fn clear_is_tolerant_of_missing_record() {
        let dir = tempdir().unwrap();
        let record = PidFile::new(dir.path().join("program.pid"));

        record.store(55).unwrap();
        assert!(record.clear().expect("first clear"));
        assert!(!record.clear().expect("second clear"));
        assert_eq!(record.load().unwrap(), None);
    }
}
