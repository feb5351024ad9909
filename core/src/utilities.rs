//! Utility functions shared across core modules

use crate::{CoreError, Result};
use std::ffi::{OsStr, OsString};
use std::path::Path;

/// Create a current timestamp string in RFC3339 format (seconds precision)
pub fn current_timestamp() -> String {
    humantime::format_rfc3339_seconds(std::time::SystemTime::now()).to_string()
}

/// Prepend `dir` to a PATH-style search value.
///
/// The existing value keeps its order after the inserted directory, so
/// lookups find the local runtime environment before system defaults.
pub fn prepend_search_path(dir: &Path, existing: Option<&OsStr>) -> Result<OsString> {
    let mut parts = vec![dir.to_path_buf()];
    if let Some(existing) = existing {
        parts.extend(std::env::split_paths(existing));
    }
    std::env::join_paths(parts).map_err(|e| {
        CoreError::ValidationError(format!(
            "binDir: {} cannot be joined into PATH: {}",
            dir.display(),
            e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn timestamp_is_rfc3339_utc() {
        let ts = current_timestamp();
        assert!(ts.ends_with('Z'));
        assert!(ts.contains('T'));
    }

    #[test]
    fn prepend_puts_dir_first() {
        let joined =
            prepend_search_path(Path::new("/opt/venv/bin"), Some(OsStr::new("/usr/bin:/bin")))
                .expect("join ok");
        let parts: Vec<PathBuf> = std::env::split_paths(&joined).collect();
        assert_eq!(
            parts,
            vec![
                PathBuf::from("/opt/venv/bin"),
                PathBuf::from("/usr/bin"),
                PathBuf::from("/bin"),
            ]
        );
    }

    #[test]
    fn prepend_with_no_existing_value() {
        let joined = prepend_search_path(Path::new("/opt/venv/bin"), None).expect("join ok");
        assert_eq!(joined, OsString::from("/opt/venv/bin"));
    }
}
