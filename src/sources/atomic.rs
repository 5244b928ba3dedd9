//! sources::atomic
//!
//! Whole-file replacement for the file-backed stores and the config file.
//!
//! Contents go to a sibling staging file (`<name>.tmp`) that is synced and
//! then renamed over the target, so readers see either the old file or the
//! new one. A failed write removes the staging file.

use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

/// Who may read the replaced file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Access {
    /// Permissions follow the process umask.
    Shared,
    /// Owner read/write only (0600) on Unix.
    Private,
}

/// Replace `path` with `contents`, creating missing parent directories.
pub(crate) fn replace_file(path: &Path, contents: &[u8], access: Access) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let staging = staging_path(path);
    // A stale staging file would keep its old mode through truncation.
    match fs::remove_file(&staging) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e),
        _ => {}
    }

    let written =
        write_staging(&staging, contents, access).and_then(|()| fs::rename(&staging, path));
    if written.is_err() {
        let _ = fs::remove_file(&staging);
    }
    written
}

fn write_staging(staging: &Path, contents: &[u8], access: Access) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        if access == Access::Private {
            options.mode(0o600);
        }
    }
    #[cfg(not(unix))]
    let _ = access;

    let mut file = options.open(staging)?;
    file.write_all(contents)?;
    file.sync_all()
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn staging_file_sits_next_to_target() {
        assert_eq!(
            staging_path(Path::new("/data/settings.json")),
            PathBuf::from("/data/settings.json.tmp")
        );
    }

    #[test]
    fn replaces_contents_and_leaves_no_staging_file() {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path().join("nested").join("settings.json");

        replace_file(&path, b"[]", Access::Shared).expect("first write");
        replace_file(&path, b"[1]", Access::Shared).expect("second write");

        assert_eq!(fs::read_to_string(&path).expect("read"), "[1]");
        assert!(!staging_path(&path).exists());
    }

    #[test]
    fn stale_staging_file_is_discarded() {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path().join("store.toml");
        fs::write(staging_path(&path), "half written").expect("stale file");

        replace_file(&path, b"[slots]\n", Access::Private).expect("write");

        assert_eq!(fs::read_to_string(&path).expect("read"), "[slots]\n");
    }

    #[test]
    fn failed_rename_cleans_up() {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path().join("occupied");
        fs::create_dir(&path).expect("directory in the way");
        fs::write(path.join("child"), "x").expect("non-empty directory");

        assert!(replace_file(&path, b"data", Access::Shared).is_err());
        assert!(!staging_path(&path).exists());
    }

    #[cfg(unix)]
    #[test]
    fn private_files_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path().join("store.toml");
        replace_file(&path, b"", Access::Private).expect("write");

        let mode = fs::metadata(&path).expect("metadata").permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }
}
