//! File checks and crash-safe writes.

use crate::AdapterError;
use anyhow::Context;
use std::fs;
use std::io::{Read, Write};
use std::path::Path;

/// First bytes of every ROOT file.
pub const ROOT_FILE_MAGIC: &[u8; 4] = b"root";

/// Make sure the simulation left a readable, non-empty ROOT file behind.
pub fn check_event_file(path: &Path) -> Result<(), AdapterError> {
    let fail = |reason: String| AdapterError::EventFile {
        path: path.to_path_buf(),
        reason,
    };

    let mut f = fs::File::open(path).map_err(|e| fail(e.to_string()))?;
    let len = f.metadata().map_err(|e| fail(e.to_string()))?.len();
    if len == 0 {
        return Err(fail("file is empty".to_string()));
    }

    let mut magic = [0u8; 4];
    f.read_exact(&mut magic)
        .map_err(|_| fail("file is truncated".to_string()))?;
    if &magic != ROOT_FILE_MAGIC {
        return Err(fail("not a ROOT file".to_string()));
    }
    Ok(())
}

/// Write `bytes` to a fresh temp file next to `path`, then rename over it.
///
/// An interrupted write leaves any previous `path` untouched.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let tmp = parent.join(format!(".{}.tmp", uuid::Uuid::new_v4()));

    let written = write_then_rename(&tmp, path, bytes);
    if written.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    written
}

fn write_then_rename(tmp: &Path, path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    {
        let mut f =
            fs::File::create(tmp).with_context(|| format!("create temp {}", tmp.display()))?;
        f.write_all(bytes)
            .with_context(|| format!("write temp {}", tmp.display()))?;
        f.sync_all().ok();
    }

    fs::rename(tmp, path)
        .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
    Ok(())
}

/// Replace `to` with the contents of `from`.
pub fn atomic_copy(from: &Path, to: &Path) -> anyhow::Result<()> {
    let bytes = fs::read(from).with_context(|| format!("read {}", from.display()))?;
    atomic_write(to, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_event_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = check_event_file(&dir.path().join("electron.root")).unwrap_err();
        assert!(matches!(err, AdapterError::EventFile { .. }));
    }

    #[test]
    fn empty_event_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("electron.root");
        fs::write(&p, b"").unwrap();
        let err = check_event_file(&p).unwrap_err();
        assert!(err.to_string().contains("empty"), "{err}");
    }

    #[test]
    fn foreign_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("electron.root");
        fs::write(&p, b"<html>").unwrap();
        let err = check_event_file(&p).unwrap_err();
        assert!(err.to_string().contains("not a ROOT file"), "{err}");
    }

    #[test]
    fn root_file_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("electron.root");
        fs::write(&p, b"root\x00\x00\xf4\x3e").unwrap();
        assert!(check_event_file(&p).is_ok());
    }

    #[test]
    fn atomic_write_replaces_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("results.html");
        fs::write(&p, "old").unwrap();
        atomic_write(&p, b"new").unwrap();
        assert_eq!(fs::read_to_string(&p).unwrap(), "new");

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    fn temp_files(dir: &Path) -> Vec<std::path::PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.to_string_lossy().ends_with(".tmp"))
            .collect()
    }

    #[test]
    fn failed_rename_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("results.html");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("occupied"), "x").unwrap();

        assert!(atomic_write(&target, b"new").is_err());
        assert!(temp_files(dir.path()).is_empty());
        assert!(target.join("occupied").exists());
    }

    #[test]
    fn atomic_copy_overwrites_target() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("current.json");
        let to = dir.path().join("standard.json");
        fs::write(&from, "{\"fresh\":true}").unwrap();
        fs::write(&to, "{\"fresh\":false}").unwrap();
        atomic_copy(&from, &to).unwrap();
        assert_eq!(fs::read_to_string(&to).unwrap(), "{\"fresh\":true}");
    }
}
