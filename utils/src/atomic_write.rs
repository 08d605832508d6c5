//! Atomic file write helpers.
//!
//! Data is written to a temp file in the destination directory and renamed into
//! place, so readers see either the old document or the new one. On Windows,
//! rename-over-existing fails; the old file is moved to `.bak` first and restored
//! if the second rename fails too.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

/// Recover from an interrupted Windows-style overwrite by restoring `path.bak`.
///
/// If `path` is missing but its backup exists, the process died between the two
/// renames in [`atomic_write`]. Call this before reading `path`.
pub fn recover_bak_file(path: &Path) {
    let backup = path.with_extension("bak");
    if path.exists() || !backup.exists() {
        return;
    }
    match fs::rename(&backup, path) {
        Ok(()) => tracing::warn!(
            path = %path.display(),
            "Recovered .bak file from interrupted atomic write"
        ),
        Err(e) => tracing::warn!(
            path = %path.display(),
            "Failed to recover .bak file: {e}"
        ),
    }
}

/// Write `bytes` to `path` atomically with owner-only permissions.
///
/// The temp file is synced before the rename and the parent directory is
/// synced after it, best-effort.
pub fn atomic_write(path: impl AsRef<Path>, bytes: &[u8]) -> io::Result<()> {
    let path = path.as_ref();
    let parent = parent_or_cwd(path);

    let mut tmp = NamedTempFile::new_in(parent)?;
    // Tighten before any bytes land so the secret is never world-readable.
    restrict_to_owner(tmp.path())?;

    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;

    persist_with_backup(tmp, path)?;
    restrict_to_owner(path)?;
    best_effort_sync_parent_dir(parent);
    Ok(())
}

fn parent_or_cwd(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn persist_with_backup(tmp: NamedTempFile, path: &Path) -> io::Result<()> {
    let err = match tmp.persist(path) {
        Ok(_) => return Ok(()),
        Err(err) => err,
    };
    if !path.exists() {
        return Err(err.error);
    }

    let backup_path = path.with_extension("bak");
    let _ = fs::remove_file(&backup_path);
    fs::rename(path, &backup_path)?;

    if let Err(rename_err) = err.file.persist(path) {
        let _ = fs::rename(&backup_path, path);
        return Err(rename_err.error);
    }
    if let Err(e) = fs::remove_file(&backup_path) {
        tracing::warn!(
            path = %backup_path.display(),
            "Failed to remove .bak after atomic write: {e}"
        );
    }
    Ok(())
}

#[cfg(unix)]
fn restrict_to_owner(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_to_owner(_path: &Path) -> io::Result<()> {
    Ok(())
}

fn best_effort_sync_parent_dir(parent: &Path) {
    #[cfg(unix)]
    {
        if let Err(e) = fs::File::open(parent).and_then(|d| d.sync_all()) {
            debug!(path = %parent.display(), "Parent directory sync_all failed (best-effort): {e}");
        }
    }

    #[cfg(not(unix))]
    {
        debug!(path = %parent.display(), "Parent directory sync skipped on this platform");
    }
}
