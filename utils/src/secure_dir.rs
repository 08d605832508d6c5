//! Owner-only storage directories.

use std::io;
use std::path::Path;

/// Create `path` (and parents) and tighten it to 0o700 if it is ours and too open.
///
/// Directories owned by someone else (e.g. a shared temp root) are left alone.
pub fn ensure_secure_dir(path: &Path) -> io::Result<()> {
    std::fs::create_dir_all(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::{MetadataExt, PermissionsExt};

        let metadata = std::fs::metadata(path)?;
        // SAFETY: getuid has no preconditions and cannot fail.
        let our_uid = unsafe { libc::getuid() };
        if metadata.uid() != our_uid {
            return Ok(());
        }

        let mode = metadata.permissions().mode() & 0o777;
        if mode & 0o077 != 0 {
            tracing::warn!(
                path = %path.display(),
                "Storage dir permissions are too open ({:o}); tightening to 0700",
                mode
            );
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))?;
        }
    }
    Ok(())
}
