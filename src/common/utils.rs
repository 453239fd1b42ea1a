//! Shared filesystem helpers.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Replace the home directory prefix with `~` for display.
///
/// Log files get shared in bug reports, so paths are never printed with the
/// user name in them.
pub fn private_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir()
        && let Ok(stripped) = path.strip_prefix(&home)
    {
        return if stripped.as_os_str().is_empty() {
            "~".to_string()
        } else {
            format!("~/{}", stripped.display())
        };
    }
    path.display().to_string()
}

/// Write `contents` to `path` by writing a sibling temp file and renaming it
/// over the target.
///
/// A crash mid-write leaves either the old or the new file, never a mix.
/// A symlinked target is resolved first so the link itself survives, and the
/// original file's permissions are carried over when it existed.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let target = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let parent = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut temp = tempfile::NamedTempFile::new_in(&parent)
        .with_context(|| format!("Failed to create temp file in {}", private_path(&parent)))?;
    temp.write_all(contents)
        .with_context(|| format!("Failed to write {}", private_path(path)))?;
    temp.as_file().sync_all()?;

    if let Ok(metadata) = std::fs::metadata(&target)
        && let Err(e) = std::fs::set_permissions(temp.path(), metadata.permissions())
    {
        log_debug!("Keeping default permissions for {}: {e}", private_path(&target));
    }

    temp.persist(&target)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to replace {}", private_path(path)))?;
    Ok(())
}

/// First path in `candidates` that exists as a regular file.
pub fn first_existing_file<'a, I>(candidates: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = &'a PathBuf>,
{
    candidates.into_iter().find(|p| p.is_file()).cloned()
}
