//! Applying an accepted suggestion: move the source file next to itself under
//! its new name.

use crate::error::NominateError;
use std::path::{Path, PathBuf};
use tracing::info;

/// Where `source` ends up when renamed to `filename`.
///
/// The file stays in its directory. When `filename` has no extension of its
/// own, the source extension is appended.
pub fn target_path(source: &Path, filename: &str) -> PathBuf {
    let dir = source.parent().unwrap_or_else(|| Path::new(""));
    let mut target = dir.join(filename);
    if Path::new(filename).extension().is_none() {
        if let Some(ext) = source.extension() {
            target.set_extension(ext);
        }
    }
    target
}

/// Rename `source` to `filename` in the same directory; never overwrites.
///
/// Returns the new path. Renaming a file onto itself is a no-op.
pub async fn rename_to(source: &Path, filename: &str) -> Result<PathBuf, NominateError> {
    let target = target_path(source, filename);
    if target == source {
        return Ok(target);
    }

    if tokio::fs::symlink_metadata(&target).await.is_ok() {
        return Err(NominateError::TargetExists { path: target });
    }

    tokio::fs::rename(source, &target)
        .await
        .map_err(|e| NominateError::RenameFailed {
            from: source.to_path_buf(),
            to: target.clone(),
            source: e,
        })?;

    info!("Renamed {} → {}", source.display(), target.display());
    Ok(target)
}
