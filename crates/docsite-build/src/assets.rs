//! Static asset mirroring.
//!
//! Each asset root (framework first, then project) may provide `js`, `css` and
//! `media` directories. They are copied into the site directory in root order,
//! so project files replace framework files with the same relative path.

use std::fs;
use std::path::{Path, PathBuf};

/// Asset directories mirrored from every root.
pub const ASSET_DIRS: [&str; 3] = ["js", "css", "media"];

/// Error returned when an asset can't be copied.
#[derive(Debug, thiserror::Error)]
#[error("Failed to copy {} to {}: {source}", .from.display(), .to.display())]
pub struct AssetError {
    /// Source file or directory.
    pub from: PathBuf,
    /// Destination file or directory.
    pub to: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Mirror the asset directories of `roots` into `site_dir`.
///
/// Missing asset directories are skipped. Returns the number of files copied.
///
/// # Errors
///
/// Returns [`AssetError`] on the first file or directory that can't be copied.
pub fn copy_assets(roots: &[PathBuf], site_dir: &Path) -> Result<usize, AssetError> {
    let mut copied = 0;
    for root in roots {
        for name in ASSET_DIRS {
            let source = root.join(name);
            if !source.is_dir() {
                continue;
            }
            let count = copy_tree(&source, &site_dir.join(name))?;
            tracing::debug!(path = %source.display(), files = count, "Copied assets");
            copied += count;
        }
    }
    Ok(copied)
}

fn copy_tree(from: &Path, to: &Path) -> Result<usize, AssetError> {
    let mut copied = 0;
    let mut pending = vec![(from.to_path_buf(), to.to_path_buf())];
    while let Some((src, dst)) = pending.pop() {
        let dir_error = |e| AssetError {
            from: src.clone(),
            to: dst.clone(),
            source: e,
        };
        fs::create_dir_all(&dst).map_err(dir_error)?;
        for entry in fs::read_dir(&src).map_err(dir_error)? {
            let entry = entry.map_err(dir_error)?;
            let path = entry.path();
            let target = dst.join(entry.file_name());
            if path.is_dir() {
                pending.push((path, target));
                continue;
            }
            fs::copy(&path, &target).map_err(|e| AssetError {
                from: path.clone(),
                to: target.clone(),
                source: e,
            })?;
            copied += 1;
        }
    }
    Ok(copied)
}
