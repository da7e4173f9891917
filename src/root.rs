//! Project root discovery.

use std::path::{Path, PathBuf};

/// Find the project root for `start`.
///
/// Returns the nearest ancestor of `start` (inclusive) that contains a
/// `marker` directory. When run from inside `<root>/<marker>/tools` the root
/// is returned directly. Falls back to the home directory, and to `start`
/// itself when the home directory is unknown. Never fails.
pub fn locate_root(start: &Path, marker: &str) -> PathBuf {
    if start.file_name().is_some_and(|n| n == "tools") {
        if let Some(parent) = start.parent() {
            if parent.file_name().is_some_and(|n| n == marker) {
                if let Some(root) = parent.parent() {
                    return root.to_path_buf();
                }
            }
        }
    }

    for dir in start.ancestors() {
        if dir.join(marker).exists() {
            return dir.to_path_buf();
        }
    }

    dirs::home_dir().unwrap_or_else(|| start.to_path_buf())
}
