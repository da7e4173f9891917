//! Chat history discovery.
//!
//! Lists the transcript files in the history directory (non-recursive,
//! `*.md` only), newest modification time first.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;
use std::time::SystemTime;
use walkdir::WalkDir;

use crate::error::{DigestError, Result};
use crate::models::Artifact;

const TRANSCRIPT_GLOB: &str = "*.md";

/// List transcripts in `dir`, newest first.
///
/// Files with equal modification times keep their directory listing order.
///
/// # Errors
///
/// - [`DigestError::NoHistoryDirectory`] if `dir` does not exist.
/// - [`DigestError::NoArtifactsFound`] if no transcript matches.
pub fn list_artifacts(dir: &Path) -> Result<Vec<Artifact>> {
    if !dir.is_dir() {
        return Err(DigestError::NoHistoryDirectory(dir.to_path_buf()));
    }

    let include = build_globset(&[TRANSCRIPT_GLOB]);

    let mut artifacts = Vec::new();

    let walker = WalkDir::new(dir).min_depth(1).max_depth(1);
    for entry in walker {
        let entry = entry.map_err(|e| {
            let source = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
            DigestError::io(dir, source)
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if !include.is_match(name.as_ref()) {
            continue;
        }

        let path = entry.path();
        let modified = entry
            .metadata()
            .ok()
            .and_then(|m| m.modified().ok())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        artifacts.push(Artifact::new(path, modified));
    }

    if artifacts.is_empty() {
        return Err(DigestError::NoArtifactsFound(dir.to_path_buf()));
    }

    artifacts.sort_by(|a, b| b.modified.cmp(&a.modified));

    Ok(artifacts)
}

fn build_globset(patterns: &[&str]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        if let Ok(glob) = Glob::new(pattern) {
            builder.add(glob);
        }
    }
    builder.build().unwrap_or_else(|_| GlobSet::empty())
}
