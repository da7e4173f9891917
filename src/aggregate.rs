//! Merging several transcripts into one document.
//!
//! The provider call takes a single source, so multiple transcripts are
//! written to a staging file under the temp directory. The file is owned by
//! a [`StagingFile`] guard that deletes it when dropped.

use chrono::Local;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{DigestError, Result};
use crate::models::{file_timestamp, read_text, write_text, Artifact};

/// Separator between sessions in a staging file.
pub const SESSION_SEPARATOR: &str = "\n\n---\n\n";

/// Input to the summarization client.
#[derive(Debug)]
pub enum AggregatedDocument {
    /// A single transcript, read as-is.
    Single(Artifact),
    /// Several transcripts merged into a staging file.
    Staged(StagingFile),
}

impl AggregatedDocument {
    pub fn path(&self) -> &Path {
        match self {
            AggregatedDocument::Single(a) => &a.path,
            AggregatedDocument::Staged(s) => s.path(),
        }
    }

    pub fn read(&self) -> Result<String> {
        read_text(self.path())
    }
}

/// A temporary aggregate file, removed on drop.
#[derive(Debug)]
pub struct StagingFile {
    path: PathBuf,
}

impl StagingFile {
    /// Write `content` to `path` under a guard, so a failed or partial write
    /// is cleaned up too.
    fn write(path: PathBuf, content: &str) -> Result<Self> {
        let staging = StagingFile { path };
        write_text(&staging.path, content)?;
        Ok(staging)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagingFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("removed staging file {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "failed to remove staging file {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

/// Build the document to summarize from `artifacts`, kept in input order.
///
/// A single artifact is returned as-is. Several are merged into a new
/// staging file in `staging_dir`, one `### Chat Session i: <name>` section
/// per artifact.
pub fn aggregate(artifacts: &[Artifact], staging_dir: &Path) -> Result<AggregatedDocument> {
    match artifacts {
        [] => Err(DigestError::NoArtifactsFound(staging_dir.to_path_buf())),
        [single] => Ok(AggregatedDocument::Single(single.clone())),
        many => {
            let mut sections = Vec::with_capacity(many.len());
            for artifact in many {
                let text = artifact.read()?;
                debug!("read {} ({} chars)", artifact.name(), text.chars().count());
                sections.push((artifact.name(), text));
            }
            let combined = combine_sessions(&sections);

            let staging = StagingFile::write(staging_path(staging_dir), &combined)?;
            debug!("created staging file {}", staging.path().display());

            Ok(AggregatedDocument::Staged(staging))
        }
    }
}

/// Render `(name, text)` sessions with 1-based headers and separators.
pub fn combine_sessions(sessions: &[(String, String)]) -> String {
    let mut out = String::new();
    for (i, (name, text)) in sessions.iter().enumerate() {
        let _ = write!(out, "### Chat Session {}: {}\n\n{}\n\n", i + 1, name, text);
        if i + 1 < sessions.len() {
            out.push_str(SESSION_SEPARATOR);
        }
    }
    out
}

fn staging_path(staging_dir: &Path) -> PathBuf {
    staging_dir.join(format!(
        "combined_chats_{}_{}.md",
        file_timestamp(Local::now()),
        std::process::id()
    ))
}
