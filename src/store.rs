//! Summary store: dated markdown files under the summary directory.
//!
//! Files are named `<prefix>_<YYYYMMDD_HHMMSS>.md`, where the prefix comes
//! from [`SummaryTag`]. Stored summaries are never rewritten or pruned.

use chrono::Local;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

use crate::error::{DigestError, Result};
use crate::models::{file_timestamp, read_text, write_text, StoredSummary, SummaryTag};

#[derive(Debug, Clone)]
pub struct SummaryStore {
    dir: PathBuf,
}

impl SummaryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create the store directory (and ancestors) if needed.
    pub fn ensure_dir(&self) -> Result<&Path> {
        std::fs::create_dir_all(&self.dir).map_err(|e| DigestError::io(&self.dir, e))?;
        Ok(&self.dir)
    }

    /// Write `summary` under a new dated name and return its path.
    pub fn save(&self, summary: &str, tag: SummaryTag) -> Result<PathBuf> {
        self.ensure_dir()?;
        let name = format!("{}_{}.md", tag.file_prefix(), file_timestamp(Local::now()));
        let path = self.dir.join(name);
        write_text(&path, summary)?;
        debug!("wrote summary to file: {}", path.display());
        Ok(path)
    }

    /// Write `summary` to an explicit path outside the dated naming scheme.
    pub fn save_to(&self, summary: &str, path: &Path) -> Result<PathBuf> {
        write_text(path, summary)?;
        debug!("wrote summary to file: {}", path.display());
        Ok(path.to_path_buf())
    }

    /// Whether at least one summary is stored.
    pub fn has_any(&self) -> Result<bool> {
        Ok(!self.summary_files()?.is_empty())
    }

    /// The most recently modified stored summary, if any.
    pub fn load_latest(&self) -> Result<Option<StoredSummary>> {
        let latest = self
            .summary_files()?
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1));

        match latest {
            None => Ok(None),
            Some((path, modified)) => {
                debug!("found latest summary: {}", path.display());
                let content = read_text(&path)?;
                Ok(Some(StoredSummary {
                    path,
                    modified,
                    content,
                }))
            }
        }
    }

    fn summary_files(&self) -> Result<Vec<(PathBuf, SystemTime)>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&self.dir).map_err(|e| DigestError::io(&self.dir, e))?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| DigestError::io(&self.dir, e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            files.push((path, modified));
        }
        Ok(files)
    }
}
