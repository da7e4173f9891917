//! Core data types that flow through the summarization pipeline.

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::{DigestError, Result};

/// One chat transcript file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub modified: SystemTime,
}

impl Artifact {
    pub fn new(path: impl Into<PathBuf>, modified: SystemTime) -> Self {
        Self {
            path: path.into(),
            modified,
        }
    }

    /// File name without directories, as shown in session headers.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Read the raw transcript text.
    pub fn read(&self) -> Result<String> {
        read_text(&self.path)
    }
}

/// Which summarize operation produced a stored summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryTag {
    /// One transcript.
    Single,
    /// Several transcripts merged into one document.
    Multi,
}

impl SummaryTag {
    pub fn file_prefix(&self) -> &'static str {
        match self {
            SummaryTag::Single => "chat_summary",
            SummaryTag::Multi => "multi_chat_summary",
        }
    }
}

/// A summary file read back from the summary store.
#[derive(Debug, Clone)]
pub struct StoredSummary {
    pub path: PathBuf,
    pub modified: SystemTime,
    pub content: String,
}

impl StoredSummary {
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// `YYYYMMDD_HHMMSS` in local time, used in every generated file name.
pub fn file_timestamp(now: DateTime<Local>) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}

pub(crate) fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| DigestError::io(path, e))
}

pub(crate) fn write_text(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| DigestError::io(parent, e))?;
        }
    }
    std::fs::write(path, content).map_err(|e| DigestError::io(path, e))
}
