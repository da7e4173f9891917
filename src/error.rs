//! Error types for the summarization pipeline.
//!
//! Every pipeline operation returns [`Result`]. The chat summary entry points
//! turn errors into printable text at their boundary, while the research
//! entry points let them propagate to `main`.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Pipeline error type.
#[derive(Error, Debug)]
pub enum DigestError {
    /// No API key could be resolved from the environment or `.env`.
    #[error(
        "No Gemini API key found. Please set GEMINI_API_KEY in your environment or .env file."
    )]
    MissingCredential,

    /// The chat history directory does not exist.
    #[error("SpecStory history directory not found: {}", .0.display())]
    NoHistoryDirectory(PathBuf),

    /// The chat history directory exists but holds no transcripts.
    #[error("No chat history files found in {}", .0.display())]
    NoArtifactsFound(PathBuf),

    /// Network, auth, quota or stream failure from the text provider.
    #[error("{0}")]
    Provider(String),

    /// Read or write failure on a local file.
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DigestError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        DigestError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn provider(detail: impl std::fmt::Display) -> Self {
        DigestError::Provider(detail.to_string())
    }
}

impl From<reqwest::Error> for DigestError {
    fn from(e: reqwest::Error) -> Self {
        DigestError::Provider(e.to_string())
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, DigestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_mentions_key_name() {
        let msg = DigestError::MissingCredential.to_string();
        assert!(msg.contains("No Gemini API key found"));
        assert!(msg.contains("GEMINI_API_KEY"));
    }

    #[test]
    fn io_error_includes_path() {
        let err = DigestError::io(
            "/tmp/nowhere.md",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/tmp/nowhere.md"));
        assert!(msg.contains("gone"));
    }
}
