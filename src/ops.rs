//! Chat summary operations.
//!
//! [`ChatSummary`] composes history discovery, aggregation, summarization
//! and the summary store into the four `chat-summary` actions. Each action
//! has a `Result`-returning form and a `*_text` form; the text forms are the
//! CLI boundary and turn every error into a printable message, so the tool
//! always exits successfully.

use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::aggregate::{aggregate, AggregatedDocument};
use crate::config::{Config, Layout};
use crate::credential::CredentialResolver;
use crate::error::{DigestError, Result};
use crate::history::list_artifacts;
use crate::models::SummaryTag;
use crate::prompt::Template;
use crate::provider::create_provider;
use crate::store::SummaryStore;
use crate::summarize::{provider_failure_as_text, Summarizer};

pub const STARTUP_BANNER: &str = "\n=== AGENT SESSION STARTUP ===\n";
pub const END_BANNER: &str = "\n=== END OF STARTUP SUMMARY ===\n";
pub const NO_SUMMARIES_NOTICE: &str = "No existing summaries found. Generating a new one...";

/// Default transcript count for `--recent`.
pub const DEFAULT_RECENT_COUNT: usize = 3;

/// A `chat-summary` action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Latest,
    Recent(usize),
    Get,
    Startup,
}

pub struct ChatSummary {
    layout: Layout,
    summarizer: Summarizer,
    store: SummaryStore,
}

impl ChatSummary {
    pub fn new(layout: Layout, summarizer: Summarizer) -> Self {
        let store = SummaryStore::new(&layout.summary_dir);
        Self {
            layout,
            summarizer,
            store,
        }
    }

    /// Build the Gemini-backed pipeline for a resolved layout.
    pub fn from_config(config: &Config, layout: Layout) -> Result<Self> {
        let provider = create_provider(&config.provider)?;
        let credentials = CredentialResolver::new(&layout.env_file);
        let summarizer = Summarizer::new(provider, credentials)
            .with_max_content_chars(config.provider.max_content_chars);
        Ok(Self::new(layout, summarizer))
    }

    /// Run `action` and return the text to print.
    pub async fn run(&self, action: Action, output: Option<&Path>) -> String {
        match action {
            Action::Latest => self.summarize_latest_text(output).await,
            Action::Recent(count) => self.summarize_recent_text(count, output).await,
            Action::Get => self.get_latest_text().await,
            Action::Startup => self.startup().await,
        }
    }

    /// Summarize the newest transcript.
    pub async fn summarize_latest(&self, output: Option<&Path>) -> Result<String> {
        let latest = list_artifacts(&self.layout.history_dir)?
            .into_iter()
            .next()
            .ok_or_else(|| DigestError::NoArtifactsFound(self.layout.history_dir.clone()))?;
        debug!("found latest chat history file: {}", latest.name());

        let document = AggregatedDocument::Single(latest);
        let summary = provider_failure_as_text(
            self.summarizer
                .summarize(&document, Template::ChatHistory)
                .await,
        )?;

        let path = self.persist(&summary, SummaryTag::Single, output)?;
        Ok(format!(
            "Chat history summary saved to: {}\n\n{}",
            path.display(),
            summary
        ))
    }

    pub async fn summarize_latest_text(&self, output: Option<&Path>) -> String {
        self.summarize_latest(output)
            .await
            .unwrap_or_else(|e| format!("Error summarizing chat history: {}", e))
    }

    /// Summarize the `count` newest transcripts as one document.
    ///
    /// A count of zero is treated as one. Several transcripts are merged into
    /// a staging file that is deleted before this returns, whether or not the
    /// provider call succeeded.
    pub async fn summarize_recent(&self, count: usize, output: Option<&Path>) -> Result<String> {
        let recent: Vec<_> = list_artifacts(&self.layout.history_dir)?
            .into_iter()
            .take(count.max(1))
            .collect();
        debug!("found {} recent chat history files", recent.len());

        let document = aggregate(&recent, &self.layout.temp_dir)?;
        let result = self
            .summarizer
            .summarize(&document, Template::ChatHistory)
            .await;
        drop(document);

        let summary = provider_failure_as_text(result)?;
        let path = self.persist(&summary, SummaryTag::Multi, output)?;
        Ok(format!(
            "Multi-chat summary saved to: {}\n\n{}",
            path.display(),
            summary
        ))
    }

    pub async fn summarize_recent_text(&self, count: usize, output: Option<&Path>) -> String {
        self.summarize_recent(count, output)
            .await
            .unwrap_or_else(|e| format!("Error summarizing recent chat histories: {}", e))
    }

    /// Return the newest stored summary, generating one if the store is empty.
    pub async fn get_latest(&self) -> Result<String> {
        self.store.ensure_dir()?;
        match self.store.load_latest()? {
            Some(latest) => {
                debug!("read summary, size: {} chars", latest.content.chars().count());
                Ok(format!(
                    "Latest chat summary ({}):\n\n{}",
                    latest.name(),
                    latest.content
                ))
            }
            None => {
                debug!("no existing summaries found");
                Ok(format!(
                    "{}\n{}",
                    NO_SUMMARIES_NOTICE,
                    self.summarize_latest_text(None).await
                ))
            }
        }
    }

    pub async fn get_latest_text(&self) -> String {
        self.get_latest()
            .await
            .unwrap_or_else(|e| format!("Error retrieving latest summary: {}", e))
    }

    /// Run `action` and write its text to `out`.
    ///
    /// For [`Action::Startup`] the start banner is written and flushed before
    /// any work begins, and the end banner after the body, whatever the
    /// outcome.
    pub async fn run_to<W: Write>(
        &self,
        action: Action,
        output: Option<&Path>,
        out: &mut W,
    ) -> std::io::Result<()> {
        match action {
            Action::Startup => {
                writeln!(out, "{}", STARTUP_BANNER)?;
                out.flush()?;
                let body = self.startup_body().await;
                writeln!(out, "{}", body)?;
                writeln!(out, "{}", END_BANNER)?;
            }
            other => writeln!(out, "{}", self.run(other, output).await)?,
        }
        out.flush()
    }

    /// Session startup block: the stored summary if there is one, a fresh
    /// summary otherwise, framed by the start and end banners.
    pub async fn startup(&self) -> String {
        format!(
            "{}\n{}\n{}",
            STARTUP_BANNER,
            self.startup_body().await,
            END_BANNER
        )
    }

    async fn startup_body(&self) -> String {
        match self.store.ensure_dir().and_then(|_| self.store.has_any()) {
            Ok(true) => {
                debug!("found existing summaries, getting latest");
                self.get_latest_text().await
            }
            Ok(false) => {
                debug!("no existing summaries found");
                format!(
                    "{}\n{}",
                    NO_SUMMARIES_NOTICE,
                    self.summarize_latest_text(None).await
                )
            }
            Err(e) => format!("Error during startup: {}", e),
        }
    }

    fn persist(&self, summary: &str, tag: SummaryTag, output: Option<&Path>) -> Result<PathBuf> {
        match output {
            Some(path) => self.store.save_to(summary, path),
            None => self.store.save(summary, tag),
        }
    }
}
