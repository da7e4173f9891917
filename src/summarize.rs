//! Summarization client.
//!
//! Resolves the credential, bounds the content size, renders the instruction
//! template and folds the provider's streamed response into one string.
//!
//! [`Summarizer::summarize`] reports provider failures as
//! [`DigestError::Provider`]. The chat summary entry points apply
//! [`provider_failure_as_text`] on top, which turns those failures into an
//! `Error generating summary: ...` text that is handled like any summary.

use chrono::{Local, NaiveDate};
use tracing::debug;

use crate::aggregate::AggregatedDocument;
use crate::credential::CredentialResolver;
use crate::error::{DigestError, Result};
use crate::progress::NoProgress;
use crate::prompt::{truncate_content, Template, MAX_CONTENT_CHARS};
use crate::provider::{generate, GenerateRequest, TextProvider};

pub struct Summarizer {
    provider: Box<dyn TextProvider>,
    credentials: CredentialResolver,
    max_content_chars: usize,
}

impl Summarizer {
    pub fn new(provider: Box<dyn TextProvider>, credentials: CredentialResolver) -> Self {
        Self {
            provider,
            credentials,
            max_content_chars: MAX_CONTENT_CHARS,
        }
    }

    pub fn with_max_content_chars(mut self, max: usize) -> Self {
        self.max_content_chars = max;
        self
    }

    /// Build the provider request for `content`, truncating it first.
    pub fn build_request(
        &self,
        content: &str,
        template: Template,
        today: NaiveDate,
    ) -> GenerateRequest {
        let bounded = truncate_content(content, self.max_content_chars);
        GenerateRequest::new(template.render(today, &bounded))
    }

    /// Summarize a transcript or staged aggregate.
    ///
    /// # Errors
    ///
    /// - [`DigestError::MissingCredential`] when no API key resolves; nothing
    ///   is read or sent in that case.
    /// - [`DigestError::Io`] when the source cannot be read.
    /// - [`DigestError::Provider`] for any failure of the provider call.
    pub async fn summarize(
        &self,
        source: &AggregatedDocument,
        template: Template,
    ) -> Result<String> {
        let credential = self.credentials.resolve().ok_or_else(|| {
            debug!(
                "no API key in GEMINI_API_KEY, GOOGLE_API_KEY or {}",
                self.credentials.env_file().display()
            );
            DigestError::MissingCredential
        })?;

        debug!("reading {}", source.path().display());
        let content = source.read()?;
        let request = self.build_request(&content, template, Local::now().date_naive());

        debug!(
            "generating summary with {} ({} source chars)",
            self.provider.model_name(),
            content.chars().count()
        );
        let summary = generate(self.provider.as_ref(), &credential, &request, &NoProgress).await?;

        if summary.is_empty() {
            debug!("no response text received from {}", self.provider.model_name());
        } else {
            debug!("generated summary, size: {} chars", summary.chars().count());
        }
        Ok(summary)
    }
}

/// Chat summary policy: a provider failure becomes the summary text.
///
/// Every other error is passed through unchanged.
pub fn provider_failure_as_text(result: Result<String>) -> Result<String> {
    match result {
        Err(DigestError::Provider(detail)) => {
            debug!("provider failure: {}", detail);
            Ok(format!("Error generating summary: {}", detail))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::Credential;
    use crate::models::Artifact;
    use crate::provider::ChunkStream;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use std::time::SystemTime;
    use tempfile::TempDir;

    struct Scripted {
        chunks: Vec<&'static str>,
        fail: Option<&'static str>,
        seen: Arc<Mutex<Vec<GenerateRequest>>>,
    }

    #[async_trait]
    impl TextProvider for Scripted {
        fn model_name(&self) -> &str {
            "scripted"
        }

        async fn stream_generate(
            &self,
            _credential: &Credential,
            request: &GenerateRequest,
        ) -> Result<ChunkStream> {
            self.seen.lock().unwrap().push(request.clone());
            if let Some(msg) = self.fail {
                return Err(DigestError::provider(msg));
            }
            let items: Vec<Result<String>> =
                self.chunks.iter().map(|c| Ok(c.to_string())).collect();
            Ok(Box::pin(futures::stream::iter(items)))
        }
    }

    fn summarizer(
        tmp: &TempDir,
        chunks: Vec<&'static str>,
        fail: Option<&'static str>,
        key: Option<&'static str>,
    ) -> (Summarizer, Arc<Mutex<Vec<GenerateRequest>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let provider = Scripted {
            chunks,
            fail,
            seen: seen.clone(),
        };
        let resolver = CredentialResolver::with_env(tmp.path().join(".env"), move |name| {
            (name == "GEMINI_API_KEY").then(|| key.map(str::to_string)).flatten()
        });
        (Summarizer::new(Box::new(provider), resolver), seen)
    }

    fn source(tmp: &TempDir, body: &str) -> AggregatedDocument {
        let path = tmp.path().join("chat.md");
        std::fs::write(&path, body).unwrap();
        AggregatedDocument::Single(Artifact::new(path, SystemTime::now()))
    }

    #[tokio::test]
    async fn concatenates_stream() {
        let tmp = TempDir::new().unwrap();
        let (s, seen) = summarizer(&tmp, vec!["# Overview", "\n- item"], None, Some("k"));
        let out = s.summarize(&source(&tmp, "hello"), Template::ChatHistory).await.unwrap();
        assert_eq!(out, "# Overview\n- item");
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].prompt.contains("hello"));
        assert!(!seen[0].web_search);
    }

    #[tokio::test]
    async fn missing_credential_sends_nothing() {
        let tmp = TempDir::new().unwrap();
        let (s, seen) = summarizer(&tmp, vec!["x"], None, None);
        let err = s
            .summarize(&source(&tmp, "hello"), Template::ChatHistory)
            .await
            .unwrap_err();
        assert!(matches!(err, DigestError::MissingCredential));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn long_content_is_truncated_in_request() {
        let tmp = TempDir::new().unwrap();
        let (s, seen) = summarizer(&tmp, vec!["ok"], None, Some("k"));
        let body = format!("{}{}", "a".repeat(10_000), "b".repeat(500));
        s.summarize(&source(&tmp, &body), Template::ChatHistory)
            .await
            .unwrap();
        let prompt = seen.lock().unwrap()[0].prompt.clone();
        assert!(prompt.contains(&"a".repeat(10_000)));
        assert!(!prompt.contains("bb"));
        assert!(prompt.contains("[...truncated - total length: 10500 characters]"));
    }

    #[tokio::test]
    async fn empty_stream_is_success() {
        let tmp = TempDir::new().unwrap();
        let (s, _) = summarizer(&tmp, vec![], None, Some("k"));
        let out = s.summarize(&source(&tmp, "x"), Template::ChatHistory).await.unwrap();
        assert_eq!(out, "");
    }

    #[tokio::test]
    async fn provider_failure_policy() {
        let tmp = TempDir::new().unwrap();
        let (s, _) = summarizer(&tmp, vec![], Some("403 PERMISSION_DENIED"), Some("k"));
        let raw = s.summarize(&source(&tmp, "x"), Template::ChatHistory).await;
        assert!(matches!(raw, Err(DigestError::Provider(_))));

        let (s, _) = summarizer(&tmp, vec![], Some("403 PERMISSION_DENIED"), Some("k"));
        let text =
            provider_failure_as_text(s.summarize(&source(&tmp, "x"), Template::ChatHistory).await)
                .unwrap();
        assert_eq!(text, "Error generating summary: 403 PERMISSION_DENIED");
    }

    #[test]
    fn non_provider_errors_pass_through() {
        let out = provider_failure_as_text(Err(DigestError::MissingCredential));
        assert!(matches!(out, Err(DigestError::MissingCredential)));
    }
}
