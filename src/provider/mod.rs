//! Text generation provider abstraction.
//!
//! Defines the [`TextProvider`] trait and the streaming model shared by the
//! chat summary and research paths:
//!
//! - a provider turns a [`GenerateRequest`] into a [`ChunkStream`], a finite,
//!   non-restartable stream of text chunks;
//! - [`accumulate`] folds that stream into the final text, appending chunks
//!   in arrival order.
//!
//! The only concrete backend is [`GeminiProvider`]; tests substitute their
//! own implementations of the trait.
//!
//! # Provider Selection
//!
//! ```rust,no_run
//! # use chat_digest::config::ProviderConfig;
//! # use chat_digest::provider::create_provider;
//! let provider = create_provider(&ProviderConfig::default()).unwrap();
//! assert_eq!(provider.model_name(), "gemini-2.5-pro-exp-03-25");
//! ```
//!
//! No retries are attempted anywhere: a failed request or a broken stream
//! surfaces as [`DigestError::Provider`] immediately.

mod gemini;

pub use gemini::{GeminiProvider, SseDecoder};

use async_trait::async_trait;
use futures::stream::{Stream, StreamExt};
use std::pin::Pin;

use crate::config::ProviderConfig;
use crate::credential::Credential;
use crate::error::{DigestError, Result};
use crate::progress::{NoProgress, StreamProgress};

/// Incremental provider output.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// One text generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    /// Single user-role prompt.
    pub prompt: String,
    /// Enable the provider's web search tool.
    pub web_search: bool,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            web_search: false,
        }
    }

    pub fn with_web_search(mut self) -> Self {
        self.web_search = true;
        self
    }
}

/// A streaming text-completion backend.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Model identifier sent with every request.
    fn model_name(&self) -> &str;

    /// Start a generation and return its chunk stream.
    ///
    /// Errors before the first chunk (connection, auth, HTTP status) are
    /// returned here; errors mid-stream arrive as stream items.
    async fn stream_generate(
        &self,
        credential: &Credential,
        request: &GenerateRequest,
    ) -> Result<ChunkStream>;
}

/// Concatenate every chunk of `stream`, stopping at the first error.
pub async fn accumulate(stream: ChunkStream) -> Result<String> {
    accumulate_with(stream, &NoProgress).await
}

/// [`accumulate`], reporting each chunk to `progress` as it arrives.
pub async fn accumulate_with(
    mut stream: ChunkStream,
    progress: &dyn StreamProgress,
) -> Result<String> {
    let mut text = String::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        progress.chunk(&chunk);
        text.push_str(&chunk);
    }
    progress.finish();
    Ok(text)
}

/// Issue `request` and fold the response into one string.
pub async fn generate(
    provider: &dyn TextProvider,
    credential: &Credential,
    request: &GenerateRequest,
    progress: &dyn StreamProgress,
) -> Result<String> {
    let stream = provider.stream_generate(credential, request).await?;
    accumulate_with(stream, progress).await
}

/// Build the provider described by the `[provider]` config section.
pub fn create_provider(config: &ProviderConfig) -> Result<Box<dyn TextProvider>> {
    if config.model.trim().is_empty() {
        return Err(DigestError::provider("provider.model must not be empty"));
    }
    Ok(Box::new(GeminiProvider::new(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn chunks(items: Vec<Result<String>>) -> ChunkStream {
        Box::pin(futures::stream::iter(items))
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>, Mutex<bool>);

    impl StreamProgress for Recorder {
        fn chunk(&self, text: &str) {
            self.0.lock().unwrap().push(text.to_string());
        }
        fn finish(&self) {
            *self.1.lock().unwrap() = true;
        }
    }

    #[tokio::test]
    async fn accumulates_in_arrival_order() {
        let s = chunks(vec![
            Ok("Hello".to_string()),
            Ok(", ".to_string()),
            Ok("world".to_string()),
        ]);
        assert_eq!(accumulate(s).await.unwrap(), "Hello, world");
    }

    #[tokio::test]
    async fn empty_stream_is_empty_success() {
        assert_eq!(accumulate(chunks(vec![])).await.unwrap(), "");
    }

    #[tokio::test]
    async fn stops_at_first_error() {
        let s = chunks(vec![
            Ok("partial".to_string()),
            Err(DigestError::provider("quota exceeded")),
            Ok("never".to_string()),
        ]);
        let err = accumulate(s).await.unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn progress_sees_every_chunk() {
        let rec = Recorder::default();
        let s = chunks(vec![Ok("a".to_string()), Ok("b".to_string())]);
        let text = accumulate_with(s, &rec).await.unwrap();
        assert_eq!(text, "ab");
        assert_eq!(*rec.0.lock().unwrap(), vec!["a", "b"]);
        assert!(*rec.1.lock().unwrap());
    }

    #[test]
    fn request_builder() {
        let r = GenerateRequest::new("p");
        assert!(!r.web_search);
        assert!(r.with_web_search().web_search);
    }

    #[test]
    fn create_default_provider() {
        let provider = create_provider(&ProviderConfig::default()).unwrap();
        assert_eq!(provider.model_name(), "gemini-2.5-pro-exp-03-25");
    }
}
