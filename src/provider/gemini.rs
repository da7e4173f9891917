//! Google Gemini backend.
//!
//! Calls `POST {base_url}/models/{model}:streamGenerateContent?alt=sse` and
//! decodes the server-sent event stream. Each `data:` payload is one
//! `GenerateContentResponse`; the text of its first candidate's parts is one
//! chunk. Payloads without text (safety metadata, usage) are skipped.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use serde_json::Value;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::debug;

use super::{ChunkStream, GenerateRequest, TextProvider};
use crate::config::ProviderConfig;
use crate::credential::Credential;
use crate::error::{DigestError, Result};

/// Gemini streaming client. One instance per orchestration call.
pub struct GeminiProvider {
    client: reqwest::Client,
    model: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        )
    }
}

/// JSON body for a `streamGenerateContent` call.
pub(crate) fn request_body(request: &GenerateRequest) -> Value {
    let mut body = serde_json::json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": request.prompt }],
        }],
        "generationConfig": {
            "responseMimeType": "text/plain",
        },
    });
    if request.web_search {
        body["tools"] = serde_json::json!([{ "google_search": {} }]);
    }
    body
}

#[async_trait]
impl TextProvider for GeminiProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn stream_generate(
        &self,
        credential: &Credential,
        request: &GenerateRequest,
    ) -> Result<ChunkStream> {
        debug!(
            "Gemini request: model={} web_search={} prompt_chars={} key={}",
            self.model,
            request.web_search,
            request.prompt.chars().count(),
            credential
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", credential.expose())
            .header("Content-Type", "application/json")
            .json(&request_body(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(DigestError::provider(format!(
                "Gemini API error {}: {}",
                status,
                error_message(&body_text).unwrap_or(body_text)
            )));
        }

        Ok(Box::pin(decode_sse(Box::pin(response.bytes_stream()))))
    }
}

/// Pull `error.message` out of a Gemini error body, if it has one.
fn error_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    json.get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .map(str::to_string)
}

struct DecodeState<S> {
    inner: S,
    decoder: SseDecoder,
    pending: VecDeque<Result<String>>,
    finished: bool,
}

/// Turn a response byte stream into text chunks.
fn decode_sse<S>(inner: S) -> impl Stream<Item = Result<String>> + Send
where
    S: Stream<Item = reqwest::Result<Bytes>> + Unpin + Send + 'static,
{
    let state = DecodeState {
        inner,
        decoder: SseDecoder::default(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.pending.pop_front() {
                if item.is_err() {
                    st.pending.clear();
                    st.finished = true;
                }
                return Some((item, st));
            }
            if st.finished {
                return None;
            }
            match st.inner.next().await {
                Some(Ok(bytes)) => st.pending.extend(st.decoder.push(&bytes)),
                Some(Err(e)) => {
                    st.pending
                        .push_back(Err(DigestError::provider(format!("Stream error: {}", e))));
                    st.finished = true;
                }
                None => {
                    st.pending.extend(st.decoder.finish());
                    st.finished = true;
                }
            }
        }
    })
}

/// Incremental server-sent events decoder for Gemini responses.
///
/// Bytes are buffered until a full line is available, so multi-byte
/// characters and events split across network reads decode correctly.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: String,
}

impl SseDecoder {
    /// Feed raw bytes; returns the chunks completed by them.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Result<String>> {
        self.buffer.extend_from_slice(bytes);
        let mut out = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            self.line(line.trim_end_matches(['\r', '\n']), &mut out);
        }
        out
    }

    /// Flush a trailing event that was not followed by a blank line.
    pub fn finish(&mut self) -> Vec<Result<String>> {
        let mut out = Vec::new();
        if !self.buffer.is_empty() {
            let raw = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&raw).to_string();
            self.line(line.trim_end_matches('\r'), &mut out);
        }
        self.dispatch(&mut out);
        out
    }

    fn line(&mut self, line: &str, out: &mut Vec<Result<String>>) {
        if line.is_empty() {
            self.dispatch(out);
            return;
        }
        if line.starts_with(':') {
            return;
        }
        if let Some(rest) = line.strip_prefix("data:") {
            let rest = rest.strip_prefix(' ').unwrap_or(rest);
            if !self.data.is_empty() {
                self.data.push('\n');
            }
            self.data.push_str(rest);
        }
        // event:, id:, retry: carry nothing we use
    }

    fn dispatch(&mut self, out: &mut Vec<Result<String>>) {
        if self.data.is_empty() {
            return;
        }
        let payload = std::mem::take(&mut self.data);
        if let Some(item) = parse_payload(&payload) {
            out.push(item);
        }
    }
}

/// Extract the chunk text from one `GenerateContentResponse` payload.
fn parse_payload(payload: &str) -> Option<Result<String>> {
    if payload.trim() == "[DONE]" {
        return None;
    }

    let json: Value = match serde_json::from_str(payload) {
        Ok(v) => v,
        Err(e) => {
            return Some(Err(DigestError::provider(format!(
                "Malformed Gemini response: {}",
                e
            ))))
        }
    };

    if let Some(error) = json.get("error") {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown error");
        return Some(Err(DigestError::provider(format!(
            "Gemini API error: {}",
            message
        ))));
    }

    let parts = json
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())?;

    let text: String = parts
        .iter()
        .filter(|p| !p.get("thought").and_then(|t| t.as_bool()).unwrap_or(false))
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect();

    if text.is_empty() {
        None
    } else {
        Some(Ok(text))
    }
}
