//! Documentation research.
//!
//! Unlike the chat summary path, research prompts enable the provider's web
//! search tool, send no transcript content (so nothing is truncated), and
//! let every error propagate to the caller.

use chrono::{Local, Utc};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Instant;
use tracing::{debug, info};

use crate::credential::{Credential, CredentialResolver};
use crate::error::{DigestError, Result};
use crate::models::{file_timestamp, write_text};
use crate::progress::{NoProgress, StreamProgress};
use crate::prompt::research_prompt;
use crate::provider::{generate, GenerateRequest, TextProvider};

/// Default output file for the `research` CLI.
pub const DEFAULT_OUTPUT_FILE: &str = "research_result.md";

const SLUG_MAX_CHARS: usize = 50;

/// Outcome of [`create_documentation`].
#[derive(Debug, Clone)]
pub struct ResearchReport {
    pub content: String,
    pub topic: String,
    pub objective: String,
    pub output_path: Option<PathBuf>,
    pub execution_time_seconds: u64,
    /// RFC 3339 completion time.
    pub timestamp: String,
}

/// Use `explicit` if given, otherwise resolve from the environment or `.env`.
pub fn research_credential(
    explicit: Option<&str>,
    resolver: &CredentialResolver,
) -> Result<Credential> {
    match explicit.filter(|k| !k.trim().is_empty()) {
        Some(key) => Ok(Credential::new(key)),
        None => resolver.resolve().ok_or(DigestError::MissingCredential),
    }
}

/// Generate a research document on `topic` for `objective`.
///
/// Chunks are passed to `progress` as they stream in. When `output` is
/// given the finished document is written there.
pub async fn research(
    provider: &dyn TextProvider,
    credential: &Credential,
    topic: &str,
    objective: &str,
    output: Option<&Path>,
    progress: &dyn StreamProgress,
) -> Result<String> {
    info!("researching: {}", topic);
    debug!("objective: {}", objective);

    let prompt = research_prompt(Local::now().date_naive(), topic, objective);
    let request = GenerateRequest::new(prompt).with_web_search();
    let document = generate(provider, credential, &request, progress).await?;

    if document.is_empty() {
        debug!("no response text received from {}", provider.model_name());
    }

    if let Some(path) = output {
        write_text(path, &document)?;
        info!("research document saved to: {}", path.display());
    }

    Ok(document)
}

/// [`research`] plus timing metadata.
pub async fn create_documentation(
    provider: &dyn TextProvider,
    credential: &Credential,
    topic: &str,
    objective: &str,
    output: Option<&Path>,
    progress: &dyn StreamProgress,
) -> Result<ResearchReport> {
    let started = Instant::now();
    let content = research(provider, credential, topic, objective, output, progress).await?;

    Ok(ResearchReport {
        content,
        topic: topic.to_string(),
        objective: objective.to_string(),
        output_path: output.map(Path::to_path_buf),
        execution_time_seconds: started.elapsed().as_secs(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Topic and objective derived from a free-text query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    pub topic: String,
    pub objective: String,
}

/// A query containing `?` is a question: the topic is the text before the
/// first `?` and the objective is to answer it. Anything else is a topic.
pub fn interpret_query(query: &str) -> QueryPlan {
    match query.split_once('?') {
        Some((before, _)) => QueryPlan {
            topic: before.trim().to_string(),
            objective: format!("answer the question: '{}'", query),
        },
        None => QueryPlan {
            topic: query.to_string(),
            objective: format!("provide comprehensive information about {}", query),
        },
    }
}

fn strip_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s-]").expect("valid regex"))
}

fn collapse_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\s-]+").expect("valid regex"))
}

/// File-name-safe form of `query`, at most 50 characters.
pub fn slugify(query: &str) -> String {
    let lower = query.to_lowercase();
    let stripped = strip_pattern().replace_all(&lower, "");
    let collapsed = collapse_pattern().replace_all(&stripped, "_");
    collapsed.chars().take(SLUG_MAX_CHARS).collect()
}

/// `<docs_dir>/<slug>_<YYYYMMDD_HHMMSS>.md`
pub fn docs_output_path(docs_dir: &Path, query: &str) -> PathBuf {
    docs_dir.join(format!(
        "{}_{}.md",
        slugify(query),
        file_timestamp(Local::now())
    ))
}

/// Research a free-text query and save it.
///
/// Writes to `output` when given, otherwise to a generated name under
/// `docs_dir`. Returns `Research saved to: <path>` followed by the document.
pub async fn quick_research(
    provider: &dyn TextProvider,
    credential: &Credential,
    query: &str,
    output: Option<&Path>,
    docs_dir: &Path,
) -> Result<String> {
    let plan = interpret_query(query);
    let path = match output {
        Some(p) => p.to_path_buf(),
        None => docs_output_path(docs_dir, query),
    };

    let report = create_documentation(
        provider,
        credential,
        &plan.topic,
        &plan.objective,
        Some(path.as_path()),
        &NoProgress,
    )
    .await?;

    Ok(format!(
        "Research saved to: {}\n\n{}",
        path.display(),
        report.content
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn question_query() {
        let plan = interpret_query("How do I use tokio::select? with timeouts");
        assert_eq!(plan.topic, "How do I use tokio::select");
        assert_eq!(
            plan.objective,
            "answer the question: 'How do I use tokio::select? with timeouts'"
        );
    }

    #[test]
    fn topic_query() {
        let plan = interpret_query("axum middleware");
        assert_eq!(plan.topic, "axum middleware");
        assert_eq!(
            plan.objective,
            "provide comprehensive information about axum middleware"
        );
    }

    #[test]
    fn slug_rules() {
        assert_eq!(slugify("What is Rust's borrow-checker?"), "what_is_rusts_borrow_checker");
        assert_eq!(slugify("a  -  b"), "a_b");
        let long = "word ".repeat(30);
        assert_eq!(slugify(&long).chars().count(), 50);
    }

    #[test]
    fn docs_path_shape() {
        let p = docs_output_path(Path::new("/p/.cursor/docs"), "Serde derive");
        let name = p.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("serde_derive_"));
        assert!(name.ends_with(".md"));
        assert_eq!(p.parent().unwrap(), Path::new("/p/.cursor/docs"));
    }

    #[test]
    fn explicit_key_wins() {
        let resolver = CredentialResolver::with_env("/nonexistent/.env", |_| None);
        let c = research_credential(Some("explicit"), &resolver).unwrap();
        assert_eq!(c.expose(), "explicit");
    }

    #[test]
    fn missing_key_is_error() {
        let resolver = CredentialResolver::with_env("/nonexistent/.env", |_| None);
        assert!(matches!(
            research_credential(None, &resolver),
            Err(DigestError::MissingCredential)
        ));
    }

    #[test]
    fn falls_back_to_resolver() {
        let vars: HashMap<&str, &str> = [("GOOGLE_API_KEY", "google")].into_iter().collect();
        let resolver = CredentialResolver::with_env("/nonexistent/.env", move |n| {
            vars.get(n).map(|v| v.to_string())
        });
        let c = research_credential(Some("  "), &resolver).unwrap();
        assert_eq!(c.expose(), "google");
    }
}
