//! Library-level tests for the chat summary actions and quick research,
//! driven by an in-memory provider.

use async_trait::async_trait;
use chat_digest::config::{Config, Layout};
use chat_digest::credential::{Credential, CredentialResolver};
use chat_digest::error::{DigestError, Result};
use chat_digest::ops::{Action, ChatSummary, END_BANNER, NO_SUMMARIES_NOTICE, STARTUP_BANNER};
use chat_digest::provider::{ChunkStream, GenerateRequest, TextProvider};
use chat_digest::research::quick_research;
use chat_digest::summarize::Summarizer;
use std::fs::File;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

#[derive(Clone)]
struct Scripted {
    reply: Vec<&'static str>,
    fail: Option<&'static str>,
    prompts: Arc<Mutex<Vec<GenerateRequest>>>,
}

impl Scripted {
    fn replying(reply: Vec<&'static str>) -> Self {
        Self {
            reply,
            fail: None,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn failing(msg: &'static str) -> Self {
        Self {
            reply: Vec::new(),
            fail: Some(msg),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn requests(&self) -> Vec<GenerateRequest> {
        self.prompts.lock().unwrap().clone()
    }
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
        self.prompts.lock().unwrap().push(request.clone());
        if let Some(msg) = self.fail {
            return Err(DigestError::provider(msg));
        }
        let items: Vec<Result<String>> = self.reply.iter().map(|c| Ok(c.to_string())).collect();
        Ok(Box::pin(futures::stream::iter(items)))
    }
}

struct Project {
    tmp: TempDir,
    layout: Layout,
}

impl Project {
    fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join(".cursor")).unwrap();
        let layout = Config::minimal().layout(tmp.path());
        Self { tmp, layout }
    }

    fn transcript(&self, name: &str, body: &str, age_secs: u64) {
        std::fs::create_dir_all(&self.layout.history_dir).unwrap();
        let path = self.layout.history_dir.join(name);
        std::fs::write(&path, body).unwrap();
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(SystemTime::now() - Duration::from_secs(age_secs))
            .unwrap();
    }

    fn app(&self, provider: &Scripted, key: Option<&'static str>) -> ChatSummary {
        let resolver = CredentialResolver::with_env(&self.layout.env_file, move |name| {
            (name == "GEMINI_API_KEY").then(|| key.map(str::to_string)).flatten()
        });
        let summarizer = Summarizer::new(Box::new(provider.clone()), resolver);
        ChatSummary::new(self.layout.clone(), summarizer)
    }

    fn stored(&self) -> Vec<String> {
        list_names(&self.layout.summary_dir)
    }

    fn staged(&self) -> Vec<String> {
        list_names(&self.layout.temp_dir)
    }
}

fn list_names(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn recent_merges_newest_first_and_cleans_staging() {
    let project = Project::new();
    project.transcript("t1.md", "oldest session", 300);
    project.transcript("t2.md", "middle session", 200);
    project.transcript("t3.md", "newest session", 100);

    let provider = Scripted::replying(vec!["## Topics", "\n- async"]);
    let app = project.app(&provider, Some("test-key"));
    let out = app.summarize_recent_text(2, None).await;

    assert!(out.starts_with("Multi-chat summary saved to: "), "{}", out);
    assert!(out.ends_with("\n\n## Topics\n- async"));

    let requests = provider.requests();
    assert_eq!(requests.len(), 1);
    let prompt = &requests[0].prompt;
    let first = prompt.find("### Chat Session 1: t3.md").unwrap();
    let second = prompt.find("### Chat Session 2: t2.md").unwrap();
    assert!(first < second);
    assert_eq!(prompt.matches("### Chat Session").count(), 2);
    assert_eq!(prompt.matches("\n\n---\n\n").count(), 1);
    assert!(!prompt.contains("oldest session"));

    let stored = project.stored();
    assert_eq!(stored.len(), 1);
    assert!(stored[0].starts_with("multi_chat_summary_"));
    assert_eq!(
        std::fs::read_to_string(project.layout.summary_dir.join(&stored[0])).unwrap(),
        "## Topics\n- async"
    );
    assert!(project.staged().is_empty());
}

#[tokio::test]
async fn recent_cleans_staging_when_provider_fails() {
    let project = Project::new();
    project.transcript("a.md", "a", 20);
    project.transcript("b.md", "b", 10);

    let provider = Scripted::failing("503 UNAVAILABLE");
    let app = project.app(&provider, Some("test-key"));
    let out = app.run(Action::Recent(3), None).await;

    assert!(out.contains("Error generating summary: 503 UNAVAILABLE"));
    assert!(project.staged().is_empty());
    let stored = project.stored();
    assert_eq!(stored.len(), 1);
    assert!(stored[0].starts_with("multi_chat_summary_"));
}

#[tokio::test]
async fn latest_uses_single_tag() {
    let project = Project::new();
    project.transcript("old.md", "old", 50);
    project.transcript("new.md", "brand new", 5);

    let provider = Scripted::replying(vec!["summary"]);
    let app = project.app(&provider, Some("test-key"));
    let out = app.run(Action::Latest, None).await;

    assert!(out.starts_with("Chat history summary saved to: "));
    assert!(provider.requests()[0].prompt.contains("brand new"));
    let stored = project.stored();
    assert_eq!(stored.len(), 1);
    assert!(stored[0].starts_with("chat_summary_"));
}

#[tokio::test]
async fn output_override_skips_summary_dir() {
    let project = Project::new();
    project.transcript("only.md", "x", 5);
    let target = project.tmp.path().join("custom/summary.md");

    let provider = Scripted::replying(vec!["written"]);
    let app = project.app(&provider, Some("test-key"));
    let out = app.run(Action::Latest, Some(target.as_path())).await;

    assert!(out.contains(&target.display().to_string()));
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "written");
    assert!(project.stored().is_empty());
}

#[tokio::test]
async fn missing_credential_is_reported_as_text() {
    let project = Project::new();
    project.transcript("a.md", "a", 20);
    project.transcript("b.md", "b", 10);

    let provider = Scripted::replying(vec!["never"]);
    let app = project.app(&provider, None);

    let latest = app.run(Action::Latest, None).await;
    assert!(latest.starts_with("Error summarizing chat history: "));
    assert!(latest.contains("No Gemini API key found"));

    let recent = app.run(Action::Recent(2), None).await;
    assert!(recent.starts_with("Error summarizing recent chat histories: "));

    assert!(provider.requests().is_empty());
    assert!(project.stored().is_empty());
    assert!(project.staged().is_empty());
}

#[tokio::test]
async fn empty_history_has_no_side_effects() {
    let project = Project::new();
    std::fs::create_dir_all(&project.layout.history_dir).unwrap();

    let provider = Scripted::replying(vec!["never"]);
    let app = project.app(&provider, Some("test-key"));
    let out = app.run(Action::Latest, None).await;

    assert!(out.contains("No chat history files found"), "{}", out);
    assert!(provider.requests().is_empty());
    assert!(project.stored().is_empty());
}

#[tokio::test]
async fn missing_history_dir_is_reported() {
    let project = Project::new();
    let provider = Scripted::replying(vec!["never"]);
    let app = project.app(&provider, Some("test-key"));
    let out = app.run(Action::Recent(3), None).await;
    assert!(out.contains("SpecStory history directory not found"), "{}", out);
}

#[tokio::test]
async fn get_returns_stored_summary_without_provider_call() {
    let project = Project::new();
    std::fs::create_dir_all(&project.layout.summary_dir).unwrap();
    std::fs::write(
        project.layout.summary_dir.join("chat_summary_20250101_120000.md"),
        "# Stored",
    )
    .unwrap();

    let provider = Scripted::replying(vec!["never"]);
    let app = project.app(&provider, Some("test-key"));
    let out = app.run(Action::Get, None).await;

    assert_eq!(
        out,
        "Latest chat summary (chat_summary_20250101_120000.md):\n\n# Stored"
    );
    assert!(provider.requests().is_empty());
}

#[tokio::test]
async fn get_generates_when_store_is_empty() {
    let project = Project::new();
    project.transcript("only.md", "hello", 5);

    let provider = Scripted::replying(vec!["fresh"]);
    let app = project.app(&provider, Some("test-key"));
    let out = app.run(Action::Get, None).await;

    assert!(out.starts_with(NO_SUMMARIES_NOTICE));
    assert!(out.contains("Chat history summary saved to: "));
    assert_eq!(project.stored().len(), 1);
}

#[tokio::test]
async fn startup_is_framed_by_banners() {
    let project = Project::new();
    project.transcript("only.md", "hello", 5);

    let provider = Scripted::replying(vec!["first"]);
    let app = project.app(&provider, Some("test-key"));

    let first = app.run(Action::Startup, None).await;
    assert!(first.starts_with(STARTUP_BANNER));
    assert!(first.ends_with(END_BANNER));
    assert!(first.contains(NO_SUMMARIES_NOTICE));

    let second = app.startup().await;
    assert!(second.contains("Latest chat summary ("));
    assert!(second.contains("first"));
    assert_eq!(provider.requests().len(), 1);
}

#[tokio::test]
async fn startup_without_key_still_prints_banners() {
    let project = Project::new();
    project.transcript("only.md", "hello", 5);

    let provider = Scripted::replying(vec!["never"]);
    let app = project.app(&provider, None);
    let out = app.startup().await;

    assert!(out.starts_with(STARTUP_BANNER));
    assert!(out.ends_with(END_BANNER));
    assert!(out.contains("No Gemini API key found"));
}

#[tokio::test]
async fn quick_research_saves_under_docs_dir() {
    let project = Project::new();
    let provider = Scripted::replying(vec!["# Answer", "\nbody"]);
    let credential = Credential::new("test-key");

    let out = quick_research(
        &provider,
        &credential,
        "What is a Pin?",
        None,
        &project.layout.docs_dir,
    )
    .await
    .unwrap();

    let docs = list_names(&project.layout.docs_dir);
    assert_eq!(docs.len(), 1);
    assert!(docs[0].starts_with("what_is_a_pin_"));
    assert!(out.starts_with("Research saved to: "));
    assert!(out.ends_with("\n\n# Answer\nbody"));

    let request = &provider.requests()[0];
    assert!(request.web_search);
    assert!(request.prompt.contains("answer the question: 'What is a Pin?'"));
}

#[tokio::test]
async fn quick_research_propagates_provider_errors() {
    let project = Project::new();
    let provider = Scripted::failing("400 INVALID_ARGUMENT");
    let credential = Credential::new("test-key");
    let target = project.tmp.path().join("out.md");

    let err = quick_research(&provider, &credential, "topic", Some(target.as_path()), &project.layout.docs_dir)
        .await
        .unwrap_err();

    assert!(matches!(err, DigestError::Provider(_)));
    assert!(!target.exists());
}

#[derive(Clone, Default)]
struct SharedOut(Arc<Mutex<Vec<u8>>>);

impl SharedOut {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
    }
}

impl std::io::Write for SharedOut {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Records what had been written to the output when generation started.
struct Observing {
    out: SharedOut,
    at_call: Arc<Mutex<Option<String>>>,
}

#[async_trait]
impl TextProvider for Observing {
    fn model_name(&self) -> &str {
        "observing"
    }

    async fn stream_generate(
        &self,
        _credential: &Credential,
        _request: &GenerateRequest,
    ) -> Result<ChunkStream> {
        *self.at_call.lock().unwrap() = Some(self.out.text());
        Ok(Box::pin(futures::stream::iter(vec![Ok("fresh".to_string())])))
    }
}

#[tokio::test]
async fn startup_banner_is_written_before_generation() {
    let project = Project::new();
    project.transcript("only.md", "hello", 5);

    let out = SharedOut::default();
    let at_call = Arc::new(Mutex::new(None));
    let provider = Observing {
        out: out.clone(),
        at_call: at_call.clone(),
    };
    let resolver = CredentialResolver::with_env(&project.layout.env_file, |name| {
        (name == "GEMINI_API_KEY").then(|| "test-key".to_string())
    });
    let app = ChatSummary::new(
        project.layout.clone(),
        Summarizer::new(Box::new(provider), resolver),
    );

    let mut writer = out.clone();
    app.run_to(Action::Startup, None, &mut writer).await.unwrap();

    let seen = at_call.lock().unwrap().clone().unwrap();
    assert_eq!(seen, format!("{}\n", STARTUP_BANNER));

    let text = out.text();
    assert!(text.starts_with(STARTUP_BANNER));
    assert!(text.ends_with(&format!("{}\n", END_BANNER)));
    assert!(text.contains("fresh"));
    let body = text.find(NO_SUMMARIES_NOTICE).unwrap();
    assert!(body > STARTUP_BANNER.len());
    assert!(body < text.find("=== END OF STARTUP SUMMARY ===").unwrap());
}

#[tokio::test]
async fn run_to_matches_run_for_other_actions() {
    let project = Project::new();
    std::fs::create_dir_all(&project.layout.summary_dir).unwrap();
    std::fs::write(project.layout.summary_dir.join("chat_summary_x.md"), "kept").unwrap();

    let provider = Scripted::replying(vec!["never"]);
    let app = project.app(&provider, Some("test-key"));
    let mut out = SharedOut::default();
    app.run_to(Action::Get, None, &mut out).await.unwrap();

    assert_eq!(out.text(), format!("{}\n", app.run(Action::Get, None).await));
}
