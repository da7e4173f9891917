//! API key resolution.
//!
//! Sources are tried in order and the first non-empty value wins:
//!
//! 1. `GEMINI_API_KEY` in the process environment
//! 2. `GOOGLE_API_KEY` in the process environment
//! 3. either name in the project `.env` file (dotenv syntax)
//! 4. a plain `GEMINI_API_KEY=` line scan of the same file
//!
//! The file is only read, never loaded into the process environment.
//! Resolution returns `None` instead of failing; callers that need a key
//! raise [`DigestError::MissingCredential`](crate::error::DigestError).

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

pub const PRIMARY_KEY_VAR: &str = "GEMINI_API_KEY";
pub const SECONDARY_KEY_VAR: &str = "GOOGLE_API_KEY";

/// An API key. Formatting never reveals more than the last four characters.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn redacted(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 8 {
            return "****".to_string();
        }
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("****{}", tail)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.redacted()).finish()
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Resolves the provider credential from the environment or a `.env` file.
pub struct CredentialResolver {
    env: EnvLookup,
    env_file: PathBuf,
}

impl CredentialResolver {
    /// Resolver over the real process environment.
    pub fn new(env_file: impl Into<PathBuf>) -> Self {
        Self::with_env(env_file, |name| std::env::var(name).ok())
    }

    /// Resolver over a custom variable lookup.
    pub fn with_env<F>(env_file: impl Into<PathBuf>, env: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            env: Box::new(env),
            env_file: env_file.into(),
        }
    }

    pub fn env_file(&self) -> &Path {
        &self.env_file
    }

    pub fn resolve(&self) -> Option<Credential> {
        for name in [PRIMARY_KEY_VAR, SECONDARY_KEY_VAR] {
            if let Some(value) = non_empty((self.env)(name)) {
                debug!("API key taken from environment variable {}", name);
                return Some(Credential::new(value));
            }
        }

        if !self.env_file.exists() {
            debug!("no env file at {}", self.env_file.display());
            return None;
        }

        let content = match std::fs::read_to_string(&self.env_file) {
            Ok(c) => c,
            Err(e) => {
                debug!("failed to read {}: {}", self.env_file.display(), e);
                return None;
            }
        };

        let vars = parse_env_file(&content);
        for name in [PRIMARY_KEY_VAR, SECONDARY_KEY_VAR] {
            if let Some(value) = non_empty(vars.get(name).cloned()) {
                debug!("API key taken from {} ({})", self.env_file.display(), name);
                return Some(Credential::new(value));
            }
        }

        let scanned = scan_assignment(&content, PRIMARY_KEY_VAR);
        if scanned.is_some() {
            debug!("API key found by direct scan of {}", self.env_file.display());
        }
        scanned.map(Credential::new)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parse dotenv-style `KEY=value` lines.
///
/// Blank lines and `#` comments are skipped, an `export ` prefix is allowed,
/// and a value starting with a single or double quote ends at the matching
/// quote. Unquoted values lose any trailing ` # comment`. Later keys override
/// earlier ones.
pub fn parse_env_file(content: &str) -> HashMap<String, String> {
    let mut vars = HashMap::new();

    for raw in content.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() || key.contains(char::is_whitespace) {
            continue;
        }

        let value = value.trim();
        let value = match unquote(value) {
            Some(inner) => inner.to_string(),
            None => match value.find(" #") {
                Some(idx) => value[..idx].trim_end().to_string(),
                None => value.to_string(),
            },
        };
        vars.insert(key.to_string(), value);
    }

    vars
}

/// Text between a leading quote and its matching closing quote. Anything
/// after the closing quote (such as a ` # comment`) is dropped.
fn unquote(value: &str) -> Option<&str> {
    let quote = value.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let rest = &value[1..];
    rest.find(quote).map(|end| &rest[..end])
}

/// Find the first line starting with `KEY=` and return its value with
/// surrounding whitespace and quote characters stripped.
pub fn scan_assignment(content: &str, key: &str) -> Option<String> {
    let prefix = format!("{}=", key);
    content
        .lines()
        .find_map(|line| line.strip_prefix(prefix.as_str()))
        .map(|value| value.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
        .filter(|value| !value.is_empty())
}
