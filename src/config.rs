//! TOML configuration and the on-disk layout derived from it.
//!
//! Every setting has a default, so a missing config file is not an error:
//! [`load_config_or_default`] falls back to [`Config::minimal`]. Paths in the
//! `[paths]` section are relative to the project root found by
//! [`crate::root::locate_root`].
//!
//! ```toml
//! [paths]
//! history_dir = ".specstory/history"
//! summary_dir = ".cursor/chat_summary"
//!
//! [provider]
//! model = "gemini-2.5-pro-exp-03-25"
//! timeout_secs = 120
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Directory marking the project root.
pub const DEFAULT_MARKER: &str = ".cursor";

/// Config file name, looked up inside the marker directory.
pub const CONFIG_FILE_NAME: &str = "chat_digest.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    #[serde(default = "default_marker")]
    pub marker: String,
    #[serde(default = "default_history_dir")]
    pub history_dir: PathBuf,
    #[serde(default = "default_summary_dir")]
    pub summary_dir: PathBuf,
    #[serde(default = "default_docs_dir")]
    pub docs_dir: PathBuf,
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    #[serde(default = "default_env_file")]
    pub env_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            marker: default_marker(),
            history_dir: default_history_dir(),
            summary_dir: default_summary_dir(),
            docs_dir: default_docs_dir(),
            temp_dir: default_temp_dir(),
            env_file: default_env_file(),
        }
    }
}

fn default_marker() -> String {
    DEFAULT_MARKER.to_string()
}
fn default_history_dir() -> PathBuf {
    PathBuf::from(".specstory/history")
}
fn default_summary_dir() -> PathBuf {
    PathBuf::from(".cursor/chat_summary")
}
fn default_docs_dir() -> PathBuf {
    PathBuf::from(".cursor/docs")
}
fn default_temp_dir() -> PathBuf {
    PathBuf::from(".cursor/temp")
}
fn default_env_file() -> PathBuf {
    PathBuf::from(".env")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: None,
            max_content_chars: default_max_content_chars(),
        }
    }
}

fn default_model() -> String {
    "gemini-2.5-pro-exp-03-25".to_string()
}
fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_max_content_chars() -> usize {
    10_000
}

impl Config {
    /// All defaults, used when no config file exists.
    pub fn minimal() -> Self {
        Self::default()
    }

    /// Resolve the `[paths]` section against a project root.
    pub fn layout(&self, root: &Path) -> Layout {
        Layout {
            root: root.to_path_buf(),
            history_dir: root.join(&self.paths.history_dir),
            summary_dir: root.join(&self.paths.summary_dir),
            docs_dir: root.join(&self.paths.docs_dir),
            temp_dir: root.join(&self.paths.temp_dir),
            env_file: root.join(&self.paths.env_file),
        }
    }
}

/// Absolute locations of everything the tools read and write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub root: PathBuf,
    pub history_dir: PathBuf,
    pub summary_dir: PathBuf,
    pub docs_dir: PathBuf,
    pub temp_dir: PathBuf,
    pub env_file: PathBuf,
}

/// Default config file location for a project root.
pub fn default_config_path(root: &Path) -> PathBuf {
    root.join(DEFAULT_MARKER).join(CONFIG_FILE_NAME)
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

/// Load the configuration and layout for a process started in `cwd`.
///
/// Without `explicit`, the config file is looked up under the root found with
/// the default marker. If that file names a different marker, the root is
/// located again with it.
pub fn resolve_from(cwd: &Path, explicit: Option<&Path>) -> Result<(Config, Layout)> {
    let default_root = crate::root::locate_root(cwd, DEFAULT_MARKER);
    let config = match explicit {
        Some(path) => load_config(path)?,
        None => load_config_or_default(&default_config_path(&default_root))?,
    };

    let root = if config.paths.marker == DEFAULT_MARKER {
        default_root
    } else {
        crate::root::locate_root(cwd, &config.paths.marker)
    };
    let layout = config.layout(&root);
    Ok((config, layout))
}

/// [`resolve_from`] the current working directory.
pub fn resolve(explicit: Option<&Path>) -> Result<(Config, Layout)> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    resolve_from(&cwd, explicit)
}

/// Like [`load_config`], but a missing file yields [`Config::minimal`].
pub fn load_config_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(Config::minimal())
    }
}

fn validate(config: &Config) -> Result<()> {
    if config.paths.marker.trim().is_empty() {
        anyhow::bail!("paths.marker must not be empty");
    }

    if config.provider.model.trim().is_empty() {
        anyhow::bail!("provider.model must not be empty");
    }

    let base = &config.provider.base_url;
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        anyhow::bail!(
            "provider.base_url must start with http:// or https://, got '{}'",
            base
        );
    }

    if config.provider.max_content_chars == 0 {
        anyhow::bail!("provider.max_content_chars must be > 0");
    }

    if config.provider.timeout_secs == Some(0) {
        anyhow::bail!("provider.timeout_secs must be > 0 when set");
    }

    Ok(())
}
