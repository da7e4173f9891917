//! # Chat summary CLI (`chat-summary`)
//!
//! Summarizes the project's chat transcripts and prints the result.
//!
//! | Flag | Action |
//! |------|--------|
//! | `--latest` | Summarize the newest transcript |
//! | `--recent [N]` | Summarize the N newest transcripts together (default 3) |
//! | `--get` | Print the newest stored summary, generating one if needed |
//! | `--startup` | Session startup block (the default) |
//!
//! Operation failures are printed as text and the process exits with
//! status 0, so the tool can run unattended at session start.

use chat_digest::config;
use chat_digest::logging;
use chat_digest::ops::{Action, ChatSummary};
use clap::{ArgGroup, Parser};
use std::path::PathBuf;

/// Summarize AI assistant chat histories with Gemini.
#[derive(Parser)]
#[command(name = "chat-summary", version, about)]
#[command(group(
    ArgGroup::new("action")
        .args(["latest", "recent", "get", "startup"])
        .multiple(false)
))]
struct Cli {
    /// Summarize the latest chat history.
    #[arg(short, long)]
    latest: bool,

    /// Summarize the N most recent chat histories as one document.
    #[arg(
        short,
        long,
        value_name = "N",
        num_args = 0..=1,
        default_missing_value = "3",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    recent: Option<u64>,

    /// Print the latest stored summary.
    #[arg(short, long)]
    get: bool,

    /// Print the startup summary for a new agent session.
    #[arg(short, long)]
    startup: bool,

    /// Write the summary to this file instead of the summary directory.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print diagnostic output.
    #[arg(short, long)]
    debug: bool,

    /// Path to a TOML config file.
    ///
    /// Defaults to `<root>/.cursor/chat_digest.toml` when it exists.
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn action(&self) -> Action {
        if self.latest {
            Action::Latest
        } else if let Some(n) = self.recent {
            Action::Recent(n as usize)
        } else if self.get {
            Action::Get
        } else {
            Action::Startup
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.debug);

    let (cfg, layout) = config::resolve(cli.config.as_deref())?;
    let app = ChatSummary::from_config(&cfg, layout)?;
    app.run_to(cli.action(), cli.output.as_deref(), &mut std::io::stdout())
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("chat-summary").chain(args.iter().copied()))
    }

    #[test]
    fn no_flags_means_startup() {
        assert_eq!(parse(&[]).unwrap().action(), Action::Startup);
    }

    #[test]
    fn recent_count_defaults_to_three() {
        assert_eq!(parse(&["--recent"]).unwrap().action(), Action::Recent(3));
        assert_eq!(parse(&["-r", "5"]).unwrap().action(), Action::Recent(5));
    }

    #[test]
    fn recent_rejects_zero() {
        assert!(parse(&["--recent", "0"]).is_err());
    }

    #[test]
    fn actions_are_exclusive() {
        assert!(parse(&["--latest", "--get"]).is_err());
        assert!(parse(&["-l", "-o", "out.md", "-d"]).is_ok());
    }
}
