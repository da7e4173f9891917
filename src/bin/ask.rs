//! # Quick research CLI (`ask`)
//!
//! `ask "<query>" [output]` researches a question or topic and saves the
//! document, by default under `<root>/.cursor/docs/`.

use chat_digest::config;
use chat_digest::credential::CredentialResolver;
use chat_digest::logging;
use chat_digest::progress::{paint, Style, Target};
use chat_digest::provider::create_provider;
use chat_digest::research::{quick_research, research_credential};
use clap::Parser;
use std::path::PathBuf;

/// Research a question or topic and save the result as markdown.
#[derive(Parser)]
#[command(name = "ask", version, about)]
struct Cli {
    /// Question or topic. A query containing `?` is treated as a question.
    query: String,

    /// Output file. Defaults to a name derived from the query.
    output: Option<PathBuf>,

    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let (cfg, layout) = config::resolve(cli.config.as_deref())?;
    let resolver = CredentialResolver::new(&layout.env_file);
    let credential = research_credential(None, &resolver)?;
    let provider = create_provider(&cfg.provider)?;

    let text = quick_research(
        provider.as_ref(),
        &credential,
        &cli.query,
        cli.output.as_deref(),
        &layout.docs_dir,
    )
    .await?;
    println!("{}", text);
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    logging::init(false);

    if let Err(e) = run(cli).await {
        eprintln!(
            "{}",
            paint(&format!("Error: {:#}", e), Style::Failure, Target::Stderr)
        );
        std::process::exit(1);
    }
}
