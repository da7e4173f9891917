//! # Research CLI (`research`)
//!
//! Generates a web-grounded research document on a topic with Gemini and
//! saves it to a markdown file. Missing `--topic` or `--objective` switches
//! to interactive prompting on stdin.
//!
//! ```bash
//! research -t "tokio" -o "explain task cancellation" -f tokio.md --stream
//! ```

use anyhow::Context;
use chat_digest::config;
use chat_digest::credential::CredentialResolver;
use chat_digest::logging;
use chat_digest::progress::{paint, ProgressMode, Style, Target};
use chat_digest::provider::create_provider;
use chat_digest::research::{create_documentation, research_credential, DEFAULT_OUTPUT_FILE};
use clap::Parser;
use std::io::{BufRead, Write};
use std::path::PathBuf;

/// Gemini research tool.
#[derive(Parser)]
#[command(name = "research", version, about = "Gemini research tool")]
struct Cli {
    /// Main topic to research.
    #[arg(short, long)]
    topic: Option<String>,

    /// Research objective.
    #[arg(short, long)]
    objective: Option<String>,

    /// Output file path (default: research_result.md).
    #[arg(short = 'f', long)]
    output: Option<PathBuf>,

    /// Gemini model to use, overriding the config file.
    #[arg(short, long)]
    model: Option<String>,

    /// Gemini API key, overriding the environment and `.env`.
    #[arg(short = 'k', long)]
    api_key: Option<String>,

    /// Print diagnostic output.
    #[arg(short, long)]
    verbose: bool,

    /// Show content as it is generated.
    #[arg(short, long)]
    stream: bool,

    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,
}

struct Params {
    topic: String,
    objective: String,
    output: PathBuf,
}

fn read_answer(label: &str) -> anyhow::Result<String> {
    print!("{}", label);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim().to_string())
}

fn interactive() -> anyhow::Result<Params> {
    println!(
        "{}",
        paint("Gemini Research Tool - Interactive Mode", Style::Header, Target::Stdout)
    );
    println!(
        "{}\n",
        paint("Please provide the following information:", Style::Info, Target::Stdout)
    );

    let topic = read_answer("Research Topic: ")?;
    let objective = read_answer("Research Objective: ")?;
    let output = read_answer(&format!("Output File Path [{}]: ", DEFAULT_OUTPUT_FILE))?;
    let output = if output.is_empty() {
        PathBuf::from(DEFAULT_OUTPUT_FILE)
    } else {
        PathBuf::from(output)
    };

    Ok(Params {
        topic,
        objective,
        output,
    })
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let params = match (cli.topic, cli.objective) {
        (Some(topic), Some(objective)) if !topic.is_empty() && !objective.is_empty() => Params {
            topic,
            objective,
            output: cli
                .output
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILE)),
        },
        _ => interactive()?,
    };

    let (mut cfg, layout) = config::resolve(cli.config.as_deref())?;
    if let Some(model) = cli.model {
        cfg.provider.model = model;
    }

    let resolver = CredentialResolver::new(&layout.env_file);
    let credential = research_credential(cli.api_key.as_deref(), &resolver)?;
    tracing::debug!("using API key {}", credential.redacted());
    let provider = create_provider(&cfg.provider)?;

    println!(
        "{}",
        paint(&format!("Researching: {}", params.topic), Style::Header, Target::Stdout)
    );
    println!(
        "{}",
        paint(&format!("Objective: {}", params.objective), Style::Info, Target::Stdout)
    );
    println!(
        "{}",
        paint("Generating documentation...", Style::Info, Target::Stdout)
    );

    let progress = ProgressMode::from_flag(cli.stream).reporter();
    if cli.stream {
        println!();
    }

    let report = create_documentation(
        provider.as_ref(),
        &credential,
        &params.topic,
        &params.objective,
        Some(params.output.as_path()),
        progress.as_ref(),
    )
    .await?;

    println!(
        "{}",
        paint(
            &format!("Research document saved to: {}", params.output.display()),
            Style::Success,
            Target::Stdout
        )
    );

    println!(
        "\n{}",
        paint(
            &format!(
                "Research complete in {} seconds!",
                report.execution_time_seconds
            ),
            Style::Success,
            Target::Stdout
        )
    );
    println!("{}", paint("Document saved to:", Style::Success, Target::Stdout));
    println!(
        "{}\n",
        paint(&params.output.display().to_string(), Style::Bold, Target::Stdout)
    );

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!(
            "\n{}",
            paint(&format!("Error: {:#}", e), Style::Failure, Target::Stderr)
        );
        std::process::exit(1);
    }
}
