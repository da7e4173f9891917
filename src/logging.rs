//! Diagnostic logging setup shared by the binaries.
//!
//! Library code logs through `tracing`. Debug output is enabled by the
//! `--debug` flag or the `CHAT_SUMMARY_TOOL_DEBUG` variable and goes to
//! stdout next to the tool's normal output. `RUST_LOG` overrides both.

use tracing_subscriber::EnvFilter;

/// Variable that turns on debug diagnostics without a flag.
pub const DEBUG_ENV_VAR: &str = "CHAT_SUMMARY_TOOL_DEBUG";

/// Whether the debug variable is set to a non-empty value.
pub fn debug_from_env() -> bool {
    std::env::var(DEBUG_ENV_VAR)
        .map(|v| !v.is_empty())
        .unwrap_or(false)
}

fn default_directive(debug: bool) -> &'static str {
    if debug {
        "chat_digest=debug"
    } else {
        "chat_digest=warn"
    }
}

/// Install the global subscriber. Safe to call more than once.
pub fn init(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug || debug_from_env())));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stdout)
        .with_ansi(atty::is(atty::Stream::Stdout))
        .with_target(false)
        .without_time()
        .try_init();
}
