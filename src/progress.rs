//! Terminal output helpers: streaming echo and ANSI colors.
//!
//! `research --stream` prints provider chunks as they arrive through a
//! [`StreamProgress`] reporter. Colors are only emitted when the target
//! stream is a TTY, so piped output stays plain.

use std::io::Write;

/// Receives provider chunks while a response is being accumulated.
pub trait StreamProgress: Send + Sync {
    /// Called once per chunk, in arrival order.
    fn chunk(&self, text: &str);
    /// Called after the last chunk of a successful stream.
    fn finish(&self) {}
}

/// Discards everything.
pub struct NoProgress;

impl StreamProgress for NoProgress {
    fn chunk(&self, _text: &str) {}
}

/// Echoes chunks to stdout as they arrive.
pub struct StdoutProgress;

impl StreamProgress for StdoutProgress {
    fn chunk(&self, text: &str) {
        let mut out = std::io::stdout().lock();
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }

    fn finish(&self) {
        let _ = std::io::stdout().lock().write_all(b"\n\n");
    }
}

/// Progress mode for the research CLI.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Stdout,
}

impl ProgressMode {
    pub fn from_flag(stream: bool) -> Self {
        if stream {
            ProgressMode::Stdout
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn StreamProgress> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Stdout => Box::new(StdoutProgress),
        }
    }
}

/// ANSI styles used by the research tools.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Style {
    Header,
    Info,
    Success,
    Failure,
    Bold,
}

impl Style {
    fn code(&self) -> &'static str {
        match self {
            Style::Header => "\x1b[95m",
            Style::Info => "\x1b[94m",
            Style::Success => "\x1b[92m",
            Style::Failure => "\x1b[91m",
            Style::Bold => "\x1b[1m",
        }
    }
}

const RESET: &str = "\x1b[0m";

/// Output stream a painted string is destined for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Target {
    Stdout,
    Stderr,
}

impl Target {
    fn is_tty(&self) -> bool {
        match self {
            Target::Stdout => atty::is(atty::Stream::Stdout),
            Target::Stderr => atty::is(atty::Stream::Stderr),
        }
    }
}

/// Wrap `text` in `style` when `target` is a terminal.
pub fn paint(text: &str, style: Style, target: Target) -> String {
    styled(text, style, target.is_tty())
}

fn styled(text: &str, style: Style, color: bool) -> String {
    if color {
        format!("{}{}{}", style.code(), text, RESET)
    } else {
        text.to_string()
    }
}
