//! # Chat Digest
//!
//! Summarizes AI coding-assistant chat transcripts with Gemini and produces
//! web-grounded research documents.
//!
//! Transcripts are markdown files exported into a history directory (by
//! default `.specstory/history` under the project root). Summaries are stored
//! as dated markdown files so that a new agent session can start from the
//! previous one's context.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌────────────┐   ┌─────────┐
//! │ History  │──▶│ Aggregate │──▶│ Summarizer │──▶│  Store  │
//! │ *.md     │   │ staging   │   │ Gemini SSE │   │ dated md│
//! └──────────┘   └───────────┘   └────────────┘   └─────────┘
//!                                      ▲
//!                                ┌─────┴─────┐
//!                                │ Research  │──▶ docs/*.md
//!                                └───────────┘
//! ```
//!
//! ## Binaries
//!
//! ```bash
//! chat-summary --startup          # banner + latest summary
//! chat-summary --recent 5         # summarize the five newest transcripts
//! research -t "tokio" -o "explain cancellation" -f out.md --stream
//! ask "How does axum extract state?"
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and path layout |
//! | [`root`] | Project root discovery |
//! | [`credential`] | API key resolution from env and `.env` |
//! | [`history`] | Transcript discovery |
//! | [`aggregate`] | Multi-transcript staging |
//! | [`prompt`] | Instruction templates and truncation |
//! | [`provider`] | Streaming text provider abstraction |
//! | [`summarize`] | Summarization client |
//! | [`store`] | Summary storage |
//! | [`ops`] | `chat-summary` actions |
//! | [`research`] | Documentation research |
//! | [`progress`] | Streaming echo and terminal colors |
//! | [`logging`] | Diagnostic logging setup |
//! | [`error`] | Error type |
//! | [`models`] | Core data types |

pub mod aggregate;
pub mod config;
pub mod credential;
pub mod error;
pub mod history;
pub mod logging;
pub mod models;
pub mod ops;
pub mod progress;
pub mod prompt;
pub mod provider;
pub mod research;
pub mod root;
pub mod store;
pub mod summarize;
