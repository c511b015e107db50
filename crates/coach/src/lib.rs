//! LLM coaching boundary.
//!
//! Builds prompts from cycle digests, talks to an OpenAI-compatible chat
//! completions endpoint, and runs per-rep coaching calls through a
//! single-flight [`CoachDispatcher`] so the frame loop never waits on the
//! network.

pub mod chat;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod fallback;
pub mod frame_check;
pub mod prompt;
pub mod report;

pub use client::{LlmClient, OpenAiClient};
pub use config::CoachConfig;
pub use dispatcher::{CoachDispatcher, CoachFeedback, FeedbackSource};
pub use error::CoachError;
pub use prompt::{CoachPrompt, PromptKind};
