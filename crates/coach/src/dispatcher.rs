//! Single-flight coaching dispatcher.
//!
//! At most one LLM request per session is outstanding. A rep that completes
//! while a request is in flight gets no LLM call and the mailbox keeps its
//! previous comment. Results land in a `watch` mailbox that the session's
//! frame loop reads without blocking.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use repcoach_core::text::shorten_feedback;
use serde::Serialize;
use tokio::sync::watch;

use crate::client::LlmClient;
use crate::error::CoachError;
use crate::prompt::CoachPrompt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackSource {
    Llm,
    Fallback,
}

/// Latest coach comment for a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoachFeedback {
    pub text: String,
    pub source: FeedbackSource,
    /// Rep (or hold checkpoint) the comment refers to.
    pub rep: u32,
}

/// Clears the in-flight flag when the request task ends, however it ends.
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct CoachDispatcher {
    client: Arc<dyn LlmClient>,
    in_flight: Arc<AtomicBool>,
    mailbox: Arc<watch::Sender<Option<CoachFeedback>>>,
    timeout: Duration,
    char_limit: usize,
}

impl CoachDispatcher {
    pub fn new(client: Arc<dyn LlmClient>, timeout: Duration, char_limit: usize) -> Self {
        let (mailbox, _) = watch::channel(None);
        Self {
            client,
            in_flight: Arc::new(AtomicBool::new(false)),
            mailbox: Arc::new(mailbox),
            timeout,
            char_limit,
        }
    }

    /// Start an LLM request for `rep` unless one is already running.
    ///
    /// Returns `false` without side effects when the slot is taken. On
    /// failure or timeout the task publishes `fallback` instead. Must be
    /// called from within a Tokio runtime.
    pub fn dispatch(&self, rep: u32, prompt: CoachPrompt, fallback: String) -> bool {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!(rep, "Coach request already in flight, skipping");
            return false;
        }

        let guard = InFlightGuard(Arc::clone(&self.in_flight));
        let client = Arc::clone(&self.client);
        let mailbox = Arc::clone(&self.mailbox);
        let timeout = self.timeout;
        let char_limit = self.char_limit;

        tokio::spawn(async move {
            let _guard = guard;
            let feedback = match request(client.as_ref(), &prompt, timeout).await {
                Ok(reply) => {
                    let text = shorten_feedback(&reply, char_limit);
                    if text.is_empty() {
                        CoachFeedback {
                            text: fallback,
                            source: FeedbackSource::Fallback,
                            rep,
                        }
                    } else {
                        CoachFeedback {
                            text,
                            source: FeedbackSource::Llm,
                            rep,
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(rep, error = %e, "Coach request failed, using fallback");
                    CoachFeedback {
                        text: fallback,
                        source: FeedbackSource::Fallback,
                        rep,
                    }
                }
            };
            mailbox.send_replace(Some(feedback));
        });

        true
    }

    /// Publish a comment directly, bypassing the LLM.
    pub fn publish(&self, feedback: CoachFeedback) {
        self.mailbox.send_replace(Some(feedback));
    }

    pub fn latest(&self) -> Option<CoachFeedback> {
        self.mailbox.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<CoachFeedback>> {
        self.mailbox.subscribe()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Forget the last comment, e.g. after a reset.
    pub fn clear(&self) {
        self.mailbox.send_replace(None);
    }
}

/// Run one completion bounded by `timeout`.
pub async fn request(
    client: &dyn LlmClient,
    prompt: &CoachPrompt,
    timeout: Duration,
) -> Result<String, CoachError> {
    match tokio::time::timeout(timeout, client.complete(prompt)).await {
        Ok(result) => result,
        Err(_) => Err(CoachError::Timeout(timeout)),
    }
}
