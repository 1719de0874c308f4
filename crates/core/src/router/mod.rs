//! Prompt router: the conversation state machine between the worker and the
//! operator.
//!
//! Every chunk is checked against an ordered rule table. Prompts the launch
//! configuration can answer produce a stdin reply right away; the rest are
//! raised to the operator and answered later through [`PromptRouter::answer`].
//!
//! Matching is per chunk. A prompt split across two reads is not recognized.

pub mod patterns;
mod rules;

use crate::demux::OutputChunk;
use crate::demux::StreamKind;
use rules::Response;
use vfm_protocol::LaunchConfiguration;
use vfm_protocol::PromptAnswer;
use vfm_protocol::PromptKind;
use vfm_protocol::PromptRequest;

/// Upper bound on the retained primary transcript.
pub const TRANSCRIPT_LIMIT: usize = 64 * 1024;

/// What the session should do with a chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterAction {
    /// Write `text` to stdin. `text` ends with a newline.
    Respond { kind: PromptKind, text: String },
    /// Ask the operator.
    Raise(PromptRequest),
    /// The worker announced the final video.
    CompletionObserved { filename: Option<String> },
}

#[derive(Debug, Default, Clone)]
pub struct ConversationState {
    awaiting: Option<PromptKind>,
    transcript: String,
}

impl ConversationState {
    fn record(&mut self, text: &str) {
        self.transcript.push_str(text);
        if self.transcript.len() > TRANSCRIPT_LIMIT {
            let mut cut = self.transcript.len() - TRANSCRIPT_LIMIT;
            while !self.transcript.is_char_boundary(cut) {
                cut += 1;
            }
            self.transcript.drain(..cut);
        }
    }
}

/// Per-run router. A new run gets a new router.
#[derive(Debug)]
pub struct PromptRouter {
    config: LaunchConfiguration,
    state: ConversationState,
}

impl PromptRouter {
    pub fn new(config: LaunchConfiguration) -> Self {
        Self {
            config,
            state: ConversationState::default(),
        }
    }

    /// The operator prompt currently outstanding, if any.
    pub fn awaiting(&self) -> Option<PromptKind> {
        self.state.awaiting
    }

    pub fn transcript(&self) -> &str {
        &self.state.transcript
    }

    /// Evaluates one chunk. Returns at most one prompt action, followed by a
    /// completion notice when the chunk announces the final video.
    pub fn route(&mut self, chunk: &OutputChunk) -> Vec<RouterAction> {
        let text = chunk.text.as_str();
        if chunk.stream == StreamKind::Primary {
            self.state.record(text);
        }

        let mut actions = Vec::new();
        if let Some(rule) = rules::first_match(chunk.stream, text) {
            match rule.response {
                Response::Auto(reply) => {
                    tracing::debug!(kind = ?rule.kind, "Auto-answering worker prompt");
                    actions.push(RouterAction::Respond {
                        kind: rule.kind,
                        text: format!("{}\n", reply(&self.config)),
                    });
                }
                Response::Operator(build) => {
                    let request = build(text, &self.state.transcript);
                    if let Some(previous) = self.state.awaiting.replace(rule.kind) {
                        tracing::debug!(?previous, next = ?rule.kind, "Prompt superseded");
                    }
                    actions.push(RouterAction::Raise(request));
                }
            }
        }

        if chunk.stream == StreamKind::Primary && patterns::is_completion(text) {
            actions.push(RouterAction::CompletionObserved {
                filename: patterns::completion_filename(text),
            });
        }

        actions
    }

    /// Serializes an operator answer to the stdin line and clears the
    /// outstanding prompt.
    pub fn answer(&mut self, answer: &PromptAnswer) -> String {
        if self.state.awaiting.is_some_and(|kind| kind != answer.kind()) {
            tracing::debug!(
                awaiting = ?self.state.awaiting,
                answered = ?answer.kind(),
                "Answer does not match the outstanding prompt"
            );
        }
        self.state.awaiting = None;
        format!("{}\n", answer.wire_text())
    }
}
