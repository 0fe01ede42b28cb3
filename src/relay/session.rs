//! Conversation state machine collecting run parameters
//!
//! A session is created when a manifest is ingested and advances exactly one
//! step per valid answer: starting line, destination channel, batch label,
//! credit text. Invalid answers re-prompt without advancing. Each step's
//! collected values ride inside the step variant, so no field is readable
//! before its predecessor has been answered.

use crate::types::ChatId;

pub(crate) const PROMPT_DESTINATION: &str =
    "📝 Got it. Now send the **channel ID** (e.g. `-1001234567890`).";
pub(crate) const PROMPT_BATCH_LABEL: &str = "🏷️ Great! Now send the **batch name** (any text).";
pub(crate) const PROMPT_CREDIT: &str = "👤 Perfect! Now send the **Downloaded by** credit text.";
pub(crate) const REJECT_NOT_AN_INTEGER: &str =
    "❌ That's not a valid integer. Please send the starting line number.";
pub(crate) const REJECT_DESTINATION_FORMAT: &str =
    "❌ Invalid channel ID format. Make sure it starts with `-100`.";

/// Steps of the configuration conversation, in answer order
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SetupStep {
    /// Waiting for the 1-based starting line number
    AwaitStartLine,
    /// Waiting for the destination channel id
    AwaitDestination {
        /// Starting line collected in the previous step
        start_line: usize,
    },
    /// Waiting for the batch label
    AwaitBatchLabel {
        /// Starting line collected earlier
        start_line: usize,
        /// Destination channel collected in the previous step
        destination: ChatId,
    },
    /// Waiting for the credit text
    AwaitCredit {
        /// Starting line collected earlier
        start_line: usize,
        /// Destination channel collected earlier
        destination: ChatId,
        /// Batch label collected in the previous step
        batch_label: String,
    },
    /// All four answers collected; the run has been handed its config
    Ready,
}

/// Completed run parameters, immutable once built
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunConfig {
    /// First manifest line to process (1-based, within the manifest)
    pub start_line: usize,
    /// Destination channel
    pub destination: ChatId,
    /// Batch label echoed into captions and progress reports
    pub batch_label: String,
    /// Credit text appended to captions
    pub credit: String,
}

/// Outcome of feeding one answer into a session
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// Answer accepted; reply with the next prompt
    Advanced(String),
    /// Answer rejected; reply with the corrective prompt, state unchanged
    Rejected(String),
    /// Final answer accepted; the run configuration is complete
    Complete(RunConfig),
    /// The session is already configured (a run is in flight); say nothing
    Ignored,
}

/// Per-user conversation holding the manifest lines and collected answers
///
/// Lives in the session store from manifest ingestion until the run it
/// configures finishes (or is superseded by a new manifest).
#[derive(Clone, Debug)]
pub struct ConversationSession {
    /// Raw manifest lines, trimmed and non-blank
    pub lines: Vec<String>,
    step: SetupStep,
}

impl ConversationSession {
    /// Start a conversation over freshly ingested manifest lines.
    pub fn new(lines: Vec<String>) -> Self {
        Self {
            lines,
            step: SetupStep::AwaitStartLine,
        }
    }

    /// Number of manifest lines.
    pub fn total(&self) -> usize {
        self.lines.len()
    }

    /// Current conversation step.
    pub fn step(&self) -> &SetupStep {
        &self.step
    }

    /// Feed one answer (already trimmed) into the conversation.
    ///
    /// Exactly one state is advanced per accepted answer. The completed
    /// [`RunConfig`] is handed out once; afterwards the session rests in
    /// [`SetupStep::Ready`] until the run tears it down, answering
    /// [`AnswerOutcome::Ignored`] to any further input.
    pub fn apply_answer(&mut self, text: &str) -> AnswerOutcome {
        let current = std::mem::replace(&mut self.step, SetupStep::AwaitStartLine);
        let (next, outcome) = self.transition(current, text);
        self.step = next;
        outcome
    }

    fn transition(&self, step: SetupStep, text: &str) -> (SetupStep, AnswerOutcome) {
        match step {
            SetupStep::AwaitStartLine => match text.parse::<i64>() {
                Ok(n) if n >= 1 && (n as usize) <= self.total() => (
                    SetupStep::AwaitDestination {
                        start_line: n as usize,
                    },
                    AnswerOutcome::Advanced(PROMPT_DESTINATION.to_string()),
                ),
                Ok(_) => (
                    SetupStep::AwaitStartLine,
                    AnswerOutcome::Rejected(format!(
                        "❌ Please send a number between 1 and {}.",
                        self.total()
                    )),
                ),
                Err(_) => (
                    SetupStep::AwaitStartLine,
                    AnswerOutcome::Rejected(REJECT_NOT_AN_INTEGER.to_string()),
                ),
            },

            SetupStep::AwaitDestination { start_line } => match parse_destination(text) {
                Some(destination) => (
                    SetupStep::AwaitBatchLabel {
                        start_line,
                        destination,
                    },
                    AnswerOutcome::Advanced(PROMPT_BATCH_LABEL.to_string()),
                ),
                None => (
                    SetupStep::AwaitDestination { start_line },
                    AnswerOutcome::Rejected(REJECT_DESTINATION_FORMAT.to_string()),
                ),
            },

            SetupStep::AwaitBatchLabel {
                start_line,
                destination,
            } => {
                if text.is_empty() {
                    (
                        SetupStep::AwaitBatchLabel {
                            start_line,
                            destination,
                        },
                        AnswerOutcome::Rejected(PROMPT_BATCH_LABEL.to_string()),
                    )
                } else {
                    (
                        SetupStep::AwaitCredit {
                            start_line,
                            destination,
                            batch_label: text.to_string(),
                        },
                        AnswerOutcome::Advanced(PROMPT_CREDIT.to_string()),
                    )
                }
            }

            SetupStep::AwaitCredit {
                start_line,
                destination,
                batch_label,
            } => {
                if text.is_empty() {
                    (
                        SetupStep::AwaitCredit {
                            start_line,
                            destination,
                            batch_label,
                        },
                        AnswerOutcome::Rejected(PROMPT_CREDIT.to_string()),
                    )
                } else {
                    let config = RunConfig {
                        start_line,
                        destination,
                        batch_label,
                        credit: text.to_string(),
                    };
                    (SetupStep::Ready, AnswerOutcome::Complete(config))
                }
            }

            SetupStep::Ready => (SetupStep::Ready, AnswerOutcome::Ignored),
        }
    }
}

/// Channel ids must carry the platform's broadcast-channel prefix.
fn parse_destination(text: &str) -> Option<ChatId> {
    if !text.starts_with("-100") {
        return None;
    }
    text.parse::<i64>().ok().map(ChatId::new)
}
